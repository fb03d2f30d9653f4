// roster.rs — Registration and administrative status changes.
//
// Operators register vehicles and drivers and move them between the
// non-trip states (workshop, retirement, duty rosters). None of these writes
// may touch a record that is ON_TRIP: only the dispatch engine puts a record
// on a trip and only completion takes it off.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::error::DispatchError;
use crate::events::{EventDispatcher, FleetEvent};
use crate::model::{
    Driver, DriverId, DriverPatch, DriverStatus, DutyStatus, NewDriver, NewVehicle,
    ServiceStatus, Vehicle, VehicleId, VehiclePatch, VehicleStatus,
};
use crate::store::Store;

/// Vehicle and driver administration over a shared store.
pub struct Roster<S: Store> {
    store: Arc<S>,
    events: Arc<EventDispatcher>,
}

impl<S: Store> Roster<S> {
    pub fn new(store: Arc<S>, events: Arc<EventDispatcher>) -> Self {
        Self { store, events }
    }

    /// Register a vehicle. It starts AVAILABLE.
    pub fn register_vehicle(&self, new: NewVehicle) -> Result<Vehicle, DispatchError> {
        validate_vehicle(&new)?;

        let vehicle = self.store.transaction(|tx| {
            let plate_taken = tx
                .list_vehicles()?
                .iter()
                .any(|v| v.license_plate == new.license_plate);
            if plate_taken {
                return Err(DispatchError::InvalidRecord(format!(
                    "license plate '{}' is already registered",
                    new.license_plate
                )));
            }
            Ok(tx.insert_vehicle(new)?)
        })?;

        tracing::info!(
            vehicle_id = vehicle.id,
            plate = %vehicle.license_plate,
            "vehicle registered"
        );
        self.events
            .dispatch(&FleetEvent::vehicle_registered(&vehicle));
        Ok(vehicle)
    }

    /// Register a driver. They start OFF_DUTY.
    pub fn register_driver(&self, new: NewDriver) -> Result<Driver, DispatchError> {
        if new.name.trim().is_empty() {
            return Err(DispatchError::InvalidRecord(
                "driver name must not be empty".to_string(),
            ));
        }

        let driver = self.store.transaction(|tx| Ok(tx.insert_driver(new)?))?;

        tracing::info!(driver_id = driver.id, name = %driver.name, "driver registered");
        self.events.dispatch(&FleetEvent::driver_registered(&driver));
        Ok(driver)
    }

    /// Move a vehicle between AVAILABLE, IN_SHOP and RETIRED.
    ///
    /// A vehicle on a trip is `VehicleUnavailable`; a retired vehicle stays
    /// retired.
    pub fn set_vehicle_status(
        &self,
        vehicle_id: VehicleId,
        status: ServiceStatus,
    ) -> Result<Vehicle, DispatchError> {
        let (from, vehicle) = self.store.transaction(|tx| {
            let current = tx.get_vehicle(vehicle_id)?;
            match current.status {
                VehicleStatus::OnTrip { .. } => {
                    return Err(DispatchError::VehicleUnavailable { vehicle_id })
                }
                VehicleStatus::Retired if status != ServiceStatus::Retired => {
                    return Err(DispatchError::InvalidRecord(format!(
                        "vehicle {} is retired",
                        vehicle_id
                    )))
                }
                _ => {}
            }
            let updated = tx.update_vehicle(vehicle_id, &VehiclePatch::service(status))?;
            Ok((current.status, updated))
        })?;

        tracing::info!(
            vehicle_id,
            from = %from,
            to = %vehicle.status,
            "vehicle status changed"
        );
        self.events.dispatch(&FleetEvent::vehicle_status_changed(
            vehicle_id,
            from.to_string(),
            vehicle.status.to_string(),
        ));
        Ok(vehicle)
    }

    /// Move a driver between ON_DUTY, OFF_DUTY and SUSPENDED.
    ///
    /// A driver on a trip is `DriverUnavailable`.
    pub fn set_driver_status(
        &self,
        driver_id: DriverId,
        status: DutyStatus,
    ) -> Result<Driver, DispatchError> {
        let (from, driver) = self.store.transaction(|tx| {
            let current = tx.get_driver(driver_id)?;
            if let DriverStatus::OnTrip { .. } = current.status {
                return Err(DispatchError::DriverUnavailable { driver_id });
            }
            let updated = tx.update_driver(driver_id, &DriverPatch::duty(status))?;
            Ok((current.status, updated))
        })?;

        tracing::info!(
            driver_id,
            from = %from,
            to = %driver.status,
            "driver status changed"
        );
        self.events.dispatch(&FleetEvent::driver_status_changed(
            driver_id,
            from.to_string(),
            driver.status.to_string(),
        ));
        Ok(driver)
    }

    /// Load the demo fleet (one truck, one on-duty driver) into an empty store.
    ///
    /// Returns `None` and writes nothing when any vehicle or driver exists.
    pub fn seed(&self) -> Result<Option<(Vehicle, Driver)>, DispatchError> {
        let license_expiry = Utc
            .with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| DispatchError::InvalidRecord("invalid seed date".to_string()))?;

        let seeded = self.store.transaction(|tx| {
            if !tx.list_vehicles()?.is_empty() || !tx.list_drivers()?.is_empty() {
                return Ok(None);
            }
            let vehicle = tx.insert_vehicle(NewVehicle {
                name: "Volvo FH16".to_string(),
                license_plate: "V-1001".to_string(),
                max_load_capacity: 20000.0,
                odometer: 15000.0,
            })?;
            let driver = tx.insert_driver(NewDriver {
                name: "John Doe".to_string(),
                license_type: "CDL-A".to_string(),
                license_expiry,
            })?;
            let driver = tx.update_driver(driver.id, &DriverPatch::duty(DutyStatus::OnDuty))?;
            Ok(Some((vehicle, driver)))
        })?;

        match &seeded {
            Some((vehicle, driver)) => {
                tracing::info!(vehicle_id = vehicle.id, driver_id = driver.id, "seeded demo fleet");
                self.events
                    .dispatch(&FleetEvent::vehicle_registered(vehicle));
                self.events.dispatch(&FleetEvent::driver_registered(driver));
            }
            None => tracing::info!("store is not empty, seed skipped"),
        }
        Ok(seeded)
    }
}

fn validate_vehicle(new: &NewVehicle) -> Result<(), DispatchError> {
    if new.name.trim().is_empty() {
        return Err(DispatchError::InvalidRecord(
            "vehicle name must not be empty".to_string(),
        ));
    }
    if new.license_plate.trim().is_empty() {
        return Err(DispatchError::InvalidRecord(
            "license plate must not be empty".to_string(),
        ));
    }
    if !(new.max_load_capacity.is_finite() && new.max_load_capacity > 0.0) {
        return Err(DispatchError::InvalidRecord(format!(
            "max load capacity must be greater than zero, got {}",
            new.max_load_capacity
        )));
    }
    if !(new.odometer.is_finite() && new.odometer >= 0.0) {
        return Err(DispatchError::InvalidRecord(format!(
            "odometer must not be negative, got {}",
            new.odometer
        )));
    }
    Ok(())
}
