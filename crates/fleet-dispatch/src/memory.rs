// memory.rs — In-process Store backed by ordered maps.
//
// Each transaction takes the table lock, works on a copy of the tables and
// swaps the copy in only when the closure succeeds. Holding the lock for the
// whole transaction makes transactions run one at a time, which is trivially
// serializable; dropping the copy is the rollback.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{DispatchError, StoreError};
use crate::model::{
    Driver, DriverId, DriverPatch, EntityKind, NewDriver, NewVehicle, TripId, Vehicle, VehicleId,
    VehiclePatch,
};
use crate::store::{Store, StoreTx};
use crate::trip::{NewTrip, Trip, TripPatch};

#[derive(Debug, Clone, Default)]
struct Tables {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    drivers: BTreeMap<DriverId, Driver>,
    trips: BTreeMap<TripId, Trip>,
    // Last id handed out per table.
    last_vehicle_id: VehicleId,
    last_driver_id: DriverId,
    last_trip_id: TripId,
}

/// A `Store` that keeps everything in memory. Used by tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, DispatchError>,
    {
        let mut tables = self.tables.lock().map_err(|_| {
            DispatchError::StoreTransactionFailed("memory store lock poisoned".to_string())
        })?;

        let mut working = tables.clone();
        match f(&mut working) {
            Ok(value) => {
                *tables = working;
                tracing::debug!("memory store transaction committed");
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(error = %e, "memory store transaction rolled back");
                Err(e)
            }
        }
    }
}

fn not_found(entity: EntityKind, id: i64) -> StoreError {
    StoreError::NotFound { entity, id }
}

impl StoreTx for Tables {
    fn get_vehicle(&mut self, id: VehicleId) -> Result<Vehicle, StoreError> {
        self.vehicles
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Vehicle, id))
    }

    fn get_driver(&mut self, id: DriverId) -> Result<Driver, StoreError> {
        self.drivers
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Driver, id))
    }

    fn get_trip(&mut self, id: TripId) -> Result<Trip, StoreError> {
        self.trips
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Trip, id))
    }

    fn list_vehicles(&mut self) -> Result<Vec<Vehicle>, StoreError> {
        Ok(self.vehicles.values().cloned().collect())
    }

    fn list_drivers(&mut self) -> Result<Vec<Driver>, StoreError> {
        Ok(self.drivers.values().cloned().collect())
    }

    fn list_trips(&mut self) -> Result<Vec<Trip>, StoreError> {
        Ok(self.trips.values().cloned().collect())
    }

    fn insert_vehicle(&mut self, new: NewVehicle) -> Result<Vehicle, StoreError> {
        if self
            .vehicles
            .values()
            .any(|v| v.license_plate == new.license_plate)
        {
            return Err(StoreError::Backend(format!(
                "duplicate license plate '{}'",
                new.license_plate
            )));
        }
        self.last_vehicle_id += 1;
        let vehicle = Vehicle::register(self.last_vehicle_id, new);
        self.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    fn insert_driver(&mut self, new: NewDriver) -> Result<Driver, StoreError> {
        self.last_driver_id += 1;
        let driver = Driver::register(self.last_driver_id, new);
        self.drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    fn insert_trip(&mut self, new: NewTrip) -> Result<Trip, StoreError> {
        self.last_trip_id += 1;
        let trip = Trip::open(self.last_trip_id, new);
        self.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    fn update_vehicle(
        &mut self,
        id: VehicleId,
        patch: &VehiclePatch,
    ) -> Result<Vehicle, StoreError> {
        let vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::Vehicle, id))?;
        vehicle.apply(patch);
        Ok(vehicle.clone())
    }

    fn update_driver(&mut self, id: DriverId, patch: &DriverPatch) -> Result<Driver, StoreError> {
        let driver = self
            .drivers
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::Driver, id))?;
        driver.apply(patch);
        Ok(driver.clone())
    }

    fn update_trip(&mut self, id: TripId, patch: &TripPatch) -> Result<Trip, StoreError> {
        let trip = self
            .trips
            .get_mut(&id)
            .ok_or_else(|| not_found(EntityKind::Trip, id))?;
        trip.apply(patch);
        Ok(trip.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VehicleStatus;

    fn new_vehicle(plate: &str) -> NewVehicle {
        NewVehicle {
            name: "Truck".to_string(),
            license_plate: plate.to_string(),
            max_load_capacity: 1000.0,
            odometer: 0.0,
        }
    }

    #[test]
    fn committed_writes_are_visible_to_later_transactions() {
        let store = MemoryStore::new();
        let id = store
            .transaction(|tx| Ok(tx.insert_vehicle(new_vehicle("A-1"))?.id))
            .unwrap();

        let found = store.transaction(|tx| Ok(tx.get_vehicle(id)?)).unwrap();
        assert_eq!(found.license_plate, "A-1");
        assert_eq!(found.status, VehicleStatus::Available);
    }

    #[test]
    fn failed_transaction_discards_all_writes() {
        let store = MemoryStore::new();
        let result: Result<(), DispatchError> = store.transaction(|tx| {
            tx.insert_vehicle(new_vehicle("A-1"))?;
            tx.insert_vehicle(new_vehicle("A-2"))?;
            Err(DispatchError::InvalidRecord("abort".to_string()))
        });
        assert!(result.is_err());

        let vehicles = store.transaction(|tx| Ok(tx.list_vehicles()?)).unwrap();
        assert!(vehicles.is_empty());
    }

    #[test]
    fn ids_increase_per_table() {
        let store = MemoryStore::new();
        let (a, b) = store
            .transaction(|tx| {
                let a = tx.insert_vehicle(new_vehicle("A-1"))?.id;
                let b = tx.insert_vehicle(new_vehicle("A-2"))?.id;
                Ok((a, b))
            })
            .unwrap();
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn missing_records_report_not_found() {
        let store = MemoryStore::new();
        let err = store.transaction(|tx| Ok(tx.get_trip(42)?)).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::NotFound {
                entity: EntityKind::Trip,
                id: 42
            }
        ));

        let err = store
            .transaction(|tx| Ok(tx.update_vehicle(5, &VehiclePatch::release(10.0))?))
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }

    #[test]
    fn duplicate_plate_is_rejected_by_backend() {
        let store = MemoryStore::new();
        store
            .transaction(|tx| Ok(tx.insert_vehicle(new_vehicle("A-1"))?))
            .unwrap();
        let err = store
            .transaction(|tx| Ok(tx.insert_vehicle(new_vehicle("A-1"))?))
            .unwrap_err();
        assert!(matches!(err, DispatchError::StoreTransactionFailed(_)));
    }
}
