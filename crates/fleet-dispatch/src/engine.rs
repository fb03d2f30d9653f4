// engine.rs — The dispatch state machine.
//
// Vehicle, driver and trip statuses together encode one machine per pairing:
//
//   (AVAILABLE, ON_DUTY, —)
//     --dispatch-->  (ON_TRIP{t}, ON_TRIP{t}, DISPATCHED t)
//     --complete-->  (AVAILABLE, ON_DUTY, COMPLETED t)
//
// `dispatch` and `complete` are the only operations that move a vehicle or
// driver into or out of ON_TRIP. Each runs as a single store transaction:
// every precondition is checked against records read *inside* that
// transaction, so two dispatches racing for the same vehicle or driver are
// ordered by the store and the loser fails immediately with
// VehicleUnavailable / DriverUnavailable. The engine keeps no locks and
// never retries.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{DispatchError, StoreError};
use crate::events::{EventDispatcher, FleetEvent};
use crate::kpi::FleetKpis;
use crate::model::{
    Driver, DriverId, DriverPatch, DriverStatus, TripId, Vehicle, VehicleId, VehiclePatch,
    VehicleStatus,
};
use crate::roster::Roster;
use crate::store::{Store, StoreTx};
use crate::trip::{NewTrip, Trip, TripPatch, TripState};

/// Runs dispatch and completion against an injected store.
pub struct DispatchEngine<S: Store> {
    store: Arc<S>,
    events: Arc<EventDispatcher>,
}

impl<S: Store> DispatchEngine<S> {
    /// Create an engine with no notification sinks.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            events: Arc::new(EventDispatcher::new()),
        }
    }

    /// Create an engine that reports committed changes to `events`.
    pub fn with_events(store: Arc<S>, events: Arc<EventDispatcher>) -> Self {
        Self { store, events }
    }

    /// Registration and administrative status changes over the same store.
    pub fn roster(&self) -> Roster<S> {
        Roster::new(Arc::clone(&self.store), Arc::clone(&self.events))
    }

    /// Pair an AVAILABLE vehicle with an ON_DUTY driver on a new trip.
    ///
    /// Preconditions, first failure wins:
    /// 1. vehicle exists and is AVAILABLE → `VehicleUnavailable`
    /// 2. `cargo_weight` is finite and positive → `InvalidCargoWeight`, and
    ///    `cargo_weight <= max_load_capacity` → `CargoExceedsCapacity`
    /// 3. driver exists and is ON_DUTY → `DriverUnavailable`
    /// 4. license not expired → `LicenseExpired`
    ///
    /// On success the new DISPATCHED trip, the vehicle and the driver are
    /// written together; on failure nothing is written.
    pub fn dispatch(
        &self,
        vehicle_id: VehicleId,
        driver_id: DriverId,
        cargo_weight: f64,
    ) -> Result<Trip, DispatchError> {
        let result = self.try_dispatch(vehicle_id, driver_id, cargo_weight);

        match &result {
            Ok(trip) => {
                tracing::info!(
                    trip_id = trip.id,
                    vehicle_id,
                    driver_id,
                    cargo_weight,
                    "trip dispatched"
                );
                self.events.dispatch(&FleetEvent::trip_dispatched(trip));
            }
            Err(e) => {
                tracing::warn!(
                    vehicle_id,
                    driver_id,
                    cargo_weight,
                    kind = e.kind(),
                    "dispatch rejected: {}",
                    e
                );
            }
        }
        result
    }

    fn try_dispatch(
        &self,
        vehicle_id: VehicleId,
        driver_id: DriverId,
        cargo_weight: f64,
    ) -> Result<Trip, DispatchError> {
        self.store.transaction(|tx| {
            let now = Utc::now();

            let vehicle = or_unavailable(
                tx.get_vehicle(vehicle_id),
                DispatchError::VehicleUnavailable { vehicle_id },
            )?;
            if !vehicle.is_available() {
                return Err(DispatchError::VehicleUnavailable { vehicle_id });
            }
            // NaN fails this check too.
            if !(cargo_weight.is_finite() && cargo_weight > 0.0) {
                return Err(DispatchError::InvalidCargoWeight(cargo_weight));
            }
            if cargo_weight > vehicle.max_load_capacity {
                return Err(DispatchError::CargoExceedsCapacity {
                    cargo_weight,
                    max_load_capacity: vehicle.max_load_capacity,
                });
            }

            let driver = or_unavailable(
                tx.get_driver(driver_id),
                DispatchError::DriverUnavailable { driver_id },
            )?;
            if !driver.is_on_duty() {
                return Err(DispatchError::DriverUnavailable { driver_id });
            }
            if !driver.license_valid_at(now) {
                return Err(DispatchError::LicenseExpired {
                    driver_id,
                    expired_at: driver.license_expiry,
                });
            }

            let trip = tx.insert_trip(NewTrip::dispatched(
                vehicle_id,
                driver_id,
                cargo_weight,
                vehicle.odometer,
                now,
            ))?;
            tx.update_vehicle(vehicle_id, &VehiclePatch::assign(trip.id))?;
            tx.update_driver(driver_id, &DriverPatch::assign(trip.id))?;
            Ok(trip)
        })
    }

    /// Close a DISPATCHED trip and release its vehicle and driver.
    ///
    /// Preconditions:
    /// 1. trip exists and is DISPATCHED → `InvalidTripState`
    /// 2. `end_odometer > start_odometer` → `InvalidOdometerReading`
    ///
    /// The vehicle returns to AVAILABLE with its odometer set to
    /// `end_odometer`, the driver returns to ON_DUTY, and the trip becomes
    /// COMPLETED, all in one transaction.
    pub fn complete(&self, trip_id: TripId, end_odometer: f64) -> Result<Trip, DispatchError> {
        let result = self.try_complete(trip_id, end_odometer);

        match &result {
            Ok(trip) => {
                tracing::info!(
                    trip_id,
                    vehicle_id = trip.vehicle_id,
                    driver_id = trip.driver_id,
                    end_odometer,
                    "trip completed"
                );
                self.events.dispatch(&FleetEvent::trip_completed(trip));
            }
            Err(e) => {
                tracing::warn!(
                    trip_id,
                    end_odometer,
                    kind = e.kind(),
                    "completion rejected: {}",
                    e
                );
            }
        }
        result
    }

    fn try_complete(&self, trip_id: TripId, end_odometer: f64) -> Result<Trip, DispatchError> {
        self.store.transaction(|tx| {
            let trip = or_unavailable(
                tx.get_trip(trip_id),
                DispatchError::InvalidTripState { trip_id },
            )?;
            let start_odometer = match trip.state {
                TripState::Dispatched { start_odometer } => start_odometer,
                _ => return Err(DispatchError::InvalidTripState { trip_id }),
            };

            // Not-finite readings (NaN, infinity) are rejected here as well.
            if !(end_odometer.is_finite() && end_odometer > start_odometer) {
                return Err(DispatchError::InvalidOdometerReading {
                    start_odometer,
                    end_odometer,
                });
            }

            let vehicle = tx.get_vehicle(trip.vehicle_id)?;
            let driver = tx.get_driver(trip.driver_id)?;
            check_pairing(&trip, &vehicle, &driver)?;
            if end_odometer < vehicle.odometer {
                return Err(DispatchError::InvariantViolation(format!(
                    "vehicle {} odometer {} is ahead of trip {} end reading {}",
                    vehicle.id, vehicle.odometer, trip_id, end_odometer
                )));
            }

            let completed = TripState::Completed {
                start_odometer,
                end_odometer,
                completed_at: Utc::now(),
            };
            if !trip.state.can_transition_to(&completed) {
                return Err(DispatchError::InvalidTripState { trip_id });
            }

            tx.update_vehicle(vehicle.id, &VehiclePatch::release(end_odometer))?;
            tx.update_driver(driver.id, &DriverPatch::release())?;
            let trip = tx.update_trip(trip_id, &TripPatch::transition(completed))?;
            Ok(trip)
        })
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn vehicle(&self, id: VehicleId) -> Result<Vehicle, DispatchError> {
        self.store.transaction(|tx| Ok(tx.get_vehicle(id)?))
    }

    pub fn driver(&self, id: DriverId) -> Result<Driver, DispatchError> {
        self.store.transaction(|tx| Ok(tx.get_driver(id)?))
    }

    pub fn trip(&self, id: TripId) -> Result<Trip, DispatchError> {
        self.store.transaction(|tx| Ok(tx.get_trip(id)?))
    }

    pub fn vehicles(&self) -> Result<Vec<Vehicle>, DispatchError> {
        self.store.transaction(|tx| Ok(tx.list_vehicles()?))
    }

    pub fn drivers(&self) -> Result<Vec<Driver>, DispatchError> {
        self.store.transaction(|tx| Ok(tx.list_drivers()?))
    }

    /// All trips, newest first.
    pub fn trips(&self) -> Result<Vec<Trip>, DispatchError> {
        let mut trips = self.store.transaction(|tx| Ok(tx.list_trips()?))?;
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(trips)
    }

    /// Dashboard figures computed from one consistent snapshot.
    pub fn kpis(&self) -> Result<FleetKpis, DispatchError> {
        self.store.transaction(|tx| kpis_in(tx))
    }
}

fn kpis_in(tx: &mut dyn StoreTx) -> Result<FleetKpis, DispatchError> {
    let vehicles = tx.list_vehicles()?;
    let trips = tx.list_trips()?;
    Ok(FleetKpis::compute(&vehicles, &trips))
}

/// Turn a missing record into the caller-facing rejection for that step.
fn or_unavailable<T>(
    found: Result<T, StoreError>,
    rejection: DispatchError,
) -> Result<T, DispatchError> {
    match found {
        Ok(record) => Ok(record),
        Err(StoreError::NotFound { .. }) => Err(rejection),
        Err(e) => Err(e.into()),
    }
}

/// A DISPATCHED trip must be the one holding both its vehicle and driver.
fn check_pairing(trip: &Trip, vehicle: &Vehicle, driver: &Driver) -> Result<(), DispatchError> {
    let held = VehicleStatus::OnTrip { trip_id: trip.id };
    if vehicle.status != held {
        return Err(DispatchError::InvariantViolation(format!(
            "trip {} is dispatched but vehicle {} is {}",
            trip.id, vehicle.id, vehicle.status
        )));
    }
    if driver.status != (DriverStatus::OnTrip { trip_id: trip.id }) {
        return Err(DispatchError::InvariantViolation(format!(
            "trip {} is dispatched but driver {} is {}",
            trip.id, driver.id, driver.status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::model::{DutyStatus, NewDriver, NewVehicle, ServiceStatus};
    use crate::trip::TripStatus;
    use chrono::{Duration, TimeZone};

    struct Fleet {
        engine: DispatchEngine<MemoryStore>,
        vehicle_id: VehicleId,
        driver_id: DriverId,
    }

    /// Vehicle{capacity 20000, odometer 15000, AVAILABLE} and an ON_DUTY
    /// driver whose license runs until 2030-01-01.
    fn fleet() -> Fleet {
        let engine = DispatchEngine::new(Arc::new(MemoryStore::new()));
        let roster = engine.roster();
        let vehicle = roster
            .register_vehicle(NewVehicle {
                name: "Volvo FH16".to_string(),
                license_plate: "V-1001".to_string(),
                max_load_capacity: 20000.0,
                odometer: 15000.0,
            })
            .unwrap();
        let driver = roster
            .register_driver(NewDriver {
                name: "John Doe".to_string(),
                license_type: "CDL-A".to_string(),
                license_expiry: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            })
            .unwrap();
        roster
            .set_driver_status(driver.id, DutyStatus::OnDuty)
            .unwrap();
        Fleet {
            engine,
            vehicle_id: vehicle.id,
            driver_id: driver.id,
        }
    }

    #[test]
    fn dispatch_pairs_vehicle_and_driver() {
        let f = fleet();
        let trip = f.engine.dispatch(f.vehicle_id, f.driver_id, 18000.0).unwrap();

        assert_eq!(trip.status(), TripStatus::Dispatched);
        assert_eq!(trip.state.start_odometer(), Some(15000.0));
        assert_eq!(
            f.engine.vehicle(f.vehicle_id).unwrap().status,
            VehicleStatus::OnTrip { trip_id: trip.id }
        );
        assert_eq!(
            f.engine.driver(f.driver_id).unwrap().status,
            DriverStatus::OnTrip { trip_id: trip.id }
        );
    }

    #[test]
    fn cargo_at_exact_capacity_is_accepted() {
        let f = fleet();
        assert!(f.engine.dispatch(f.vehicle_id, f.driver_id, 20000.0).is_ok());
    }

    #[test]
    fn overweight_cargo_is_rejected_without_writes() {
        let f = fleet();
        let err = f
            .engine
            .dispatch(f.vehicle_id, f.driver_id, 20000.5)
            .unwrap_err();
        assert!(matches!(err, DispatchError::CargoExceedsCapacity { .. }));
        assert!(f.engine.vehicle(f.vehicle_id).unwrap().is_available());
        assert!(f.engine.driver(f.driver_id).unwrap().is_on_duty());
        assert!(f.engine.trips().unwrap().is_empty());
    }

    #[test]
    fn non_positive_cargo_is_rejected() {
        let f = fleet();
        for weight in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = f
                .engine
                .dispatch(f.vehicle_id, f.driver_id, weight)
                .unwrap_err();
            assert!(matches!(err, DispatchError::InvalidCargoWeight(_)));
        }
        assert!(f.engine.trips().unwrap().is_empty());
    }

    #[test]
    fn unavailable_vehicle_wins_over_bad_cargo_weight() {
        let f = fleet();
        assert!(matches!(
            f.engine.dispatch(999, f.driver_id, -1.0),
            Err(DispatchError::VehicleUnavailable { vehicle_id: 999 })
        ));

        f.engine
            .roster()
            .set_vehicle_status(f.vehicle_id, ServiceStatus::InShop)
            .unwrap();
        for weight in [0.0, f64::NAN] {
            let err = f
                .engine
                .dispatch(f.vehicle_id, f.driver_id, weight)
                .unwrap_err();
            assert!(matches!(err, DispatchError::VehicleUnavailable { .. }));
        }

        f.engine
            .roster()
            .set_vehicle_status(f.vehicle_id, ServiceStatus::Available)
            .unwrap();
        let err = f
            .engine
            .dispatch(f.vehicle_id, f.driver_id, 0.0)
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidCargoWeight(_)));
    }

    #[test]
    fn vehicle_check_wins_over_cargo_and_driver_checks() {
        let f = fleet();
        f.engine
            .roster()
            .set_vehicle_status(f.vehicle_id, ServiceStatus::InShop)
            .unwrap();
        f.engine
            .roster()
            .set_driver_status(f.driver_id, DutyStatus::Suspended)
            .unwrap();

        let err = f
            .engine
            .dispatch(f.vehicle_id, f.driver_id, 999_999.0)
            .unwrap_err();
        assert!(matches!(err, DispatchError::VehicleUnavailable { .. }));
    }

    #[test]
    fn unknown_vehicle_and_driver_are_unavailable() {
        let f = fleet();
        assert!(matches!(
            f.engine.dispatch(99, f.driver_id, 10.0),
            Err(DispatchError::VehicleUnavailable { vehicle_id: 99 })
        ));
        assert!(matches!(
            f.engine.dispatch(f.vehicle_id, 99, 10.0),
            Err(DispatchError::DriverUnavailable { driver_id: 99 })
        ));
    }

    #[test]
    fn off_duty_driver_is_unavailable() {
        let f = fleet();
        f.engine
            .roster()
            .set_driver_status(f.driver_id, DutyStatus::OffDuty)
            .unwrap();
        let err = f.engine.dispatch(f.vehicle_id, f.driver_id, 10.0).unwrap_err();
        assert!(matches!(err, DispatchError::DriverUnavailable { .. }));
    }

    #[test]
    fn expired_license_is_rejected() {
        let engine = DispatchEngine::new(Arc::new(MemoryStore::new()));
        let roster = engine.roster();
        let vehicle = roster
            .register_vehicle(NewVehicle {
                name: "Van".to_string(),
                license_plate: "VAN-9".to_string(),
                max_load_capacity: 1000.0,
                odometer: 0.0,
            })
            .unwrap();
        let driver = roster
            .register_driver(NewDriver {
                name: "Late Renewal".to_string(),
                license_type: "CDL-B".to_string(),
                license_expiry: Utc::now() - Duration::days(1),
            })
            .unwrap();
        roster.set_driver_status(driver.id, DutyStatus::OnDuty).unwrap();

        let err = engine.dispatch(vehicle.id, driver.id, 10.0).unwrap_err();
        assert!(matches!(err, DispatchError::LicenseExpired { .. }));
        assert!(engine.vehicle(vehicle.id).unwrap().is_available());
    }

    #[test]
    fn complete_releases_and_records_odometer() {
        let f = fleet();
        let trip = f.engine.dispatch(f.vehicle_id, f.driver_id, 18000.0).unwrap();
        let done = f.engine.complete(trip.id, 15500.0).unwrap();

        assert_eq!(done.status(), TripStatus::Completed);
        assert_eq!(done.state.end_odometer(), Some(15500.0));
        let vehicle = f.engine.vehicle(f.vehicle_id).unwrap();
        assert!(vehicle.is_available());
        assert_eq!(vehicle.odometer, 15500.0);
        assert!(f.engine.driver(f.driver_id).unwrap().is_on_duty());
    }

    #[test]
    fn second_completion_is_rejected_and_changes_nothing() {
        let f = fleet();
        let trip = f.engine.dispatch(f.vehicle_id, f.driver_id, 18000.0).unwrap();
        f.engine.complete(trip.id, 15500.0).unwrap();

        let err = f.engine.complete(trip.id, 15200.0).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTripState { .. }));
        assert_eq!(f.engine.vehicle(f.vehicle_id).unwrap().odometer, 15500.0);
        assert_eq!(
            f.engine.trip(trip.id).unwrap().state.end_odometer(),
            Some(15500.0)
        );
    }

    #[test]
    fn end_reading_must_exceed_start_reading() {
        let f = fleet();
        let trip = f.engine.dispatch(f.vehicle_id, f.driver_id, 100.0).unwrap();
        for reading in [15000.0, 14000.0, f64::NAN, f64::INFINITY] {
            let err = f.engine.complete(trip.id, reading).unwrap_err();
            assert!(matches!(err, DispatchError::InvalidOdometerReading { .. }));
        }
        assert_eq!(
            f.engine.trip(trip.id).unwrap().status(),
            TripStatus::Dispatched
        );
    }

    #[test]
    fn completing_unknown_trip_is_invalid_state() {
        let f = fleet();
        assert!(matches!(
            f.engine.complete(404, 1.0),
            Err(DispatchError::InvalidTripState { trip_id: 404 })
        ));
    }

    #[test]
    fn busy_vehicle_cannot_be_dispatched_twice() {
        let f = fleet();
        let roster = f.engine.roster();
        let second = roster
            .register_driver(NewDriver {
                name: "Second".to_string(),
                license_type: "CDL-A".to_string(),
                license_expiry: Utc::now() + Duration::days(365),
            })
            .unwrap();
        roster.set_driver_status(second.id, DutyStatus::OnDuty).unwrap();

        f.engine.dispatch(f.vehicle_id, f.driver_id, 10.0).unwrap();
        let err = f.engine.dispatch(f.vehicle_id, second.id, 10.0).unwrap_err();
        assert!(matches!(err, DispatchError::VehicleUnavailable { .. }));
        assert!(f.engine.driver(second.id).unwrap().is_on_duty());
    }

    #[test]
    fn trips_list_newest_first() {
        let f = fleet();
        let first = f.engine.dispatch(f.vehicle_id, f.driver_id, 10.0).unwrap();
        f.engine.complete(first.id, 15100.0).unwrap();
        let second = f.engine.dispatch(f.vehicle_id, f.driver_id, 10.0).unwrap();

        let ids: Vec<TripId> = f.engine.trips().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(second.state.start_odometer(), Some(15100.0));
    }

    #[test]
    fn completion_refuses_a_broken_pairing() {
        let f = fleet();
        let trip = f.engine.dispatch(f.vehicle_id, f.driver_id, 10.0).unwrap();
        // Put the vehicle back to AVAILABLE behind the engine's back.
        let release = VehiclePatch::release(15000.0);
        f.engine
            .store
            .transaction(|tx| Ok(tx.update_vehicle(f.vehicle_id, &release)?))
            .unwrap();

        let err = f.engine.complete(trip.id, 15100.0).unwrap_err();
        assert!(matches!(err, DispatchError::InvariantViolation(_)));
        assert_eq!(err.http_status(), 500);
        assert_eq!(
            f.engine.trip(trip.id).unwrap().status(),
            TripStatus::Dispatched
        );
        assert_eq!(
            f.engine.driver(f.driver_id).unwrap().status,
            DriverStatus::OnTrip { trip_id: trip.id }
        );
    }

    #[test]
    fn kpis_track_active_fleet() {
        let f = fleet();
        f.engine.dispatch(f.vehicle_id, f.driver_id, 10.0).unwrap();
        let kpis = f.engine.kpis().unwrap();
        assert_eq!(kpis.active_fleet, 1);
        assert_eq!(kpis.total_vehicles, 1);
        assert_eq!(kpis.utilization_rate, 100.0);
    }
}
