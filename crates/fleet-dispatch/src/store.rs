// store.rs — The transactional store contract.
//
// The engine never holds a data-store handle of its own: it is given a
// `Store` at construction and does all of its reads and writes inside
// `Store::transaction`. Backends must apply every read and write made inside
// one transaction atomically and in isolation equivalent to serializable
// execution: either all writes commit or none do, and a second transaction
// never observes a half-applied first one.
//
// Two backends ship with the workspace: `MemoryStore` (this crate) and
// `SqliteStore` (fleet-store-sqlite).

use crate::error::{DispatchError, StoreError};
use crate::model::{
    Driver, DriverId, DriverPatch, NewDriver, NewVehicle, TripId, Vehicle, VehicleId,
    VehiclePatch,
};
use crate::trip::{NewTrip, Trip, TripPatch};

/// Reads and writes available inside a transaction.
///
/// Updates take a patch built by this crate and return the record as it
/// reads after the patch. Every id-taking method fails with
/// `StoreError::NotFound` when the record is absent.
pub trait StoreTx {
    fn get_vehicle(&mut self, id: VehicleId) -> Result<Vehicle, StoreError>;
    fn get_driver(&mut self, id: DriverId) -> Result<Driver, StoreError>;
    fn get_trip(&mut self, id: TripId) -> Result<Trip, StoreError>;

    /// All vehicles, by ascending id.
    fn list_vehicles(&mut self) -> Result<Vec<Vehicle>, StoreError>;
    /// All drivers, by ascending id.
    fn list_drivers(&mut self) -> Result<Vec<Driver>, StoreError>;
    /// All trips, by ascending id.
    fn list_trips(&mut self) -> Result<Vec<Trip>, StoreError>;

    /// Insert a vehicle; it starts AVAILABLE.
    fn insert_vehicle(&mut self, new: NewVehicle) -> Result<Vehicle, StoreError>;
    /// Insert a driver; they start OFF_DUTY with the initial safety score.
    fn insert_driver(&mut self, new: NewDriver) -> Result<Driver, StoreError>;
    fn insert_trip(&mut self, new: NewTrip) -> Result<Trip, StoreError>;

    fn update_vehicle(&mut self, id: VehicleId, patch: &VehiclePatch)
        -> Result<Vehicle, StoreError>;
    fn update_driver(&mut self, id: DriverId, patch: &DriverPatch) -> Result<Driver, StoreError>;
    fn update_trip(&mut self, id: TripId, patch: &TripPatch) -> Result<Trip, StoreError>;
}

/// A transactional record store.
///
/// `transaction` runs `f` against a `StoreTx` and commits iff `f` returns
/// `Ok`. An `Err` from `f` (or a backend failure) discards every write made
/// inside it. Backend failures surface as
/// `DispatchError::StoreTransactionFailed`.
pub trait Store: Send + Sync {
    fn transaction<T, F>(&self, f: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, DispatchError>;
}
