// store.rs — SQLite implementation of the fleet-dispatch store contract.
//
// Vehicles, drivers and trips live in three tables. Status enums are stored
// as their SCREAMING_SNAKE_CASE name plus the columns the variant carries
// (`trip_id` for ON_TRIP, odometer readings and completion time for trips),
// and are rebuilt with the `from_parts` constructors on the way out. A row
// that cannot be rebuilt is reported as a backend error, never skipped.
//
// Updates read the current row, apply the patch through the model's own
// `apply`, and write the full status back.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use fleet_dispatch::{
    DispatchError, Driver, DriverId, DriverPatch, DriverStatus, EntityKind, NewDriver, NewTrip,
    NewVehicle, Store, StoreError, StoreTx, Trip, TripId, TripPatch, TripState, Vehicle,
    VehicleId, VehiclePatch, VehicleStatus,
};

use crate::error::SqliteStoreError;

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS vehicles (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT    NOT NULL,
    license_plate     TEXT    NOT NULL UNIQUE,
    max_load_capacity REAL    NOT NULL CHECK (max_load_capacity > 0),
    odometer          REAL    NOT NULL DEFAULT 0,
    status            TEXT    NOT NULL DEFAULT 'AVAILABLE',
    trip_id           INTEGER
);

CREATE TABLE IF NOT EXISTS drivers (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT    NOT NULL,
    license_type   TEXT    NOT NULL,
    license_expiry TEXT    NOT NULL,
    safety_score   REAL    NOT NULL DEFAULT 100,
    status         TEXT    NOT NULL DEFAULT 'OFF_DUTY',
    trip_id        INTEGER
);

CREATE TABLE IF NOT EXISTS trips (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    vehicle_id     INTEGER NOT NULL REFERENCES vehicles(id),
    driver_id      INTEGER NOT NULL REFERENCES drivers(id),
    cargo_weight   REAL    NOT NULL,
    status         TEXT    NOT NULL,
    start_odometer REAL,
    end_odometer   REAL,
    completed_at   TEXT,
    created_at     TEXT    NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS trips_dispatched_vehicle
    ON trips (vehicle_id) WHERE status = 'DISPATCHED';
CREATE UNIQUE INDEX IF NOT EXISTS trips_dispatched_driver
    ON trips (driver_id) WHERE status = 'DISPATCHED';
"#;

/// A `Store` over one SQLite connection.
///
/// The connection sits behind a mutex, so transactions from threads sharing
/// this value run one at a time. Separate `SqliteStore`s on the same file
/// are serialized by SQLite's write lock, waiting up to the busy timeout.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SqliteStoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path).map_err(|source| SqliteStoreError::Open {
            path: path.clone(),
            source,
        })?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// A private database that disappears with this value.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Store for SqliteStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, DispatchError>,
    {
        let mut conn = self.conn.lock().map_err(|_| {
            DispatchError::StoreTransactionFailed("sqlite connection lock poisoned".to_string())
        })?;

        let txn = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| DispatchError::from(backend(e)))?;

        let result = f(&mut SqliteTx { conn: &txn });

        match result {
            Ok(value) => {
                txn.commit().map_err(|e| DispatchError::from(backend(e)))?;
                tracing::debug!("sqlite transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback() {
                    tracing::warn!(error = %rollback, "sqlite rollback failed");
                }
                tracing::debug!(error = %e, "sqlite transaction rolled back");
                Err(e)
            }
        }
    }
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn corrupt(entity: EntityKind, id: i64, status: &str) -> StoreError {
    StoreError::Backend(format!(
        "{} {} has unreadable status '{}'",
        entity, id, status
    ))
}

// ── Row shapes ───────────────────────────────────────────────────

struct VehicleRow {
    id: VehicleId,
    name: String,
    license_plate: String,
    max_load_capacity: f64,
    odometer: f64,
    status: String,
    trip_id: Option<TripId>,
}

impl VehicleRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            license_plate: row.get("license_plate")?,
            max_load_capacity: row.get("max_load_capacity")?,
            odometer: row.get("odometer")?,
            status: row.get("status")?,
            trip_id: row.get("trip_id")?,
        })
    }

    fn into_vehicle(self) -> Result<Vehicle, StoreError> {
        let status = VehicleStatus::from_parts(&self.status, self.trip_id)
            .ok_or_else(|| corrupt(EntityKind::Vehicle, self.id, &self.status))?;
        Ok(Vehicle {
            id: self.id,
            name: self.name,
            license_plate: self.license_plate,
            max_load_capacity: self.max_load_capacity,
            odometer: self.odometer,
            status,
        })
    }
}

struct DriverRow {
    id: DriverId,
    name: String,
    license_type: String,
    license_expiry: DateTime<Utc>,
    safety_score: f64,
    status: String,
    trip_id: Option<TripId>,
}

impl DriverRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            license_type: row.get("license_type")?,
            license_expiry: row.get("license_expiry")?,
            safety_score: row.get("safety_score")?,
            status: row.get("status")?,
            trip_id: row.get("trip_id")?,
        })
    }

    fn into_driver(self) -> Result<Driver, StoreError> {
        let status = DriverStatus::from_parts(&self.status, self.trip_id)
            .ok_or_else(|| corrupt(EntityKind::Driver, self.id, &self.status))?;
        Ok(Driver {
            id: self.id,
            name: self.name,
            license_type: self.license_type,
            license_expiry: self.license_expiry,
            safety_score: self.safety_score,
            status,
        })
    }
}

struct TripRow {
    id: TripId,
    vehicle_id: VehicleId,
    driver_id: DriverId,
    cargo_weight: f64,
    status: String,
    start_odometer: Option<f64>,
    end_odometer: Option<f64>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TripRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            vehicle_id: row.get("vehicle_id")?,
            driver_id: row.get("driver_id")?,
            cargo_weight: row.get("cargo_weight")?,
            status: row.get("status")?,
            start_odometer: row.get("start_odometer")?,
            end_odometer: row.get("end_odometer")?,
            completed_at: row.get("completed_at")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_trip(self) -> Result<Trip, StoreError> {
        let state = TripState::from_parts(
            &self.status,
            self.start_odometer,
            self.end_odometer,
            self.completed_at,
        )
        .ok_or_else(|| corrupt(EntityKind::Trip, self.id, &self.status))?;
        Ok(Trip {
            id: self.id,
            vehicle_id: self.vehicle_id,
            driver_id: self.driver_id,
            cargo_weight: self.cargo_weight,
            state,
            created_at: self.created_at,
        })
    }
}

// ── Transaction handle ───────────────────────────────────────────

struct SqliteTx<'a> {
    conn: &'a Connection,
}

impl StoreTx for SqliteTx<'_> {
    fn get_vehicle(&mut self, id: VehicleId) -> Result<Vehicle, StoreError> {
        self.conn
            .query_row(
                "SELECT * FROM vehicles WHERE id = ?1",
                params![id],
                VehicleRow::read,
            )
            .optional()
            .map_err(backend)?
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Vehicle,
                id,
            })?
            .into_vehicle()
    }

    fn get_driver(&mut self, id: DriverId) -> Result<Driver, StoreError> {
        self.conn
            .query_row(
                "SELECT * FROM drivers WHERE id = ?1",
                params![id],
                DriverRow::read,
            )
            .optional()
            .map_err(backend)?
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Driver,
                id,
            })?
            .into_driver()
    }

    fn get_trip(&mut self, id: TripId) -> Result<Trip, StoreError> {
        self.conn
            .query_row("SELECT * FROM trips WHERE id = ?1", params![id], TripRow::read)
            .optional()
            .map_err(backend)?
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Trip,
                id,
            })?
            .into_trip()
    }

    fn list_vehicles(&mut self) -> Result<Vec<Vehicle>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM vehicles ORDER BY id")
            .map_err(backend)?;
        let rows = stmt.query_map([], VehicleRow::read).map_err(backend)?;
        let vehicles = rows
            .map(|row| row.map_err(backend).and_then(VehicleRow::into_vehicle))
            .collect();
        vehicles
    }

    fn list_drivers(&mut self) -> Result<Vec<Driver>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM drivers ORDER BY id")
            .map_err(backend)?;
        let rows = stmt.query_map([], DriverRow::read).map_err(backend)?;
        let drivers = rows
            .map(|row| row.map_err(backend).and_then(DriverRow::into_driver))
            .collect();
        drivers
    }

    fn list_trips(&mut self) -> Result<Vec<Trip>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM trips ORDER BY id")
            .map_err(backend)?;
        let rows = stmt.query_map([], TripRow::read).map_err(backend)?;
        let trips = rows
            .map(|row| row.map_err(backend).and_then(TripRow::into_trip))
            .collect();
        trips
    }

    fn insert_vehicle(&mut self, new: NewVehicle) -> Result<Vehicle, StoreError> {
        self.conn
            .execute(
                "INSERT INTO vehicles (name, license_plate, max_load_capacity, odometer)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    new.name,
                    new.license_plate,
                    new.max_load_capacity,
                    new.odometer
                ],
            )
            .map_err(backend)?;
        let id = self.conn.last_insert_rowid();
        self.get_vehicle(id)
    }

    fn insert_driver(&mut self, new: NewDriver) -> Result<Driver, StoreError> {
        self.conn
            .execute(
                "INSERT INTO drivers (name, license_type, license_expiry) VALUES (?1, ?2, ?3)",
                params![new.name, new.license_type, new.license_expiry],
            )
            .map_err(backend)?;
        let id = self.conn.last_insert_rowid();
        self.get_driver(id)
    }

    fn insert_trip(&mut self, new: NewTrip) -> Result<Trip, StoreError> {
        let state = new.state();
        self.conn
            .execute(
                "INSERT INTO trips (vehicle_id, driver_id, cargo_weight, status,
                                    start_odometer, end_odometer, completed_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    new.vehicle_id(),
                    new.driver_id(),
                    new.cargo_weight(),
                    state.status().as_str(),
                    state.start_odometer(),
                    state.end_odometer(),
                    state.completed_at(),
                    new.created_at(),
                ],
            )
            .map_err(backend)?;
        let id = self.conn.last_insert_rowid();
        self.get_trip(id)
    }

    fn update_vehicle(
        &mut self,
        id: VehicleId,
        patch: &VehiclePatch,
    ) -> Result<Vehicle, StoreError> {
        let mut vehicle = self.get_vehicle(id)?;
        vehicle.apply(patch);
        self.conn
            .execute(
                "UPDATE vehicles SET odometer = ?1, status = ?2, trip_id = ?3 WHERE id = ?4",
                params![
                    vehicle.odometer,
                    vehicle.status.to_string(),
                    vehicle.status.trip_id(),
                    id
                ],
            )
            .map_err(backend)?;
        Ok(vehicle)
    }

    fn update_driver(&mut self, id: DriverId, patch: &DriverPatch) -> Result<Driver, StoreError> {
        let mut driver = self.get_driver(id)?;
        driver.apply(patch);
        self.conn
            .execute(
                "UPDATE drivers SET status = ?1, trip_id = ?2 WHERE id = ?3",
                params![driver.status.to_string(), driver.status.trip_id(), id],
            )
            .map_err(backend)?;
        Ok(driver)
    }

    fn update_trip(&mut self, id: TripId, patch: &TripPatch) -> Result<Trip, StoreError> {
        let mut trip = self.get_trip(id)?;
        trip.apply(patch);
        self.conn
            .execute(
                "UPDATE trips SET status = ?1, start_odometer = ?2, end_odometer = ?3,
                                  completed_at = ?4
                 WHERE id = ?5",
                params![
                    trip.status().as_str(),
                    trip.state.start_odometer(),
                    trip.state.end_odometer(),
                    trip.state.completed_at(),
                    id
                ],
            )
            .map_err(backend)?;
        Ok(trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn truck(plate: &str) -> NewVehicle {
        NewVehicle {
            name: "Volvo FH16".to_string(),
            license_plate: plate.to_string(),
            max_load_capacity: 20000.0,
            odometer: 15000.0,
        }
    }

    #[test]
    fn inserted_records_get_schema_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        let expiry = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        let (vehicle, driver) = store
            .transaction(|tx| {
                let v = tx.insert_vehicle(truck("V-1001"))?;
                let d = tx.insert_driver(NewDriver {
                    name: "John Doe".to_string(),
                    license_type: "CDL-A".to_string(),
                    license_expiry: expiry,
                })?;
                Ok((v, d))
            })
            .unwrap();

        assert_eq!(vehicle.id, 1);
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(vehicle.odometer, 15000.0);
        assert_eq!(driver.status, DriverStatus::OffDuty);
        assert_eq!(driver.safety_score, 100.0);
        assert_eq!(driver.license_expiry, expiry);
        assert!(store.path().is_none());
    }

    #[test]
    fn error_from_closure_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result: Result<(), DispatchError> = store.transaction(|tx| {
            tx.insert_vehicle(truck("V-1"))?;
            Err(DispatchError::InvalidRecord("abort".to_string()))
        });
        assert!(matches!(result, Err(DispatchError::InvalidRecord(_))));

        let vehicles = store.transaction(|tx| Ok(tx.list_vehicles()?)).unwrap();
        assert!(vehicles.is_empty());
    }

    #[test]
    fn missing_rows_are_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.transaction(|tx| Ok(tx.get_trip(42)?)).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::NotFound {
                entity: EntityKind::Trip,
                id: 42
            }
        ));
    }

    #[test]
    fn duplicate_plate_is_a_backend_failure() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .transaction(|tx| Ok(tx.insert_vehicle(truck("V-1"))?))
            .unwrap();
        let err = store
            .transaction(|tx| Ok(tx.insert_vehicle(truck("V-1"))?))
            .unwrap_err();
        assert!(matches!(err, DispatchError::StoreTransactionFailed(_)));
    }

    #[test]
    fn unreadable_status_is_reported_not_skipped() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .transaction(|tx| Ok(tx.insert_vehicle(truck("V-1"))?))
            .unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute("UPDATE vehicles SET status = 'ON_TRIP', trip_id = NULL", [])
                .unwrap();
        }

        let err = store.transaction(|tx| Ok(tx.list_vehicles()?)).unwrap_err();
        assert!(matches!(err, DispatchError::StoreTransactionFailed(_)));
    }
}
