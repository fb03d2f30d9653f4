// error.rs — Error types for the dispatch subsystem.
//
// `StoreError` is what a store backend reports; `DispatchError` is what the
// engine and roster report to their callers. Every precondition failure is
// terminal for the call that raised it and leaves the store untouched.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DriverId, EntityKind, TripId, VehicleId};

/// Errors raised by a store backend while reading or writing records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    /// The backend itself failed (I/O, constraint, lock, conflict).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors returned by `DispatchEngine` and `Roster` operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The vehicle is missing or not AVAILABLE.
    #[error("vehicle {vehicle_id} is unavailable")]
    VehicleUnavailable { vehicle_id: VehicleId },

    /// The cargo is heavier than the vehicle may carry.
    #[error("cargo weight {cargo_weight} exceeds vehicle capacity {max_load_capacity}")]
    CargoExceedsCapacity {
        cargo_weight: f64,
        max_load_capacity: f64,
    },

    /// The driver is missing or not ON_DUTY.
    #[error("driver {driver_id} is unavailable")]
    DriverUnavailable { driver_id: DriverId },

    /// The driver's license expired before the dispatch time.
    #[error("driver {driver_id} license expired at {expired_at}")]
    LicenseExpired {
        driver_id: DriverId,
        expired_at: DateTime<Utc>,
    },

    /// The trip is missing or not DISPATCHED.
    #[error("trip {trip_id} is not dispatched")]
    InvalidTripState { trip_id: TripId },

    /// The reported end odometer does not exceed the start reading.
    #[error("invalid odometer reading {end_odometer}: must exceed start reading {start_odometer}")]
    InvalidOdometerReading {
        start_odometer: f64,
        end_odometer: f64,
    },

    /// Cargo weight must be a finite number above zero.
    #[error("invalid cargo weight {0}: must be greater than zero")]
    InvalidCargoWeight(f64),

    /// A roster record failed validation.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    /// Stored vehicle/driver/trip state disagrees with itself.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The store could not run or commit the transaction.
    #[error("store transaction failed: {0}")]
    StoreTransactionFailed(String),
}

impl From<StoreError> for DispatchError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => DispatchError::NotFound { entity, id },
            StoreError::Backend(msg) => DispatchError::StoreTransactionFailed(msg),
        }
    }
}

impl DispatchError {
    /// Short, stable name of the failure kind (used in logs).
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::VehicleUnavailable { .. } => "vehicle_unavailable",
            DispatchError::CargoExceedsCapacity { .. } => "cargo_exceeds_capacity",
            DispatchError::DriverUnavailable { .. } => "driver_unavailable",
            DispatchError::LicenseExpired { .. } => "license_expired",
            DispatchError::InvalidTripState { .. } => "invalid_trip_state",
            DispatchError::InvalidOdometerReading { .. } => "invalid_odometer_reading",
            DispatchError::InvalidCargoWeight(_) => "invalid_cargo_weight",
            DispatchError::InvalidRecord(_) => "invalid_record",
            DispatchError::NotFound { .. } => "not_found",
            DispatchError::InvariantViolation(_) => "invariant_violation",
            DispatchError::StoreTransactionFailed(_) => "store_transaction_failed",
        }
    }

    /// HTTP status an API layer should answer with for this error.
    ///
    /// Rejections are client errors; a missing record is 404; anything the
    /// caller cannot fix by changing the request is 500.
    pub fn http_status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::StoreTransactionFailed(_) | DispatchError::InvariantViolation(_) => 500,
            _ => 400,
        }
    }

    /// JSON body `{ "error": <message> }` for this error.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors raised by notification sinks. Never fatal to an operation.
#[derive(Debug, Error)]
pub enum EventError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize an event.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `FleetSettings`.
    #[error("malformed config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_bad_request() {
        let errors = [
            DispatchError::VehicleUnavailable { vehicle_id: 1 },
            DispatchError::CargoExceedsCapacity {
                cargo_weight: 2.0,
                max_load_capacity: 1.0,
            },
            DispatchError::DriverUnavailable { driver_id: 1 },
            DispatchError::LicenseExpired {
                driver_id: 1,
                expired_at: Utc::now(),
            },
            DispatchError::InvalidTripState { trip_id: 1 },
            DispatchError::InvalidOdometerReading {
                start_odometer: 10.0,
                end_odometer: 5.0,
            },
            DispatchError::InvalidCargoWeight(0.0),
        ];
        for e in &errors {
            assert_eq!(e.http_status(), 400, "{}", e.kind());
        }
    }

    #[test]
    fn infrastructure_errors_map_to_server_errors() {
        let not_found = DispatchError::NotFound {
            entity: EntityKind::Trip,
            id: 9,
        };
        assert_eq!(not_found.http_status(), 404);
        assert_eq!(
            DispatchError::StoreTransactionFailed("busy".into()).http_status(),
            500
        );
    }

    #[test]
    fn store_not_found_converts_to_dispatch_not_found() {
        let e: DispatchError = StoreError::NotFound {
            entity: EntityKind::Vehicle,
            id: 3,
        }
        .into();
        assert!(matches!(
            e,
            DispatchError::NotFound {
                entity: EntityKind::Vehicle,
                id: 3
            }
        ));
        assert_eq!(e.to_string(), "vehicle 3 not found");
    }

    #[test]
    fn backend_error_becomes_transaction_failure() {
        let e: DispatchError = StoreError::Backend("database is locked".into()).into();
        assert_eq!(e.kind(), "store_transaction_failed");
        assert_eq!(
            e.to_body().error,
            "store transaction failed: database is locked"
        );
    }
}
