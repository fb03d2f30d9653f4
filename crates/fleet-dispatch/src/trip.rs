// trip.rs — Trip records and the trip lifecycle.
//
// The trip state machine:
//   Draft → Dispatched → Completed
//   Draft → Cancelled, Dispatched → Cancelled
// Completed and Cancelled are terminal.
//
// Readings live inside the variants that own them: a start odometer exists
// from dispatch on, and an end odometer exists only once completed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{DriverId, TripId, VehicleId};

/// Flat name of a trip's lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Draft,
    Dispatched,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Draft => "DRAFT",
            TripStatus::Dispatched => "DISPATCHED",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle state of a trip, with the data each state owns.
///
/// Serialized with a `status` tag alongside the trip's other fields:
/// `{"status": "COMPLETED", "start_odometer": 15000.0, "end_odometer": 15500.0, ...}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripState {
    Draft,
    Dispatched {
        start_odometer: f64,
    },
    Completed {
        start_odometer: f64,
        end_odometer: f64,
        completed_at: DateTime<Utc>,
    },
    Cancelled,
}

impl TripState {
    pub fn status(&self) -> TripStatus {
        match self {
            TripState::Draft => TripStatus::Draft,
            TripState::Dispatched { .. } => TripStatus::Dispatched,
            TripState::Completed { .. } => TripStatus::Completed,
            TripState::Cancelled => TripStatus::Cancelled,
        }
    }

    pub fn start_odometer(&self) -> Option<f64> {
        match self {
            TripState::Dispatched { start_odometer }
            | TripState::Completed { start_odometer, .. } => Some(*start_odometer),
            _ => None,
        }
    }

    pub fn end_odometer(&self) -> Option<f64> {
        match self {
            TripState::Completed { end_odometer, .. } => Some(*end_odometer),
            _ => None,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TripState::Completed { completed_at, .. } => Some(*completed_at),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripState::Completed { .. } | TripState::Cancelled)
    }

    /// Check whether moving from this state to `next` is a defined transition.
    ///
    /// Completion must keep the dispatch-time start reading and record an
    /// end reading strictly above it.
    pub fn can_transition_to(&self, next: &TripState) -> bool {
        match (self, next) {
            (TripState::Draft, TripState::Dispatched { .. })
            | (TripState::Draft, TripState::Cancelled)
            | (TripState::Dispatched { .. }, TripState::Cancelled) => true,
            (
                TripState::Dispatched { start_odometer },
                TripState::Completed {
                    start_odometer: kept,
                    end_odometer,
                    ..
                },
            ) => kept == start_odometer && end_odometer > start_odometer,
            _ => false,
        }
    }

    /// Rebuild a state from stored columns.
    pub fn from_parts(
        status: &str,
        start_odometer: Option<f64>,
        end_odometer: Option<f64>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        match (status, start_odometer, end_odometer, completed_at) {
            ("DRAFT", _, _, _) => Some(TripState::Draft),
            ("DISPATCHED", Some(start_odometer), None, _) => {
                Some(TripState::Dispatched { start_odometer })
            }
            ("COMPLETED", Some(start_odometer), Some(end_odometer), Some(completed_at)) => {
                Some(TripState::Completed {
                    start_odometer,
                    end_odometer,
                    completed_at,
                })
            }
            ("CANCELLED", _, _, _) => Some(TripState::Cancelled),
            _ => None,
        }
    }
}

/// A trip: one vehicle and one driver moving one load.
///
/// The trip references its vehicle and driver; it does not own them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub vehicle_id: VehicleId,
    pub driver_id: DriverId,
    pub cargo_weight: f64,
    #[serde(flatten)]
    pub state: TripState,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Materialize a freshly inserted trip.
    pub fn open(id: TripId, new: NewTrip) -> Self {
        Self {
            id,
            vehicle_id: new.vehicle_id,
            driver_id: new.driver_id,
            cargo_weight: new.cargo_weight,
            state: new.state,
            created_at: new.created_at,
        }
    }

    pub fn status(&self) -> TripStatus {
        self.state.status()
    }

    pub fn apply(&mut self, patch: &TripPatch) {
        self.state = patch.state;
    }
}

/// Fields of a trip about to be inserted. Only the engine creates these.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    vehicle_id: VehicleId,
    driver_id: DriverId,
    cargo_weight: f64,
    state: TripState,
    created_at: DateTime<Utc>,
}

impl NewTrip {
    pub(crate) fn dispatched(
        vehicle_id: VehicleId,
        driver_id: DriverId,
        cargo_weight: f64,
        start_odometer: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            vehicle_id,
            driver_id,
            cargo_weight,
            state: TripState::Dispatched { start_odometer },
            created_at,
        }
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    pub fn driver_id(&self) -> DriverId {
        self.driver_id
    }

    pub fn cargo_weight(&self) -> f64 {
        self.cargo_weight
    }

    pub fn state(&self) -> &TripState {
        &self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A lifecycle transition for a stored trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPatch {
    state: TripState,
}

impl TripPatch {
    pub(crate) fn transition(state: TripState) -> Self {
        Self { state }
    }
}
