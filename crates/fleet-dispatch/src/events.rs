// events.rs — Fleet lifecycle events and notification dispatch.
//
// The engine and roster emit an event after each committed write. Sinks
// (a JSONL log file today) subscribe through `NotificationSink`. A failing
// sink is logged and skipped; it never undoes or fails the operation that
// produced the event.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EventError;
use crate::model::{Driver, DriverId, TripId, Vehicle, VehicleId};
use crate::trip::Trip;

/// Events emitted at fleet lifecycle points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum FleetEvent {
    VehicleRegistered {
        event_id: Uuid,
        vehicle_id: VehicleId,
        license_plate: String,
        timestamp: DateTime<Utc>,
    },

    DriverRegistered {
        event_id: Uuid,
        driver_id: DriverId,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// A vehicle and driver were paired on a new trip.
    TripDispatched {
        event_id: Uuid,
        trip_id: TripId,
        vehicle_id: VehicleId,
        driver_id: DriverId,
        cargo_weight: f64,
        start_odometer: f64,
        timestamp: DateTime<Utc>,
    },

    /// A trip closed and released its vehicle and driver.
    TripCompleted {
        event_id: Uuid,
        trip_id: TripId,
        vehicle_id: VehicleId,
        driver_id: DriverId,
        distance: f64,
        end_odometer: f64,
        timestamp: DateTime<Utc>,
    },

    VehicleStatusChanged {
        event_id: Uuid,
        vehicle_id: VehicleId,
        from_status: String,
        to_status: String,
        timestamp: DateTime<Utc>,
    },

    DriverStatusChanged {
        event_id: Uuid,
        driver_id: DriverId,
        from_status: String,
        to_status: String,
        timestamp: DateTime<Utc>,
    },
}

impl FleetEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &str {
        match self {
            FleetEvent::VehicleRegistered { .. } => "vehicle_registered",
            FleetEvent::DriverRegistered { .. } => "driver_registered",
            FleetEvent::TripDispatched { .. } => "trip_dispatched",
            FleetEvent::TripCompleted { .. } => "trip_completed",
            FleetEvent::VehicleStatusChanged { .. } => "vehicle_status_changed",
            FleetEvent::DriverStatusChanged { .. } => "driver_status_changed",
        }
    }

    pub fn vehicle_registered(vehicle: &Vehicle) -> Self {
        FleetEvent::VehicleRegistered {
            event_id: Uuid::new_v4(),
            vehicle_id: vehicle.id,
            license_plate: vehicle.license_plate.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn driver_registered(driver: &Driver) -> Self {
        FleetEvent::DriverRegistered {
            event_id: Uuid::new_v4(),
            driver_id: driver.id,
            name: driver.name.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn trip_dispatched(trip: &Trip) -> Self {
        FleetEvent::TripDispatched {
            event_id: Uuid::new_v4(),
            trip_id: trip.id,
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            cargo_weight: trip.cargo_weight,
            start_odometer: trip.state.start_odometer().unwrap_or_default(),
            timestamp: trip.created_at,
        }
    }

    pub fn trip_completed(trip: &Trip) -> Self {
        let start = trip.state.start_odometer().unwrap_or_default();
        let end = trip.state.end_odometer().unwrap_or(start);
        FleetEvent::TripCompleted {
            event_id: Uuid::new_v4(),
            trip_id: trip.id,
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            distance: end - start,
            end_odometer: end,
            timestamp: trip.state.completed_at().unwrap_or_else(Utc::now),
        }
    }

    pub fn vehicle_status_changed(vehicle_id: VehicleId, from: String, to: String) -> Self {
        FleetEvent::VehicleStatusChanged {
            event_id: Uuid::new_v4(),
            vehicle_id,
            from_status: from,
            to_status: to,
            timestamp: Utc::now(),
        }
    }

    pub fn driver_status_changed(driver_id: DriverId, from: String, to: String) -> Self {
        FleetEvent::DriverStatusChanged {
            event_id: Uuid::new_v4(),
            driver_id,
            from_status: from,
            to_status: to,
            timestamp: Utc::now(),
        }
    }
}

/// Receives fleet events.
pub trait NotificationSink: Send + Sync {
    /// Handle an event. Errors are logged but don't stop the system.
    fn send(&self, event: &FleetEvent) -> Result<(), EventError>;
}

/// Appends events as JSON lines to a file.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &FleetEvent) -> Result<(), EventError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| EventError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| EventError::Io {
                path: self.path.clone(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| EventError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(())
    }
}

/// Fans events out to every registered sink.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    /// A dispatcher with no sinks drops every event.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn dispatch(&self, event: &FleetEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!(event_type = event.event_type(), "notification sink error: {}", e);
            }
        }
    }
}
