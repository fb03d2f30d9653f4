//! # fleet-dispatch
//!
//! Dispatch state machine for a small vehicle fleet.
//!
//! A [`Trip`] pairs one AVAILABLE [`Vehicle`] with one ON_DUTY [`Driver`].
//! The [`DispatchEngine`] is the only component that puts a vehicle and a
//! driver on a trip and the only one that releases them, and it does both
//! inside a single [`Store`] transaction so that vehicle, driver and trip
//! always agree:
//!
//! `trip DISPATCHED ⇔ vehicle ON_TRIP{trip} ⇔ driver ON_TRIP{trip}`
//!
//! ## Key components
//!
//! - [`DispatchEngine`] — `dispatch` and `complete`, plus reads and KPIs
//! - [`Store`] / [`StoreTx`] — the transactional persistence contract
//! - [`MemoryStore`] — in-process store for tests and demos
//! - [`Roster`] — vehicle/driver registration and non-trip status changes
//! - [`FleetEvent`] / [`EventDispatcher`] — lifecycle notifications
//! - [`FleetConfig`] — `.fleet/` layout and `config.toml` settings
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::{Duration, Utc};
//! use fleet_dispatch::{DispatchEngine, DutyStatus, MemoryStore, NewDriver, NewVehicle};
//!
//! let engine = DispatchEngine::new(Arc::new(MemoryStore::new()));
//! let roster = engine.roster();
//! let truck = roster
//!     .register_vehicle(NewVehicle {
//!         name: "Volvo FH16".into(),
//!         license_plate: "V-1001".into(),
//!         max_load_capacity: 20000.0,
//!         odometer: 15000.0,
//!     })
//!     .unwrap();
//! let driver = roster
//!     .register_driver(NewDriver {
//!         name: "John Doe".into(),
//!         license_type: "CDL-A".into(),
//!         license_expiry: Utc::now() + Duration::days(365),
//!     })
//!     .unwrap();
//! roster.set_driver_status(driver.id, DutyStatus::OnDuty).unwrap();
//!
//! let trip = engine.dispatch(truck.id, driver.id, 18000.0).unwrap();
//! let trip = engine.complete(trip.id, 15500.0).unwrap();
//! assert_eq!(trip.state.end_odometer(), Some(15500.0));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod kpi;
pub mod memory;
pub mod model;
pub mod roster;
pub mod store;
pub mod trip;

pub use config::{EventSettings, FleetConfig, FleetSettings, StoreSettings};
pub use engine::DispatchEngine;
pub use error::{ConfigError, DispatchError, ErrorBody, EventError, StoreError};
pub use events::{EventDispatcher, FleetEvent, LogSink, NotificationSink};
pub use kpi::FleetKpis;
pub use memory::MemoryStore;
pub use model::{
    Driver, DriverId, DriverPatch, DriverStatus, DutyStatus, EntityKind, NewDriver, NewVehicle,
    ServiceStatus, TripId, Vehicle, VehicleId, VehiclePatch, VehicleStatus,
};
pub use roster::Roster;
pub use store::{Store, StoreTx};
pub use trip::{NewTrip, Trip, TripPatch, TripState, TripStatus};
