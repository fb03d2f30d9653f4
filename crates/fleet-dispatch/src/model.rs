// model.rs — Vehicle and Driver records and the patches that change them.
//
// A vehicle or driver that is out on a trip records *which* trip holds it
// (`OnTrip { trip_id }`), so the busy pairing can be checked against the
// trip itself instead of trusting three unrelated status columns.
//
// Patches that move a record into or out of ON_TRIP can only be built inside
// this crate. Store backends apply them through `Vehicle::apply` /
// `Driver::apply` and never interpret them on their own.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type VehicleId = i64;
pub type DriverId = i64;
pub type TripId = i64;

/// Which kind of record an id refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Vehicle,
    Driver,
    Trip,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Vehicle => write!(f, "vehicle"),
            EntityKind::Driver => write!(f, "driver"),
            EntityKind::Trip => write!(f, "trip"),
        }
    }
}

// ── Vehicle ──────────────────────────────────────────────────────

/// Operational status of a vehicle.
///
/// Serialized with a `status` tag, e.g. `{"status": "ON_TRIP", "trip_id": 4}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    OnTrip { trip_id: TripId },
    InShop,
    Retired,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Available => write!(f, "AVAILABLE"),
            VehicleStatus::OnTrip { .. } => write!(f, "ON_TRIP"),
            VehicleStatus::InShop => write!(f, "IN_SHOP"),
            VehicleStatus::Retired => write!(f, "RETIRED"),
        }
    }
}

impl VehicleStatus {
    /// The trip holding this vehicle, if any.
    pub fn trip_id(&self) -> Option<TripId> {
        match self {
            VehicleStatus::OnTrip { trip_id } => Some(*trip_id),
            _ => None,
        }
    }

    /// Rebuild a status from its stored name and trip column.
    ///
    /// Returns `None` for unknown names and for ON_TRIP without a trip id.
    pub fn from_parts(name: &str, trip_id: Option<TripId>) -> Option<Self> {
        match (name, trip_id) {
            ("AVAILABLE", _) => Some(VehicleStatus::Available),
            ("ON_TRIP", Some(trip_id)) => Some(VehicleStatus::OnTrip { trip_id }),
            ("IN_SHOP", _) => Some(VehicleStatus::InShop),
            ("RETIRED", _) => Some(VehicleStatus::Retired),
            _ => None,
        }
    }
}

/// Vehicle states an operator may set by hand. ON_TRIP is not among them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Available,
    InShop,
    Retired,
}

impl From<ServiceStatus> for VehicleStatus {
    fn from(s: ServiceStatus) -> Self {
        match s {
            ServiceStatus::Available => VehicleStatus::Available,
            ServiceStatus::InShop => VehicleStatus::InShop,
            ServiceStatus::Retired => VehicleStatus::Retired,
        }
    }
}

/// A fleet vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub license_plate: String,
    /// Maximum cargo weight in kilograms.
    pub max_load_capacity: f64,
    /// Only ever increases, and only when a trip completes.
    pub odometer: f64,
    #[serde(flatten)]
    pub status: VehicleStatus,
}

/// Fields for registering a new vehicle. New vehicles start AVAILABLE.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVehicle {
    pub name: String,
    pub license_plate: String,
    pub max_load_capacity: f64,
    #[serde(default)]
    pub odometer: f64,
}

impl Vehicle {
    /// Materialize a freshly inserted vehicle.
    pub fn register(id: VehicleId, new: NewVehicle) -> Self {
        Self {
            id,
            name: new.name,
            license_plate: new.license_plate,
            max_load_capacity: new.max_load_capacity,
            odometer: new.odometer,
            status: VehicleStatus::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    /// Apply a patch in place.
    pub fn apply(&mut self, patch: &VehiclePatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(odometer) = patch.odometer {
            self.odometer = odometer;
        }
    }
}

/// A partial update to a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePatch {
    status: Option<VehicleStatus>,
    odometer: Option<f64>,
}

impl VehiclePatch {
    /// Hand the vehicle to a trip.
    pub(crate) fn assign(trip_id: TripId) -> Self {
        Self {
            status: Some(VehicleStatus::OnTrip { trip_id }),
            odometer: None,
        }
    }

    /// Return the vehicle from a trip with its final odometer reading.
    pub(crate) fn release(end_odometer: f64) -> Self {
        Self {
            status: Some(VehicleStatus::Available),
            odometer: Some(end_odometer),
        }
    }

    pub(crate) fn service(status: ServiceStatus) -> Self {
        Self {
            status: Some(status.into()),
            odometer: None,
        }
    }
}

// ── Driver ───────────────────────────────────────────────────────

/// Duty status of a driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    OnDuty,
    OffDuty,
    Suspended,
    OnTrip { trip_id: TripId },
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverStatus::OnDuty => write!(f, "ON_DUTY"),
            DriverStatus::OffDuty => write!(f, "OFF_DUTY"),
            DriverStatus::Suspended => write!(f, "SUSPENDED"),
            DriverStatus::OnTrip { .. } => write!(f, "ON_TRIP"),
        }
    }
}

impl DriverStatus {
    pub fn trip_id(&self) -> Option<TripId> {
        match self {
            DriverStatus::OnTrip { trip_id } => Some(*trip_id),
            _ => None,
        }
    }

    pub fn from_parts(name: &str, trip_id: Option<TripId>) -> Option<Self> {
        match (name, trip_id) {
            ("ON_DUTY", _) => Some(DriverStatus::OnDuty),
            ("OFF_DUTY", _) => Some(DriverStatus::OffDuty),
            ("SUSPENDED", _) => Some(DriverStatus::Suspended),
            ("ON_TRIP", Some(trip_id)) => Some(DriverStatus::OnTrip { trip_id }),
            _ => None,
        }
    }
}

/// Driver states an operator may set by hand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyStatus {
    OnDuty,
    OffDuty,
    Suspended,
}

impl From<DutyStatus> for DriverStatus {
    fn from(s: DutyStatus) -> Self {
        match s {
            DutyStatus::OnDuty => DriverStatus::OnDuty,
            DutyStatus::OffDuty => DriverStatus::OffDuty,
            DutyStatus::Suspended => DriverStatus::Suspended,
        }
    }
}

/// A licensed driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub license_type: String,
    pub license_expiry: DateTime<Utc>,
    pub safety_score: f64,
    #[serde(flatten)]
    pub status: DriverStatus,
}

/// Fields for registering a new driver. New drivers start OFF_DUTY.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDriver {
    pub name: String,
    pub license_type: String,
    pub license_expiry: DateTime<Utc>,
}

/// Safety score every driver starts with.
pub const INITIAL_SAFETY_SCORE: f64 = 100.0;

impl Driver {
    pub fn register(id: DriverId, new: NewDriver) -> Self {
        Self {
            id,
            name: new.name,
            license_type: new.license_type,
            license_expiry: new.license_expiry,
            safety_score: INITIAL_SAFETY_SCORE,
            status: DriverStatus::OffDuty,
        }
    }

    pub fn is_on_duty(&self) -> bool {
        self.status == DriverStatus::OnDuty
    }

    /// A license is valid through its expiry instant.
    pub fn license_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.license_expiry >= at
    }

    pub fn apply(&mut self, patch: &DriverPatch) {
        self.status = patch.status;
    }
}

/// A status change for a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverPatch {
    status: DriverStatus,
}

impl DriverPatch {
    pub(crate) fn assign(trip_id: TripId) -> Self {
        Self {
            status: DriverStatus::OnTrip { trip_id },
        }
    }

    /// Completion always returns the driver to ON_DUTY.
    pub(crate) fn release() -> Self {
        Self {
            status: DriverStatus::OnDuty,
        }
    }

    pub(crate) fn duty(status: DutyStatus) -> Self {
        Self {
            status: status.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn truck() -> Vehicle {
        Vehicle::register(
            1,
            NewVehicle {
                name: "Volvo FH16".to_string(),
                license_plate: "V-1001".to_string(),
                max_load_capacity: 20000.0,
                odometer: 15000.0,
            },
        )
    }

    #[test]
    fn registered_vehicle_is_available() {
        let v = truck();
        assert!(v.is_available());
        assert_eq!(v.odometer, 15000.0);
    }

    #[test]
    fn registered_driver_is_off_duty_with_full_score() {
        let d = Driver::register(
            7,
            NewDriver {
                name: "John Doe".to_string(),
                license_type: "CDL-A".to_string(),
                license_expiry: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            },
        );
        assert_eq!(d.status, DriverStatus::OffDuty);
        assert_eq!(d.safety_score, INITIAL_SAFETY_SCORE);
    }

    #[test]
    fn assign_then_release_vehicle() {
        let mut v = truck();
        v.apply(&VehiclePatch::assign(3));
        assert_eq!(v.status, VehicleStatus::OnTrip { trip_id: 3 });
        assert_eq!(v.odometer, 15000.0);

        v.apply(&VehiclePatch::release(15500.0));
        assert!(v.is_available());
        assert_eq!(v.odometer, 15500.0);
    }

    #[test]
    fn vehicle_json_uses_flat_status_tag() {
        let mut v = truck();
        v.apply(&VehiclePatch::assign(9));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["status"], "ON_TRIP");
        assert_eq!(json["trip_id"], 9);

        let restored: Vehicle = serde_json::from_value(json).unwrap();
        assert_eq!(restored.status, VehicleStatus::OnTrip { trip_id: 9 });
    }

    #[test]
    fn status_from_parts_requires_trip_for_on_trip() {
        assert_eq!(VehicleStatus::from_parts("ON_TRIP", None), None);
        assert_eq!(
            VehicleStatus::from_parts("ON_TRIP", Some(2)),
            Some(VehicleStatus::OnTrip { trip_id: 2 })
        );
        assert_eq!(
            DriverStatus::from_parts("SUSPENDED", None),
            Some(DriverStatus::Suspended)
        );
        assert_eq!(DriverStatus::from_parts("ASLEEP", None), None);
    }

    #[test]
    fn license_valid_through_expiry_instant() {
        let now = Utc::now();
        let mut d = Driver::register(
            1,
            NewDriver {
                name: "A".to_string(),
                license_type: "CDL-B".to_string(),
                license_expiry: now,
            },
        );
        assert!(d.license_valid_at(now));
        d.license_expiry = now - Duration::seconds(1);
        assert!(!d.license_valid_at(now));
    }

    #[test]
    fn status_display_names() {
        assert_eq!(VehicleStatus::InShop.to_string(), "IN_SHOP");
        assert_eq!(DriverStatus::OnTrip { trip_id: 1 }.to_string(), "ON_TRIP");
        assert_eq!(EntityKind::Trip.to_string(), "trip");
    }
}
