// kpi.rs — Dashboard figures for the fleet.

use serde::{Deserialize, Serialize};

use crate::model::{Vehicle, VehicleStatus};
use crate::trip::{Trip, TripStatus};

/// Aggregate fleet figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetKpis {
    /// Vehicles currently ON_TRIP.
    pub active_fleet: usize,
    /// Vehicles currently IN_SHOP.
    pub in_shop: usize,
    pub total_vehicles: usize,
    /// `active_fleet / total_vehicles * 100`, or 0 with no vehicles.
    pub utilization_rate: f64,
    /// Total cargo weight waiting on DRAFT trips.
    pub pending_cargo: f64,
}

impl FleetKpis {
    pub fn compute(vehicles: &[Vehicle], trips: &[Trip]) -> Self {
        let active_fleet = vehicles
            .iter()
            .filter(|v| matches!(v.status, VehicleStatus::OnTrip { .. }))
            .count();
        let in_shop = vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::InShop)
            .count();
        let total_vehicles = vehicles.len();
        let utilization_rate = if total_vehicles == 0 {
            0.0
        } else {
            active_fleet as f64 / total_vehicles as f64 * 100.0
        };
        let pending_cargo = trips
            .iter()
            .filter(|t| t.status() == TripStatus::Draft)
            .map(|t| t.cargo_weight)
            .sum();

        Self {
            active_fleet,
            in_shop,
            total_vehicles,
            utilization_rate,
            pending_cargo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewVehicle;
    use crate::trip::{NewTrip, TripPatch, TripState};
    use chrono::Utc;

    fn vehicle(id: i64, status: VehicleStatus) -> Vehicle {
        let mut v = Vehicle::register(
            id,
            NewVehicle {
                name: format!("Truck {}", id),
                license_plate: format!("T-{}", id),
                max_load_capacity: 1000.0,
                odometer: 0.0,
            },
        );
        v.status = status;
        v
    }

    #[test]
    fn empty_fleet_has_zero_utilization() {
        let kpis = FleetKpis::compute(&[], &[]);
        assert_eq!(kpis.total_vehicles, 0);
        assert_eq!(kpis.utilization_rate, 0.0);
        assert_eq!(kpis.pending_cargo, 0.0);
    }

    #[test]
    fn counts_vehicles_by_status() {
        let vehicles = vec![
            vehicle(1, VehicleStatus::OnTrip { trip_id: 1 }),
            vehicle(2, VehicleStatus::InShop),
            vehicle(3, VehicleStatus::Available),
            vehicle(4, VehicleStatus::Retired),
        ];
        let kpis = FleetKpis::compute(&vehicles, &[]);
        assert_eq!(kpis.active_fleet, 1);
        assert_eq!(kpis.in_shop, 1);
        assert_eq!(kpis.total_vehicles, 4);
        assert_eq!(kpis.utilization_rate, 25.0);
    }

    #[test]
    fn pending_cargo_sums_draft_trips_only() {
        let mut draft = Trip::open(1, NewTrip::dispatched(1, 1, 300.0, 0.0, Utc::now()));
        draft.apply(&TripPatch::transition(TripState::Draft));
        let mut other_draft = Trip::open(2, NewTrip::dispatched(2, 2, 200.0, 0.0, Utc::now()));
        other_draft.apply(&TripPatch::transition(TripState::Draft));
        let dispatched = Trip::open(3, NewTrip::dispatched(3, 3, 999.0, 0.0, Utc::now()));

        let kpis = FleetKpis::compute(&[], &[draft, other_draft, dispatched]);
        assert_eq!(kpis.pending_cargo, 500.0);
    }
}
