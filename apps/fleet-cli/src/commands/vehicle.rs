// vehicle.rs — Vehicle subcommands: add, list, show, status.

use clap::{Subcommand, ValueEnum};
use fleet_dispatch::{NewVehicle, ServiceStatus, Vehicle};

use super::{print_json, truncate, Engine};

#[derive(Subcommand)]
pub enum VehicleCommands {
    /// Register a vehicle. It starts AVAILABLE.
    Add {
        /// Display name (e.g., "Volvo FH16").
        name: String,
        /// License plate; must be unique.
        #[arg(long)]
        plate: String,
        /// Maximum cargo weight in kilograms.
        #[arg(long)]
        capacity: f64,
        /// Current odometer reading in kilometres.
        #[arg(long, default_value_t = 0.0)]
        odometer: f64,
    },
    /// List all vehicles.
    List,
    /// Show one vehicle.
    Show {
        /// Vehicle ID.
        id: i64,
    },
    /// Move a vehicle to AVAILABLE, IN_SHOP or RETIRED.
    Status {
        /// Vehicle ID.
        id: i64,
        #[arg(value_enum)]
        status: ServiceArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ServiceArg {
    Available,
    InShop,
    Retired,
}

impl From<ServiceArg> for ServiceStatus {
    fn from(arg: ServiceArg) -> Self {
        match arg {
            ServiceArg::Available => ServiceStatus::Available,
            ServiceArg::InShop => ServiceStatus::InShop,
            ServiceArg::Retired => ServiceStatus::Retired,
        }
    }
}

pub fn execute(cmd: &VehicleCommands, engine: &Engine, json: bool) -> anyhow::Result<()> {
    match cmd {
        VehicleCommands::Add {
            name,
            plate,
            capacity,
            odometer,
        } => {
            let vehicle = engine.roster().register_vehicle(NewVehicle {
                name: name.clone(),
                license_plate: plate.clone(),
                max_load_capacity: *capacity,
                odometer: *odometer,
            })?;
            if json {
                return print_json(&vehicle);
            }
            println!("Vehicle registered: {}", vehicle.id);
            print_vehicle(&vehicle);
            Ok(())
        }
        VehicleCommands::List => list_vehicles(engine, json),
        VehicleCommands::Show { id } => {
            let vehicle = engine.vehicle(*id)?;
            if json {
                return print_json(&vehicle);
            }
            println!("Vehicle {}", vehicle.id);
            print_vehicle(&vehicle);
            Ok(())
        }
        VehicleCommands::Status { id, status } => {
            let vehicle = engine
                .roster()
                .set_vehicle_status(*id, ServiceStatus::from(*status))?;
            if json {
                return print_json(&vehicle);
            }
            println!("Vehicle {} is now {}", vehicle.id, vehicle.status);
            Ok(())
        }
    }
}

fn list_vehicles(engine: &Engine, json: bool) -> anyhow::Result<()> {
    let vehicles = engine.vehicles()?;
    if json {
        return print_json(&vehicles);
    }
    if vehicles.is_empty() {
        println!("No vehicles registered.");
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:<12} {:>12} {:>12} {:<10}",
        "ID", "NAME", "PLATE", "CAPACITY", "ODOMETER", "STATUS"
    );
    println!("{}", "-".repeat(81));
    for v in &vehicles {
        println!(
            "{:<6} {:<24} {:<12} {:>12.1} {:>12.1} {:<10}",
            v.id,
            truncate(&v.name, 22),
            truncate(&v.license_plate, 12),
            v.max_load_capacity,
            v.odometer,
            v.status.to_string(),
        );
    }
    println!("\n{} vehicle(s) total.", vehicles.len());
    Ok(())
}

fn print_vehicle(v: &Vehicle) {
    println!("  Name:     {}", v.name);
    println!("  Plate:    {}", v.license_plate);
    println!("  Capacity: {} kg", v.max_load_capacity);
    println!("  Odometer: {} km", v.odometer);
    println!("  Status:   {}", v.status);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::open_engine;
    use fleet_dispatch::{DispatchError, FleetConfig};
    use tempfile::tempdir;

    #[test]
    fn show_finds_registered_vehicle_and_reports_missing_one() {
        let dir = tempdir().unwrap();
        let engine = open_engine(&FleetConfig::load(dir.path()).unwrap()).unwrap();
        let vehicle = engine
            .roster()
            .register_vehicle(NewVehicle {
                name: "Van".to_string(),
                license_plate: "VAN-1".to_string(),
                max_load_capacity: 800.0,
                odometer: 0.0,
            })
            .unwrap();

        execute(&VehicleCommands::Show { id: vehicle.id }, &engine, true).unwrap();

        let err = execute(&VehicleCommands::Show { id: 404 }, &engine, false).unwrap_err();
        let dispatch_err = err.downcast_ref::<DispatchError>().unwrap();
        assert!(matches!(dispatch_err, DispatchError::NotFound { id: 404, .. }));
        assert_eq!(dispatch_err.http_status(), 404);
    }
}
