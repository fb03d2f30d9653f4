// trip.rs — Trip subcommands: dispatch, complete, list.

use clap::{Subcommand, ValueEnum};
use fleet_dispatch::{Trip, TripStatus};

use super::{print_json, Engine};

#[derive(Subcommand)]
pub enum TripCommands {
    /// Put an AVAILABLE vehicle and an ON_DUTY driver on a new trip.
    Dispatch {
        /// Vehicle ID.
        #[arg(long)]
        vehicle: i64,
        /// Driver ID.
        #[arg(long)]
        driver: i64,
        /// Cargo weight in kilograms.
        #[arg(long)]
        cargo: f64,
    },
    /// Complete a DISPATCHED trip and release its vehicle and driver.
    Complete {
        /// Trip ID.
        id: i64,
        /// Odometer reading at the end of the trip.
        #[arg(long)]
        odometer: f64,
    },
    /// List trips, newest first.
    List {
        /// Only show trips in this state.
        #[arg(long, value_enum)]
        status: Option<TripStatusArg>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TripStatusArg {
    Draft,
    Dispatched,
    Completed,
    Cancelled,
}

impl From<TripStatusArg> for TripStatus {
    fn from(arg: TripStatusArg) -> Self {
        match arg {
            TripStatusArg::Draft => TripStatus::Draft,
            TripStatusArg::Dispatched => TripStatus::Dispatched,
            TripStatusArg::Completed => TripStatus::Completed,
            TripStatusArg::Cancelled => TripStatus::Cancelled,
        }
    }
}

pub fn execute(cmd: &TripCommands, engine: &Engine, json: bool) -> anyhow::Result<()> {
    match cmd {
        TripCommands::Dispatch {
            vehicle,
            driver,
            cargo,
        } => {
            let trip = engine.dispatch(*vehicle, *driver, *cargo)?;
            if json {
                return print_json(&trip);
            }
            println!("Trip dispatched: {}", trip.id);
            print_trip(&trip);
            Ok(())
        }
        TripCommands::Complete { id, odometer } => {
            let trip = engine.complete(*id, *odometer)?;
            if json {
                return print_json(&trip);
            }
            println!("Trip completed: {}", trip.id);
            print_trip(&trip);
            Ok(())
        }
        TripCommands::List { status } => {
            let filter = status.map(TripStatus::from);
            list_trips(engine, filter, json)
        }
    }
}

fn list_trips(engine: &Engine, status: Option<TripStatus>, json: bool) -> anyhow::Result<()> {
    let trips: Vec<Trip> = engine
        .trips()?
        .into_iter()
        .filter(|t| status.map_or(true, |s| t.status() == s))
        .collect();
    if json {
        return print_json(&trips);
    }
    if trips.is_empty() {
        println!("No trips found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<8} {:<8} {:>10} {:<11} {:>10} {:>10} {:<20}",
        "ID", "VEHICLE", "DRIVER", "CARGO", "STATUS", "START", "END", "CREATED"
    );
    println!("{}", "-".repeat(90));
    for t in &trips {
        println!(
            "{:<6} {:<8} {:<8} {:>10.1} {:<11} {:>10} {:>10} {:<20}",
            t.id,
            t.vehicle_id,
            t.driver_id,
            t.cargo_weight,
            t.status().as_str(),
            reading(t.state.start_odometer()),
            reading(t.state.end_odometer()),
            t.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    println!("\n{} trip(s) total.", trips.len());
    Ok(())
}

fn print_trip(t: &Trip) {
    println!("  Vehicle:  {}", t.vehicle_id);
    println!("  Driver:   {}", t.driver_id);
    println!("  Cargo:    {} kg", t.cargo_weight);
    println!("  Status:   {}", t.status());
    println!("  Start:    {}", reading(t.state.start_odometer()));
    if let Some(end) = t.state.end_odometer() {
        println!("  End:      {:.1}", end);
        if let Some(start) = t.state.start_odometer() {
            println!("  Distance: {:.1} km", end - start);
        }
    }
    println!("  Created:  {}", t.created_at.to_rfc3339());
}

fn reading(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}
