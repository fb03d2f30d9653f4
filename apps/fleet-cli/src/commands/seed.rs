// seed.rs — Load the demo fleet.

use super::{print_json, Engine};

pub fn execute(engine: &Engine, json: bool) -> anyhow::Result<()> {
    let seeded = engine.roster().seed()?;
    if json {
        return print_json(&seeded);
    }

    match seeded {
        Some((vehicle, driver)) => {
            println!("Seeded demo fleet:");
            println!(
                "  Vehicle {}: {} ({})",
                vehicle.id, vehicle.name, vehicle.license_plate
            );
            println!("  Driver {}:  {} ({})", driver.id, driver.name, driver.status);
        }
        None => println!("Database already has vehicles or drivers; nothing seeded."),
    }
    Ok(())
}
