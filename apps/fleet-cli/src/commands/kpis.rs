// kpis.rs — Fleet dashboard figures.

use super::{print_json, Engine};

pub fn execute(engine: &Engine, json: bool) -> anyhow::Result<()> {
    let kpis = engine.kpis()?;
    if json {
        return print_json(&kpis);
    }

    println!("Active fleet:  {}", kpis.active_fleet);
    println!("In shop:       {}", kpis.in_shop);
    println!("Total:         {}", kpis.total_vehicles);
    println!("Utilization:   {:.1}%", kpis.utilization_rate);
    println!("Pending cargo: {} kg", kpis.pending_cargo);
    Ok(())
}
