// driver.rs — Driver subcommands: add, list, status.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Subcommand, ValueEnum};
use fleet_dispatch::{DutyStatus, NewDriver};

use super::{print_json, truncate, Engine};

#[derive(Subcommand)]
pub enum DriverCommands {
    /// Register a driver. They start OFF_DUTY.
    Add {
        /// Full name.
        name: String,
        /// License class (e.g., "CDL-A").
        #[arg(long)]
        license_type: String,
        /// License expiry: YYYY-MM-DD (midnight UTC) or an RFC 3339 timestamp.
        #[arg(long, value_parser = parse_expiry)]
        expiry: DateTime<Utc>,
    },
    /// List all drivers.
    List,
    /// Move a driver to ON_DUTY, OFF_DUTY or SUSPENDED.
    Status {
        /// Driver ID.
        id: i64,
        #[arg(value_enum)]
        status: DutyArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DutyArg {
    OnDuty,
    OffDuty,
    Suspended,
}

impl From<DutyArg> for DutyStatus {
    fn from(arg: DutyArg) -> Self {
        match arg {
            DutyArg::OnDuty => DutyStatus::OnDuty,
            DutyArg::OffDuty => DutyStatus::OffDuty,
            DutyArg::Suspended => DutyStatus::Suspended,
        }
    }
}

pub fn execute(cmd: &DriverCommands, engine: &Engine, json: bool) -> anyhow::Result<()> {
    match cmd {
        DriverCommands::Add {
            name,
            license_type,
            expiry,
        } => {
            let driver = engine.roster().register_driver(NewDriver {
                name: name.clone(),
                license_type: license_type.clone(),
                license_expiry: *expiry,
            })?;
            if json {
                return print_json(&driver);
            }
            println!("Driver registered: {}", driver.id);
            println!("  Name:    {}", driver.name);
            println!(
                "  License: {} (expires {})",
                driver.license_type,
                driver.license_expiry.to_rfc3339()
            );
            println!("  Status:  {}", driver.status);
            Ok(())
        }
        DriverCommands::List => list_drivers(engine, json),
        DriverCommands::Status { id, status } => {
            let driver = engine
                .roster()
                .set_driver_status(*id, DutyStatus::from(*status))?;
            if json {
                return print_json(&driver);
            }
            println!("Driver {} is now {}", driver.id, driver.status);
            Ok(())
        }
    }
}

fn list_drivers(engine: &Engine, json: bool) -> anyhow::Result<()> {
    let drivers = engine.drivers()?;
    if json {
        return print_json(&drivers);
    }
    if drivers.is_empty() {
        println!("No drivers registered.");
        return Ok(());
    }

    let now = Utc::now();
    println!(
        "{:<6} {:<24} {:<8} {:<12} {:>7} {:<10}",
        "ID", "NAME", "LICENSE", "EXPIRES", "SCORE", "STATUS"
    );
    println!("{}", "-".repeat(72));
    for d in &drivers {
        let expiry = if d.license_valid_at(now) {
            d.license_expiry.format("%Y-%m-%d").to_string()
        } else {
            format!("{}!", d.license_expiry.format("%Y-%m-%d"))
        };
        println!(
            "{:<6} {:<24} {:<8} {:<12} {:>7.1} {:<10}",
            d.id,
            truncate(&d.name, 22),
            truncate(&d.license_type, 8),
            expiry,
            d.safety_score,
            d.status.to_string(),
        );
    }
    println!("\n{} driver(s) total.", drivers.len());
    Ok(())
}

/// Accept a bare date (midnight UTC) or a full RFC 3339 timestamp.
fn parse_expiry(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| format!("invalid date: {}", s))?;
        return Ok(Utc.from_utc_datetime(&midnight));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected YYYY-MM-DD or RFC 3339 timestamp, got '{}': {}", s, e))
}
