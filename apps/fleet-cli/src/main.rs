//! # fleet-cli
//!
//! Command-line interface for fleet dispatch.
//!
//! - `fleet vehicle add/list/show/status` — register and service vehicles
//! - `fleet driver add/list/status` — register drivers and set duty status
//! - `fleet trip dispatch/complete/list` — run the dispatch state machine
//! - `fleet kpis` — dashboard figures
//! - `fleet seed` — load the demo fleet into an empty database
//!
//! State lives in `<project-root>/.fleet/`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fleet_dispatch::{DispatchError, FleetConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "fleet_dispatch=info,fleet_store_sqlite=info";

/// Fleet dispatch CLI — pair vehicles with drivers and track trips.
#[derive(Parser)]
#[command(name = "fleet", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage vehicles.
    Vehicle {
        #[command(subcommand)]
        command: commands::vehicle::VehicleCommands,
    },
    /// Manage drivers.
    Driver {
        #[command(subcommand)]
        command: commands::driver::DriverCommands,
    },
    /// Dispatch, complete and list trips.
    Trip {
        #[command(subcommand)]
        command: commands::trip::TripCommands,
    },
    /// Show fleet KPIs.
    Kpis,
    /// Load the demo fleet into an empty database.
    Seed,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = FleetConfig::load(&project_root)?;

    // Logs go to stderr so they don't mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&config)?)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::debug!(
        project_root = %project_root.display(),
        db = %config.db_path().display(),
        "opening fleet database"
    );
    let engine = commands::open_engine(&config)?;
    let json = cli.json;

    let result = match &cli.command {
        Commands::Vehicle { command } => commands::vehicle::execute(command, &engine, json),
        Commands::Driver { command } => commands::driver::execute(command, &engine, json),
        Commands::Trip { command } => commands::trip::execute(command, &engine, json),
        Commands::Kpis => commands::kpis::execute(&engine, json),
        Commands::Seed => commands::seed::execute(&engine, json),
    };

    if let Err(e) = result {
        if let Some(dispatch_err) = e.downcast_ref::<DispatchError>() {
            if json {
                println!("{}", serde_json::to_string_pretty(&dispatch_err.to_body())?);
            }
            eprintln!("Error: {}", dispatch_err);
            std::process::exit(exit_code(dispatch_err));
        }
        return Err(e);
    }
    Ok(())
}

/// `RUST_LOG` wins, then `log_filter` from the config file, then the default.
fn log_filter(config: &FleetConfig) -> anyhow::Result<EnvFilter> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(EnvFilter::from_default_env());
    }
    let directives = config
        .settings
        .log_filter
        .as_deref()
        .unwrap_or(DEFAULT_LOG_FILTER);
    Ok(EnvFilter::try_new(directives)?)
}

/// 1 for rejected requests, 2 for missing records, 3 for store failures.
fn exit_code(e: &DispatchError) -> i32 {
    match e.http_status() {
        404 => 2,
        500 => 3,
        _ => 1,
    }
}
