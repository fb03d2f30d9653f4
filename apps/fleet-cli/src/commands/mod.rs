// mod.rs — Shared plumbing for `fleet` subcommands.

pub mod driver;
pub mod kpis;
pub mod seed;
pub mod trip;
pub mod vehicle;

use std::sync::Arc;

use fleet_dispatch::{DispatchEngine, EventDispatcher, FleetConfig, LogSink};
use fleet_store_sqlite::SqliteStore;
use serde::Serialize;

pub type Engine = DispatchEngine<SqliteStore>;

/// Open the project database and wire up the event log.
pub fn open_engine(config: &FleetConfig) -> anyhow::Result<Engine> {
    let store = SqliteStore::open(config.db_path(), config.busy_timeout())?;

    let mut events = EventDispatcher::new();
    if config.settings.events.enabled {
        events.add_sink(Box::new(LogSink::new(&config.events_log)));
    }

    Ok(DispatchEngine::with_events(Arc::new(store), Arc::new(events)))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
