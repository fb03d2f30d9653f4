//! # fleet-store-sqlite
//!
//! A [`Store`](fleet_dispatch::Store) backed by a single SQLite database.
//!
//! Each `Store::transaction` runs as a `BEGIN IMMEDIATE` transaction, so
//! the write lock is taken before the first read. Two engines racing for
//! the same vehicle, whether in one process or in several processes sharing
//! the file, are therefore serialized by SQLite itself, and the loser reads
//! the winner's committed state when it re-checks its preconditions.
//!
//! Partial unique indexes on `trips` back the engine's pairing rule: at most
//! one DISPATCHED trip per vehicle and per driver.

pub mod error;
pub mod store;

pub use error::SqliteStoreError;
pub use store::SqliteStore;
