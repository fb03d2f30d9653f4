// error.rs — Errors raised while opening a SQLite store.
//
// Failures inside a transaction are reported through fleet-dispatch's
// `StoreError`; this type only covers getting a usable database handle.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// The directory that should hold the database could not be created.
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// SQLite refused to open the database file.
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// Connection settings or schema creation failed.
    #[error("failed to prepare schema: {0}")]
    Schema(#[from] rusqlite::Error),
}
