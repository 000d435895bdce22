//! Catalog database bootstrap.
//!
//! # Responsibility
//! - Hand out SQLite connections whose schema holds the `bands`, `albums`
//!   and `songs` tables at the version this binary expects.
//! - Report which schema step broke when a migration cannot be applied.
//!
//! # Invariants
//! - The catalog schema version lives in `PRAGMA user_version`.
//! - No catalog row is read or written on a connection before the
//!   migration run finished.
//! - Foreign keys are enforced on every returned connection; album and
//!   song cascades are SQLite's job.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating a catalog database.
#[derive(Debug)]
pub enum DbError {
    /// Connection-level SQLite failure (open, pragma, transaction control).
    Sqlite(rusqlite::Error),
    /// One schema step failed; the whole migration run was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build of the catalog.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "catalog migration {version} ({name}) failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "catalog schema version {db_version} is newer than this build understands (up to {latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
