//! SQLite storage bootstrap, schema migrations and write scopes.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the notes graph.
//! - Apply schema migrations in deterministic order.
//! - Provide nestable atomic write scopes on a shared connection.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - A failed write scope leaves no partial writes behind.

use log::warn;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_location, FOLD_FUNCTION, MEMORY_LOCATION};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Runs `op` inside a named SAVEPOINT on `conn`.
///
/// The savepoint is released when `op` succeeds and rolled back when it
/// fails. Savepoints nest, so scopes may be opened inside each other; an
/// outermost savepoint behaves like `BEGIN DEFERRED ... COMMIT`.
pub fn with_savepoint<T, E, F>(conn: &Connection, name: &str, op: F) -> Result<T, E>
where
    E: From<rusqlite::Error>,
    F: FnOnce() -> Result<T, E>,
{
    conn.execute_batch(&format!("SAVEPOINT {name};"))?;
    match op() {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name};"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) =
                conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name};"))
            {
                warn!(
                    "event=savepoint_rollback module=db status=error savepoint={} error={}",
                    name, rollback_err
                );
            }
            Err(err)
        }
    }
}
