//! Shared SQLite handle for request handlers.
//!
//! One connection sits behind a mutex; each request holds the lock for the
//! duration of one service call, so writers are serialized and readers never
//! observe a half-applied cascade.

use parking_lot::Mutex;
use rusqlite::Connection;
use zettel_core::db::{open_db_location, DbResult};
use zettel_core::{NoteService, NoteServiceError, SqliteZettelStore};

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens and migrates the database at `location` (`:memory:` allowed).
    pub fn open(location: &str) -> DbResult<Self> {
        Ok(Self::from_connection(open_db_location(location)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs `op` against a note service bound to the locked connection.
    pub fn with_service<T, F>(&self, op: F) -> Result<T, NoteServiceError>
    where
        F: FnOnce(&mut NoteService<SqliteZettelStore<'_>>) -> Result<T, NoteServiceError>,
    {
        let conn = self.conn.lock();
        let store = SqliteZettelStore::try_new(&conn)?;
        let mut service = NoteService::new(store);
        op(&mut service)
    }
}
