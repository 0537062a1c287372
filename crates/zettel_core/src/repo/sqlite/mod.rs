//! SQLite-backed note store and link graph.
//!
//! # Responsibility
//! - Implement `NoteStore`, `LinkGraph` and `ZettelStore` over one connection.
//! - Keep multi-statement writes inside savepoints.
//!
//! # Invariants
//! - The connection must come from `db::open_db*` (migrated, `foreign_keys=ON`).
//! - Forward links and backlinks are ordered by `links.rowid`, i.e. insertion.

use super::{RepoError, RepoResult, ZettelStore};
use crate::db::with_savepoint;
use crate::model::note::NoteId;
use rusqlite::Connection;
use uuid::Uuid;

mod links;
mod notes;

const REQUIRED_TABLES: [&str; 4] = ["notes", "tags", "note_tags", "links"];

/// Note store and link graph backed by one SQLite connection.
///
/// Writes take `&mut self`; callers sharing a connection across threads must
/// serialize access (the server wraps the connection in a mutex).
pub struct SqliteZettelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteZettelStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl ZettelStore for SqliteZettelStore<'_> {
    fn atomically<T, F>(&mut self, op: F) -> RepoResult<T>
    where
        F: FnOnce(&mut Self) -> RepoResult<T>,
    {
        let conn = self.conn;
        with_savepoint(conn, "zettel_unit", || op(self))
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn note_exists_in(conn: &Connection, id: NoteId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_note_id(value: &str, column: &str) -> RepoResult<NoteId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
