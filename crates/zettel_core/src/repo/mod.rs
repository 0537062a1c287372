//! Store abstractions for notes and links, plus their implementations.
//!
//! # Responsibility
//! - Define the `NoteStore` and `LinkGraph` contracts used by services.
//! - Isolate SQLite query details from service/business orchestration.
//! - Provide an in-memory implementation with identical semantics.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`, `SelfLink`,
//!   `TitleConflict`) in addition to DB transport errors.
//! - A note delete and its link cascade are one atomic unit.
//! - Core logic never depends on which implementation backs it.

use crate::db::DbError;
use crate::model::note::{NoteId, NoteValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod link_graph;
pub mod memory;
pub mod note_store;
pub mod sqlite;

pub use link_graph::LinkGraph;
pub use memory::MemoryZettelStore;
pub use note_store::NoteStore;
pub use sqlite::SqliteZettelStore;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error shared by note and link operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    /// Referenced note does not exist.
    NotFound(NoteId),
    /// Edge source and target are the same note.
    SelfLink(NoteId),
    /// Another note already uses this title.
    TitleConflict(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::SelfLink(id) => write!(f, "note {id} cannot link to itself"),
            Self::TitleConflict(title) => {
                write!(f, "a note titled `{title}` already exists")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// A backend that owns both notes and links and can group writes atomically.
pub trait ZettelStore: NoteStore + LinkGraph {
    /// Runs `op` as one atomic unit: either every write it performs is
    /// applied, or none is.
    fn atomically<T, F>(&mut self, op: F) -> RepoResult<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> RepoResult<T>;
}
