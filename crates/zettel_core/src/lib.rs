//! Core domain logic for the Zettelkasten notes graph.
//! This crate is the single source of truth for note and link invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::note::{
    normalize_tag, normalize_tags, Note, NoteDraft, NoteFilter, NoteId, NotePatch,
    NoteValidationError,
};
pub use model::view::{GraphView, NoteView};
pub use repo::{
    LinkGraph, MemoryZettelStore, NoteStore, RepoError, RepoResult, SqliteZettelStore,
    ZettelStore,
};
pub use service::link_extractor::{extract_references, link_referrers, resolve_and_link};
pub use service::note_service::{LinkTarget, NoteService, NoteServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
