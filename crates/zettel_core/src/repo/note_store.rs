//! Note store contract.
//!
//! # Invariants
//! - Titles are unique across live notes.
//! - Tags are persisted in normalized form only.
//! - `delete_note` removes the note, its tag associations and every link
//!   touching it in one atomic unit.

use super::RepoResult;
use crate::model::note::{Note, NoteDraft, NoteFilter, NoteId, NotePatch};

/// Repository interface for note records and their tags.
pub trait NoteStore {
    /// Validates and persists a new note, assigning id and timestamps.
    fn create_note(&mut self, draft: &NoteDraft) -> RepoResult<Note>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Returns whether a note with `id` exists.
    fn note_exists(&self, id: NoteId) -> RepoResult<bool>;
    /// Finds a note id by exact (case-sensitive) title.
    fn find_note_id_by_title(&self, title: &str) -> RepoResult<Option<NoteId>>;
    /// Applies a partial update and returns the updated note.
    fn update_note(&mut self, id: NoteId, patch: &NotePatch) -> RepoResult<Note>;
    /// Deletes a note and cascades to its links.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<()>;
    /// Lists notes in creation order, filtered by tag or keyword.
    fn list_notes(&self, filter: &NoteFilter) -> RepoResult<Vec<Note>>;
    /// Maps ids to titles, preserving input order and skipping unknown ids.
    fn resolve_titles(&self, ids: &[NoteId]) -> RepoResult<Vec<String>>;
    /// Returns all known tag names sorted ascending.
    fn list_tags(&self) -> RepoResult<Vec<String>>;
}
