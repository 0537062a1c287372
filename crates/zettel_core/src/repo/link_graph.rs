//! Link graph contract.
//!
//! Edges are directed `(source, target)` pairs with set semantics.
//!
//! # Invariants
//! - `source != target` for every stored edge.
//! - Both endpoints exist when an edge is created.
//! - An edge is either present or absent; re-adding is a no-op.
//! - Forward links and backlinks are reported in edge-insertion order.

use super::RepoResult;
use crate::model::note::NoteId;

/// Repository interface for directed note links.
pub trait LinkGraph {
    /// Adds `source -> target`. Returns `false` when the edge already existed.
    ///
    /// # Errors
    /// - `RepoError::SelfLink` when `source == target`.
    /// - `RepoError::NotFound` when either endpoint does not exist.
    fn add_edge(&mut self, source: NoteId, target: NoteId) -> RepoResult<bool>;
    /// Returns whether `source -> target` exists.
    fn has_edge(&self, source: NoteId, target: NoteId) -> RepoResult<bool>;
    /// Removes every edge where `id` is source or target.
    fn remove_note_edges(&mut self, id: NoteId) -> RepoResult<()>;
    /// Targets of edges leaving `id`.
    fn forward_links(&self, id: NoteId) -> RepoResult<Vec<NoteId>>;
    /// Sources of edges entering `id`.
    fn backlinks(&self, id: NoteId) -> RepoResult<Vec<NoteId>>;
    /// Whole-graph export: only notes with outgoing edges, in note-creation
    /// order, each with its targets in edge-insertion order.
    fn adjacency(&self) -> RepoResult<Vec<(NoteId, Vec<NoteId>)>>;
}
