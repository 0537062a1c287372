//! Read projections returned by the query facade.

use super::note::{Note, NoteId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Note enriched with its tags and link neighbourhood, links shown by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Titles of notes this note links to, in link-creation order.
    pub links: Vec<String>,
    /// Titles of notes linking to this note, in link-creation order.
    pub backlinks: Vec<String>,
}

impl NoteView {
    pub fn from_note(note: Note, links: Vec<String>, backlinks: Vec<String>) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            tags: note.tags,
            created_at: note.created_at,
            updated_at: note.updated_at,
            links,
            backlinks,
        }
    }
}

/// Titled adjacency map: source title -> linked titles.
///
/// Only notes with at least one outgoing link appear as keys.
pub type GraphView = BTreeMap<String, Vec<String>>;
