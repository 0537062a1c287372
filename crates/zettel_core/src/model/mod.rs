//! Domain model for notes and their read projections.
//!
//! # Responsibility
//! - Define canonical data structures used by stores and services.
//! - Keep read projections (`NoteView`) separate from stored records.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is a hard delete that cascades to tag associations and links.

pub mod note;
pub mod view;
