//! Use-case service layer.
//!
//! # Responsibility
//! - Orchestrate store writes and content link extraction.
//! - Expose read-side query facade functions.

pub mod link_extractor;
pub mod note_service;
pub mod query;
