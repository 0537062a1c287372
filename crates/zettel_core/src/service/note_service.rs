//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/update/delete/link/query APIs for adapters.
//! - Keep content references and the link graph in sync on writes.
//! - Shape responses through the query facade.
//!
//! # Invariants
//! - Every mutating use-case runs inside one `ZettelStore::atomically` unit,
//!   so a note write and its tag/link side effects commit together or not
//!   at all.
//! - Content-derived links are only ever added; edits never drop edges.
//! - Service layer remains storage-agnostic.

use crate::model::note::{NoteDraft, NoteFilter, NoteId, NotePatch, NoteValidationError};
use crate::model::view::{GraphView, NoteView};
use crate::repo::{LinkGraph, NoteStore, RepoError, ZettelStore};
use crate::service::link_extractor::{extract_references, link_referrers, resolve_and_link};
use crate::service::query;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Input failed field validation.
    Validation(NoteValidationError),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// No note carries the requested title.
    TitleNotFound(String),
    /// A note cannot link to itself.
    SelfLink(NoteId),
    /// Another note already uses the title.
    TitleConflict(String),
    /// Link request named neither a target id nor a target title.
    MissingLinkTarget,
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl NoteServiceError {
    /// Whether the error is caused by the request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repo(_) | Self::InconsistentState(_))
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NoteNotFound(_) | Self::TitleNotFound(_) => "not_found",
            Self::SelfLink(_) => "self_link",
            Self::TitleConflict(_) => "title_conflict",
            Self::MissingLinkTarget => "missing_link_target",
            Self::Repo(_) => "storage",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::TitleNotFound(title) => write!(f, "no note titled `{title}`"),
            Self::SelfLink(_) => write!(f, "cannot link a note to itself"),
            Self::TitleConflict(title) => write!(f, "a note titled `{title}` already exists"),
            Self::MissingLinkTarget => write!(f, "link target requires `target_id` or `target_title`"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            RepoError::SelfLink(id) => Self::SelfLink(id),
            RepoError::TitleConflict(title) => Self::TitleConflict(title),
            other => Self::Repo(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Target of an explicit link request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Id(NoteId),
    Title(String),
}

impl LinkTarget {
    /// Builds a target from optional request fields; an id wins over a title.
    pub fn from_parts(
        target_id: Option<NoteId>,
        target_title: Option<String>,
    ) -> Result<Self, NoteServiceError> {
        match (target_id, target_title) {
            (Some(id), _) => Ok(Self::Id(id)),
            (None, Some(title)) if !title.trim().is_empty() => Ok(Self::Title(title)),
            _ => Err(NoteServiceError::MissingLinkTarget),
        }
    }
}

/// Note service facade over a store implementation.
pub struct NoteService<S: ZettelStore> {
    store: S,
}

impl<S: ZettelStore> NoteService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a note, links its `[[references]]`, and links existing notes
    /// that already reference its title.
    pub fn create_note(&mut self, draft: NoteDraft) -> Result<NoteView, NoteServiceError> {
        let started_at = Instant::now();
        let result = self.store.atomically(|store| {
            let note = store.create_note(&draft)?;
            let references = extract_references(&note.content);
            let outgoing = resolve_and_link(note.id, &references, store)?;
            let incoming = link_referrers(&note, store)?;
            Ok((note, outgoing, incoming))
        });

        let (note, outgoing, incoming) = result.map_err(|err| log_write_failure("note_create", err))?;
        info!(
            "event=note_create module=service status=ok note_id={} tags={} links_out={} links_in={} duration_ms={}",
            note.id,
            note.tags.len(),
            outgoing,
            incoming,
            started_at.elapsed().as_millis()
        );
        Ok(query::enrich(&self.store, note)?)
    }

    /// Gets one enriched note by id.
    pub fn get_note(&self, id: NoteId) -> Result<NoteView, NoteServiceError> {
        query::get_enriched(&self.store, id)?.ok_or(NoteServiceError::NoteNotFound(id))
    }

    /// Applies a partial update.
    ///
    /// New content references are linked; a new title picks up notes that
    /// already reference it.
    pub fn update_note(
        &mut self,
        id: NoteId,
        patch: NotePatch,
    ) -> Result<NoteView, NoteServiceError> {
        if patch.is_empty() {
            return self.get_note(id);
        }

        let started_at = Instant::now();
        let result = self.store.atomically(|store| {
            let note = store.update_note(id, &patch)?;
            let mut added = 0;
            if patch.content.is_some() {
                let references = extract_references(&note.content);
                added += resolve_and_link(note.id, &references, store)?;
            }
            if patch.title.is_some() {
                added += link_referrers(&note, store)?;
            }
            Ok((note, added))
        });

        let (note, added) = result.map_err(|err| log_write_failure("note_update", err))?;
        info!(
            "event=note_update module=service status=ok note_id={} links_added={} duration_ms={}",
            note.id,
            added,
            started_at.elapsed().as_millis()
        );
        Ok(query::enrich(&self.store, note)?)
    }

    /// Deletes a note together with every link touching it.
    pub fn delete_note(&mut self, id: NoteId) -> Result<(), NoteServiceError> {
        self.store
            .atomically(|store| store.delete_note(id))
            .map_err(|err| log_write_failure("note_delete", err))?;
        info!("event=note_delete module=service status=ok note_id={}", id);
        Ok(())
    }

    /// Adds an explicit `source -> target` link and returns the source view.
    ///
    /// Linking an already linked pair succeeds without creating a duplicate.
    pub fn link_notes(
        &mut self,
        source: NoteId,
        target: LinkTarget,
    ) -> Result<NoteView, NoteServiceError> {
        let result = self.store.atomically(|store| {
            if !store.note_exists(source)? {
                return Err(RepoError::NotFound(source));
            }
            let target_id = match &target {
                LinkTarget::Id(id) => *id,
                LinkTarget::Title(title) => match store.find_note_id_by_title(title)? {
                    Some(id) => id,
                    None => return Ok(None),
                },
            };
            store.add_edge(source, target_id).map(Some)
        });

        let created = match result.map_err(|err| log_write_failure("link_add", err))? {
            Some(created) => created,
            None => {
                let LinkTarget::Title(title) = target else {
                    return Err(NoteServiceError::InconsistentState(
                        "id link target resolved to nothing",
                    ));
                };
                return Err(NoteServiceError::TitleNotFound(title));
            }
        };
        info!(
            "event=link_add module=service status=ok source_id={} created={}",
            source, created
        );
        self.get_note(source)
    }

    /// Lists enriched notes; `tag` takes precedence over `keyword`.
    pub fn search_notes(&self, filter: &NoteFilter) -> Result<Vec<NoteView>, NoteServiceError> {
        Ok(query::search(&self.store, filter)?)
    }

    /// Exports the titled adjacency map.
    pub fn graph(&self) -> Result<GraphView, NoteServiceError> {
        Ok(query::graph_view(&self.store)?)
    }

    /// Lists normalized tags known by storage.
    pub fn list_tags(&self) -> Result<Vec<String>, NoteServiceError> {
        Ok(self.store.list_tags()?)
    }

    /// Ids of notes linked from `id`, in link-creation order.
    pub fn forward_links(&self, id: NoteId) -> Result<Vec<NoteId>, NoteServiceError> {
        self.ensure_exists(id)?;
        Ok(self.store.forward_links(id)?)
    }

    /// Ids of notes linking to `id`, in link-creation order.
    pub fn backlinks(&self, id: NoteId) -> Result<Vec<NoteId>, NoteServiceError> {
        self.ensure_exists(id)?;
        Ok(self.store.backlinks(id)?)
    }

    fn ensure_exists(&self, id: NoteId) -> Result<(), NoteServiceError> {
        if self.store.note_exists(id)? {
            Ok(())
        } else {
            Err(NoteServiceError::NoteNotFound(id))
        }
    }
}

fn log_write_failure(event: &str, err: RepoError) -> NoteServiceError {
    let err = NoteServiceError::from(err);
    if err.is_client_error() {
        info!(
            "event={event} module=service status=rejected error_code={}",
            err.code()
        );
    } else {
        warn!(
            "event={event} module=service status=error error_code={} error={err}",
            err.code()
        );
    }
    err
}
