//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its write-side inputs.
//! - Own field-level validation and tag normalization rules.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `title` and `content` are never blank.
//! - `tags` are trimmed, lowercased, deduplicated and sorted ascending.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Canonical note record as persisted by a note store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Markdown body. May embed `[[Title]]` references.
    pub content: String,
    /// Normalized tag set, sorted ascending.
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Never earlier than `created_at`.
    pub updated_at: i64,
}

/// Input for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Validates required fields and returns the normalized tag set.
    pub fn validate(&self) -> Result<Vec<String>, NoteValidationError> {
        validate_title(&self.title)?;
        validate_content(&self.content)?;
        normalize_tags(&self.tags)
    }
}

/// Partial update for an existing note.
///
/// `None` leaves a field unchanged. For `tags`, `Some(vec![])` clears the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }

    /// Validates provided fields and returns the normalized tag set, if any.
    pub fn validate(&self) -> Result<Option<Vec<String>>, NoteValidationError> {
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(content) = self.content.as_deref() {
            validate_content(content)?;
        }
        self.tags.as_deref().map(normalize_tags).transpose()
    }
}

/// Filter for note listing.
///
/// When both fields are set, `tag` takes precedence and `keyword` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoteFilter {
    pub tag: Option<String>,
    pub keyword: Option<String>,
}

impl NoteFilter {
    pub fn by_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            keyword: None,
        }
    }

    pub fn by_keyword(keyword: impl Into<String>) -> Self {
        Self {
            tag: None,
            keyword: Some(keyword.into()),
        }
    }

    /// Resolves the effective filter after precedence and blank handling.
    pub fn effective(&self) -> EffectiveFilter {
        if let Some(tag) = self.tag.as_deref().and_then(normalize_tag) {
            return EffectiveFilter::Tag(tag);
        }
        match self.keyword.as_deref().map(str::trim) {
            Some(keyword) if !keyword.is_empty() => EffectiveFilter::Keyword(keyword.to_string()),
            _ => EffectiveFilter::All,
        }
    }
}

/// Normalized form of [`NoteFilter`] consumed by store implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveFilter {
    All,
    /// Normalized tag name.
    Tag(String),
    /// Trimmed keyword, matched case-insensitively.
    Keyword(String),
}

/// Field-level validation failure for note writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    BlankTitle,
    BlankContent,
    BlankTag,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "note title must not be empty"),
            Self::BlankContent => write!(f, "note content must not be empty"),
            Self::BlankTag => write!(f, "tag names must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// Normalizes one tag value: trimmed and lowercased, `None` when blank.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values, rejecting blank entries.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, NoteValidationError> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        let value = normalize_tag(tag).ok_or(NoteValidationError::BlankTag)?;
        unique.insert(value);
    }
    Ok(unique.into_iter().collect())
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

fn validate_title(title: &str) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::BlankTitle);
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), NoteValidationError> {
    if content.trim().is_empty() {
        return Err(NoteValidationError::BlankContent);
    }
    Ok(())
}
