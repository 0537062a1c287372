//! Content link extraction and resolution.
//!
//! # Responsibility
//! - Find `[[Title]]` references embedded in note content.
//! - Resolve references to note ids by exact title and register edges.
//!
//! # Invariants
//! - Unresolved references are skipped silently; they never fail a write.
//! - A note referencing its own title never produces a self-link.

use crate::model::note::{Note, NoteFilter, NoteId};
use crate::repo::{LinkGraph, NoteStore, RepoResult};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]]*)\]\]").expect("valid reference regex"));

/// Returns the enclosed text of every `[[...]]` occurrence, left to right.
///
/// Matches never overlap and never nest; the enclosed text cannot contain
/// `]`. `[[]]` yields an empty string, which simply fails to resolve later.
pub fn extract_references(content: &str) -> Vec<String> {
    REFERENCE_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Links `source_id` to every note whose exact title appears in `references`.
///
/// Returns the number of newly created edges.
pub fn resolve_and_link<S>(source_id: NoteId, references: &[String], store: &mut S) -> RepoResult<usize>
where
    S: NoteStore + LinkGraph,
{
    let mut created = 0;
    for reference in references {
        match store.find_note_id_by_title(reference)? {
            Some(target_id) if target_id != source_id => {
                if store.add_edge(source_id, target_id)? {
                    created += 1;
                }
            }
            Some(_) => {}
            None => debug!(
                "event=reference_unresolved module=link_extractor status=skipped source_id={} reference_len={}",
                source_id,
                reference.chars().count()
            ),
        }
    }
    Ok(created)
}

/// Links every existing note whose content references `note.title` to `note`.
///
/// Used after a note is created or renamed so references written before the
/// target existed become edges. Returns the number of newly created edges.
pub fn link_referrers<S>(note: &Note, store: &mut S) -> RepoResult<usize>
where
    S: NoteStore + LinkGraph,
{
    let marker = format!("[[{}]]", note.title);
    let candidates = store.list_notes(&NoteFilter::by_keyword(marker))?;

    let mut created = 0;
    for candidate in candidates {
        if candidate.id == note.id {
            continue;
        }
        let references = extract_references(&candidate.content);
        if references.iter().any(|reference| *reference == note.title)
            && store.add_edge(candidate.id, note.id)?
        {
            created += 1;
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::extract_references;

    #[test]
    fn extracts_references_left_to_right() {
        assert_eq!(
            extract_references("see [[Beta]] and [[Gamma Ray]], then [[Beta]]"),
            vec!["Beta", "Gamma Ray", "Beta"]
        );
    }

    #[test]
    fn empty_reference_is_returned_verbatim() {
        assert_eq!(extract_references("x [[]] y"), vec![String::new()]);
    }

    #[test]
    fn inner_openers_do_not_start_a_nested_reference() {
        assert_eq!(extract_references("[[Outer [[Inner]]]]"), vec!["Outer [[Inner"]);
        assert!(extract_references("[[a]b]] and [single] and [[open").is_empty());
    }

    #[test]
    fn keeps_whitespace_inside_reference() {
        assert_eq!(extract_references("[[ Spaced ]]"), vec![" Spaced "]);
    }
}
