//! In-memory note store and link graph.
//!
//! # Responsibility
//! - Provide a process-local backend with the same contract as SQLite.
//! - Keep forward and reverse adjacency indexes so backlink lookups do not
//!   scan the whole edge set.
//!
//! # Invariants
//! - `edges`, `forward` and `reverse` always describe the same edge set.
//! - `forward`/`reverse` never hold empty vectors.
//! - `order` lists live note ids in creation order.
//! - Inside an `atomically` unit every write is journaled; a failed unit
//!   reverts its own entries newest first and leaves outer units intact.

use super::{LinkGraph, NoteStore, RepoError, RepoResult, ZettelStore};
use crate::model::note::{
    now_epoch_ms, EffectiveFilter, Note, NoteDraft, NoteFilter, NoteId, NotePatch,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    notes: HashMap<NoteId, Note>,
    order: Vec<NoteId>,
    titles: HashMap<String, NoteId>,
    tags: BTreeSet<String>,
    edges: HashSet<(NoteId, NoteId)>,
    forward: HashMap<NoteId, Vec<NoteId>>,
    reverse: HashMap<NoteId, Vec<NoteId>>,
}

/// One reversible write recorded while a unit is open.
#[derive(Debug, Clone)]
enum Undo {
    NoteInserted(NoteId),
    NoteReplaced(Note),
    NoteRemoved { note: Note, position: usize },
    TagAdded(String),
    EdgeInserted(NoteId, NoteId),
    EdgeRemoved {
        source: NoteId,
        target: NoteId,
        forward_at: usize,
        reverse_at: usize,
    },
}

/// Note store and link graph held entirely in memory.
///
/// State lives as long as the value; share it across threads behind a lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryZettelStore {
    state: MemoryState,
    /// `Some` while an `atomically` unit is running.
    journal: Option<Vec<Undo>>,
}

impl MemoryZettelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live notes.
    pub fn note_count(&self) -> usize {
        self.state.order.len()
    }

    /// Number of stored edges.
    pub fn edge_count(&self) -> usize {
        self.state.edges.len()
    }

    fn record(&mut self, entry: Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(entry);
        }
    }

    fn add_tags(&mut self, tags: &[String]) {
        for tag in tags {
            if self.state.tags.insert(tag.clone()) {
                self.record(Undo::TagAdded(tag.clone()));
            }
        }
    }

    /// Drops one edge from all three indexes.
    fn unlink(&mut self, source: NoteId, target: NoteId) {
        let state = &mut self.state;
        if !state.edges.remove(&(source, target)) {
            return;
        }
        let forward_at = detach(&mut state.forward, source, target);
        let reverse_at = detach(&mut state.reverse, target, source);
        if let (Some(forward_at), Some(reverse_at)) = (forward_at, reverse_at) {
            self.record(Undo::EdgeRemoved {
                source,
                target,
                forward_at,
                reverse_at,
            });
        }
    }

    /// Reverts journal entries recorded after `mark`, newest first.
    fn rollback_to(&mut self, mark: usize) {
        let entries = match self.journal.as_mut() {
            Some(journal) if mark <= journal.len() => journal.split_off(mark),
            _ => return,
        };
        for entry in entries.into_iter().rev() {
            self.state.revert(entry);
        }
    }
}

impl MemoryState {
    fn revert(&mut self, entry: Undo) {
        match entry {
            Undo::NoteInserted(id) => {
                if let Some(note) = self.notes.remove(&id) {
                    self.titles.remove(&note.title);
                }
                self.order.retain(|current| *current != id);
            }
            Undo::NoteReplaced(previous) => {
                let id = previous.id;
                if let Some(current) = self.notes.insert(id, previous.clone()) {
                    if current.title != previous.title {
                        self.titles.remove(&current.title);
                        self.titles.insert(previous.title, id);
                    }
                }
            }
            Undo::NoteRemoved { note, position } => {
                let position = position.min(self.order.len());
                self.order.insert(position, note.id);
                self.titles.insert(note.title.clone(), note.id);
                self.notes.insert(note.id, note);
            }
            Undo::TagAdded(tag) => {
                self.tags.remove(&tag);
            }
            Undo::EdgeInserted(source, target) => {
                self.edges.remove(&(source, target));
                detach(&mut self.forward, source, target);
                detach(&mut self.reverse, target, source);
            }
            Undo::EdgeRemoved {
                source,
                target,
                forward_at,
                reverse_at,
            } => {
                self.edges.insert((source, target));
                reattach(&mut self.forward, source, target, forward_at);
                reattach(&mut self.reverse, target, source, reverse_at);
            }
        }
    }
}

impl ZettelStore for MemoryZettelStore {
    fn atomically<T, F>(&mut self, op: F) -> RepoResult<T>
    where
        F: FnOnce(&mut Self) -> RepoResult<T>,
    {
        let outermost = self.journal.is_none();
        let mark = self.journal.get_or_insert_with(Vec::new).len();
        let result = op(self);
        if result.is_err() {
            self.rollback_to(mark);
        }
        if outermost {
            self.journal = None;
        }
        result
    }
}

impl NoteStore for MemoryZettelStore {
    fn create_note(&mut self, draft: &NoteDraft) -> RepoResult<Note> {
        let tags = draft.validate()?;
        if self.state.titles.contains_key(&draft.title) {
            return Err(RepoError::TitleConflict(draft.title.clone()));
        }

        let now = now_epoch_ms();
        let note = Note {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            content: draft.content.clone(),
            tags,
            created_at: now,
            updated_at: now,
        };

        self.add_tags(&note.tags);
        let state = &mut self.state;
        state.titles.insert(note.title.clone(), note.id);
        state.order.push(note.id);
        state.notes.insert(note.id, note.clone());
        self.record(Undo::NoteInserted(note.id));
        Ok(note)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        Ok(self.state.notes.get(&id).cloned())
    }

    fn note_exists(&self, id: NoteId) -> RepoResult<bool> {
        Ok(self.state.notes.contains_key(&id))
    }

    fn find_note_id_by_title(&self, title: &str) -> RepoResult<Option<NoteId>> {
        Ok(self.state.titles.get(title).copied())
    }

    fn update_note(&mut self, id: NoteId, patch: &NotePatch) -> RepoResult<Note> {
        let tags = patch.validate()?;
        let previous = self
            .state
            .notes
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound(id))?;

        if let Some(title) = patch.title.as_ref() {
            if let Some(owner) = self.state.titles.get(title) {
                if *owner != id {
                    return Err(RepoError::TitleConflict(title.clone()));
                }
            }
        }

        let mut note = previous.clone();
        if let Some(title) = patch.title.as_ref() {
            self.state.titles.remove(&note.title);
            self.state.titles.insert(title.clone(), id);
            note.title = title.clone();
        }
        if let Some(content) = patch.content.as_ref() {
            note.content = content.clone();
        }
        if let Some(tags) = tags {
            self.add_tags(&tags);
            note.tags = tags;
        }
        note.updated_at = now_epoch_ms().max(note.updated_at);

        self.state.notes.insert(id, note.clone());
        self.record(Undo::NoteReplaced(previous));
        Ok(note)
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<()> {
        self.remove_note_edges(id)?;
        let note = self
            .state
            .notes
            .remove(&id)
            .ok_or(RepoError::NotFound(id))?;
        self.state.titles.remove(&note.title);
        let position = self
            .state
            .order
            .iter()
            .position(|current| *current == id)
            .unwrap_or(self.state.order.len());
        if position < self.state.order.len() {
            self.state.order.remove(position);
        }
        self.record(Undo::NoteRemoved { note, position });
        Ok(())
    }

    fn list_notes(&self, filter: &NoteFilter) -> RepoResult<Vec<Note>> {
        let effective = filter.effective();
        let keyword = match &effective {
            EffectiveFilter::Keyword(keyword) => Some(keyword.to_lowercase()),
            _ => None,
        };

        let notes = self
            .state
            .order
            .iter()
            .filter_map(|id| self.state.notes.get(id))
            .filter(|note| match &effective {
                EffectiveFilter::All => true,
                EffectiveFilter::Tag(tag) => note.tags.iter().any(|value| value == tag),
                EffectiveFilter::Keyword(_) => keyword.as_deref().is_some_and(|needle| {
                    note.title.to_lowercase().contains(needle)
                        || note.content.to_lowercase().contains(needle)
                }),
            })
            .cloned()
            .collect();
        Ok(notes)
    }

    fn resolve_titles(&self, ids: &[NoteId]) -> RepoResult<Vec<String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.state.notes.get(id))
            .map(|note| note.title.clone())
            .collect())
    }

    fn list_tags(&self) -> RepoResult<Vec<String>> {
        Ok(self.state.tags.iter().cloned().collect())
    }
}

impl LinkGraph for MemoryZettelStore {
    fn add_edge(&mut self, source: NoteId, target: NoteId) -> RepoResult<bool> {
        if source == target {
            return Err(RepoError::SelfLink(source));
        }
        for endpoint in [source, target] {
            if !self.state.notes.contains_key(&endpoint) {
                return Err(RepoError::NotFound(endpoint));
            }
        }

        let state = &mut self.state;
        if !state.edges.insert((source, target)) {
            return Ok(false);
        }
        state.forward.entry(source).or_default().push(target);
        state.reverse.entry(target).or_default().push(source);
        self.record(Undo::EdgeInserted(source, target));
        Ok(true)
    }

    fn has_edge(&self, source: NoteId, target: NoteId) -> RepoResult<bool> {
        Ok(self.state.edges.contains(&(source, target)))
    }

    fn remove_note_edges(&mut self, id: NoteId) -> RepoResult<()> {
        let targets = self.state.forward.get(&id).cloned().unwrap_or_default();
        for target in targets.into_iter().rev() {
            self.unlink(id, target);
        }
        let sources = self.state.reverse.get(&id).cloned().unwrap_or_default();
        for source in sources.into_iter().rev() {
            self.unlink(source, id);
        }
        Ok(())
    }

    fn forward_links(&self, id: NoteId) -> RepoResult<Vec<NoteId>> {
        Ok(self.state.forward.get(&id).cloned().unwrap_or_default())
    }

    fn backlinks(&self, id: NoteId) -> RepoResult<Vec<NoteId>> {
        Ok(self.state.reverse.get(&id).cloned().unwrap_or_default())
    }

    fn adjacency(&self) -> RepoResult<Vec<(NoteId, Vec<NoteId>)>> {
        Ok(self
            .state
            .order
            .iter()
            .filter_map(|id| {
                self.state
                    .forward
                    .get(id)
                    .map(|targets| (*id, targets.clone()))
            })
            .collect())
    }
}

/// Removes `neighbour` from `index[key]`, dropping the entry once empty.
///
/// Returns the position it held.
fn detach(
    index: &mut HashMap<NoteId, Vec<NoteId>>,
    key: NoteId,
    neighbour: NoteId,
) -> Option<usize> {
    let values = index.get_mut(&key)?;
    let position = values.iter().position(|value| *value == neighbour)?;
    values.remove(position);
    if values.is_empty() {
        index.remove(&key);
    }
    Some(position)
}

fn reattach(
    index: &mut HashMap<NoteId, Vec<NoteId>>,
    key: NoteId,
    neighbour: NoteId,
    position: usize,
) {
    let values = index.entry(key).or_default();
    let position = position.min(values.len());
    values.insert(position, neighbour);
}

#[cfg(test)]
mod tests {
    use super::MemoryZettelStore;
    use crate::model::note::{NoteDraft, NoteFilter, NoteId, NotePatch};
    use crate::repo::{LinkGraph, NoteStore, RepoError, ZettelStore};

    #[test]
    fn indexes_stay_consistent_after_cascade() {
        let mut store = MemoryZettelStore::new();
        let a = store.create_note(&NoteDraft::new("A", "a")).unwrap();
        let b = store.create_note(&NoteDraft::new("B", "b")).unwrap();
        let c = store.create_note(&NoteDraft::new("C", "c")).unwrap();
        store.add_edge(a.id, b.id).unwrap();
        store.add_edge(c.id, b.id).unwrap();
        store.add_edge(b.id, a.id).unwrap();

        store.delete_note(b.id).unwrap();

        assert_eq!(store.edge_count(), 0);
        assert!(store.state.forward.is_empty());
        assert!(store.state.reverse.is_empty());
        assert_eq!(store.note_count(), 2);
    }

    #[test]
    fn failed_unit_restores_previous_state() {
        let mut store = MemoryZettelStore::new();
        let a = store.create_note(&NoteDraft::new("A", "a")).unwrap();

        let result: Result<(), RepoError> = store.atomically(|store| {
            let b = store.create_note(&NoteDraft::new("B", "b"))?;
            store.add_edge(a.id, b.id)?;
            store.add_edge(a.id, a.id)?;
            Ok(())
        });

        assert!(matches!(result, Err(RepoError::SelfLink(_))));
        assert_eq!(store.note_count(), 1);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.find_note_id_by_title("B").unwrap(), None);
        assert!(store.journal.is_none());
    }

    #[test]
    fn failed_inner_unit_keeps_outer_writes() {
        let mut store = MemoryZettelStore::new();
        let a = store.create_note(&NoteDraft::new("A", "a")).unwrap();

        let result: Result<NoteId, RepoError> = store.atomically(|store| {
            let b = store.create_note(&NoteDraft::new("B", "b"))?;
            store.add_edge(a.id, b.id)?;
            let inner: Result<(), RepoError> = store.atomically(|store| {
                store.create_note(&NoteDraft::new("C", "c"))?;
                let rename = NotePatch {
                    title: Some("Renamed".to_string()),
                    ..NotePatch::default()
                };
                store.update_note(a.id, &rename)?;
                store.create_note(&NoteDraft::new("B", "dup"))?;
                Ok(())
            });
            assert!(matches!(inner, Err(RepoError::TitleConflict(_))));
            Ok(b.id)
        });

        let b = result.unwrap();
        assert!(store.journal.is_none());
        assert_eq!(store.note_count(), 2);
        assert_eq!(store.find_note_id_by_title("C").unwrap(), None);
        assert_eq!(store.find_note_id_by_title("A").unwrap(), Some(a.id));
        assert_eq!(store.find_note_id_by_title("Renamed").unwrap(), None);
        assert_eq!(store.forward_links(a.id).unwrap(), vec![b]);
    }

    #[test]
    fn failed_delete_restores_link_order_and_tags() {
        let mut store = MemoryZettelStore::new();
        let a = store.create_note(&NoteDraft::new("A", "a")).unwrap();
        let b = store.create_note(&NoteDraft::new("B", "b")).unwrap();
        let c = store.create_note(&NoteDraft::new("C", "c")).unwrap();
        let d = store.create_note(&NoteDraft::new("D", "d")).unwrap();
        let edges = [
            (a.id, b.id),
            (a.id, c.id),
            (a.id, d.id),
            (d.id, c.id),
            (c.id, a.id),
        ];
        for (source, target) in edges {
            store.add_edge(source, target).unwrap();
        }

        let result: Result<(), RepoError> = store.atomically(|store| {
            let retag = NotePatch {
                tags: Some(vec!["fresh".to_string()]),
                ..NotePatch::default()
            };
            store.update_note(b.id, &retag)?;
            store.delete_note(c.id)?;
            store.delete_note(c.id)
        });

        assert!(matches!(result, Err(RepoError::NotFound(_))));
        assert!(store.journal.is_none());
        assert_eq!(store.list_tags().unwrap(), Vec::<String>::new());
        assert!(store.get_note(b.id).unwrap().unwrap().tags.is_empty());
        assert_eq!(store.forward_links(a.id).unwrap(), vec![b.id, c.id, d.id]);
        assert_eq!(store.backlinks(c.id).unwrap(), vec![a.id, d.id]);
        assert_eq!(store.forward_links(c.id).unwrap(), vec![a.id]);
        assert_eq!(store.edge_count(), 5);
        let titles: Vec<_> = store
            .list_notes(&NoteFilter::default())
            .unwrap()
            .into_iter()
            .map(|note| note.title)
            .collect();
        assert_eq!(titles, ["A", "B", "C", "D"]);
    }
}
