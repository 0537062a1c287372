//! Read-side query facade.
//!
//! Joins note records with the link graph and translates neighbour ids into
//! titles for display. All functions are read-only.

use crate::model::note::{Note, NoteFilter, NoteId};
use crate::model::view::{GraphView, NoteView};
use crate::repo::{LinkGraph, NoteStore, RepoResult};

/// Builds the enriched view of an already loaded note.
pub fn enrich<S>(store: &S, note: Note) -> RepoResult<NoteView>
where
    S: NoteStore + LinkGraph,
{
    let links = store.resolve_titles(&store.forward_links(note.id)?)?;
    let backlinks = store.resolve_titles(&store.backlinks(note.id)?)?;
    Ok(NoteView::from_note(note, links, backlinks))
}

/// Returns the enriched view of note `id`, or `None` when it does not exist.
pub fn get_enriched<S>(store: &S, id: NoteId) -> RepoResult<Option<NoteView>>
where
    S: NoteStore + LinkGraph,
{
    store
        .get_note(id)?
        .map(|note| enrich(store, note))
        .transpose()
}

/// Lists notes matching `filter`, each enriched with its links.
pub fn search<S>(store: &S, filter: &NoteFilter) -> RepoResult<Vec<NoteView>>
where
    S: NoteStore + LinkGraph,
{
    store
        .list_notes(filter)?
        .into_iter()
        .map(|note| enrich(store, note))
        .collect()
}

/// Exports the whole graph keyed by source title.
pub fn graph_view<S>(store: &S) -> RepoResult<GraphView>
where
    S: NoteStore + LinkGraph,
{
    let mut graph = GraphView::new();
    for (source, targets) in store.adjacency()? {
        let Some(source_title) = store.resolve_titles(&[source])?.pop() else {
            continue;
        };
        let target_titles = store.resolve_titles(&targets)?;
        if !target_titles.is_empty() {
            graph.insert(source_title, target_titles);
        }
    }
    Ok(graph)
}
