use zettel_core::{LinkGraph, NoteDraft, NoteId, NoteStore, RepoError, ZettelStore};

macro_rules! on_both_backends {
    ($($name:ident => $check:ident;)*) => {
        $(
            mod $name {
                #[test]
                fn sqlite() {
                    let conn = zettel_core::db::open_db_in_memory().unwrap();
                    let mut store = zettel_core::SqliteZettelStore::try_new(&conn).unwrap();
                    super::$check(&mut store);
                }

                #[test]
                fn memory() {
                    let mut store = zettel_core::MemoryZettelStore::new();
                    super::$check(&mut store);
                }
            }
        )*
    };
}

on_both_backends! {
    forward_and_backlinks_are_symmetric => check_symmetry;
    self_link_is_rejected => check_self_link;
    adding_an_edge_twice_keeps_one => check_idempotent_add;
    missing_endpoint_is_not_found => check_missing_endpoint;
    deleting_a_note_cascades_its_edges => check_delete_cascade;
    neighbours_keep_link_creation_order => check_link_order;
    adjacency_skips_notes_without_outgoing_links => check_adjacency;
}

fn seed<S: ZettelStore>(store: &mut S, titles: &[&str]) -> Vec<NoteId> {
    titles
        .iter()
        .map(|title| {
            store
                .create_note(&NoteDraft::new(*title, format!("{title} body")))
                .unwrap()
                .id
        })
        .collect()
}

fn check_symmetry<S: ZettelStore>(store: &mut S) {
    let ids = seed(store, &["A", "B", "C"]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    store.add_edge(a, b).unwrap();
    store.add_edge(c, b).unwrap();
    store.add_edge(b, a).unwrap();

    for &source in &ids {
        for target in store.forward_links(source).unwrap() {
            assert!(store.backlinks(target).unwrap().contains(&source));
        }
    }
    for &target in &ids {
        for source in store.backlinks(target).unwrap() {
            assert!(store.forward_links(source).unwrap().contains(&target));
        }
    }
    assert!(store.has_edge(a, b).unwrap());
    assert!(!store.has_edge(a, c).unwrap());
    assert_eq!(store.backlinks(b).unwrap(), vec![a, c]);
}

fn check_self_link<S: ZettelStore>(store: &mut S) {
    let ids = seed(store, &["A"]);
    let err = store.add_edge(ids[0], ids[0]).unwrap_err();
    assert!(matches!(err, RepoError::SelfLink(id) if id == ids[0]));
    assert!(store.forward_links(ids[0]).unwrap().is_empty());
}

fn check_idempotent_add<S: ZettelStore>(store: &mut S) {
    let ids = seed(store, &["A", "B"]);
    assert!(store.add_edge(ids[0], ids[1]).unwrap());
    assert!(!store.add_edge(ids[0], ids[1]).unwrap());
    assert_eq!(store.forward_links(ids[0]).unwrap(), vec![ids[1]]);
    assert_eq!(store.backlinks(ids[1]).unwrap(), vec![ids[0]]);
}

fn check_missing_endpoint<S: ZettelStore>(store: &mut S) {
    let ids = seed(store, &["A"]);
    let ghost = uuid::Uuid::new_v4();
    assert!(matches!(
        store.add_edge(ids[0], ghost).unwrap_err(),
        RepoError::NotFound(id) if id == ghost
    ));
    assert!(matches!(
        store.add_edge(ghost, ids[0]).unwrap_err(),
        RepoError::NotFound(id) if id == ghost
    ));
    assert!(store.forward_links(ghost).unwrap().is_empty());
    assert!(store.backlinks(ghost).unwrap().is_empty());
}

fn check_delete_cascade<S: ZettelStore>(store: &mut S) {
    let ids = seed(store, &["A", "B", "C"]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    store.add_edge(a, b).unwrap();
    store.add_edge(b, c).unwrap();
    store.add_edge(c, a).unwrap();

    store.delete_note(b).unwrap();

    assert!(store.forward_links(a).unwrap().is_empty());
    assert!(store.backlinks(c).unwrap().is_empty());
    assert_eq!(store.forward_links(c).unwrap(), vec![a]);
    assert!(store.forward_links(b).unwrap().is_empty());
    assert!(store.backlinks(b).unwrap().is_empty());
    let sources: Vec<NoteId> = store
        .adjacency()
        .unwrap()
        .into_iter()
        .map(|(source, _)| source)
        .collect();
    assert_eq!(sources, vec![c]);
}

fn check_link_order<S: ZettelStore>(store: &mut S) {
    let ids = seed(store, &["Hub", "Z", "M", "A"]);
    let hub = ids[0];
    for &target in &[ids[1], ids[2], ids[3]] {
        store.add_edge(hub, target).unwrap();
    }
    assert_eq!(store.forward_links(hub).unwrap(), vec![ids[1], ids[2], ids[3]]);
    assert_eq!(
        store.resolve_titles(&store.forward_links(hub).unwrap()).unwrap(),
        vec!["Z".to_string(), "M".to_string(), "A".to_string()]
    );
}

fn check_adjacency<S: ZettelStore>(store: &mut S) {
    let ids = seed(store, &["A", "B", "C", "Isolated"]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    store.add_edge(b, c).unwrap();
    store.add_edge(a, c).unwrap();
    store.add_edge(a, b).unwrap();

    assert_eq!(
        store.adjacency().unwrap(),
        vec![(a, vec![c, b]), (b, vec![c])]
    );
}
