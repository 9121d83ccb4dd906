use pagestack_engine::io::ImportedSource;
use pagestack_engine::{
    Cmd, Direction, Document, DropTarget, EntityId, ItemId, PageId, SourceKind, Workspace,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashSet;

fn sources() -> Vec<ImportedSource> {
    vec![
        ImportedSource::new("/docs/a.pdf", SourceKind::File, 5),
        ImportedSource::new("/docs/b.png", SourceKind::Image, 1),
        ImportedSource::new("/docs/c.pdf", SourceKind::File, 3),
        ImportedSource::new("/docs/d.jpg", SourceKind::Image, 1),
    ]
}

fn workspace() -> Workspace {
    let mut workspace = Workspace::new();
    workspace.apply(Cmd::Import(sources())).unwrap();
    workspace
}

fn item(doc: &Document, index: usize) -> ItemId {
    doc.item_at(index).unwrap().id
}

fn pages(doc: &Document, index: usize) -> Vec<PageId> {
    doc.item_at(index).unwrap().pages.clone()
}

fn page_names(doc: &Document, index: usize) -> Vec<String> {
    doc.pages_of(item(doc, index))
        .map(|page| page.name.clone())
        .collect()
}

/// One command of each kind against the standard workspace
fn command(kind: &str, doc: &Document) -> Cmd {
    let a = pages(doc, 0);
    let b = pages(doc, 1)[0];
    match kind {
        "move" => Cmd::Move {
            dragged: vec![EntityId::Page(a[1]), EntityId::Page(b)],
            target: DropTarget::into_group(2, 1),
        },
        "duplicate" => Cmd::Duplicate(vec![EntityId::Item(item(doc, 0)), EntityId::Page(b)]),
        "rotate" => Cmd::Rotate(vec![EntityId::Item(item(doc, 2)), EntityId::Page(a[0])]),
        "delete" => Cmd::Delete(vec![EntityId::Page(a[2]), EntityId::Item(item(doc, 3))]),
        // The page the setup moved out into its own wrapper
        "revert" => Cmd::Revert(vec![EntityId::Page(pages(doc, 4)[0])]),
        "shift" => Cmd::Shift {
            entity: EntityId::Page(a[0]),
            direction: Direction::Backward,
        },
        other => panic!("unknown command kind {other}"),
    }
}

#[rstest]
#[case("move")]
#[case("duplicate")]
#[case("rotate")]
#[case("delete")]
#[case("revert")]
#[case("shift")]
fn test_undo_then_redo_reproduces_tree(#[case] kind: &str) {
    let mut workspace = workspace();
    // Move a page out first so revert has something to do
    let a = pages(workspace.document(), 0);
    workspace
        .apply(Cmd::Move {
            dragged: vec![EntityId::Page(a[3])],
            target: DropTarget::after(3),
        })
        .unwrap();

    let before = workspace.document().clone();
    let cmd = command(kind, workspace.document());
    let patch = workspace.apply(cmd).unwrap();
    assert!(patch.changed);
    let after = workspace.document().clone();

    assert!(workspace.undo());
    assert_eq!(workspace.document(), &before);
    assert!(workspace.redo());
    assert_eq!(workspace.document(), &after);
}

#[rstest]
#[case("move")]
#[case("duplicate")]
#[case("rotate")]
#[case("delete")]
#[case("shift")]
fn test_sanitize_is_idempotent_after_commands(#[case] kind: &str) {
    let mut workspace = workspace();
    let cmd = command(kind, workspace.document());
    workspace.apply(cmd).unwrap();

    let mut doc = workspace.document().clone();
    assert!(!doc.sanitize());
    assert_eq!(&doc, workspace.document());
}

#[test]
fn test_history_never_exceeds_limit() {
    let mut workspace = workspace();
    let page = pages(workspace.document(), 1)[0];
    for _ in 0..120 {
        workspace.apply(Cmd::Rotate(vec![EntityId::Page(page)])).unwrap();
    }

    let mut undone = 0;
    while workspace.undo() {
        undone += 1;
    }
    assert!(undone < pagestack_engine::editing::HISTORY_LIMIT);
}

#[test]
fn test_remove_and_reinsert_preserves_relative_order() {
    let mut workspace = workspace();
    let doc = workspace.document();
    let a = pages(doc, 0);
    let c = pages(doc, 2);
    let d = pages(doc, 3)[0];
    // Deliberately listed out of document order
    let dragged = vec![
        EntityId::Page(d),
        EntityId::Page(c[0]),
        EntityId::Page(a[4]),
        EntityId::Page(a[1]),
    ];

    workspace
        .apply(Cmd::Move {
            dragged,
            target: DropTarget::before(1),
        })
        .unwrap();

    let doc = workspace.document();
    let top: Vec<PageId> = (1..5).map(|i| pages(doc, i)[0]).collect();
    assert_eq!(top, vec![a[1], a[4], c[0], d]);
}

#[test]
fn test_revert_reinserts_by_source_index() {
    let mut workspace = workspace();
    let a = pages(workspace.document(), 0);
    workspace
        .apply(Cmd::Move {
            dragged: vec![EntityId::Page(a[1]), EntityId::Page(a[3])],
            target: DropTarget::after(3),
        })
        .unwrap();
    assert_eq!(pages(workspace.document(), 0), vec![a[0], a[2], a[4]]);

    workspace.apply(Cmd::Revert(vec![EntityId::Page(a[3])])).unwrap();
    workspace.apply(Cmd::Revert(vec![EntityId::Page(a[1])])).unwrap();

    assert_eq!(pages(workspace.document(), 0), a);
    assert_eq!(workspace.document().len(), 4);
}

#[test]
fn test_duplicate_group_has_fresh_ids_and_same_content() {
    let mut workspace = workspace();
    let original = item(workspace.document(), 0);

    workspace
        .apply(Cmd::Duplicate(vec![EntityId::Item(original)]))
        .unwrap();

    let doc = workspace.document();
    let copy = item(doc, 1);
    assert_ne!(copy, original);
    assert_eq!(page_names(doc, 0), page_names(doc, 1));

    let original_ids: HashSet<PageId> = pages(doc, 0).into_iter().collect();
    assert!(pages(doc, 1).iter().all(|id| !original_ids.contains(id)));
    assert!(doc.pages_of(copy).all(|page| page.source_item == copy));
}
