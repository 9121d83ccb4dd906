use pagestack_engine::io::ImportedSource;
use pagestack_engine::viewer::{MAX_SCALE, MIN_SCALE};
use pagestack_engine::{
    Cmd, DragSession, DropTarget, EntityId, ItemId, Modifiers, PageId, Size, SourceKind, Workspace,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

/// Workspace holding group A[p1,p2,p3] followed by a single-image wrapper
fn workspace() -> Workspace {
    let mut workspace = Workspace::new();
    workspace
        .apply(Cmd::Import(vec![
            ImportedSource::new("/docs/a.pdf", SourceKind::File, 3),
            ImportedSource::new("/docs/w.png", SourceKind::Image, 1),
        ]))
        .unwrap();
    workspace
}

fn item(workspace: &Workspace, index: usize) -> ItemId {
    workspace.document().item_at(index).unwrap().id
}

fn pages(workspace: &Workspace, index: usize) -> Vec<PageId> {
    workspace.document().item_at(index).unwrap().pages.clone()
}

#[test]
fn test_delete_page_from_group_keeps_the_rest() {
    let mut workspace = workspace();
    let [p1, p2, p3] = pages(&workspace, 0)[..] else {
        panic!("expected three pages");
    };

    workspace.select_only(EntityId::Page(p2));
    workspace.delete_selected().unwrap();

    assert_eq!(pages(&workspace, 0), vec![p1, p3]);
    assert!(workspace.document().page(p2).is_none());
}

#[test]
fn test_delete_only_page_of_wrapper_removes_wrapper() {
    let mut workspace = workspace();
    let wrapper = item(&workspace, 1);
    let p4 = pages(&workspace, 1)[0];

    workspace.select_only(EntityId::Page(p4));
    workspace.delete_selected().unwrap();

    assert_eq!(workspace.document().len(), 1);
    assert!(workspace.document().item(wrapper).is_none());
}

#[test]
fn test_drag_page_to_top_level_creates_wrapper() {
    let mut workspace = workspace();
    let a = item(&workspace, 0);
    let [p1, p2, p3] = pages(&workspace, 0)[..] else {
        panic!("expected three pages");
    };
    workspace.select_only(EntityId::Page(p2));
    workspace.delete_selected().unwrap();

    workspace
        .apply(Cmd::Move {
            dragged: vec![EntityId::Page(p1)],
            target: DropTarget::before(0),
        })
        .unwrap();

    let document = workspace.document();
    let wrapper = document.item_at(0).unwrap();
    assert!(!wrapper.is_group);
    assert_eq!(wrapper.pages, vec![p1]);
    assert_eq!(document.item_at(1).unwrap().id, a);
    assert_eq!(pages(&workspace, 1), vec![p3]);
}

#[test]
fn test_drag_into_group_keeps_dragged_order() {
    let mut workspace = workspace();
    let [p1, p2, p3] = pages(&workspace, 0)[..] else {
        panic!("expected three pages");
    };
    let p4 = pages(&workspace, 1)[0];

    workspace.click(EntityId::Page(p4), Modifiers::NONE);
    workspace.click(EntityId::Page(p1), Modifiers::CTRL);
    workspace.begin_drag(EntityId::Page(p1)).unwrap();
    let dragged = dragged_of(&workspace);
    assert_eq!(dragged, vec![EntityId::Page(p1), EntityId::Page(p4)]);

    workspace
        .apply(Cmd::Move {
            dragged,
            target: DropTarget::into_group(0, 3),
        })
        .unwrap();

    assert_eq!(workspace.document().len(), 1);
    assert_eq!(pages(&workspace, 0), vec![p2, p3, p1, p4]);
}

fn dragged_of(workspace: &Workspace) -> Vec<EntityId> {
    match workspace.drag() {
        DragSession::Internal(drag) => drag.dragged.clone(),
        other => panic!("expected internal drag, got {other:?}"),
    }
}

#[test]
fn test_shift_click_selects_visible_range() {
    let mut workspace = workspace();
    let [p1, p2, p3] = pages(&workspace, 0)[..] else {
        panic!("expected three pages");
    };

    workspace.click(EntityId::Page(p1), Modifiers::NONE);
    workspace.click(EntityId::Page(p3), Modifiers::SHIFT);

    let expected: HashSet<EntityId> = [p1, p2, p3].into_iter().map(EntityId::Page).collect();
    assert_eq!(workspace.selection().ids(), &expected);
}

#[test]
fn test_viewer_scale_is_clamped() {
    let mut workspace = workspace();
    let p1 = pages(&workspace, 0)[0];
    workspace
        .open_viewer(p1, Size::new(1024.0, 768.0))
        .unwrap();
    let session = workspace.viewer_mut().unwrap();

    assert_eq!(session.set_scale(1000.0), MAX_SCALE);
    assert_eq!(session.set_scale(0.00001), MIN_SCALE);
    assert_eq!(MAX_SCALE, 64.0);
    assert_eq!(MIN_SCALE, 0.0008);
}
