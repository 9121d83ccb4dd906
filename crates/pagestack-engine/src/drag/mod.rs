//! Drag sessions and where a drag would land.
//!
//! Only one drag is ever active. An internal drag freezes the set of dragged
//! entities when it starts; each pointer move re-resolves a [`DropTarget`]
//! against the layout's [`DropZones`], and the drop commits through
//! [`Cmd::Move`](crate::editing::Cmd::Move).

mod commit;
pub mod resolve;

pub use resolve::{DropZones, ItemZone, LayoutMode};

use crate::models::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    InsertBeforeItem,
    InsertAfterItem,
    InsertIntoGroup,
}

/// Resolved destination of a pending drop.
///
/// Indices refer to the tree as it was when the target was resolved, before
/// the dragged entities are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub action: DropAction,
    pub container_index: usize,
    /// Position within the group; only meaningful for `InsertIntoGroup`
    pub inner_index: usize,
}

impl DropTarget {
    pub fn before(index: usize) -> Self {
        Self {
            action: DropAction::InsertBeforeItem,
            container_index: index,
            inner_index: 0,
        }
    }

    pub fn after(index: usize) -> Self {
        Self {
            action: DropAction::InsertAfterItem,
            container_index: index,
            inner_index: 0,
        }
    }

    pub fn into_group(index: usize, inner_index: usize) -> Self {
        Self {
            action: DropAction::InsertIntoGroup,
            container_index: index,
            inner_index,
        }
    }

    /// Top-level gap this target points at, for reorder drops
    pub fn top_level_index(&self) -> usize {
        match self.action {
            DropAction::InsertAfterItem => self.container_index + 1,
            _ => self.container_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternalDrag {
    pub origin: EntityId,
    /// Frozen at drag start, in document order
    pub dragged: Vec<EntityId>,
    pub target: Option<DropTarget>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragSession {
    #[default]
    Idle,
    Internal(InternalDrag),
    /// Files from outside the application are hovering over the document
    External,
}

impl DragSession {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragSession::Idle)
    }

    pub fn target(&self) -> Option<DropTarget> {
        match self {
            DragSession::Internal(drag) => drag.target,
            _ => None,
        }
    }

    pub fn is_dragging(&self, id: EntityId) -> bool {
        matches!(self, DragSession::Internal(drag) if drag.dragged.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DropTarget::before(2), 2)]
    #[case(DropTarget::after(2), 3)]
    #[case(DropTarget::into_group(2, 5), 2)]
    fn test_top_level_index(#[case] target: DropTarget, #[case] expected: usize) {
        assert_eq!(target.top_level_index(), expected);
    }
}
