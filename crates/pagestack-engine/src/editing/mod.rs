/*!
 * # Editing Core
 *
 * The page tree, the commands that mutate it, and the interaction state that
 * feeds those commands.
 *
 * ## Architecture Overview
 *
 * ### 1. Arena document
 * - [`Document`] keeps items and pages in id-keyed arenas with a single
 *   top-level order; structure is only ever navigated by id lookup
 * - [`Document::sanitize`] restores the structural invariants after every
 *   mutation and is idempotent
 *
 * ### 2. Command-based mutation
 * - Every undoable edit is a [`Cmd`] applied with [`Document::apply`]
 * - Multi-target commands resolve their targets in document order first
 *
 * ### 3. Snapshot history
 * - [`History`] stores whole-document snapshots taken before each command
 * - Render caches live outside the document, so snapshots never carry them
 *
 * ### 4. Workspace facade
 * - [`Workspace`] owns the document, history, selection, drag session,
 *   viewer and render cache, and is the only place commands are recorded
 *
 * ## Usage Pattern
 *
 * ```rust
 * use pagestack_engine::editing::{Cmd, Workspace};
 * use pagestack_engine::io::ImportedSource;
 * use pagestack_engine::models::SourceKind;
 *
 * let mut workspace = Workspace::new();
 * workspace
 *     .apply(Cmd::Import(vec![ImportedSource::new("scan.pdf", SourceKind::File, 3)]))
 *     .unwrap();
 *
 * let visible = workspace.visible_order(false);
 * workspace.click(visible[2], Default::default());
 * workspace.delete_selected().unwrap();
 * assert_eq!(workspace.document().page_count(), 2);
 *
 * workspace.undo();
 * assert_eq!(workspace.document().page_count(), 3);
 * ```
 */

pub mod commands;
pub mod document;
pub mod history;
pub mod patch;
pub mod selection;
pub mod workspace;

pub use commands::{Cmd, Direction, Effects};
pub use document::{Detached, Document, Removal};
pub use history::{HISTORY_LIMIT, History};
pub use patch::Patch;
pub use selection::{Modifiers, Selection};
pub use workspace::Workspace;

use crate::models::{EntityId, ItemId};

/// Failure at the mutation boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Entity not in document: {0}")]
    UnknownEntity(EntityId),
    #[error("Container index {index} out of range for {len} items")]
    ContainerOutOfRange { index: usize, len: usize },
    #[error("No drag in progress")]
    NoActiveDrag,
    #[error("No drop target under the pointer")]
    NoDropTarget,
    #[error("Cannot drop group {0} into itself")]
    DropIntoDraggedGroup(ItemId),
    #[error("Viewer is not open")]
    ViewerClosed,
}
