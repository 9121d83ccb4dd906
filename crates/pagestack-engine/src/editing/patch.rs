use crate::models::{EntityId, PageId};

/// Result of applying a command through the [`Workspace`](crate::editing::Workspace)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    /// False when the command turned out to be a no-op and left no history entry
    pub changed: bool,
    /// Document version after the command
    pub version: u64,
    /// Pages whose cached bitmaps no longer match their render key
    pub invalidated: Vec<PageId>,
    /// Entities created by the command, in document order
    pub created: Vec<EntityId>,
}

impl Patch {
    pub fn unchanged(version: u64) -> Self {
        Self {
            changed: false,
            version,
            ..Default::default()
        }
    }
}
