//! Snapshot undo/redo.
//!
//! The undo stack holds the state as it was *before* each recorded mutation.
//! It is seeded with one floor entry that is never restored, so
//! `can_undo` means "more than one entry". Snapshots are `Arc`-wrapped so
//! moving them between the stacks never clones the state.

use std::collections::VecDeque;
use std::sync::Arc;

/// Most snapshots retained on the undo stack; the oldest are evicted first
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct History<T> {
    undo: VecDeque<Arc<T>>,
    redo: Vec<Arc<T>>,
    limit: usize,
}

impl<T: Clone> History<T> {
    pub fn new(seed: T) -> Self {
        Self::with_limit(seed, HISTORY_LIMIT)
    }

    pub fn with_limit(seed: T, limit: usize) -> Self {
        let mut undo = VecDeque::with_capacity(limit.min(HISTORY_LIMIT));
        undo.push_back(Arc::new(seed));
        Self {
            undo,
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the state prior to a mutation. Starts a new branch.
    pub fn push(&mut self, before: T) {
        self.redo.clear();
        self.undo.push_back(Arc::new(before));
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Swap `current` for the most recent recorded state
    pub fn undo(&mut self, current: T) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        let previous = self.undo.pop_back()?;
        self.redo.push(Arc::new(current));
        Some(Arc::unwrap_or_clone(previous))
    }

    /// Swap `current` for the most recently undone state
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo.pop()?;
        self.undo.push_back(Arc::new(current));
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        Some(Arc::unwrap_or_clone(next))
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Entries on the undo stack, floor included
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Forget everything and start again from `seed`
    pub fn reset(&mut self, seed: T) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(Arc::new(seed));
    }
}
