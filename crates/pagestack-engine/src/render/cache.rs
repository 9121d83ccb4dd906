use std::collections::HashMap;

use crate::models::{PageId, RenderKey};
use crate::render::Bitmap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// Requested, no result yet
    Pending,
    Ready(Bitmap),
    /// Rendering failed; show a placeholder rather than retrying
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: RenderKey,
    pub state: CacheState,
}

/// Thumbnails by page. Kept outside the document so it never enters undo
/// history; an entry is only valid while its key matches the page's.
#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    entries: HashMap<PageId, CacheEntry>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, page: PageId) -> Option<&CacheEntry> {
        self.entries.get(&page)
    }

    /// Entry for `page`, only if it was produced for `key`
    pub fn lookup(&self, page: PageId, key: &RenderKey) -> Option<&CacheState> {
        self.entries
            .get(&page)
            .filter(|entry| entry.key == *key)
            .map(|entry| &entry.state)
    }

    pub fn insert(&mut self, page: PageId, key: RenderKey, state: CacheState) {
        self.entries.insert(page, CacheEntry { key, state });
    }

    pub fn invalidate(&mut self, pages: &[PageId]) {
        for page in pages {
            self.entries.remove(page);
        }
    }

    /// Drop entries for pages `keep` rejects. Returns how many were dropped.
    pub fn prune(&mut self, keep: impl Fn(PageId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|page, _| keep(*page));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
