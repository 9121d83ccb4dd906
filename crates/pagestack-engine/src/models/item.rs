use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{ColorTag, ItemId, Page, PageId, SourceKind};

/// A top-level unit of the document: either a group of pages or a
/// single-page wrapper.
///
/// Items only hold the ids of their pages; the pages themselves live in the
/// [`Document`](crate::editing::Document) arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: SourceKind,
    pub name: String,
    /// Source file, if the item was imported rather than created by a drag
    pub path: Option<PathBuf>,
    /// Groups survive being emptied; wrappers are pruned with their last page
    pub is_group: bool,
    pub expanded: bool,
    pub pages: Vec<PageId>,
    pub color: ColorTag,
}

impl Item {
    /// Multi-page container for an imported document
    pub fn group(
        name: impl Into<String>,
        kind: SourceKind,
        path: Option<PathBuf>,
        color: ColorTag,
    ) -> Self {
        Self {
            id: ItemId::new(),
            kind,
            name: name.into(),
            path,
            is_group: true,
            expanded: true,
            pages: Vec::new(),
            color,
        }
    }

    /// Single-page wrapper that takes its identity from the page it holds
    pub fn wrapper_for(page: &Page) -> Self {
        Self {
            id: ItemId::new(),
            kind: page.kind,
            name: page.name.clone(),
            path: None,
            is_group: false,
            expanded: true,
            pages: vec![page.id],
            color: page.color,
        }
    }

    pub fn is_wrapper(&self) -> bool {
        !self.is_group
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn position_of(&self, page: PageId) -> Option<usize> {
        self.pages.iter().position(|p| *p == page)
    }
}
