use std::collections::{HashMap, HashSet};

use crate::editing::EditError;
use crate::models::{EntityId, Item, ItemId, Page, PageId};

/// An entity lifted out of the tree by [`Document::detach`].
///
/// Detached items keep their pages; detached pages are owned by nobody until
/// they are reinserted. Anything still floating at the next
/// [`Document::sanitize`] is dropped from the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detached {
    Item(ItemId),
    Page(PageId),
}

/// Result of removing a set of entities from the tree
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Removed entities in their original top-to-bottom order
    pub entities: Vec<Detached>,
    /// Top-level indices (before removal) of every item that was removed whole
    pub top_level_indices: Vec<usize>,
}

impl Removal {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Shift a top-level insertion index so it points at the same gap after the
    /// removed items are gone.
    pub fn adjust_index(&self, index: usize) -> usize {
        let before = self.top_level_indices.iter().filter(|i| **i < index).count();
        index - before
    }
}

/// The page tree: an ordered list of items, each owning an ordered list of pages.
///
/// Items and pages live in id-keyed arenas; `order` and `Item::pages` carry the
/// structure. Navigation always goes through id lookup, so provenance links
/// (`Page::source_item`) stay valid lookups even after the source is gone.
///
/// Render caches are deliberately absent: a `Document` clone is exactly the
/// structural state recorded in undo history, and `==` compares structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub(crate) order: Vec<ItemId>,
    pub(crate) items: HashMap<ItemId, Item>,
    pub(crate) pages: HashMap<PageId, Page>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of top-level items
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Number of pages reachable from the top-level order
    pub fn page_count(&self) -> usize {
        self.items().map(|item| item.pages.len()).sum()
    }

    /// Top-level items in document order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn item_at(&self, index: usize) -> Option<&Item> {
        self.order.get(index).and_then(|id| self.items.get(id))
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.order.iter().position(|i| *i == id)
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(&id)
    }

    pub(crate) fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.get_mut(&id)
    }

    /// Pages of an item in order
    pub fn pages_of(&self, id: ItemId) -> impl Iterator<Item = &Page> {
        self.items
            .get(&id)
            .into_iter()
            .flat_map(|item| item.pages.iter())
            .filter_map(|page| self.pages.get(page))
    }

    /// Every page in export order
    pub fn flattened_pages(&self) -> impl Iterator<Item = &Page> {
        self.items()
            .flat_map(|item| item.pages.iter())
            .filter_map(|page| self.pages.get(page))
    }

    /// Locate the item currently holding `page`: (top-level index, index within item)
    pub fn owner_of(&self, page: PageId) -> Option<(usize, usize)> {
        self.items()
            .enumerate()
            .find_map(|(idx, item)| item.position_of(page).map(|inner| (idx, inner)))
    }

    pub fn owner_item(&self, page: PageId) -> Option<&Item> {
        self.owner_of(page).and_then(|(idx, _)| self.item_at(idx))
    }

    /// Whether the entity is currently reachable from the top-level order
    pub fn contains(&self, entity: EntityId) -> bool {
        match entity {
            EntityId::Item(id) => self.order.contains(&id),
            EntityId::Page(id) => self.owner_of(id).is_some(),
        }
    }

    pub fn has_item_named(&self, name: &str) -> bool {
        self.items().any(|item| item.name == name)
    }

    /// Append a new item holding `pages` in the given order
    pub fn add_item(&mut self, mut item: Item, pages: Vec<Page>) -> ItemId {
        item.pages = pages.iter().map(|p| p.id).collect();
        for page in pages {
            self.pages.insert(page.id, page);
        }
        let id = item.id;
        self.items.insert(id, item);
        self.order.push(id);
        id
    }

    /// Register a new wrapper for a floating page, without placing it
    pub(crate) fn wrap_page(&mut self, page: PageId) -> Result<ItemId, EditError> {
        let page = self
            .pages
            .get(&page)
            .ok_or(EditError::UnknownEntity(EntityId::Page(page)))?;
        let wrapper = Item::wrapper_for(page);
        let id = wrapper.id;
        self.items.insert(id, wrapper);
        Ok(id)
    }

    /// Register a page in the arena without placing it anywhere
    pub(crate) fn register_page(&mut self, page: Page) -> PageId {
        let id = page.id;
        self.pages.insert(id, page);
        id
    }

    /// Register an item (and its pages) without placing it in the order
    pub(crate) fn register_item(&mut self, mut item: Item, pages: Vec<Page>) -> ItemId {
        item.pages = pages.iter().map(|p| p.id).collect();
        for page in pages {
            self.pages.insert(page.id, page);
        }
        let id = item.id;
        self.items.insert(id, item);
        id
    }

    /// Lift every entity in `ids` out of the tree.
    ///
    /// Items are visited top to bottom; a selected item is removed whole, and
    /// otherwise its selected pages are removed in page order. A selected page
    /// that is the only page of a wrapper takes the wrapper with it, so wrappers
    /// keep their identity when they are moved. Emptied wrappers of other kinds
    /// are left for [`sanitize`](Self::sanitize).
    pub fn detach(&mut self, ids: &HashSet<EntityId>) -> Removal {
        let mut removal = Removal::default();
        let mut kept = Vec::with_capacity(self.order.len());

        for (index, item_id) in self.order.iter().enumerate() {
            let Some(item) = self.items.get_mut(item_id) else {
                continue;
            };

            let whole = ids.contains(&EntityId::Item(*item_id))
                || (item.is_wrapper()
                    && item.pages.len() == 1
                    && ids.contains(&EntityId::Page(item.pages[0])));

            if whole {
                removal.entities.push(Detached::Item(*item_id));
                removal.top_level_indices.push(index);
                continue;
            }

            item.pages.retain(|page| {
                if ids.contains(&EntityId::Page(*page)) {
                    removal.entities.push(Detached::Page(*page));
                    false
                } else {
                    true
                }
            });
            kept.push(*item_id);
        }

        self.order = kept;
        removal
    }

    /// Splice pages into the item at `group_index`, which becomes an expanded group
    pub fn insert_pages_into_group(
        &mut self,
        group_index: usize,
        inner_index: usize,
        pages: Vec<PageId>,
    ) -> Result<(), EditError> {
        let len = self.order.len();
        let id = *self
            .order
            .get(group_index)
            .ok_or(EditError::ContainerOutOfRange {
                index: group_index,
                len,
            })?;
        let group = self
            .items
            .get_mut(&id)
            .ok_or(EditError::UnknownEntity(EntityId::Item(id)))?;

        let at = inner_index.min(group.pages.len());
        group.pages.splice(at..at, pages);
        group.is_group = true;
        group.expanded = true;
        Ok(())
    }

    /// Splice registered items into the top-level order, clamping the index
    pub fn insert_top_level(&mut self, index: usize, items: Vec<ItemId>) {
        let at = index.min(self.order.len());
        self.order.splice(at..at, items);
    }

    /// Restore the structural invariants. Returns whether anything changed.
    ///
    /// - empty wrappers are pruned; empty groups are kept
    /// - a wrapper holding more than one page is promoted to a group
    /// - a page id listed twice keeps only its first occurrence
    /// - items and pages no longer reachable are dropped from the arena
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;

        let before = self.order.len();
        let items = &self.items;
        self.order
            .retain(|id| items.get(id).is_some_and(|item| item.is_group || !item.pages.is_empty()));
        changed |= self.order.len() != before;

        let mut seen: HashSet<PageId> = HashSet::new();
        for id in &self.order {
            let Some(item) = self.items.get_mut(id) else {
                continue;
            };
            let count = item.pages.len();
            let pages = &self.pages;
            item.pages
                .retain(|page| pages.contains_key(page) && seen.insert(*page));
            changed |= item.pages.len() != count;

            if !item.is_group && item.pages.len() > 1 {
                item.is_group = true;
                changed = true;
            }
        }

        // Pruning may have emptied wrappers whose only page was a duplicate
        let before = self.order.len();
        let items = &self.items;
        self.order
            .retain(|id| items.get(id).is_some_and(|item| item.is_group || !item.pages.is_empty()));
        changed |= self.order.len() != before;

        let reachable: HashSet<ItemId> = self.order.iter().copied().collect();
        let item_count = self.items.len();
        self.items.retain(|id, _| reachable.contains(id));
        changed |= self.items.len() != item_count;

        let page_count = self.pages.len();
        self.pages.retain(|id, _| seen.contains(id));
        changed |= self.pages.len() != page_count;

        changed
    }

    /// Flattened selectable ids as presented to the user.
    ///
    /// Wrappers contribute their page; groups contribute their own id followed,
    /// when expanded, by their pages. With `top_level_only` groups never
    /// contribute pages.
    pub fn visible_order(&self, top_level_only: bool) -> Vec<EntityId> {
        let mut visible = Vec::new();
        for item in self.items() {
            if item.is_wrapper() && !item.pages.is_empty() {
                visible.push(EntityId::Page(item.pages[0]));
                continue;
            }
            visible.push(EntityId::Item(item.id));
            if item.expanded && !top_level_only {
                visible.extend(item.pages.iter().map(|p| EntityId::Page(*p)));
            }
        }
        visible
    }

    /// The visible top-level id representing `entity`: wrappers and groups map
    /// to themselves, pages inside groups map to their group.
    pub fn top_level_entity(&self, entity: EntityId) -> Option<EntityId> {
        match entity {
            EntityId::Item(id) => self.order.contains(&id).then_some(entity),
            EntityId::Page(page) => {
                let item = self.owner_item(page)?;
                Some(if item.is_wrapper() {
                    entity
                } else {
                    EntityId::Item(item.id)
                })
            }
        }
    }

    /// Order `entities` top to bottom, dropping anything not in the tree.
    ///
    /// An item sorts immediately before its own pages.
    pub fn in_document_order(&self, entities: impl IntoIterator<Item = EntityId>) -> Vec<EntityId> {
        let mut rank: HashMap<EntityId, usize> = HashMap::new();
        let mut next = 0;
        for item in self.items() {
            rank.insert(EntityId::Item(item.id), next);
            next += 1;
            for page in &item.pages {
                rank.insert(EntityId::Page(*page), next);
                next += 1;
            }
        }

        let mut ordered: Vec<(usize, EntityId)> = entities
            .into_iter()
            .filter_map(|e| rank.get(&e).map(|r| (*r, e)))
            .collect();
        ordered.sort_by_key(|(rank, _)| *rank);
        ordered.dedup_by_key(|(rank, _)| *rank);
        ordered.into_iter().map(|(_, e)| e).collect()
    }
}
