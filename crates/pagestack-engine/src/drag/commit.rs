use std::collections::HashSet;

use crate::drag::{DropAction, DropTarget};
use crate::editing::{Detached, Document, EditError, Effects};
use crate::models::{EntityId, ItemId, PageId};

impl Document {
    /// Move `dragged` to `target`.
    ///
    /// The destination group is captured by id before anything is removed,
    /// and both the top-level and the inner index are corrected for dragged
    /// entities that sat in front of them. Dropping into a group unwraps
    /// dragged items into their pages; reordering wraps bare pages in new
    /// wrappers. Ids no longer in the tree are ignored.
    pub(crate) fn commit_drop(
        &mut self,
        dragged: &[EntityId],
        target: DropTarget,
    ) -> Result<Effects, EditError> {
        let dragged: HashSet<EntityId> = dragged
            .iter()
            .copied()
            .filter(|e| self.contains(*e))
            .collect();
        if dragged.is_empty() {
            return Ok(Effects::default());
        }

        let len = self.order.len();
        let container = self.order.get(target.container_index).copied();
        let into_group = match (target.action, container) {
            (DropAction::InsertIntoGroup, None) => {
                return Err(EditError::ContainerOutOfRange {
                    index: target.container_index,
                    len,
                });
            }
            (DropAction::InsertIntoGroup, Some(group)) => {
                if dragged.contains(&EntityId::Item(group)) {
                    return Err(EditError::DropIntoDraggedGroup(group));
                }
                let inner = self.inner_index_after_removal(group, target.inner_index, &dragged);
                Some((group, inner))
            }
            _ => None,
        };

        let removal = self.detach(&dragged);

        if let Some((group, inner)) = into_group {
            // The container can vanish with the removal, e.g. a wrapper whose
            // only page was dragged; fall back to reordering at its position
            if let Some(index) = self.index_of(group) {
                let pages = self.unwrap_detached(&removal.entities);
                self.insert_pages_into_group(index, inner, pages)?;
                return Ok(Effects::default());
            }
        }

        let index = removal.adjust_index(target.top_level_index());
        let mut created = Vec::new();
        let mut items = Vec::with_capacity(removal.entities.len());
        for entity in &removal.entities {
            match entity {
                Detached::Item(id) => items.push(*id),
                Detached::Page(page) => {
                    let wrapper = self.wrap_page(*page)?;
                    created.push(EntityId::Item(wrapper));
                    items.push(wrapper);
                }
            }
        }
        self.insert_top_level(index, items);

        Ok(Effects {
            invalidated: Vec::new(),
            created,
        })
    }

    fn inner_index_after_removal(
        &self,
        group: ItemId,
        inner_index: usize,
        dragged: &HashSet<EntityId>,
    ) -> usize {
        let Some(item) = self.item(group) else {
            return inner_index;
        };
        let end = inner_index.min(item.pages.len());
        let removed_before = item.pages[..end]
            .iter()
            .filter(|page| dragged.contains(&EntityId::Page(**page)))
            .count();
        inner_index - removed_before
    }

    fn unwrap_detached(&self, entities: &[Detached]) -> Vec<PageId> {
        entities
            .iter()
            .flat_map(|entity| match entity {
                Detached::Item(id) => self
                    .item(*id)
                    .map(|item| item.pages.clone())
                    .unwrap_or_default(),
                Detached::Page(page) => vec![*page],
            })
            .collect()
    }
}
