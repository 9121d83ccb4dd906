use std::collections::HashSet;

use log::debug;

use crate::drag::DropTarget;
use crate::editing::{Document, EditError};
use crate::io::ImportedSource;
use crate::models::{ColorTag, EntityId, Item, ItemId, Page, PageId, Rotation, SourceKind};

/// Every undoable change to the page tree
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Append newly probed sources; names already present are skipped
    Import(Vec<ImportedSource>),
    /// Commit a drag of `dragged` onto `target`
    Move {
        dragged: Vec<EntityId>,
        target: DropTarget,
    },
    Duplicate(Vec<EntityId>),
    /// Send pages back to the item they were extracted from
    Revert(Vec<EntityId>),
    /// Turn every reachable page a quarter turn clockwise
    Rotate(Vec<EntityId>),
    Delete(Vec<EntityId>),
    /// Keyboard move of one entity by one position
    Shift {
        entity: EntityId,
        direction: Direction,
    },
}

impl Cmd {
    pub fn name(&self) -> &'static str {
        match self {
            Cmd::Import(_) => "import",
            Cmd::Move { .. } => "move",
            Cmd::Duplicate(_) => "duplicate",
            Cmd::Revert(_) => "revert",
            Cmd::Rotate(_) => "rotate",
            Cmd::Delete(_) => "delete",
            Cmd::Shift { .. } => "shift",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    pub fn delta(self) -> isize {
        match self {
            Direction::Backward => -1,
            Direction::Forward => 1,
        }
    }
}

/// Side effects of a command beyond the tree itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    pub invalidated: Vec<PageId>,
    pub created: Vec<EntityId>,
}

impl Document {
    /// Apply a command and sanitize the tree.
    ///
    /// The tree is sanitized even when the command fails part way, so an
    /// error never leaves it structurally invalid.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Effects, EditError> {
        debug!("Applying {} command", cmd.name());
        let result = match cmd {
            Cmd::Import(sources) => Ok(self.import_sources(sources)),
            Cmd::Move { dragged, target } => self.commit_drop(&dragged, target),
            Cmd::Duplicate(targets) => self.duplicate(&targets),
            Cmd::Revert(targets) => self.revert(&targets),
            Cmd::Rotate(targets) => self.rotate(&targets),
            Cmd::Delete(targets) => self.delete(&targets),
            Cmd::Shift { entity, direction } => self.shift(entity, direction),
        };
        self.sanitize();
        result
    }

    /// Check every target exists and return them top to bottom without repeats
    fn resolve_targets(&self, targets: &[EntityId]) -> Result<Vec<EntityId>, EditError> {
        if let Some(missing) = targets.iter().find(|t| !self.contains(**t)) {
            return Err(EditError::UnknownEntity(*missing));
        }
        Ok(self.in_document_order(targets.iter().copied()))
    }

    fn import_sources(&mut self, sources: Vec<ImportedSource>) -> Effects {
        let mut effects = Effects::default();
        for source in sources {
            if source.page_count == 0 {
                debug!("Skipping {}: no pages", source.name);
                continue;
            }
            if self.has_item_named(&source.name) {
                debug!("Skipping {}: already imported", source.name);
                continue;
            }

            let color = ColorTag::for_index(self.len());
            let is_group = source.kind == SourceKind::File || source.page_count > 1;
            let item = Item {
                is_group,
                ..Item::group(
                    source.name.clone(),
                    source.kind,
                    Some(source.path.clone()),
                    color,
                )
            };

            let pages = (0..source.page_count)
                .map(|index| {
                    let name = if is_group {
                        format!("Page {}", index + 1)
                    } else {
                        source.name.clone()
                    };
                    Page::new(name, source.kind, source.path.clone(), item.id, index, color)
                })
                .collect();

            let id = self.add_item(item, pages);
            effects.created.push(EntityId::Item(id));
        }
        effects
    }

    fn duplicate(&mut self, targets: &[EntityId]) -> Result<Effects, EditError> {
        let mut effects = Effects::default();
        for target in self.resolve_targets(targets)? {
            match target {
                EntityId::Item(id) => {
                    let copy = self.duplicate_item(id)?;
                    effects.created.push(EntityId::Item(copy));
                }
                EntityId::Page(page) => {
                    let (index, inner) = self
                        .owner_of(page)
                        .ok_or(EditError::UnknownEntity(target))?;
                    let owner = self.order[index];

                    if self.items.get(&owner).is_some_and(Item::is_wrapper) {
                        let copy = self.duplicate_item(owner)?;
                        if let Some(first) = self.items.get(&copy).and_then(|i| i.pages.first()) {
                            effects.created.push(EntityId::Page(*first));
                        }
                        continue;
                    }

                    let copy = self
                        .page(page)
                        .ok_or(EditError::UnknownEntity(target))?
                        .duplicate();
                    let copy = self.register_page(copy);
                    if let Some(group) = self.item_mut(owner) {
                        group.pages.insert(inner + 1, copy);
                    }
                    effects.created.push(EntityId::Page(copy));
                }
            }
        }
        Ok(effects)
    }

    /// Clone a top-level item under fresh ids, right after the original.
    /// The cloned pages take the clone as their provenance.
    fn duplicate_item(&mut self, id: ItemId) -> Result<ItemId, EditError> {
        let missing = EditError::UnknownEntity(EntityId::Item(id));
        let index = self.index_of(id).ok_or(missing.clone())?;
        let original = self.items.get(&id).ok_or(missing)?.clone();

        let copy_id = ItemId::new();
        let pages = original
            .pages
            .iter()
            .filter_map(|page| self.pages.get(page))
            .map(|page| Page {
                source_item: copy_id,
                ..page.duplicate()
            })
            .collect();

        self.register_item(
            Item {
                id: copy_id,
                ..original
            },
            pages,
        );
        self.order.insert(index + 1, copy_id);
        Ok(copy_id)
    }

    fn revert(&mut self, targets: &[EntityId]) -> Result<Effects, EditError> {
        let mut effects = Effects::default();
        for target in self.resolve_targets(targets)? {
            let EntityId::Page(page_id) = target else {
                continue;
            };
            let page = self.page(page_id).ok_or(EditError::UnknownEntity(target))?;
            let (source, source_index, rotated) =
                (page.source_item, page.source_index, page.rotation != Rotation::Deg0);
            if rotated {
                effects.invalidated.push(page_id);
            }

            // A wrapper that is its own source is already home
            if let Some(owner) = self.owner_item(page_id)
                && owner.id == source
                && owner.is_wrapper()
            {
                if let Some(page) = self.page_mut(page_id) {
                    page.rotation = Rotation::Deg0;
                }
                continue;
            }

            self.detach(&HashSet::from([target]));
            if let Some(page) = self.page_mut(page_id) {
                page.rotation = Rotation::Deg0;
            }

            match self.index_of(source) {
                Some(index) => {
                    let position = self
                        .pages_of(source)
                        .position(|p| p.source_index > source_index)
                        .unwrap_or_else(|| self.item(source).map_or(0, |i| i.pages.len()));
                    self.insert_pages_into_group(index, position, vec![page_id])?;
                }
                None => {
                    let wrapper = self.wrap_page(page_id)?;
                    self.order.push(wrapper);
                    effects.created.push(EntityId::Item(wrapper));
                }
            }
        }
        Ok(effects)
    }

    fn rotate(&mut self, targets: &[EntityId]) -> Result<Effects, EditError> {
        let mut pages: Vec<PageId> = Vec::new();
        for target in self.resolve_targets(targets)? {
            match target {
                EntityId::Item(id) => {
                    pages.extend(self.item(id).into_iter().flat_map(|i| i.pages.iter().copied()));
                }
                EntityId::Page(page) => pages.push(page),
            }
        }

        let mut seen = HashSet::new();
        pages.retain(|page| seen.insert(*page));
        for id in &pages {
            if let Some(page) = self.page_mut(*id) {
                page.rotation = page.rotation.clockwise();
            }
        }

        Ok(Effects {
            invalidated: pages,
            created: Vec::new(),
        })
    }

    fn delete(&mut self, targets: &[EntityId]) -> Result<Effects, EditError> {
        let targets: HashSet<EntityId> = self.resolve_targets(targets)?.into_iter().collect();
        let removal = self.detach(&targets);
        debug!("Deleted {} entities", removal.entities.len());
        Ok(Effects::default())
    }

    fn shift(&mut self, entity: EntityId, direction: Direction) -> Result<Effects, EditError> {
        let delta = direction.delta();
        let len = self.order.len();

        let top_level = match entity {
            EntityId::Item(id) => self.index_of(id),
            EntityId::Page(page) => self
                .owner_of(page)
                .filter(|(index, _)| self.item_at(*index).is_some_and(Item::is_wrapper))
                .map(|(index, _)| index),
        };

        if let Some(index) = top_level {
            if let Some(next) = index.checked_add_signed(delta).filter(|n| *n < len) {
                self.order.swap(index, next);
            }
            return Ok(Effects::default());
        }

        let EntityId::Page(page) = entity else {
            return Err(EditError::UnknownEntity(entity));
        };
        let (index, inner) = self
            .owner_of(page)
            .ok_or(EditError::UnknownEntity(entity))?;
        let group_id = self.order[index];
        let group = self
            .item_mut(group_id)
            .ok_or(EditError::UnknownEntity(EntityId::Item(group_id)))?;

        if let Some(next) = inner
            .checked_add_signed(delta)
            .filter(|n| *n < group.pages.len())
        {
            group.pages.swap(inner, next);
            return Ok(Effects::default());
        }

        // Past the group boundary: eject into a wrapper beside the group
        group.pages.remove(inner);
        let wrapper = self.wrap_page(page)?;
        let at = match direction {
            Direction::Backward => index,
            Direction::Forward => index + 1,
        };
        self.insert_top_level(at, vec![wrapper]);
        Ok(Effects {
            invalidated: Vec::new(),
            created: vec![EntityId::Item(wrapper)],
        })
    }
}
