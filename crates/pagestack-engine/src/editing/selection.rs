use std::collections::HashSet;

use crate::models::EntityId;

/// Modifier keys held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl on most platforms, Cmd on macOS
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
    };
}

/// Selected entities plus the anchor that range selection extends from.
///
/// `focus` tracks the far end of a keyboard-extended range so repeated
/// shift+arrow presses grow or shrink the range around a fixed anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: HashSet<EntityId>,
    anchor: Option<EntityId>,
    focus: Option<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    pub fn ids(&self) -> &HashSet<EntityId> {
        &self.selected
    }

    pub fn anchor(&self) -> Option<EntityId> {
        self.anchor
    }

    /// Where keyboard navigation continues from
    pub fn cursor(&self) -> Option<EntityId> {
        self.focus.or(self.anchor)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
        self.focus = None;
    }

    /// Replace the selection with a single entity and anchor on it
    pub fn select_only(&mut self, id: EntityId) {
        self.selected.clear();
        self.selected.insert(id);
        self.anchor = Some(id);
        self.focus = Some(id);
    }

    /// Apply a click on `id`, given the current visible order
    pub fn click(&mut self, id: EntityId, modifiers: Modifiers, visible: &[EntityId]) {
        if modifiers.shift
            && let Some(anchor) = self.anchor
        {
            // An anchor or target outside the visible order leaves the selection alone
            if let Some(range) = range_between(visible, anchor, id) {
                if !modifiers.ctrl {
                    self.selected.clear();
                }
                self.selected.extend(range.iter().copied());
                self.focus = Some(id);
            }
            return;
        }

        if modifiers.ctrl {
            if self.selected.remove(&id) {
                self.anchor = None;
                self.focus = None;
            } else {
                self.selected.insert(id);
                self.anchor = Some(id);
                self.focus = Some(id);
            }
            return;
        }

        self.select_only(id);
    }

    /// Move the cursor by `delta` positions through `visible`, clamping at
    /// both ends.
    ///
    /// `cursor_index` is the position of the current cursor in `visible` when
    /// the caller has already resolved it (for example a page mapped to its
    /// group in top-level navigation). Without a cursor a forward step selects
    /// the first entry and a backward step the last. With `extend` the anchor
    /// stays put and the selection becomes the range from anchor to the new
    /// cursor.
    pub fn step(
        &mut self,
        visible: &[EntityId],
        delta: isize,
        extend: bool,
        cursor_index: Option<usize>,
    ) -> Option<EntityId> {
        let last = visible.len().checked_sub(1)?;

        let target = match (self.cursor(), cursor_index) {
            (None, _) => {
                if delta >= 0 {
                    0
                } else {
                    last
                }
            }
            // Cursor vanished from view (inside a collapsed group, say)
            (Some(_), None) => 0,
            (Some(_), Some(current)) => current.saturating_add_signed(delta).min(last),
        };
        let id = visible[target];

        match self.anchor {
            Some(anchor) if extend => {
                if let Some(range) = range_between(visible, anchor, id) {
                    self.selected.clear();
                    self.selected.extend(range.iter().copied());
                    self.focus = Some(id);
                } else {
                    self.select_only(id);
                }
            }
            _ => self.select_only(id),
        }
        Some(id)
    }

    /// Drop every selected id that fails `keep`
    pub fn retain(&mut self, keep: impl Fn(EntityId) -> bool) {
        self.selected.retain(|id| keep(*id));
        if self.anchor.is_some_and(|a| !keep(a)) {
            self.anchor = None;
        }
        if self.focus.is_some_and(|f| !keep(f)) {
            self.focus = None;
        }
    }
}

fn range_between(visible: &[EntityId], a: EntityId, b: EntityId) -> Option<&[EntityId]> {
    let start = visible.iter().position(|id| *id == a)?;
    let end = visible.iter().position(|id| *id == b)?;
    Some(&visible[start.min(end)..=start.max(end)])
}
