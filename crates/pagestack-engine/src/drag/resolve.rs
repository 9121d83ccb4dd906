use serde::{Deserialize, Serialize};

use crate::drag::DropTarget;
use crate::geometry::{Point, Rect};
use crate::models::{EntityId, ItemId};

/// Inset from a list header's top and bottom edges inside which a drop goes
/// into the group rather than beside it
const HEADER_EDGE: f32 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Grid,
    List,
}

/// Screen geometry of one top-level item as laid out by the front-end
#[derive(Debug, Clone, PartialEq)]
pub struct ItemZone {
    /// Top-level index of the item
    pub index: usize,
    pub id: ItemId,
    pub is_group: bool,
    /// The whole card in grid mode; the header row in list mode
    pub rect: Rect,
    /// Area holding the group's pages, when they are shown
    pub body: Option<Rect>,
    /// Page cards (grid) or child rows (list) in page order
    pub pages: Vec<Rect>,
}

impl ItemZone {
    fn contains(&self, p: Point) -> bool {
        self.rect.contains(p) || self.body.is_some_and(|body| body.contains(p))
    }
}

/// Candidate drop zones for the current layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropZones {
    pub mode: LayoutMode,
    pub items: Vec<ItemZone>,
    /// Dedicated "drop at the end" strip below the last list row
    pub tail: Option<Rect>,
}

impl DropZones {
    pub fn new(mode: LayoutMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Work out where `dragged` would land if released at `pointer`.
    ///
    /// A group is never offered as a destination for itself. Returns `None`
    /// only when there is nothing laid out at all.
    pub fn resolve(&self, pointer: Point, dragged: &[EntityId]) -> Option<DropTarget> {
        match self.mode {
            LayoutMode::Grid => self.resolve_grid(pointer, dragged),
            LayoutMode::List => self.resolve_list(pointer, dragged),
        }
    }

    fn end_target(&self) -> DropTarget {
        self.items
            .last()
            .map_or(DropTarget::before(0), |zone| DropTarget::after(zone.index))
    }

    fn resolve_grid(&self, p: Point, dragged: &[EntityId]) -> Option<DropTarget> {
        // Whole groups are only ever reordered in the grid
        let carrying_items = dragged.iter().any(|e| matches!(e, EntityId::Item(_)));

        if !carrying_items
            && let Some(zone) = self
                .items
                .iter()
                .find(|zone| zone.is_group && zone.contains(p))
        {
            let on_background = zone.body.is_some_and(|body| body.contains(p))
                && !zone.pages.iter().any(|card| card.contains(p));
            if zone.pages.is_empty() || on_background {
                return Some(DropTarget::into_group(zone.index, zone.pages.len()));
            }

            let (inner, card) = nearest(zone.pages.iter().enumerate(), p, |(_, r)| r.center())?;
            let inner = if p.x > card.center().x { inner + 1 } else { inner };
            return Some(DropTarget::into_group(zone.index, inner));
        }

        let zone = nearest(self.items.iter(), p, |zone| zone.rect.top_center())?;
        Some(if p.x > zone.rect.center().x {
            DropTarget::after(zone.index)
        } else {
            DropTarget::before(zone.index)
        })
    }

    fn resolve_list(&self, p: Point, dragged: &[EntityId]) -> Option<DropTarget> {
        if self.tail.is_some_and(|tail| tail.contains(p)) {
            return Some(self.end_target());
        }

        let accepts =
            |zone: &ItemZone| zone.is_group && !dragged.contains(&EntityId::Item(zone.id));

        for zone in self.items.iter().filter(|zone| accepts(*zone)) {
            if let Some((inner, row)) = zone
                .pages
                .iter()
                .enumerate()
                .find(|(_, row)| row.contains(p))
            {
                let inner = if p.y > row.center().y { inner + 1 } else { inner };
                return Some(DropTarget::into_group(zone.index, inner));
            }
        }

        if let Some(zone) = self.items.iter().find(|zone| zone.contains(p)) {
            let header = zone.rect;
            if accepts(zone) && p.y > header.y + HEADER_EDGE && p.y < header.bottom() - HEADER_EDGE
            {
                return Some(DropTarget::into_group(zone.index, zone.pages.len()));
            }
            return Some(beside_row(zone, p));
        }

        let first = self.items.first()?;
        if p.y < first.rect.y {
            return Some(DropTarget::before(first.index));
        }
        let zone = nearest(self.items.iter(), p, |zone| {
            Point::new(p.x, zone.rect.center().y)
        })?;
        Some(beside_row(zone, p))
    }
}

fn beside_row(zone: &ItemZone, p: Point) -> DropTarget {
    if p.y < zone.rect.center().y {
        DropTarget::before(zone.index)
    } else {
        DropTarget::after(zone.index)
    }
}

/// First candidate whose anchor point is closest to `p`
fn nearest<T>(
    candidates: impl Iterator<Item = T>,
    p: Point,
    anchor: impl Fn(&T) -> Point,
) -> Option<T> {
    let mut best: Option<(f32, T)> = None;
    for candidate in candidates {
        let distance = anchor(&candidate).distance(p);
        if best.as_ref().is_none_or(|(d, _)| distance < *d) {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageId;
    use pretty_assertions::assert_eq;

    /// Grid: a group card at x 0..300 with two 100px page cards, then two
    /// wrapper cards
    fn grid() -> (DropZones, ItemId) {
        let group = ItemId::new();
        let zones = DropZones {
            mode: LayoutMode::Grid,
            items: vec![
                ItemZone {
                    index: 0,
                    id: group,
                    is_group: true,
                    rect: Rect::new(0.0, 0.0, 300.0, 200.0),
                    body: Some(Rect::new(0.0, 40.0, 300.0, 160.0)),
                    pages: vec![
                        Rect::new(10.0, 50.0, 100.0, 140.0),
                        Rect::new(120.0, 50.0, 100.0, 140.0),
                    ],
                },
                ItemZone {
                    index: 1,
                    id: ItemId::new(),
                    is_group: false,
                    rect: Rect::new(320.0, 0.0, 100.0, 140.0),
                    body: None,
                    pages: vec![],
                },
                ItemZone {
                    index: 2,
                    id: ItemId::new(),
                    is_group: false,
                    rect: Rect::new(440.0, 0.0, 100.0, 140.0),
                    body: None,
                    pages: vec![],
                },
            ],
            tail: None,
        };
        (zones, group)
    }

    /// List: a 30px header for a two-page group, two 20px child rows, then a
    /// wrapper row and a tail strip
    fn list() -> (DropZones, ItemId) {
        let group = ItemId::new();
        let zones = DropZones {
            mode: LayoutMode::List,
            items: vec![
                ItemZone {
                    index: 0,
                    id: group,
                    is_group: true,
                    rect: Rect::new(0.0, 0.0, 400.0, 30.0),
                    body: Some(Rect::new(0.0, 30.0, 400.0, 40.0)),
                    pages: vec![
                        Rect::new(20.0, 30.0, 380.0, 20.0),
                        Rect::new(20.0, 50.0, 380.0, 20.0),
                    ],
                },
                ItemZone {
                    index: 1,
                    id: ItemId::new(),
                    is_group: false,
                    rect: Rect::new(0.0, 80.0, 400.0, 30.0),
                    body: None,
                    pages: vec![],
                },
            ],
            tail: Some(Rect::new(0.0, 120.0, 400.0, 60.0)),
        };
        (zones, group)
    }

    fn page_drag() -> Vec<EntityId> {
        vec![EntityId::Page(PageId::new())]
    }

    #[test]
    fn test_grid_pointer_on_page_card_inserts_beside_it() {
        let (zones, _) = grid();
        assert_eq!(
            zones.resolve(Point::new(190.0, 100.0), &page_drag()),
            Some(DropTarget::into_group(0, 2))
        );
        assert_eq!(
            zones.resolve(Point::new(30.0, 100.0), &page_drag()),
            Some(DropTarget::into_group(0, 0))
        );
    }

    #[test]
    fn test_grid_group_background_appends() {
        let (zones, _) = grid();
        assert_eq!(
            zones.resolve(Point::new(260.0, 100.0), &page_drag()),
            Some(DropTarget::into_group(0, 2))
        );
    }

    #[test]
    fn test_grid_empty_group_interior_targets_end() {
        let (mut zones, _) = grid();
        zones.items[0].pages.clear();
        assert_eq!(
            zones.resolve(Point::new(150.0, 20.0), &page_drag()),
            Some(DropTarget::into_group(0, 0))
        );
    }

    #[test]
    fn test_grid_reorders_by_nearest_card() {
        let (zones, _) = grid();
        assert_eq!(
            zones.resolve(Point::new(400.0, 10.0), &page_drag()),
            Some(DropTarget::after(1))
        );
        assert_eq!(
            zones.resolve(Point::new(450.0, 10.0), &page_drag()),
            Some(DropTarget::before(2))
        );
    }

    #[test]
    fn test_grid_dragged_groups_only_reorder() {
        let (zones, _) = grid();
        let dragged = vec![EntityId::Item(ItemId::new())];
        assert_eq!(
            zones.resolve(Point::new(190.0, 100.0), &dragged),
            Some(DropTarget::after(0))
        );
    }

    #[test]
    fn test_list_child_row_uses_vertical_midpoint() {
        let (zones, _) = list();
        assert_eq!(
            zones.resolve(Point::new(100.0, 35.0), &page_drag()),
            Some(DropTarget::into_group(0, 0))
        );
        assert_eq!(
            zones.resolve(Point::new(100.0, 65.0), &page_drag()),
            Some(DropTarget::into_group(0, 2))
        );
    }

    #[test]
    fn test_list_header_centre_inserts_into_group() {
        let (zones, _) = list();
        assert_eq!(
            zones.resolve(Point::new(100.0, 15.0), &page_drag()),
            Some(DropTarget::into_group(0, 2))
        );
        assert_eq!(
            zones.resolve(Point::new(100.0, 2.0), &page_drag()),
            Some(DropTarget::before(0))
        );
    }

    #[test]
    fn test_list_never_targets_dragged_group() {
        let (zones, group) = list();
        let dragged = vec![EntityId::Item(group)];
        assert_eq!(
            zones.resolve(Point::new(100.0, 10.0), &dragged),
            Some(DropTarget::before(0))
        );
        assert_eq!(
            zones.resolve(Point::new(100.0, 35.0), &dragged),
            Some(DropTarget::after(0))
        );
    }

    #[test]
    fn test_list_wrapper_row_halves() {
        let (zones, _) = list();
        assert_eq!(
            zones.resolve(Point::new(100.0, 85.0), &page_drag()),
            Some(DropTarget::before(1))
        );
        assert_eq!(
            zones.resolve(Point::new(100.0, 105.0), &page_drag()),
            Some(DropTarget::after(1))
        );
    }

    #[test]
    fn test_list_tail_targets_end() {
        let (zones, _) = list();
        assert_eq!(
            zones.resolve(Point::new(100.0, 150.0), &page_drag()),
            Some(DropTarget::after(1))
        );
    }

    #[test]
    fn test_list_above_first_row_targets_start() {
        let (mut zones, _) = list();
        for zone in &mut zones.items {
            zone.rect.y += 50.0;
            zone.body = None;
            zone.pages.clear();
        }
        assert_eq!(
            zones.resolve(Point::new(100.0, 10.0), &page_drag()),
            Some(DropTarget::before(0))
        );
    }

    #[test]
    fn test_list_gap_between_rows_uses_nearest_header() {
        let (zones, _) = list();
        assert_eq!(
            zones.resolve(Point::new(100.0, 75.0), &page_drag()),
            Some(DropTarget::before(1))
        );
    }

    #[test]
    fn test_empty_layout_resolves_nothing_except_tail() {
        let mut zones = DropZones::new(LayoutMode::List);
        assert_eq!(zones.resolve(Point::new(0.0, 0.0), &page_drag()), None);

        zones.tail = Some(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(
            zones.resolve(Point::new(10.0, 10.0), &page_drag()),
            Some(DropTarget::before(0))
        );
    }
}
