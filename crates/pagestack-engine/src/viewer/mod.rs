//! Single-page viewer: zoom, pan and region-zoom state.
//!
//! Coordinates handed to the pointer methods are relative to the viewport's
//! top-left corner. `scroll` is the offset of the viewport into the scaled
//! page, so a viewport point `p` sits over content point `p + scroll`.

use crate::geometry::{Point, Rect, Size};
use crate::models::{PageId, Rotation};

pub const MIN_SCALE: f32 = 0.0008;
pub const MAX_SCALE: f32 = 64.0;
pub const ZOOM_STEP: f32 = 1.25;
/// Space left around the page by the fit operations
pub const FIT_PADDING: f32 = 48.0;
/// A region must be strictly larger than this on both sides to zoom
pub const REGION_MIN: f32 = 10.0;
const WHEEL_INTENSITY: f32 = 0.0015;
const WHEEL_DELTA_LIMIT: f32 = 200.0;
const SCALE_EPSILON: f32 = 0.00001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewerTool {
    #[default]
    Pan,
    RegionZoom,
}

/// Pointer interaction in progress
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        start: Point,
        scroll_origin: Point,
    },
    Region {
        start: Point,
        current: Point,
    },
    Pinch {
        start_distance: f32,
        start_scale: f32,
        center: Point,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSession {
    pub page_id: PageId,
    pub scale: f32,
    pub rotation: Rotation,
    pub tool: ViewerTool,
    pub gesture: Gesture,
    pub scroll: Point,
    pub viewport: Size,
    /// Unrotated page size at scale 1, once the renderer has reported it
    pub page_size: Option<Size>,
}

impl ViewerSession {
    pub fn new(page_id: PageId, rotation: Rotation, viewport: Size) -> Self {
        Self {
            page_id,
            scale: 1.0,
            rotation,
            tool: ViewerTool::Pan,
            gesture: Gesture::Idle,
            scroll: Point::default(),
            viewport,
            page_size: None,
        }
    }

    /// Page size at scale 1 as displayed, after rotation
    pub fn oriented_size(&self) -> Option<Size> {
        self.page_size.map(|size| {
            if self.rotation.is_sideways() {
                size.transposed()
            } else {
                size
            }
        })
    }

    pub fn content_size(&self) -> Option<Size> {
        self.oriented_size()
            .map(|size| Size::new(size.width * self.scale, size.height * self.scale))
    }

    /// Clamp and apply a scale. Returns the scale actually applied.
    pub fn set_scale(&mut self, scale: f32) -> f32 {
        self.store_scale(scale);
        self.clamp_scroll();
        self.scale
    }

    /// Clamp and store a scale, leaving scroll for the caller to re-anchor
    fn store_scale(&mut self, scale: f32) -> f32 {
        if scale.is_finite() {
            self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }
        self.scale
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_scale(self.scale * ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_scale(self.scale / ZOOM_STEP)
    }

    pub fn reset_zoom(&mut self) -> f32 {
        self.set_scale(1.0)
    }

    pub fn fit_width(&mut self) -> f32 {
        match self.oriented_size() {
            Some(size) if size.width > 0.0 => {
                self.set_scale((self.viewport.width - FIT_PADDING) / size.width)
            }
            _ => self.scale,
        }
    }

    pub fn fit_page(&mut self) -> f32 {
        match self.oriented_size() {
            Some(size) if size.width > 0.0 && size.height > 0.0 => {
                let x = (self.viewport.width - FIT_PADDING) / size.width;
                let y = (self.viewport.height - FIT_PADDING) / size.height;
                self.set_scale(x.min(y))
            }
            _ => self.scale,
        }
    }

    /// Record the page's natural size and fit it to the viewport
    pub fn page_measured(&mut self, size: Size) -> f32 {
        self.page_size = Some(size);
        self.fit_page()
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.clamp_scroll();
    }

    /// Change scale keeping the content under `anchor` fixed on screen
    pub fn zoom_at(&mut self, anchor: Point, scale: f32) -> f32 {
        let old = self.scale;
        let new = self.store_scale(scale);
        let ratio = new / old;
        self.scroll = Point::new(
            (self.scroll.x + anchor.x) * ratio - anchor.x,
            (self.scroll.y + anchor.y) * ratio - anchor.y,
        );
        self.clamp_scroll();
        new
    }

    /// Exponential wheel zoom around the cursor
    pub fn wheel(&mut self, delta: f32, at: Point) -> f32 {
        if delta == 0.0 {
            return self.scale;
        }
        let delta = delta.clamp(-WHEEL_DELTA_LIMIT, WHEEL_DELTA_LIMIT);
        let target = (self.scale * (-delta * WHEEL_INTENSITY).exp()).clamp(MIN_SCALE, MAX_SCALE);
        if (target - self.scale).abs() < SCALE_EPSILON {
            return self.scale;
        }
        self.zoom_at(at, target)
    }

    pub fn pinch_start(&mut self, a: Point, b: Point) {
        self.gesture = Gesture::Pinch {
            start_distance: a.distance(b),
            start_scale: self.scale,
            center: a.midpoint(b),
        };
    }

    /// Scale relative to the gesture start, keeping the content under the
    /// previous pinch centre beneath the new one
    pub fn pinch_move(&mut self, a: Point, b: Point) -> f32 {
        let Gesture::Pinch {
            start_distance,
            start_scale,
            center,
        } = self.gesture
        else {
            return self.scale;
        };
        if start_distance <= 0.0 {
            return self.scale;
        }

        let old = self.scale;
        let new = self.store_scale(start_scale * a.distance(b) / start_distance);
        let ratio = new / old;
        let next_center = a.midpoint(b);
        self.scroll = Point::new(
            (center.x + self.scroll.x) * ratio - next_center.x,
            (center.y + self.scroll.y) * ratio - next_center.y,
        );
        self.clamp_scroll();
        self.gesture = Gesture::Pinch {
            start_distance,
            start_scale,
            center: next_center,
        };
        new
    }

    pub fn pinch_end(&mut self) {
        if matches!(self.gesture, Gesture::Pinch { .. }) {
            self.gesture = Gesture::Idle;
        }
    }

    pub fn toggle_tool(&mut self) -> ViewerTool {
        self.tool = match self.tool {
            ViewerTool::Pan => ViewerTool::RegionZoom,
            ViewerTool::RegionZoom => ViewerTool::Pan,
        };
        self.gesture = Gesture::Idle;
        self.tool
    }

    pub fn pointer_down(&mut self, p: Point) {
        self.gesture = match self.tool {
            ViewerTool::Pan => Gesture::Panning {
                start: p,
                scroll_origin: self.scroll,
            },
            ViewerTool::RegionZoom => Gesture::Region {
                start: p,
                current: p,
            },
        };
    }

    pub fn pointer_move(&mut self, p: Point) {
        match self.gesture {
            Gesture::Panning {
                start,
                scroll_origin,
            } => {
                self.scroll = Point::new(
                    scroll_origin.x - (p.x - start.x),
                    scroll_origin.y - (p.y - start.y),
                );
                self.clamp_scroll();
            }
            Gesture::Region { start, .. } => self.gesture = Gesture::Region { start, current: p },
            _ => {}
        }
    }

    /// Finish a pan or region drag. Returns the region zoomed into, if any.
    ///
    /// The tool reverts to pan after every region drag, committed or not.
    pub fn pointer_up(&mut self) -> Option<Rect> {
        let gesture = std::mem::take(&mut self.gesture);
        let Gesture::Region { start, current } = gesture else {
            return None;
        };
        self.tool = ViewerTool::Pan;

        let region = Rect::from_corners(start, current);
        if region.width <= REGION_MIN || region.height <= REGION_MIN {
            return None;
        }

        let factor = (self.viewport.width / region.width).min(self.viewport.height / region.height);
        let old = self.scale;
        let ratio = self.store_scale(old * factor) / old;
        let center = region.center();
        self.scroll = Point::new(
            (center.x + self.scroll.x) * ratio - self.viewport.width / 2.0,
            (center.y + self.scroll.y) * ratio - self.viewport.height / 2.0,
        );
        self.clamp_scroll();
        Some(region)
    }

    /// Leaving the viewport abandons any pan or region drag
    pub fn pointer_leave(&mut self) {
        if matches!(
            self.gesture,
            Gesture::Panning { .. } | Gesture::Region { .. }
        ) {
            self.gesture = Gesture::Idle;
        }
    }

    /// Rectangle being drawn by an active region drag
    pub fn region(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Region { start, current } => Some(Rect::from_corners(start, current)),
            _ => None,
        }
    }

    /// Switch to another page, keeping tool and viewport
    pub fn show_page(&mut self, page_id: PageId, rotation: Rotation) {
        self.page_id = page_id;
        self.rotation = rotation;
        self.page_size = None;
        self.scroll = Point::default();
        self.gesture = Gesture::Idle;
    }

    /// Scroll can't leave the content; content smaller than the viewport is
    /// not scrollable at all. Unknown content size leaves scroll alone.
    fn clamp_scroll(&mut self) {
        let Some(content) = self.content_size() else {
            return;
        };
        let max_x = (content.width - self.viewport.width).max(0.0);
        let max_y = (content.height - self.viewport.height).max(0.0);
        self.scroll = Point::new(self.scroll.x.clamp(0.0, max_x), self.scroll.y.clamp(0.0, max_y));
    }
}

/// Viewer lifecycle: closed, or open on one page
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Viewer {
    #[default]
    Closed,
    Open(ViewerSession),
}

impl Viewer {
    pub fn is_open(&self) -> bool {
        matches!(self, Viewer::Open(_))
    }

    pub fn session(&self) -> Option<&ViewerSession> {
        match self {
            Viewer::Open(session) => Some(session),
            Viewer::Closed => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut ViewerSession> {
        match self {
            Viewer::Open(session) => Some(session),
            Viewer::Closed => None,
        }
    }

    pub fn page_id(&self) -> Option<PageId> {
        self.session().map(|session| session.page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const VIEWPORT: Size = Size::new(848.0, 1048.0);

    fn open() -> ViewerSession {
        ViewerSession::new(PageId::new(), Rotation::Deg0, VIEWPORT)
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[rstest]
    #[case(1000.0, MAX_SCALE)]
    #[case(0.00001, MIN_SCALE)]
    #[case(2.5, 2.5)]
    fn test_set_scale_clamps(#[case] requested: f32, #[case] expected: f32) {
        let mut viewer = open();
        assert_eq!(viewer.set_scale(requested), expected);
    }

    #[test]
    fn test_set_scale_ignores_non_finite() {
        let mut viewer = open();
        viewer.set_scale(f32::NAN);
        assert_eq!(viewer.scale, 1.0);
    }

    #[test]
    fn test_zoom_steps() {
        let mut viewer = open();
        assert_close(viewer.zoom_in(), 1.25);
        assert_close(viewer.zoom_out(), 1.0);
        viewer.set_scale(MAX_SCALE);
        assert_eq!(viewer.zoom_in(), MAX_SCALE);
    }

    #[test]
    fn test_page_measured_fits_page_with_padding() {
        let mut viewer = open();
        // 800x1000 available after padding; a 400x1000 page is height bound
        assert_close(viewer.page_measured(Size::new(400.0, 1000.0)), 1.0);
        assert_close(viewer.fit_width(), 2.0);
    }

    #[test]
    fn test_fit_uses_rotated_dimensions() {
        let mut viewer = ViewerSession::new(PageId::new(), Rotation::Deg90, VIEWPORT);
        // Displayed as 1000 wide, 400 tall
        assert_close(viewer.page_measured(Size::new(400.0, 1000.0)), 0.8);
    }

    #[test]
    fn test_fit_without_measurement_keeps_scale() {
        let mut viewer = open();
        viewer.set_scale(3.0);
        assert_eq!(viewer.fit_page(), 3.0);
    }

    #[test]
    fn test_wheel_zoom_keeps_point_under_cursor() {
        let mut viewer = open();
        viewer.page_size = Some(Size::new(4000.0, 4000.0));
        viewer.scroll = Point::new(100.0, 100.0);
        let cursor = Point::new(200.0, 300.0);
        let content_before = Point::new(
            (cursor.x + viewer.scroll.x) / viewer.scale,
            (cursor.y + viewer.scroll.y) / viewer.scale,
        );

        let scale = viewer.wheel(-100.0, cursor);

        assert_close(scale, (0.15f32).exp());
        assert_close((cursor.x + viewer.scroll.x) / scale, content_before.x);
        assert_close((cursor.y + viewer.scroll.y) / scale, content_before.y);
    }

    #[test]
    fn test_zoom_out_near_far_edge_keeps_point_under_cursor() {
        let mut viewer = ViewerSession::new(PageId::new(), Rotation::Deg0, Size::new(100.0, 100.0));
        viewer.page_size = Some(Size::new(1000.0, 1000.0));
        viewer.scroll = Point::new(800.0, 800.0);
        let cursor = Point::new(50.0, 50.0);

        let scale = viewer.zoom_at(cursor, 0.5);

        assert_close(scale, 0.5);
        assert_close(viewer.scroll.x, 375.0);
        assert_close(viewer.scroll.y, 375.0);
        assert_close((cursor.x + viewer.scroll.x) / scale, 850.0);
    }

    #[test]
    fn test_pinch_out_keeps_centre_content_fixed() {
        let mut viewer = ViewerSession::new(PageId::new(), Rotation::Deg0, Size::new(100.0, 100.0));
        viewer.page_size = Some(Size::new(1000.0, 1000.0));
        viewer.scroll = Point::new(800.0, 800.0);
        let (a, b) = (Point::new(30.0, 50.0), Point::new(70.0, 50.0));

        viewer.pinch_start(a, b);
        let scale = viewer.pinch_move(Point::new(40.0, 50.0), Point::new(60.0, 50.0));

        assert_close(scale, 0.5);
        assert_close(viewer.scroll.x, 375.0);
        assert_close(viewer.scroll.y, 375.0);
    }

    #[test]
    fn test_wheel_delta_is_limited() {
        let mut viewer = open();
        let scale = viewer.wheel(10_000.0, Point::default());
        assert_close(scale, (-0.3f32).exp());
    }

    #[test]
    fn test_wheel_at_limit_changes_nothing() {
        let mut viewer = open();
        viewer.set_scale(MAX_SCALE);
        viewer.scroll = Point::new(5.0, 5.0);
        viewer.wheel(-100.0, Point::new(50.0, 50.0));
        assert_eq!(viewer.scroll, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_pan_moves_scroll_against_pointer() {
        let mut viewer = open();
        viewer.page_size = Some(Size::new(4000.0, 4000.0));
        viewer.scroll = Point::new(500.0, 500.0);

        viewer.pointer_down(Point::new(100.0, 100.0));
        viewer.pointer_move(Point::new(130.0, 80.0));
        assert_eq!(viewer.scroll, Point::new(470.0, 520.0));

        viewer.pointer_up();
        assert_eq!(viewer.gesture, Gesture::Idle);
    }

    #[test]
    fn test_region_zoom_fits_and_recentres() {
        let mut viewer = open();
        viewer.page_size = Some(Size::new(4000.0, 4000.0));
        viewer.toggle_tool();

        viewer.pointer_down(Point::new(100.0, 100.0));
        viewer.pointer_move(Point::new(312.0, 362.0));
        let region = viewer.pointer_up();

        // 212x262 region: width factor 4, height factor 4
        assert_eq!(region, Some(Rect::new(100.0, 100.0, 212.0, 262.0)));
        assert_close(viewer.scale, 4.0);
        assert_close(viewer.scroll.x, 206.0 * 4.0 - 424.0);
        assert_close(viewer.scroll.y, 231.0 * 4.0 - 524.0);
        assert_eq!(viewer.tool, ViewerTool::Pan);
    }

    #[test]
    fn test_small_region_is_discarded() {
        let mut viewer = open();
        viewer.toggle_tool();
        viewer.pointer_down(Point::new(100.0, 100.0));
        viewer.pointer_move(Point::new(110.0, 300.0));

        assert_eq!(viewer.pointer_up(), None);
        assert_eq!(viewer.scale, 1.0);
        assert_eq!(viewer.tool, ViewerTool::Pan);
    }

    #[test]
    fn test_pointer_leave_aborts_region() {
        let mut viewer = open();
        viewer.toggle_tool();
        viewer.pointer_down(Point::new(100.0, 100.0));
        viewer.pointer_move(Point::new(300.0, 300.0));
        viewer.pointer_leave();

        assert_eq!(viewer.region(), None);
        assert_eq!(viewer.pointer_up(), None);
        assert_eq!(viewer.tool, ViewerTool::RegionZoom);
    }

    #[test]
    fn test_pinch_scales_from_gesture_start() {
        let mut viewer = open();
        viewer.page_size = Some(Size::new(4000.0, 4000.0));
        viewer.set_scale(0.5);

        viewer.pinch_start(Point::new(100.0, 100.0), Point::new(200.0, 100.0));
        assert_close(
            viewer.pinch_move(Point::new(50.0, 100.0), Point::new(250.0, 100.0)),
            1.0,
        );
        assert_close(
            viewer.pinch_move(Point::new(0.0, 100.0), Point::new(300.0, 100.0)),
            1.5,
        );
        viewer.pinch_end();
        assert_eq!(viewer.gesture, Gesture::Idle);
    }

    #[test]
    fn test_scroll_is_clamped_to_content() {
        let mut viewer = open();
        viewer.page_size = Some(Size::new(100.0, 100.0));
        viewer.scroll = Point::new(50.0, 50.0);
        viewer.set_scale(1.0);
        assert_eq!(viewer.scroll, Point::default());
    }

    #[test]
    fn test_show_page_resets_measurement() {
        let mut viewer = open();
        viewer.page_measured(Size::new(100.0, 100.0));
        let next = PageId::new();
        viewer.show_page(next, Rotation::Deg180);

        assert_eq!(viewer.page_id, next);
        assert_eq!(viewer.rotation, Rotation::Deg180);
        assert_eq!(viewer.page_size, None);
    }
}
