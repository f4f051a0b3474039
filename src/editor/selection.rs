//! Marquee selection gesture and containment geometry

use super::viewport::ViewTransform;
use glam::Vec2;

/// Axis-aligned rectangle in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Builds a normalized rectangle from two arbitrary corner points.
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Builds a rectangle from its top-left corner and size.
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    /// Strict full containment: `inner` must lie entirely inside `self`.
    /// A box touching or crossing the boundary is not contained.
    pub fn contains_rect(&self, inner: &Rect) -> bool {
        inner.max.x < self.max.x
            && inner.min.x > self.min.x
            && inner.min.y > self.min.y
            && inner.max.y < self.max.y
    }
}

/// Screen-space bounding box of a node under the surface transform.
pub fn node_screen_box(position: Vec2, size: Vec2, transform: ViewTransform) -> Rect {
    Rect::from_min_size(position * transform.zoom + transform.pan, size * transform.zoom)
}

/// Marquee multi-select gesture, edge-triggered by a modifier chord.
///
/// While armed, ordinary click-to-select is suppressed. The drag rectangle
/// is handed back on completion; the session turns it into a selection.
#[derive(Debug, Clone, Default)]
pub struct AreaSelector {
    armed: bool,
    start: Option<Vec2>,
    current: Option<Vec2>,
}

impl AreaSelector {
    /// Creates a disarmed selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the marquee. Repeated keydown events are a no-op.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Disarms the marquee and clears any drag in progress.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.start = None;
        self.current = None;
    }

    /// Whether the marquee chord is currently held.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether ordinary click selection should be suppressed.
    pub fn suppresses_click(&self) -> bool {
        self.armed
    }

    /// Starts the drag at a screen point. Ignored while disarmed.
    pub fn begin_drag(&mut self, point: Vec2) {
        if self.armed {
            self.start = Some(point);
            self.current = Some(point);
        }
    }

    /// Extends the drag to a new screen point.
    pub fn update_drag(&mut self, point: Vec2) {
        if self.start.is_some() {
            self.current = Some(point);
        }
    }

    /// Finishes the drag, returning the covered corner points.
    pub fn complete_drag(&mut self) -> Option<(Vec2, Vec2)> {
        let corners = match (self.start, self.current) {
            (Some(start), Some(current)) => Some((start, current)),
            _ => None,
        };
        self.start = None;
        self.current = None;
        corners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_contained_box_is_selected() {
        let marquee = Rect::from_points(Vec2::new(90.0, 90.0), Vec2::new(160.0, 140.0));
        let node = Rect::from_points(Vec2::new(100.0, 100.0), Vec2::new(150.0, 130.0));
        assert!(marquee.contains_rect(&node));
    }

    #[test]
    fn test_partially_overlapping_box_is_excluded() {
        let marquee = Rect::from_points(Vec2::new(90.0, 90.0), Vec2::new(160.0, 140.0));
        let node = Rect::from_points(Vec2::new(100.0, 100.0), Vec2::new(200.0, 130.0));
        assert!(!marquee.contains_rect(&node));
    }

    #[test]
    fn test_boundary_touching_box_is_excluded() {
        let marquee = Rect::from_points(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
        let node = Rect::from_points(Vec2::new(0.0, 10.0), Vec2::new(50.0, 50.0));
        assert!(!marquee.contains_rect(&node));
    }

    #[test]
    fn test_corner_points_normalize() {
        let a = Rect::from_points(Vec2::new(160.0, 140.0), Vec2::new(90.0, 90.0));
        let b = Rect::from_points(Vec2::new(90.0, 90.0), Vec2::new(160.0, 140.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_screen_box_applies_transform() {
        let transform = ViewTransform {
            pan: Vec2::new(10.0, 20.0),
            zoom: 0.5,
        };
        let rect = node_screen_box(Vec2::new(100.0, 100.0), Vec2::new(40.0, 40.0), transform);
        assert_eq!(rect.min, Vec2::new(60.0, 70.0));
        assert_eq!(rect.max, Vec2::new(80.0, 90.0));
    }

    #[test]
    fn test_gesture_requires_arming() {
        let mut selector = AreaSelector::new();
        selector.begin_drag(Vec2::new(5.0, 5.0));
        assert_eq!(selector.complete_drag(), None);

        selector.arm();
        selector.arm();
        selector.begin_drag(Vec2::new(5.0, 5.0));
        selector.update_drag(Vec2::new(50.0, 40.0));
        assert!(selector.suppresses_click());
        assert_eq!(
            selector.complete_drag(),
            Some((Vec2::new(5.0, 5.0), Vec2::new(50.0, 40.0)))
        );

        selector.disarm();
        assert!(!selector.is_armed());
    }
}
