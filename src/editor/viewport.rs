//! View transform between world and screen coordinates

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Half-extent of the scrollable workspace in world units.
pub const TRANSLATE_EXTENT: f32 = 65_536.0;
/// Smallest zoom factor the surface reports.
pub const MIN_ZOOM: f32 = 0.01;
/// Largest zoom factor the surface reports.
pub const MAX_ZOOM: f32 = 1.0;

/// Pan/zoom transform of the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub pan: Vec2,
    pub zoom: f32,
}

impl ViewTransform {
    /// Identity transform (no pan, 1:1 zoom).
    pub fn new() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }

    /// Clamps pan and zoom into the workspace extents.
    pub fn clamped(self) -> Self {
        Self {
            pan: self
                .pan
                .clamp(Vec2::splat(-TRANSLATE_EXTENT), Vec2::splat(TRANSLATE_EXTENT)),
            zoom: self.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Converts world coordinates to screen coordinates.
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world * self.zoom + self.pan
    }

    /// Converts screen coordinates to world coordinates.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.pan) / self.zoom
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new()
    }
}
