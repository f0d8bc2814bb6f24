//! UI exclusion regions.
//!
//! The host draws its own panels over the 3D surface. The router only needs to
//! know whether a point lies inside one of them; what is drawn there is not
//! its concern.

use serde::{Deserialize, Serialize};

/// The two independently tagged exclusion regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiRegion {
    /// Details panel, toolbars, menus
    General,
    /// Build palette, only present while build mode is on
    BuildPalette,
}

/// "Is this screen point inside region X".
pub trait RegionProbe {
    fn contains(&self, region: UiRegion, x: f32, y: f32) -> bool;
}

/// Axis-aligned screen rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Rectangle-list implementation of [`RegionProbe`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    rects: Vec<(UiRegion, ScreenRect)>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, region: UiRegion, rect: ScreenRect) {
        self.rects.push((region, rect));
    }

    /// Replace every rectangle of one region (panel moved or resized).
    pub fn set(&mut self, region: UiRegion, rects: impl IntoIterator<Item = ScreenRect>) {
        self.rects.retain(|(r, _)| *r != region);
        self.rects.extend(rects.into_iter().map(|rect| (region, rect)));
    }

    pub fn clear(&mut self, region: UiRegion) {
        self.rects.retain(|(r, _)| *r != region);
    }
}

impl RegionProbe for RegionSet {
    fn contains(&self, region: UiRegion, x: f32, y: f32) -> bool {
        self.rects
            .iter()
            .any(|(r, rect)| *r == region && rect.contains(x, y))
    }
}
