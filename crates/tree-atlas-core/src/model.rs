use crate::config::SortOrder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// True when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let ax2 = self.x as u64 + self.w as u64;
        let ay2 = self.y as u64 + self.h as u64;
        let bx2 = other.x as u64 + other.w as u64;
        let by2 = other.y as u64 + other.h as u64;
        (self.x as u64) < bx2 && (other.x as u64) < ax2 && (self.y as u64) < by2 && (other.y as u64) < ay2
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
}

/// A decoded source image. Read-only once built.
#[derive(Debug, Clone)]
pub struct SourceImage {
    name: String,
    rgba: RgbaImage,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, rgba: RgbaImage) -> Self {
        Self {
            name: name.into(),
            rgba,
        }
    }

    /// Converts any decoded image to RGBA8 without touching pixel values.
    pub fn from_dynamic(name: impl Into<String>, image: DynamicImage) -> Self {
        Self::new(name, image.to_rgba8())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
    pub fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }
}

/// Final placement of one image, margin excluded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementRecord {
    pub name: String,
    pub frame: Rect,
}

/// Summary record written ahead of the per-image records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasSummary {
    /// Number of placed images.
    pub count: usize,
    pub width: u32,
    pub height: u32,
}

/// Atlas-level metadata carried alongside the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version for the JSON description; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub margin: u32,
    pub sort_order: SortOrder,
}

/// Summary plus placement records in tree traversal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasDescription {
    pub summary: AtlasSummary,
    pub frames: Vec<PlacementRecord>,
    pub meta: Meta,
}

impl AtlasDescription {
    /// Looks up the record for `name` (first match in traversal order).
    pub fn frame(&self, name: &str) -> Option<&PlacementRecord> {
        self.frames.iter().find(|f| f.name == name)
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Number of images placed in the atlas.
    pub num_placed: usize,
    /// Number of images that did not fit anywhere.
    pub num_unplaced: usize,
    /// Atlas area (width * height).
    pub atlas_area: u64,
    /// Sum of placed frame areas, margin excluded.
    pub used_area: u64,
    /// used_area / atlas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl PackStats {
    pub fn from_description(desc: &AtlasDescription, num_unplaced: usize) -> Self {
        let atlas_area = (desc.summary.width as u64) * (desc.summary.height as u64);
        let used_area: u64 = desc.frames.iter().map(|f| f.frame.area()).sum();
        let occupancy = if atlas_area > 0 {
            used_area as f64 / atlas_area as f64
        } else {
            0.0
        };
        Self {
            num_placed: desc.frames.len(),
            num_unplaced,
            atlas_area,
            used_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Placed: {}, Unplaced: {}, Occupancy: {:.2}%, Atlas Area: {} px², Used Area: {} px²",
            self.num_placed,
            self.num_unplaced,
            self.occupancy * 100.0,
            self.atlas_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.atlas_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.atlas_area > 0 {
            (self.wasted_area() as f64 / self.atlas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
