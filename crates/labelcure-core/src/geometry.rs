//! Normalized bounding boxes and intersection-over-union.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slack allowed on box edges by [`BoundingBox::is_valid`].
pub const EDGE_TOLERANCE: f32 = 1e-6;

/// Axis-aligned box in relative image coordinates.
///
/// `(x, y)` is the top-left corner; all four fields are expected in `[0, 1]`
/// for a valid box, but validity is only checked by [`BoundingBox::is_valid`],
/// never enforced at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from its midpoint and size (darknet convention).
    pub fn from_center(mid_x: f32, mid_y: f32, width: f32, height: f32) -> Self {
        Self {
            x: mid_x - width / 2.0,
            y: mid_y - height / 2.0,
            width,
            height,
        }
    }

    /// Build a relative box from a pixel-space rectangle.
    ///
    /// Returns `None` for an empty image.
    pub fn from_absolute(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        if image_width == 0 || image_height == 0 {
            return None;
        }
        let iw = image_width as f32;
        let ih = image_height as f32;
        Some(Self::new(x / iw, y / ih, width / iw, height / ih))
    }

    /// Midpoint `(x, y)` of the box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when the size is non-negative and every edge lies in `[0, 1]`
    /// (up to [`EDGE_TOLERANCE`], so midpoint round-off does not invalidate
    /// a box flush with the image border).
    pub fn is_valid(&self) -> bool {
        let unit = -EDGE_TOLERANCE..=1.0 + EDGE_TOLERANCE;
        self.width >= 0.0
            && self.height >= 0.0
            && unit.contains(&self.x)
            && unit.contains(&self.y)
            && unit.contains(&self.right())
            && unit.contains(&self.bottom())
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Area of intersection over area of union, in `[0, 1]`.
///
/// Boxes that only touch along an edge (or do not meet at all) yield exactly
/// `0`. When both boxes are zero-area the result is undefined (`NaN`); guard
/// against that at the call site if it can happen.
pub fn intersection_over_union(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let left = a.x.max(b.x);
    let right = a.right().min(b.right());
    let top = a.y.max(b.y);
    let bottom = a.bottom().min(b.bottom());

    if left >= right || top >= bottom {
        return 0.0;
    }

    let intersection = (right - left) * (bottom - top);
    let union = a.area() + b.area() - intersection;
    intersection / union
}
