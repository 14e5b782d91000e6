//! Highlight geometry model
//!
//! Converts raw screen-space selection rectangles into page-local,
//! scale-independent rectangles and projects them back at paint time.

use serde::{Deserialize, Serialize};

/// A rectangle in raw screen space, as reported by the live surface
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ClientRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ClientRect {
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Screen position of a page's content box, reported by the surface adapter
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PageOrigin {
    pub left: f32,
    pub top: f32,
}

impl PageOrigin {
    #[must_use]
    pub const fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

/// A page-local rectangle stored at unit scale.
///
/// Unit-scale storage means a highlight captured at one zoom level renders
/// correctly at any other via a single multiply at paint time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighlightRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl HighlightRect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle encloses a drawable area
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Project back to screen space at the given scale and page origin
    #[must_use]
    pub fn to_client(&self, origin: PageOrigin, scale: f32) -> ClientRect {
        ClientRect {
            left: self.x * scale + origin.left,
            top: self.y * scale + origin.top,
            width: self.width * scale,
            height: self.height * scale,
        }
    }
}

/// Normalize raw screen rectangles into page-local unit-scale rectangles.
///
/// Rectangles with non-positive width or height are discarded. Returns `None`
/// when nothing usable remains (or the scale factor is unusable); callers
/// treat that as "no highlight creatable here", never as a surfaced error.
#[must_use]
pub fn normalize_rects(
    raw: &[ClientRect],
    origin: PageOrigin,
    scale: f32,
) -> Option<Vec<HighlightRect>> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }

    let rects: Vec<HighlightRect> = raw
        .iter()
        .filter(|r| r.width > 0.0 && r.height > 0.0)
        .map(|r| HighlightRect {
            x: (r.left - origin.left) / scale,
            y: (r.top - origin.top) / scale,
            width: r.width / scale,
            height: r.height / scale,
        })
        .collect();

    if rects.is_empty() { None } else { Some(rects) }
}
