//! Board-space geometry: points, sizes, and the board surface rectangle.
//!
//! All widget coordinates live in board space: origin at the top-left of the
//! board surface, x to the right, y downward. Pointer events arrive in client
//! space and are translated through [`Surface::to_board`].

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// Coerce a raw number to a finite value, mapping NaN and infinities to `0.0`.
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// A point in either client or board space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same point with non-finite components replaced by `0.0`.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self { x: finite_or_zero(self.x), y: finite_or_zero(self.y) }
    }

    /// Component-wise `self - other`.
    #[must_use]
    pub fn offset_from(self, other: Point) -> Point {
        Point { x: self.x - other.x, y: self.y - other.y }
    }
}

/// Width and height of a widget or surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Same size with non-finite components replaced by `0.0`.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self { width: finite_or_zero(self.width), height: finite_or_zero(self.height) }
    }

    /// Grow each axis to at least the given minimum.
    #[must_use]
    pub fn at_least(self, min: Size) -> Self {
        Self { width: self.width.max(min.width), height: self.height.max(min.height) }
    }
}

/// Axis-aligned rectangle in board space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    #[must_use]
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Whether `pt` lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.origin.x
            && pt.x <= self.origin.x + self.size.width
            && pt.y >= self.origin.y
            && pt.y <= self.origin.y + self.size.height
    }
}

/// The visible board surface.
///
/// `origin` is the client-space position of the board's top-left corner.
/// A zero-sized surface means the dimensions are not known yet; boundary
/// policies treat it as unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Surface {
    pub origin: Point,
    pub size: Size,
}

impl Surface {
    #[must_use]
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size: size.sanitized() }
    }

    /// Whether both dimensions are known (strictly positive).
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.size.width > 0.0 && self.size.height > 0.0
    }

    /// Convert a client-space point to board space.
    #[must_use]
    pub fn to_board(&self, client: Point) -> Point {
        client.offset_from(self.origin)
    }
}
