// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rects and sizes in layer and device space.
//!
//! Float geometry uses [`kurbo`] directly; these integer types exist because
//! quad rects, clips, and pass output rects are pixel-aligned.

use kurbo::{Rect, Size};

/// An integer size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntSize {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl IntSize {
    /// Creates a size. Negative extents clamp to zero.
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Returns `true` when either extent is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub const fn area(self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Converts to a float size.
    #[inline]
    #[must_use]
    pub fn to_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// An integer rect with origin `(x, y)` and a non-negative size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width; never negative.
    pub width: i32,
    /// Height; never negative.
    pub height: i32,
}

impl IntRect {
    /// Creates a rect. Negative extents clamp to zero.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Creates a rect at the origin with the given size.
    #[inline]
    #[must_use]
    pub const fn from_size(size: IntSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// One past the right-most column.
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// One past the bottom-most row.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// The rect's size.
    #[inline]
    #[must_use]
    pub const fn size(self) -> IntSize {
        IntSize::new(self.width, self.height)
    }

    /// Returns `true` when the rect covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` when `other` lies entirely within `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }

    /// Returns `true` when the pixel at `(px, py)` lies inside the rect.
    #[inline]
    #[must_use]
    pub const fn contains_point(self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns `true` when the two rects share at least one pixel.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        !(self.is_empty()
            || other.is_empty()
            || other.x >= self.right()
            || other.right() <= self.x
            || other.y >= self.bottom()
            || other.bottom() <= self.y)
    }

    /// Returns the overlap of the two rects, or the zero rect when they do
    /// not overlap.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::default();
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x0 >= x1 || y0 >= y1 {
            return Self::default();
        }
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Intersects `self` with `other` in place.
    pub fn intersect(&mut self, other: Self) {
        *self = self.intersection(other);
    }

    /// Returns the smallest rect containing both. Empty rects are ignored.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Moves each edge inwards by the given amount. Negative values grow the
    /// rect.
    #[must_use]
    pub const fn inset(self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            self.x + left,
            self.y + top,
            self.width - left - right,
            self.height - top - bottom,
        )
    }

    /// Translates the rect.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Converts to a float rect.
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }

    /// Returns the smallest integer rect containing `rect`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "expanded coordinates are integral; out-of-range values saturate"
    )]
    pub fn enclosing(rect: Rect) -> Self {
        let r = rect.abs().expand();
        Self::new(
            r.x0 as i32,
            r.y0 as i32,
            (r.x1 - r.x0) as i32,
            (r.y1 - r.y0) as i32,
        )
    }
}

/// Maps `inner`, given relative to `from_outer`, into the same relative
/// position inside `to_outer`.
///
/// Used to carry a visible sub-rect of a quad into unit-quad or texture
/// coordinates.
#[must_use]
pub fn map_rect_proportional(from_outer: Rect, to_outer: Rect, inner: Rect) -> Rect {
    let sx = if from_outer.width() == 0.0 {
        0.0
    } else {
        to_outer.width() / from_outer.width()
    };
    let sy = if from_outer.height() == 0.0 {
        0.0
    } else {
        to_outer.height() / from_outer.height()
    };
    Rect::new(
        to_outer.x0 + (inner.x0 - from_outer.x0) * sx,
        to_outer.y0 + (inner.y0 - from_outer.y0) * sy,
        to_outer.x0 + (inner.x1 - from_outer.x0) * sx,
        to_outer.y0 + (inner.y1 - from_outer.y0) * sy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_extent_clamps() {
        let r = IntRect::new(5, 5, -3, 4);
        assert_eq!(r.width, 0);
        assert!(r.is_empty());
    }

    #[test]
    fn intersection_of_disjoint_is_zero_rect() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(10, 0, 10, 10);
        assert!(!a.intersects(b));
        assert_eq!(a.intersection(b), IntRect::default());
    }

    #[test]
    fn intersection_and_union() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(b), IntRect::new(5, 5, 5, 5));
        assert_eq!(a.union(b), IntRect::new(0, 0, 15, 15));
        assert_eq!(a.union(IntRect::default()), a);
    }

    #[test]
    fn containment() {
        let outer = IntRect::new(0, 0, 100, 100);
        assert!(outer.contains(IntRect::new(10, 10, 50, 50)));
        assert!(outer.contains(outer));
        assert!(!outer.contains(IntRect::new(90, 90, 20, 20)));
        assert!(outer.contains_point(99, 0));
        assert!(!outer.contains_point(100, 0));
    }

    #[test]
    fn inset_and_offset() {
        let r = IntRect::new(0, 0, 10, 10).inset(1, 2, 3, 4);
        assert_eq!(r, IntRect::new(1, 2, 6, 4));
        assert_eq!(r.offset(-1, -2), IntRect::new(0, 0, 6, 4));
        assert_eq!(IntRect::new(0, 0, 2, 2).inset(5, 0, 0, 0).width, 0);
    }

    #[test]
    fn enclosing_rounds_outward() {
        let r = IntRect::enclosing(Rect::new(0.5, -0.5, 9.2, 10.0));
        assert_eq!(r, IntRect::new(0, -1, 10, 11));
    }

    #[test]
    fn proportional_mapping_into_unit_quad() {
        let unit = Rect::new(-0.5, -0.5, 0.5, 0.5);
        let quad = Rect::new(0.0, 0.0, 100.0, 100.0);
        let visible = Rect::new(0.0, 0.0, 50.0, 100.0);
        let mapped = map_rect_proportional(quad, unit, visible);
        assert_eq!(mapped, Rect::new(-0.5, -0.5, 0.0, 0.5));
    }
}
