// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal column-major 4×4 transform.
//!
//! This type covers the subset of 3-D transforms the compositor actually
//! needs (identity, multiply, inverse, point and rect mapping, and the 2-D
//! classification queries used by overlays and anti-aliasing) without pulling
//! in a full linear-algebra crate.
//!
//! Element access follows the `(row, col)` convention: `get(row, col)` reads
//! `cols[col][row]`. The `pre_*` builders apply the new operation *before*
//! the existing transform, so `t.pre_translate(x, y)` maps a point by first
//! translating it and then applying `t`.

use core::ops::Mul;
use kurbo::{Affine, Point, Rect};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the memory layout
/// used by GPU APIs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Reads the element at `(row, col)`.
    #[inline]
    #[must_use]
    pub const fn get(&self, row: usize, col: usize) -> f64 {
        self.cols[col][row]
    }

    /// Writes the element at `(row, col)`.
    #[inline]
    pub const fn set(&mut self, row: usize, col: usize, value: f64) {
        self.cols[col][row] = value;
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        #[cfg(feature = "std")]
        let (s, c) = radians.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Embeds a 2-D affine transform.
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self::from_cols(
            [a, b, 0.0, 0.0],
            [c, d, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [e, f, 0.0, 1.0],
        )
    }

    /// Drops the z row/column and the perspective row, keeping the 2-D part.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        let c = &self.cols;
        Affine::new([c[0][0], c[0][1], c[1][0], c[1][1], c[3][0], c[3][1]])
    }

    /// Builds an orthographic projection onto the unit cube.
    #[must_use]
    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        let dx = right - left;
        let dy = top - bottom;
        let mut out = Self::IDENTITY;
        if dx == 0.0 || dy == 0.0 {
            return out;
        }
        out.set(0, 0, 2.0 / dx);
        out.set(0, 3, -(right + left) / dx);
        out.set(1, 1, 2.0 / dy);
        out.set(1, 3, -(top + bottom) / dy);
        // Depth is unused; map z to 0.
        out.set(2, 2, 0.0);
        out
    }

    /// Returns `self * translation(dx, dy, 0)`.
    #[must_use]
    pub fn pre_translate(self, dx: f64, dy: f64) -> Self {
        self * Self::from_translation(dx, dy, 0.0)
    }

    /// Returns `self * translation(dx, dy, dz)`.
    #[must_use]
    pub fn pre_translate3d(self, dx: f64, dy: f64, dz: f64) -> Self {
        self * Self::from_translation(dx, dy, dz)
    }

    /// Returns `self * scale(sx, sy, 1)`.
    #[must_use]
    pub fn pre_scale(self, sx: f64, sy: f64) -> Self {
        self * Self::from_scale(sx, sy, 1.0)
    }

    /// Returns `self * scale(sx, sy, sz)`.
    #[must_use]
    pub fn pre_scale3d(self, sx: f64, sy: f64, sz: f64) -> Self {
        self * Self::from_scale(sx, sy, sz)
    }

    /// Returns `other * self`: `other` is applied after `self`.
    #[must_use]
    pub fn post_concat(self, other: Self) -> Self {
        other * self
    }

    /// Returns `true` for the identity matrix.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Returns `true` when the matrix only translates.
    #[must_use]
    pub fn is_identity_or_translation(&self) -> bool {
        let mut linear = *self;
        linear.cols[3] = [0.0, 0.0, 0.0, 1.0];
        linear.is_identity()
    }

    /// Returns `true` when the matrix only scales and translates.
    #[must_use]
    pub fn is_scale_or_translation(&self) -> bool {
        let c = &self.cols;
        c[0][1] == 0.0
            && c[0][2] == 0.0
            && c[0][3] == 0.0
            && c[1][0] == 0.0
            && c[1][2] == 0.0
            && c[1][3] == 0.0
            && c[2][0] == 0.0
            && c[2][1] == 0.0
            && c[2][3] == 0.0
            && c[3][3] == 1.0
    }

    /// Returns `true` when the matrix has a non-trivial perspective row.
    #[must_use]
    pub fn has_perspective(&self) -> bool {
        let c = &self.cols;
        c[0][3] != 0.0 || c[1][3] != 0.0 || c[2][3] != 0.0 || c[3][3] != 1.0
    }

    /// Returns `true` when the matrix scales and translates with integer
    /// translation, so pixel edges stay on pixel boundaries.
    #[must_use]
    pub fn is_positive_scale_with_integer_translation(&self) -> bool {
        if !self.is_scale_or_translation() {
            return false;
        }
        let c = &self.cols;
        c[0][0] > 0.0
            && c[1][1] > 0.0
            && c[2][2] > 0.0
            && c[3][0] == c[3][0].round()
            && c[3][1] == c[3][1].round()
    }

    /// Returns `true` when the 2-D image of the x and y axes stays on the x
    /// and y axes (in either order and direction).
    ///
    /// Each of the two upper-left rows and columns must have exactly one
    /// non-zero entry, and perspective must not vary with x or y.
    #[must_use]
    pub fn preserves_2d_axis_alignment(&self) -> bool {
        if self.get(3, 0) != 0.0 || self.get(3, 1) != 0.0 {
            return false;
        }
        let mut num_non_zero_in_row_0 = 0;
        let mut num_non_zero_in_row_1 = 0;
        let mut num_non_zero_in_col_0 = 0;
        let mut num_non_zero_in_col_1 = 0;
        if self.get(0, 0).abs() > f64::EPSILON {
            num_non_zero_in_row_0 += 1;
            num_non_zero_in_col_0 += 1;
        }
        if self.get(0, 1).abs() > f64::EPSILON {
            num_non_zero_in_row_0 += 1;
            num_non_zero_in_col_1 += 1;
        }
        if self.get(1, 0).abs() > f64::EPSILON {
            num_non_zero_in_row_1 += 1;
            num_non_zero_in_col_0 += 1;
        }
        if self.get(1, 1).abs() > f64::EPSILON {
            num_non_zero_in_row_1 += 1;
            num_non_zero_in_col_1 += 1;
        }
        num_non_zero_in_row_0 <= 1
            && num_non_zero_in_row_1 <= 1
            && num_non_zero_in_col_0 <= 1
            && num_non_zero_in_col_1 <= 1
    }

    /// Image of the unit x axis, `(m00, m10, m20)`.
    #[must_use]
    pub const fn x_axis(&self) -> [f64; 3] {
        [self.cols[0][0], self.cols[0][1], self.cols[0][2]]
    }

    /// Image of the unit y axis, `(m01, m11, m21)`.
    #[must_use]
    pub const fn y_axis(&self) -> [f64; 3] {
        [self.cols[1][0], self.cols[1][1], self.cols[1][2]]
    }

    /// Collapses the z dimension, as when a 3-D layer is drawn into a flat
    /// target.
    #[must_use]
    pub fn flatten_to_2d(mut self) -> Self {
        self.set(2, 0, 0.0);
        self.set(2, 1, 0.0);
        self.set(0, 2, 0.0);
        self.set(1, 2, 0.0);
        self.set(2, 2, 1.0);
        self.set(3, 2, 0.0);
        self.set(2, 3, 0.0);
        self
    }

    /// Maps a point in the z = 0 plane, dividing by w when it is not 1.
    #[must_use]
    pub fn map_point(&self, p: Point) -> Point {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[3][1];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[3][3];
        if w == 1.0 || w == 0.0 {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }

    /// Maps the four corners of `rect` and returns their bounding box.
    #[must_use]
    pub fn map_rect(&self, rect: Rect) -> Rect {
        if self.is_identity_or_translation() {
            return rect + kurbo::Vec2::new(self.cols[3][0], self.cols[3][1]);
        }
        let corners = [
            self.map_point(Point::new(rect.x0, rect.y0)),
            self.map_point(Point::new(rect.x1, rect.y0)),
            self.map_point(Point::new(rect.x1, rect.y1)),
            self.map_point(Point::new(rect.x0, rect.y1)),
        ];
        let mut out = Rect::from_points(corners[0], corners[1]);
        out = out.union_pt(corners[2]);
        out.union_pt(corners[3])
    }

    /// Determinant of the full 4×4 matrix.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let (inv, m) = self.adjugate();
        m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12]
    }

    /// Returns the inverse, or `None` when the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let (inv, m) = self.adjugate();
        let det = m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12];
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let mut cols = [[0.0_f64; 4]; 4];
        let mut i = 0;
        while i < 16 {
            cols[i / 4][i % 4] = inv[i] * inv_det;
            i += 1;
        }
        Some(Self { cols })
    }

    /// Adjugate of the flattened column-major matrix, returned with the flat
    /// input for the determinant expansion.
    fn adjugate(&self) -> ([f64; 16], [f64; 16]) {
        let mut m = [0.0_f64; 16];
        let mut i = 0;
        while i < 16 {
            m[i] = self.cols[i / 4][i % 4];
            i += 1;
        }
        let mut inv = [0.0_f64; 16];
        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14]
            + m[13] * m[6] * m[11]
            - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14]
            - m[12] * m[6] * m[11]
            + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13]
            + m[12] * m[5] * m[11]
            - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13]
            - m[12] * m[5] * m[10]
            + m[12] * m[6] * m[9];
        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14]
            - m[13] * m[2] * m[11]
            + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14]
            + m[12] * m[2] * m[11]
            - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13]
            - m[12] * m[1] * m[11]
            + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13]
            + m[12] * m[1] * m[10]
            - m[12] * m[2] * m[9];
        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14]
            + m[13] * m[2] * m[7]
            - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14]
            - m[12] * m[2] * m[7]
            + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13]
            + m[12] * m[1] * m[7]
            - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13]
            - m[12] * m[1] * m[6]
            + m[12] * m[2] * m[5];
        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10]
            - m[9] * m[2] * m[7]
            + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10]
            + m[8] * m[2] * m[7]
            - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9]
            - m[8] * m[1] * m[7]
            + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9]
            + m[8] * m[1] * m[6]
            - m[8] * m[2] * m[5];
        (inv, m)
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Is this transform [NaN]?
    ///
    /// [NaN]: f64::is_nan
    #[inline]
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.cols.iter().flatten().any(|v| v.is_nan())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: &Transform3d, b: &Transform3d) -> bool {
        a.cols
            .iter()
            .flatten()
            .zip(b.cols.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
    }

    #[test]
    fn pre_translate_applies_first() {
        let t = Transform3d::from_scale(2.0, 2.0, 1.0).pre_translate(3.0, 4.0);
        // Translate (1, 1) to (4, 5), then scale.
        assert_eq!(t.map_point(Point::new(1.0, 1.0)), Point::new(8.0, 10.0));
    }

    #[test]
    fn get_and_set_use_row_col() {
        let mut t = Transform3d::IDENTITY;
        t.set(0, 3, 7.0);
        assert_eq!(t.cols[3][0], 7.0);
        assert_eq!(t.get(0, 3), 7.0);
    }

    #[test]
    fn inverse_round_trips() {
        let t = Transform3d::from_translation(5.0, -3.0, 2.0)
            * Transform3d::from_rotation_z(0.3)
            * Transform3d::from_scale(2.0, 4.0, 1.0);
        let inv = t.inverse();
        assert!(inv.is_some(), "transform is invertible");
        if let Some(inv) = inv {
            assert!(approx_eq(&(t * inv), &Transform3d::IDENTITY));
        }
    }

    #[test]
    fn singular_has_no_inverse() {
        let t = Transform3d::from_scale(0.0, 1.0, 1.0);
        assert_eq!(t.inverse(), None);
        assert_eq!(t.determinant(), 0.0);
    }

    #[test]
    fn map_rect_bounds_rotated_corners() {
        let t = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2);
        let r = t.map_rect(Rect::new(0.0, 0.0, 10.0, 20.0));
        assert!((r.x0 + 20.0).abs() < 1e-9);
        assert!((r.x1 - 0.0).abs() < 1e-9);
        assert!((r.y1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn axis_alignment() {
        assert!(Transform3d::IDENTITY.preserves_2d_axis_alignment());
        assert!(Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2).preserves_2d_axis_alignment());
        assert!(!Transform3d::from_rotation_z(0.3).preserves_2d_axis_alignment());
        let mut perspective = Transform3d::IDENTITY;
        perspective.set(3, 0, 0.01);
        assert!(!perspective.preserves_2d_axis_alignment());
    }

    #[test]
    fn scale_or_translation_classification() {
        let t = Transform3d::from_translation(3.0, 4.0, 0.0) * Transform3d::from_scale(2.0, 2.0, 1.0);
        assert!(t.is_scale_or_translation());
        assert!(t.is_positive_scale_with_integer_translation());
        assert!(!Transform3d::from_translation(0.5, 0.0, 0.0).is_positive_scale_with_integer_translation());
        assert!(!Transform3d::from_rotation_z(0.3).is_scale_or_translation());
        assert!(Transform3d::from_translation(2.0, 0.0, 0.0).is_identity_or_translation());
    }

    #[test]
    fn affine_round_trip() {
        let a = Affine::new([2.0, 0.5, -1.0, 3.0, 10.0, 20.0]);
        assert_eq!(Transform3d::from_affine(a).to_affine(), a);
    }

    #[test]
    fn orthographic_maps_to_unit_cube() {
        let p = Transform3d::orthographic(0.0, 100.0, 50.0, 0.0);
        assert_eq!(p.map_point(Point::new(0.0, 0.0)), Point::new(-1.0, 1.0));
        assert_eq!(p.map_point(Point::new(100.0, 50.0)), Point::new(1.0, -1.0));
    }

    #[test]
    fn flatten_drops_z() {
        let mut t = Transform3d::from_translation(1.0, 2.0, 3.0);
        t.set(2, 0, 0.5);
        let flat = t.flatten_to_2d();
        assert_eq!(flat.get(2, 0), 0.0);
        assert_eq!(flat.get(2, 2), 1.0);
        assert_eq!(flat.get(0, 3), 1.0);
    }

    #[test]
    fn nan_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(t.is_nan());
    }
}
