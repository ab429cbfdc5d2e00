// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hardware overlay promotion.
//!
//! An overlay is a plane composited by display hardware instead of by the
//! renderer. This module decides which quads could become overlays and how
//! the hardware must orient them:
//!
//! - [`OverlayCandidate::from_draw_quad`] extracts a candidate from a quad or
//!   rejects it. Rejection is an ordinary `None`, never an error.
//! - [`get_overlay_transform`] classifies a quad transform into one of the
//!   orientations overlay hardware supports.
//! - [`OverlayProcessor`] runs an ordered list of [`OverlayStrategy`]s
//!   against the root pass and stops at the first that promotes a quad.

mod candidate;
mod strategy;

pub use candidate::{OverlayCandidate, OverlayCandidateList, OverlayFormat};
pub use strategy::{
    OverlayCandidateValidator, OverlayProcessor, OverlayStrategy, SingleOnTop, Underlay,
};

use crate::transform::Transform3d;

/// Orientation applied by overlay hardware when scanning out a plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OverlayTransform {
    /// Not expressible by overlay hardware.
    #[default]
    Invalid,
    /// No reorientation.
    None,
    /// Mirror left to right.
    FlipHorizontal,
    /// Mirror top to bottom.
    FlipVertical,
    /// Rotate 90 degrees clockwise.
    Rotate90,
    /// Rotate 180 degrees.
    Rotate180,
    /// Rotate 270 degrees clockwise.
    Rotate270,
}

impl OverlayTransform {
    /// Short name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::None => "none",
            Self::FlipHorizontal => "flip-horizontal",
            Self::FlipVertical => "flip-vertical",
            Self::Rotate90 => "rotate-90",
            Self::Rotate180 => "rotate-180",
            Self::Rotate270 => "rotate-270",
        }
    }
}

/// Where a transformed unit axis points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    None,
    PosX,
    NegX,
    PosY,
    NegY,
}

fn is_nearly_zero(v: f64) -> bool {
    v.abs() < f64::from(f32::EPSILON)
}

fn vector_to_axis([x, y, z]: [f64; 3]) -> Axis {
    if !is_nearly_zero(z) {
        return Axis::None;
    }
    let x_zero = is_nearly_zero(x);
    let y_zero = is_nearly_zero(y);
    if x_zero && !y_zero {
        if y > 0.0 { Axis::PosY } else { Axis::NegY }
    } else if y_zero && !x_zero {
        if x > 0.0 { Axis::PosX } else { Axis::NegX }
    } else {
        Axis::None
    }
}

/// Classifies `quad_transform` as an overlay orientation.
///
/// The transform must keep the x and y axes axis-aligned. The image of each
/// axis is then matched against the six orientations hardware supports.
/// `y_flipped` content has its y axis reversed first. The two transposing
/// orientations are [`OverlayTransform::Invalid`].
#[must_use]
pub fn get_overlay_transform(quad_transform: &Transform3d, y_flipped: bool) -> OverlayTransform {
    if !quad_transform.preserves_2d_axis_alignment() {
        return OverlayTransform::Invalid;
    }
    let x_axis = quad_transform.x_axis();
    let mut y_axis = quad_transform.y_axis();
    if y_flipped {
        y_axis = [-y_axis[0], -y_axis[1], -y_axis[2]];
    }
    match (vector_to_axis(x_axis), vector_to_axis(y_axis)) {
        (Axis::PosX, Axis::PosY) => OverlayTransform::None,
        (Axis::NegX, Axis::PosY) => OverlayTransform::FlipHorizontal,
        (Axis::PosX, Axis::NegY) => OverlayTransform::FlipVertical,
        (Axis::NegY, Axis::PosX) => OverlayTransform::Rotate270,
        (Axis::NegX, Axis::NegY) => OverlayTransform::Rotate180,
        (Axis::PosY, Axis::NegX) => OverlayTransform::Rotate90,
        _ => OverlayTransform::Invalid,
    }
}

/// Applies the flip `delta` on top of `base`.
///
/// [`OverlayTransform::None`] is an identity on either side. Otherwise only
/// flips are folded in, and only into orientations that stay expressible:
/// composing a flip with a quarter turn yields a transposition, which
/// overlay hardware cannot scan out, so it is [`OverlayTransform::Invalid`].
#[must_use]
pub const fn compose_transforms(delta: OverlayTransform, base: OverlayTransform) -> OverlayTransform {
    use OverlayTransform as T;
    match (delta, base) {
        (T::None, base) => base,
        (delta, T::None) => delta,
        (T::FlipHorizontal, T::None) => T::FlipHorizontal,
        (T::FlipHorizontal, T::FlipVertical) => T::Rotate180,
        (T::FlipHorizontal, T::FlipHorizontal) => T::None,
        (T::FlipHorizontal, T::Rotate180) => T::FlipVertical,
        (T::FlipVertical, T::None) => T::FlipVertical,
        (T::FlipVertical, T::FlipVertical) => T::None,
        (T::FlipVertical, T::FlipHorizontal) => T::Rotate180,
        (T::FlipVertical, T::Rotate180) => T::FlipHorizontal,
        _ => T::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OverlayTransform; 7] = [
        OverlayTransform::Invalid,
        OverlayTransform::None,
        OverlayTransform::FlipHorizontal,
        OverlayTransform::FlipVertical,
        OverlayTransform::Rotate90,
        OverlayTransform::Rotate180,
        OverlayTransform::Rotate270,
    ];

    fn axes(x: [f64; 2], y: [f64; 2]) -> Transform3d {
        Transform3d::from_cols(
            [x[0], x[1], 0.0, 0.0],
            [y[0], y[1], 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    #[test]
    fn axis_table_covers_every_signed_pair() {
        let px = [2.0, 0.0];
        let nx = [-2.0, 0.0];
        let py = [0.0, 3.0];
        let ny = [0.0, -3.0];
        let cases = [
            (px, py, OverlayTransform::None),
            (nx, py, OverlayTransform::FlipHorizontal),
            (px, ny, OverlayTransform::FlipVertical),
            (nx, ny, OverlayTransform::Rotate180),
            (ny, px, OverlayTransform::Rotate270),
            (py, nx, OverlayTransform::Rotate90),
            // Transpositions.
            (py, px, OverlayTransform::Invalid),
            (ny, nx, OverlayTransform::Invalid),
        ];
        for (x, y, expected) in cases {
            assert_eq!(get_overlay_transform(&axes(x, y), false), expected, "x={x:?} y={y:?}");
        }
    }

    #[test]
    fn rotation_matrices_classify() {
        let r90 = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2);
        assert_eq!(get_overlay_transform(&r90, false), OverlayTransform::Rotate90);
        let r270 = Transform3d::from_rotation_z(-core::f64::consts::FRAC_PI_2);
        assert_eq!(get_overlay_transform(&r270, false), OverlayTransform::Rotate270);
        let skew = Transform3d::from_rotation_z(0.4);
        assert_eq!(get_overlay_transform(&skew, false), OverlayTransform::Invalid);
    }

    #[test]
    fn y_flip_reverses_y_axis() {
        assert_eq!(
            get_overlay_transform(&Transform3d::IDENTITY, true),
            OverlayTransform::FlipVertical
        );
        let mirrored = Transform3d::from_scale(1.0, -1.0, 1.0);
        assert_eq!(get_overlay_transform(&mirrored, true), OverlayTransform::None);
    }

    #[test]
    fn z_component_rejects() {
        let mut t = Transform3d::IDENTITY;
        t.set(2, 0, 0.5);
        assert_eq!(get_overlay_transform(&t, false), OverlayTransform::Invalid);
    }

    #[test]
    fn none_is_compose_identity() {
        for t in ALL {
            assert_eq!(compose_transforms(OverlayTransform::None, t), t);
            assert_eq!(compose_transforms(t, OverlayTransform::None), t);
        }
    }

    #[test]
    fn flips_compose_like_mirrors() {
        use OverlayTransform as T;
        assert_eq!(compose_transforms(T::FlipHorizontal, T::FlipHorizontal), T::None);
        assert_eq!(compose_transforms(T::FlipVertical, T::FlipHorizontal), T::Rotate180);
        assert_eq!(compose_transforms(T::FlipHorizontal, T::Rotate180), T::FlipVertical);
        assert_eq!(compose_transforms(T::FlipVertical, T::Rotate90), T::Invalid);
        assert_eq!(compose_transforms(T::FlipHorizontal, T::Rotate270), T::Invalid);
        assert_eq!(compose_transforms(T::Rotate90, T::FlipVertical), T::Invalid);
        assert_eq!(compose_transforms(T::FlipVertical, T::Invalid), T::Invalid);
    }
}
