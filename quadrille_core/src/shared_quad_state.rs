// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attributes shared by a contiguous run of quads.

use crate::geometry::{IntRect, IntSize};
use crate::transform::Transform3d;

/// How a quad's pixels combine with the pixels already in its target.
///
/// The full Skia transfer-mode set: Porter-Duff operators first, then the
/// separable and non-separable blend modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Clears the destination.
    Clear,
    /// Replaces the destination.
    Src,
    /// Keeps the destination.
    Dst,
    /// Standard source-over alpha compositing.
    #[default]
    SrcOver,
    /// Destination over source.
    DstOver,
    /// Source inside destination.
    SrcIn,
    /// Destination inside source.
    DstIn,
    /// Source outside destination.
    SrcOut,
    /// Destination outside source.
    DstOut,
    /// Source atop destination.
    SrcATop,
    /// Destination atop source.
    DstATop,
    /// Exclusive or.
    Xor,
    /// Saturating add.
    Plus,
    /// Component-wise multiply without alpha complement.
    Modulate,
    /// Screen blend.
    Screen,
    /// Overlay blend.
    Overlay,
    /// Darken blend.
    Darken,
    /// Lighten blend.
    Lighten,
    /// Color-dodge blend.
    ColorDodge,
    /// Color-burn blend.
    ColorBurn,
    /// Hard-light blend.
    HardLight,
    /// Soft-light blend.
    SoftLight,
    /// Difference blend.
    Difference,
    /// Exclusion blend.
    Exclusion,
    /// Multiply blend.
    Multiply,
    /// Hue blend.
    Hue,
    /// Saturation blend.
    Saturation,
    /// Color blend.
    Color,
    /// Luminosity blend.
    Luminosity,
}

impl BlendMode {
    /// Every blend mode, in declaration order.
    pub const ALL: [Self; 29] = [
        Self::Clear,
        Self::Src,
        Self::Dst,
        Self::SrcOver,
        Self::DstOver,
        Self::SrcIn,
        Self::DstIn,
        Self::SrcOut,
        Self::DstOut,
        Self::SrcATop,
        Self::DstATop,
        Self::Xor,
        Self::Plus,
        Self::Modulate,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::Multiply,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];

    /// Short lowercase name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Src => "src",
            Self::Dst => "dst",
            Self::SrcOver => "src-over",
            Self::DstOver => "dst-over",
            Self::SrcIn => "src-in",
            Self::DstIn => "dst-in",
            Self::SrcOut => "src-out",
            Self::DstOut => "dst-out",
            Self::SrcATop => "src-atop",
            Self::DstATop => "dst-atop",
            Self::Xor => "xor",
            Self::Plus => "plus",
            Self::Modulate => "modulate",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Multiply => "multiply",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }
}

/// Transform, clip, opacity, and blend attributes for a run of quads.
///
/// Quads refer to their state by [`SharedQuadStateId`](crate::id::SharedQuadStateId);
/// all quads citing one state must be adjacent in the pass's quad list.
#[derive(Clone, Debug, PartialEq)]
pub struct SharedQuadState {
    /// Maps quad (layer content) space to the pass's target space.
    pub quad_to_target_transform: Transform3d,
    /// Bounds of the originating layer, used by the edge predicates.
    pub quad_layer_bounds: IntSize,
    /// Visible part of the layer in layer space.
    pub visible_quad_layer_rect: IntRect,
    /// Clip in target space; only meaningful when `is_clipped`.
    pub clip_rect: IntRect,
    /// Whether `clip_rect` applies.
    pub is_clipped: bool,
    /// Opacity multiplied into every quad.
    pub opacity: f32,
    /// How the quads composite into the target.
    pub blend_mode: BlendMode,
    /// 3-D sorting context; 0 means the quads are flat.
    pub sorting_context_id: i32,
}

impl Default for SharedQuadState {
    fn default() -> Self {
        Self {
            quad_to_target_transform: Transform3d::IDENTITY,
            quad_layer_bounds: IntSize::default(),
            visible_quad_layer_rect: IntRect::default(),
            clip_rect: IntRect::default(),
            is_clipped: false,
            opacity: 1.0,
            blend_mode: BlendMode::SrcOver,
            sorting_context_id: 0,
        }
    }
}

impl SharedQuadState {
    /// Sets every field.
    pub fn set_all(
        &mut self,
        quad_to_target_transform: Transform3d,
        quad_layer_bounds: IntSize,
        visible_quad_layer_rect: IntRect,
        clip_rect: IntRect,
        is_clipped: bool,
        opacity: f32,
        blend_mode: BlendMode,
        sorting_context_id: i32,
    ) {
        self.quad_to_target_transform = quad_to_target_transform;
        self.quad_layer_bounds = quad_layer_bounds;
        self.visible_quad_layer_rect = visible_quad_layer_rect;
        self.clip_rect = clip_rect;
        self.is_clipped = is_clipped;
        self.opacity = opacity;
        self.blend_mode = blend_mode;
        self.sorting_context_id = sorting_context_id;
    }

    /// Copies every field from `other`.
    pub fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }
}
