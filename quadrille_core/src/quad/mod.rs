// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed family of draw quads.
//!
//! A [`DrawQuad`] is one draw primitive: a rect in quad space plus a
//! material-specific payload ([`QuadKind`]). Quads never own their transform,
//! clip, or opacity; those live in a
//! [`SharedQuadState`](crate::shared_quad_state::SharedQuadState) that the
//! quad cites by index.
//!
//! Every payload type offers two initializers:
//!
//! - `set_new` takes only the per-instance arguments and derives the rest
//!   (opaque rect, blending, overlay metadata) the way a producer would.
//! - `set_all` takes every field explicitly and is what copy paths use.
//!
//! Calling `set_all` with the fields `set_new` derived reproduces the same
//! quad.

mod content;
mod pass;
mod solid;
mod video;

pub use content::{TextureQuad, TileQuad};
pub use pass::{RenderPassQuad, SurfaceQuad};
pub use solid::{DebugBorderQuad, SolidColorQuad};
pub use video::{IoSurfaceOrientation, IoSurfaceQuad, StreamVideoQuad, YuvColorSpace, YuvVideoQuad};

use kurbo::Rect;

use crate::geometry::{IntRect, map_rect_proportional};
use crate::id::{ResourceId, SharedQuadStateId};
use crate::resource::ResourceList;
use crate::shared_quad_state::SharedQuadState;

/// Field-less tag naming a quad's material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Material {
    /// A quad that has not been initialized.
    #[default]
    Invalid,
    /// Stroked debug outline.
    DebugBorder,
    /// Platform IOSurface content.
    IoSurface,
    /// Output of another render pass.
    RenderPass,
    /// Flat color.
    SolidColor,
    /// Stream texture video frame.
    StreamVideo,
    /// Embedded compositor surface.
    Surface,
    /// Generic texture.
    Texture,
    /// Rasterized tile.
    Tile,
    /// Planar YUV video frame.
    YuvVideo,
}

impl Material {
    /// Every material, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Invalid,
        Self::DebugBorder,
        Self::IoSurface,
        Self::RenderPass,
        Self::SolidColor,
        Self::StreamVideo,
        Self::Surface,
        Self::Texture,
        Self::Tile,
        Self::YuvVideo,
    ];

    /// Short name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::DebugBorder => "debug-border",
            Self::IoSurface => "io-surface",
            Self::RenderPass => "render-pass",
            Self::SolidColor => "solid-color",
            Self::StreamVideo => "stream-video",
            Self::Surface => "surface",
            Self::Texture => "texture",
            Self::Tile => "tile",
            Self::YuvVideo => "yuv-video",
        }
    }

    /// Stable numeric code used by binary trace encodings.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Invalid => 0,
            Self::DebugBorder => 1,
            Self::IoSurface => 2,
            Self::RenderPass => 3,
            Self::SolidColor => 4,
            Self::StreamVideo => 5,
            Self::Surface => 6,
            Self::Texture => 7,
            Self::Tile => 8,
            Self::YuvVideo => 9,
        }
    }

    /// Inverse of [`Material::code`].
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Invalid),
            1 => Some(Self::DebugBorder),
            2 => Some(Self::IoSurface),
            3 => Some(Self::RenderPass),
            4 => Some(Self::SolidColor),
            5 => Some(Self::StreamVideo),
            6 => Some(Self::Surface),
            7 => Some(Self::Texture),
            8 => Some(Self::Tile),
            9 => Some(Self::YuvVideo),
            _ => None,
        }
    }
}

/// Material-specific payload of a [`DrawQuad`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum QuadKind {
    /// Not yet initialized.
    #[default]
    Invalid,
    /// See [`DebugBorderQuad`].
    DebugBorder(DebugBorderQuad),
    /// See [`IoSurfaceQuad`].
    IoSurface(IoSurfaceQuad),
    /// See [`RenderPassQuad`].
    RenderPass(RenderPassQuad),
    /// See [`SolidColorQuad`].
    SolidColor(SolidColorQuad),
    /// See [`StreamVideoQuad`].
    StreamVideo(StreamVideoQuad),
    /// See [`SurfaceQuad`].
    Surface(SurfaceQuad),
    /// See [`TextureQuad`].
    Texture(TextureQuad),
    /// See [`TileQuad`].
    Tile(TileQuad),
    /// See [`YuvVideoQuad`].
    YuvVideo(YuvVideoQuad),
}

/// One draw primitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawQuad {
    /// Bounds in quad space.
    pub rect: IntRect,
    /// Sub-rect known to be fully opaque; may be empty.
    pub opaque_rect: IntRect,
    /// Sub-rect that is not occluded; drawing is limited to it.
    pub visible_rect: IntRect,
    /// Whether the content itself has non-opaque pixels.
    pub needs_blending: bool,
    /// Index of the cited shared state within the owning pass.
    pub shared_quad_state: SharedQuadStateId,
    /// Resource ids cited by the payload.
    pub resources: ResourceList,
    /// Material payload.
    pub kind: QuadKind,
}

/// Size in bytes of the largest quad, which is every quad's arena slot size.
#[must_use]
pub const fn largest_quad_size() -> usize {
    size_of::<DrawQuad>()
}

impl DrawQuad {
    /// Sets the fields shared by every material and installs `kind`.
    ///
    /// Resources are left as they are; payload initializers set them.
    pub fn set_all(
        &mut self,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        kind: QuadKind,
    ) {
        debug_assert!(
            rect.contains(visible_rect),
            "visible rect {visible_rect:?} escapes quad rect {rect:?}"
        );
        debug_assert!(
            opaque_rect.is_empty() || rect.contains(opaque_rect),
            "opaque rect {opaque_rect:?} escapes quad rect {rect:?}"
        );
        self.shared_quad_state = shared_quad_state;
        self.rect = rect;
        self.opaque_rect = opaque_rect;
        self.visible_rect = visible_rect;
        self.needs_blending = needs_blending;
        self.kind = kind;
    }

    /// The material tag of the payload.
    #[must_use]
    pub const fn material(&self) -> Material {
        match self.kind {
            QuadKind::Invalid => Material::Invalid,
            QuadKind::DebugBorder(_) => Material::DebugBorder,
            QuadKind::IoSurface(_) => Material::IoSurface,
            QuadKind::RenderPass(_) => Material::RenderPass,
            QuadKind::SolidColor(_) => Material::SolidColor,
            QuadKind::StreamVideo(_) => Material::StreamVideo,
            QuadKind::Surface(_) => Material::Surface,
            QuadKind::Texture(_) => Material::Texture,
            QuadKind::Tile(_) => Material::Tile,
            QuadKind::YuvVideo(_) => Material::YuvVideo,
        }
    }

    /// Returns `true` when the quad must be composited with blending under
    /// `sqs`.
    ///
    /// An empty visible rect never needs blending; otherwise any part of the
    /// visible rect outside the opaque rect does.
    #[must_use]
    pub fn should_draw_with_blending(&self, sqs: &SharedQuadState) -> bool {
        if self.needs_blending || sqs.opacity < 1.0 {
            return true;
        }
        if self.visible_rect.is_empty() {
            return false;
        }
        !self.opaque_rect.contains(self.visible_rect)
    }

    /// The quad touches the left edge of its layer.
    #[must_use]
    pub const fn is_left_edge(&self) -> bool {
        self.rect.x == 0
    }

    /// The quad touches the top edge of its layer.
    #[must_use]
    pub const fn is_top_edge(&self) -> bool {
        self.rect.y == 0
    }

    /// The quad touches the right edge of its layer's bounds.
    #[must_use]
    pub const fn is_right_edge(&self, sqs: &SharedQuadState) -> bool {
        self.rect.right() == sqs.quad_layer_bounds.width
    }

    /// The quad touches the bottom edge of its layer's bounds.
    #[must_use]
    pub const fn is_bottom_edge(&self, sqs: &SharedQuadState) -> bool {
        self.rect.bottom() == sqs.quad_layer_bounds.height
    }

    /// Returns `true` for debug-only quads.
    #[must_use]
    pub const fn is_debug_quad(&self) -> bool {
        matches!(self.kind, QuadKind::DebugBorder(_))
    }

    /// The visible rect in the payload's content coordinates.
    ///
    /// For tiles this is texel space, for textures normalized UV space. Other
    /// materials return the visible rect unchanged.
    #[must_use]
    pub fn visible_content_rect(&self) -> Rect {
        let visible = self.visible_rect.to_rect();
        match &self.kind {
            QuadKind::Tile(tile) => {
                map_rect_proportional(self.rect.to_rect(), tile.tex_coord_rect, visible)
            }
            QuadKind::Texture(texture) => map_rect_proportional(
                self.rect.to_rect(),
                Rect::from_points(texture.uv_top_left, texture.uv_bottom_right),
                visible,
            ),
            _ => visible,
        }
    }

    /// The first resource id, or [`ResourceId::NONE`].
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.resources.get(0).unwrap_or(ResourceId::NONE)
    }

    /// The solid-color payload, if this is a solid-color quad.
    #[must_use]
    pub const fn as_solid_color(&self) -> Option<&SolidColorQuad> {
        match &self.kind {
            QuadKind::SolidColor(q) => Some(q),
            _ => None,
        }
    }

    /// The debug-border payload, if this is a debug-border quad.
    #[must_use]
    pub const fn as_debug_border(&self) -> Option<&DebugBorderQuad> {
        match &self.kind {
            QuadKind::DebugBorder(q) => Some(q),
            _ => None,
        }
    }

    /// The texture payload, if this is a texture quad.
    #[must_use]
    pub const fn as_texture(&self) -> Option<&TextureQuad> {
        match &self.kind {
            QuadKind::Texture(q) => Some(q),
            _ => None,
        }
    }

    /// The tile payload, if this is a tile quad.
    #[must_use]
    pub const fn as_tile(&self) -> Option<&TileQuad> {
        match &self.kind {
            QuadKind::Tile(q) => Some(q),
            _ => None,
        }
    }

    /// The render-pass payload, if this is a render-pass quad.
    #[must_use]
    pub const fn as_render_pass(&self) -> Option<&RenderPassQuad> {
        match &self.kind {
            QuadKind::RenderPass(q) => Some(q),
            _ => None,
        }
    }

    /// The render-pass payload mutably, if this is a render-pass quad.
    #[must_use]
    pub fn as_render_pass_mut(&mut self) -> Option<&mut RenderPassQuad> {
        match &mut self.kind {
            QuadKind::RenderPass(q) => Some(q),
            _ => None,
        }
    }

    /// The YUV payload, if this is a YUV video quad.
    #[must_use]
    pub const fn as_yuv_video(&self) -> Option<&YuvVideoQuad> {
        match &self.kind {
            QuadKind::YuvVideo(q) => Some(q),
            _ => None,
        }
    }

    /// The stream-video payload, if this is a stream-video quad.
    #[must_use]
    pub const fn as_stream_video(&self) -> Option<&StreamVideoQuad> {
        match &self.kind {
            QuadKind::StreamVideo(q) => Some(q),
            _ => None,
        }
    }

    /// The IOSurface payload, if this is an IOSurface quad.
    #[must_use]
    pub const fn as_io_surface(&self) -> Option<&IoSurfaceQuad> {
        match &self.kind {
            QuadKind::IoSurface(q) => Some(q),
            _ => None,
        }
    }

    /// The surface payload, if this is a surface quad.
    #[must_use]
    pub const fn as_surface(&self) -> Option<&SurfaceQuad> {
        match &self.kind {
            QuadKind::Surface(q) => Some(q),
            _ => None,
        }
    }
}
