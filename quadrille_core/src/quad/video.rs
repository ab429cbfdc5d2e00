// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Video and platform-surface materials.

use kurbo::Rect;

use crate::geometry::{IntRect, IntSize};
use crate::id::{ResourceId, SharedQuadStateId};
use crate::resource::ResourceList;
use crate::transform::Transform3d;

use super::{DrawQuad, QuadKind};

/// YUV to RGB conversion matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum YuvColorSpace {
    /// ITU-R BT.601, limited range.
    #[default]
    Rec601,
    /// ITU-R BT.709, limited range.
    Rec709,
    /// BT.601 full range (JPEG).
    Jpeg,
}

/// A planar video frame. Resources are Y, U, V, and optionally A.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct YuvVideoQuad {
    /// Texel rect sampled from the Y and A planes.
    pub ya_tex_coord_rect: Rect,
    /// Texel rect sampled from the U and V planes.
    pub uv_tex_coord_rect: Rect,
    /// Size of the Y and A planes.
    pub ya_tex_size: IntSize,
    /// Size of the U and V planes.
    pub uv_tex_size: IntSize,
    /// Conversion matrix.
    pub color_space: YuvColorSpace,
}

impl YuvVideoQuad {
    /// Y plane index.
    pub const Y_PLANE: usize = 0;
    /// U plane index.
    pub const U_PLANE: usize = 1;
    /// V plane index.
    pub const V_PLANE: usize = 2;
    /// A plane index; present only when the frame has alpha.
    pub const A_PLANE: usize = 3;

    /// Initializes `quad` as a YUV frame. A non-zero `a_plane` adds a fourth
    /// resource.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        ya_tex_coord_rect: Rect,
        uv_tex_coord_rect: Rect,
        ya_tex_size: IntSize,
        uv_tex_size: IntSize,
        planes: [ResourceId; 4],
        color_space: YuvColorSpace,
    ) {
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            false,
            ya_tex_coord_rect,
            uv_tex_coord_rect,
            ya_tex_size,
            uv_tex_size,
            planes,
            color_space,
        );
    }

    /// Initializes every field of `quad` as a YUV frame.
    pub fn set_all(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        ya_tex_coord_rect: Rect,
        uv_tex_coord_rect: Rect,
        ya_tex_size: IntSize,
        uv_tex_size: IntSize,
        planes: [ResourceId; 4],
        color_space: YuvColorSpace,
    ) {
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::YuvVideo(Self {
                ya_tex_coord_rect,
                uv_tex_coord_rect,
                ya_tex_size,
                uv_tex_size,
                color_space,
            }),
        );
        let count = if planes[Self::A_PLANE].is_valid() { 4 } else { 3 };
        quad.resources = ResourceList::from_slice(&planes[..count]);
    }
}

/// A video frame delivered as a stream texture. The texture is
/// `resources[0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StreamVideoQuad {
    /// Texture coordinate transform supplied with the frame.
    pub matrix: Transform3d,
    /// Size of the backing resource.
    pub resource_size_in_pixels: IntSize,
    /// Whether the frame may be promoted to a hardware overlay.
    pub allow_overlay: bool,
}

impl StreamVideoQuad {
    /// Initializes `quad` as a stream-video frame.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        resource_id: ResourceId,
        resource_size_in_pixels: IntSize,
        allow_overlay: bool,
        matrix: Transform3d,
    ) {
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            false,
            resource_id,
            resource_size_in_pixels,
            allow_overlay,
            matrix,
        );
    }

    /// Initializes every field of `quad` as a stream-video frame.
    pub fn set_all(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        resource_id: ResourceId,
        resource_size_in_pixels: IntSize,
        allow_overlay: bool,
        matrix: Transform3d,
    ) {
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::StreamVideo(Self {
                matrix,
                resource_size_in_pixels,
                allow_overlay,
            }),
        );
        quad.resources = ResourceList::one(resource_id);
    }
}

/// Row order of an IOSurface's contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IoSurfaceOrientation {
    /// Rows are stored bottom-up.
    Flipped,
    /// Rows are stored top-down.
    #[default]
    Unflipped,
}

/// Platform IOSurface content. The surface is `resources[0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IoSurfaceQuad {
    /// Size of the surface.
    pub io_surface_size: IntSize,
    /// Row order.
    pub orientation: IoSurfaceOrientation,
    /// Whether the surface may be promoted to a hardware overlay.
    pub allow_overlay: bool,
}

impl IoSurfaceQuad {
    /// Initializes `quad` as an IOSurface. Overlay promotion starts out
    /// disallowed.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        io_surface_size: IntSize,
        resource_id: ResourceId,
        orientation: IoSurfaceOrientation,
    ) {
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            false,
            io_surface_size,
            resource_id,
            orientation,
            false,
        );
    }

    /// Initializes every field of `quad` as an IOSurface.
    pub fn set_all(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        io_surface_size: IntSize,
        resource_id: ResourceId,
        orientation: IoSurfaceOrientation,
        allow_overlay: bool,
    ) {
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::IoSurface(Self {
                io_surface_size,
                orientation,
                allow_overlay,
            }),
        );
        quad.resources = ResourceList::one(resource_id);
    }
}
