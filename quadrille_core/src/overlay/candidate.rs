// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Extraction of overlay descriptors from quads.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::color::Color;
use crate::geometry::{IntRect, IntSize};
use crate::id::ResourceId;
use crate::quad::{DrawQuad, IoSurfaceQuad, QuadKind, StreamVideoQuad, TextureQuad};
use crate::shared_quad_state::{BlendMode, SharedQuadState};

use super::{OverlayTransform, compose_transforms, get_overlay_transform};

/// Pixel format of an overlay plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OverlayFormat {
    /// 8-bit RGBA.
    #[default]
    Rgba8888,
    /// 8-bit BGRA.
    Bgra8888,
}

/// Candidates offered to an [`OverlayCandidateValidator`], in plane order.
///
/// [`OverlayCandidateValidator`]: super::OverlayCandidateValidator
pub type OverlayCandidateList = Vec<OverlayCandidate>;

/// Everything overlay hardware needs to scan out one plane.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayCandidate {
    /// Orientation applied by the hardware.
    pub transform: OverlayTransform,
    /// Pixel format of the buffer.
    pub format: OverlayFormat,
    /// Destination rect in target space.
    pub display_rect: Rect,
    /// Normalized source rect within the buffer.
    pub uv_rect: Rect,
    /// Clip in target space, meaningful when `is_clipped`.
    pub clip_rect: IntRect,
    /// Whether `clip_rect` applies.
    pub is_clipped: bool,
    /// Whether the plane scans out the output surface itself.
    pub use_output_surface_for_resource: bool,
    /// Buffer backing the plane.
    pub resource_id: ResourceId,
    /// Size of the buffer.
    pub resource_size_in_pixels: IntSize,
    /// Stacking relative to the main plane: positive above, negative below.
    pub plane_z_order: i32,
    /// Set by the validator when the hardware accepts the plane.
    pub overlay_handled: bool,
    /// `display_rect` rounded out to whole pixels.
    pub quad_rect_in_target_space: IntRect,
}

impl Default for OverlayCandidate {
    fn default() -> Self {
        Self {
            transform: OverlayTransform::None,
            format: OverlayFormat::Rgba8888,
            display_rect: Rect::ZERO,
            uv_rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            clip_rect: IntRect::default(),
            is_clipped: false,
            use_output_surface_for_resource: false,
            resource_id: ResourceId::NONE,
            resource_size_in_pixels: IntSize::default(),
            plane_z_order: 0,
            overlay_handled: false,
            quad_rect_in_target_space: IntRect::default(),
        }
    }
}

impl OverlayCandidate {
    /// Builds a candidate for `quad` drawn under `sqs`.
    ///
    /// Returns `None` when the quad cannot be an overlay. That covers any
    /// quad that blends, has partial opacity, or uses a blend mode other
    /// than [`BlendMode::SrcOver`], every material other than texture,
    /// stream video, and IOSurface, and any orientation the material's rules
    /// exclude.
    #[must_use]
    pub fn from_draw_quad(quad: &DrawQuad, sqs: &SharedQuadState) -> Option<Self> {
        if quad.should_draw_with_blending(sqs)
            || sqs.opacity != 1.0
            || sqs.blend_mode != BlendMode::SrcOver
        {
            return None;
        }

        let transform = &sqs.quad_to_target_transform;
        let display_rect = transform.map_rect(quad.rect.to_rect());
        let mut candidate = Self {
            display_rect,
            quad_rect_in_target_space: IntRect::enclosing(display_rect),
            format: OverlayFormat::Rgba8888,
            clip_rect: sqs.clip_rect,
            is_clipped: sqs.is_clipped,
            ..Self::default()
        };

        let accepted = match &quad.kind {
            QuadKind::Texture(texture) => candidate.fill_from_texture(quad, texture, sqs),
            QuadKind::StreamVideo(video) => candidate.fill_from_stream_video(quad, video, sqs),
            QuadKind::IoSurface(surface) => candidate.fill_from_io_surface(quad, surface, sqs),
            _ => false,
        };
        accepted.then_some(candidate)
    }

    fn fill_from_texture(
        &mut self,
        quad: &DrawQuad,
        texture: &TextureQuad,
        sqs: &SharedQuadState,
    ) -> bool {
        if !texture.allow_overlay {
            return false;
        }
        let transform = get_overlay_transform(&sqs.quad_to_target_transform, texture.y_flipped);
        if texture.background_color != Color::TRANSPARENT
            || texture.premultiplied_alpha
            || transform == OverlayTransform::Invalid
        {
            return false;
        }
        self.resource_id = quad.resource_id();
        self.resource_size_in_pixels = texture.resource_size_in_pixels;
        self.transform = transform;
        self.uv_rect = Rect::from_points(texture.uv_top_left, texture.uv_bottom_right);
        true
    }

    /// Stream textures address their rows bottom-up, so an unflipped
    /// matrix needs a vertical flip on scan-out and a matrix that already
    /// inverts y needs none.
    fn fill_from_stream_video(
        &mut self,
        quad: &DrawQuad,
        video: &StreamVideoQuad,
        sqs: &SharedQuadState,
    ) -> bool {
        if !video.allow_overlay {
            return false;
        }
        let mut transform = get_overlay_transform(&sqs.quad_to_target_transform, false);
        if transform == OverlayTransform::Invalid {
            return false;
        }
        if !video.matrix.is_scale_or_translation() {
            return false;
        }

        let mut uv0 = video.matrix.map_point(Point::ZERO);
        let mut uv1 = video.matrix.map_point(Point::new(1.0, 1.0));
        let mut delta = uv1 - uv0;
        if delta.x < 0.0 {
            transform = compose_transforms(OverlayTransform::FlipHorizontal, transform);
            core::mem::swap(&mut uv0.x, &mut uv1.x);
            delta.x = -delta.x;
        }
        if delta.y < 0.0 {
            core::mem::swap(&mut uv0.y, &mut uv1.y);
            delta.y = -delta.y;
        } else {
            transform = compose_transforms(OverlayTransform::FlipVertical, transform);
        }
        if transform == OverlayTransform::Invalid {
            return false;
        }

        self.transform = transform;
        self.resource_id = quad.resource_id();
        self.resource_size_in_pixels = video.resource_size_in_pixels;
        self.uv_rect = Rect::from_origin_size(uv0, (delta.x, delta.y));
        true
    }

    fn fill_from_io_surface(
        &mut self,
        quad: &DrawQuad,
        surface: &IoSurfaceQuad,
        sqs: &SharedQuadState,
    ) -> bool {
        if !surface.allow_overlay {
            return false;
        }
        // The surface's orientation is resolved when it is presented, so
        // only the quad transform must leave the plane upright.
        let transform = get_overlay_transform(&sqs.quad_to_target_transform, false);
        if transform != OverlayTransform::None {
            return false;
        }
        self.transform = transform;
        self.resource_id = quad.resource_id();
        self.resource_size_in_pixels = surface.io_surface_size;
        self.uv_rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SharedQuadStateId;
    use crate::quad::{IoSurfaceOrientation, SolidColorQuad};
    use crate::transform::Transform3d;

    const RECT: IntRect = IntRect::new(0, 0, 64, 32);

    fn texture_quad(allow_overlay: bool, premultiplied: bool, y_flipped: bool) -> DrawQuad {
        let mut quad = DrawQuad::default();
        TextureQuad::set_all(
            &mut quad,
            SharedQuadStateId(0),
            RECT,
            RECT,
            RECT,
            false,
            ResourceId(11),
            IntSize::new(64, 32),
            allow_overlay,
            premultiplied,
            Point::new(0.25, 0.75),
            Point::new(0.75, 0.25),
            Color::TRANSPARENT,
            [1.0; 4],
            y_flipped,
            false,
        );
        quad
    }

    fn stream_quad(matrix: Transform3d) -> DrawQuad {
        let mut quad = DrawQuad::default();
        StreamVideoQuad::set_new(
            &mut quad,
            SharedQuadStateId(0),
            RECT,
            RECT,
            RECT,
            ResourceId(3),
            IntSize::new(64, 32),
            true,
            matrix,
        );
        quad
    }

    fn io_surface_quad(orientation: IoSurfaceOrientation) -> DrawQuad {
        let mut quad = DrawQuad::default();
        IoSurfaceQuad::set_all(
            &mut quad,
            SharedQuadStateId(0),
            RECT,
            RECT,
            RECT,
            false,
            IntSize::new(64, 32),
            ResourceId(4),
            orientation,
            true,
        );
        quad
    }

    fn state(transform: Transform3d) -> SharedQuadState {
        SharedQuadState {
            quad_to_target_transform: transform,
            clip_rect: IntRect::new(0, 0, 50, 50),
            is_clipped: true,
            ..SharedQuadState::default()
        }
    }

    #[test]
    fn texture_candidate_fills_geometry() {
        let sqs = state(Transform3d::from_translation(10.0, 5.0, 0.0));
        let candidate = OverlayCandidate::from_draw_quad(&texture_quad(true, false, false), &sqs);
        let Some(candidate) = candidate else {
            panic!("texture should be promotable");
        };
        assert_eq!(candidate.transform, OverlayTransform::None);
        assert_eq!(candidate.display_rect, Rect::new(10.0, 5.0, 74.0, 37.0));
        assert_eq!(candidate.quad_rect_in_target_space, IntRect::new(10, 5, 64, 32));
        assert_eq!(candidate.uv_rect, Rect::new(0.25, 0.25, 0.75, 0.75));
        assert_eq!(candidate.resource_id, ResourceId(11));
        assert_eq!(candidate.resource_size_in_pixels, IntSize::new(64, 32));
        assert_eq!(candidate.clip_rect, IntRect::new(0, 0, 50, 50));
        assert!(candidate.is_clipped);
        assert!(!candidate.overlay_handled);
    }

    #[test]
    fn texture_rejections() {
        let sqs = state(Transform3d::IDENTITY);
        assert!(OverlayCandidate::from_draw_quad(&texture_quad(false, false, false), &sqs).is_none());
        assert!(OverlayCandidate::from_draw_quad(&texture_quad(true, true, false), &sqs).is_none());

        let mut opaque_bg = texture_quad(true, false, false);
        if let QuadKind::Texture(texture) = &mut opaque_bg.kind {
            texture.background_color = Color::BLACK;
        }
        assert!(OverlayCandidate::from_draw_quad(&opaque_bg, &sqs).is_none());

        let skewed = state(Transform3d::from_rotation_z(0.3));
        assert!(OverlayCandidate::from_draw_quad(&texture_quad(true, false, false), &skewed).is_none());
    }

    #[test]
    fn y_flipped_texture_flips_vertically() {
        let sqs = state(Transform3d::IDENTITY);
        let candidate = OverlayCandidate::from_draw_quad(&texture_quad(true, false, true), &sqs);
        assert_eq!(candidate.map(|c| c.transform), Some(OverlayTransform::FlipVertical));
    }

    #[test]
    fn blending_opacity_and_blend_mode_reject() {
        let quad = texture_quad(true, false, false);

        let mut translucent = state(Transform3d::IDENTITY);
        translucent.opacity = 0.5;
        assert!(OverlayCandidate::from_draw_quad(&quad, &translucent).is_none());

        let mut multiply = state(Transform3d::IDENTITY);
        multiply.blend_mode = BlendMode::Multiply;
        assert!(OverlayCandidate::from_draw_quad(&quad, &multiply).is_none());

        let mut blended = quad.clone();
        blended.needs_blending = true;
        assert!(OverlayCandidate::from_draw_quad(&blended, &state(Transform3d::IDENTITY)).is_none());
    }

    #[test]
    fn other_materials_never_promote() {
        let mut quad = DrawQuad::default();
        SolidColorQuad::set_new(&mut quad, SharedQuadStateId(0), RECT, RECT, Color::RED, false);
        assert!(OverlayCandidate::from_draw_quad(&quad, &state(Transform3d::IDENTITY)).is_none());
    }

    #[test]
    fn stream_video_identity_matrix_flips_vertically() {
        let sqs = state(Transform3d::IDENTITY);
        let candidate = OverlayCandidate::from_draw_quad(&stream_quad(Transform3d::IDENTITY), &sqs);
        let Some(candidate) = candidate else {
            panic!("stream video should be promotable");
        };
        assert_eq!(candidate.transform, OverlayTransform::FlipVertical);
        assert_eq!(candidate.uv_rect, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(candidate.resource_id, ResourceId(3));
    }

    #[test]
    fn stream_video_matrix_sign_selects_flips() {
        let sqs = state(Transform3d::IDENTITY);

        // y already inverted: no vertical flip needed.
        let y_inverted = Transform3d::from_translation(0.0, 1.0, 0.0).pre_scale(1.0, -1.0);
        let candidate = OverlayCandidate::from_draw_quad(&stream_quad(y_inverted), &sqs);
        assert_eq!(candidate.as_ref().map(|c| c.transform), Some(OverlayTransform::None));
        assert_eq!(candidate.map(|c| c.uv_rect), Some(Rect::new(0.0, 0.0, 1.0, 1.0)));

        // Both axes inverted: a horizontal flip on top of nothing.
        let both = Transform3d::from_translation(1.0, 1.0, 0.0).pre_scale(-1.0, -1.0);
        let candidate = OverlayCandidate::from_draw_quad(&stream_quad(both), &sqs);
        assert_eq!(candidate.map(|c| c.transform), Some(OverlayTransform::FlipHorizontal));

        // Neither inverted, but x mirrored: horizontal composed with vertical.
        let x_mirrored = Transform3d::from_translation(1.0, 0.0, 0.0).pre_scale(-1.0, 1.0);
        let candidate = OverlayCandidate::from_draw_quad(&stream_quad(x_mirrored), &sqs);
        assert_eq!(candidate.map(|c| c.transform), Some(OverlayTransform::Rotate180));
    }

    #[test]
    fn stream_video_sub_rect_uv() {
        let sqs = state(Transform3d::IDENTITY);
        let matrix = Transform3d::from_translation(0.0, 0.75, 0.0).pre_scale(0.5, -0.5);
        let candidate = OverlayCandidate::from_draw_quad(&stream_quad(matrix), &sqs);
        assert_eq!(candidate.map(|c| c.uv_rect), Some(Rect::new(0.0, 0.25, 0.5, 0.75)));
    }

    #[test]
    fn stream_video_rejects_rotating_matrix_and_rotated_flip() {
        let sqs = state(Transform3d::IDENTITY);
        let rotating = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2);
        assert!(OverlayCandidate::from_draw_quad(&stream_quad(rotating), &sqs).is_none());

        // A quarter-turn quad cannot take the implicit vertical flip.
        let rotated = state(Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2));
        assert!(OverlayCandidate::from_draw_quad(&stream_quad(Transform3d::IDENTITY), &rotated).is_none());
    }

    #[test]
    fn io_surface_requires_no_reorientation() {
        let identity = state(Transform3d::IDENTITY);
        let candidate =
            OverlayCandidate::from_draw_quad(&io_surface_quad(IoSurfaceOrientation::Unflipped), &identity);
        let Some(candidate) = candidate else {
            panic!("unflipped IOSurface should be promotable");
        };
        assert_eq!(candidate.transform, OverlayTransform::None);
        assert_eq!(candidate.uv_rect, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(candidate.resource_size_in_pixels, IntSize::new(64, 32));

        // Orientation does not take part in the plane transform.
        let flipped =
            OverlayCandidate::from_draw_quad(&io_surface_quad(IoSurfaceOrientation::Flipped), &identity);
        assert_eq!(flipped.map(|c| c.transform), Some(OverlayTransform::None));

        let mirrored = state(Transform3d::from_scale(1.0, -1.0, 1.0));
        for orientation in [IoSurfaceOrientation::Unflipped, IoSurfaceOrientation::Flipped] {
            assert!(OverlayCandidate::from_draw_quad(&io_surface_quad(orientation), &mirrored).is_none());
        }
    }
}
