// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Materials that reference other compositing outputs.

use kurbo::{Rect, Vec2};

use crate::filter::FilterOperations;
use crate::geometry::{IntRect, IntSize};
use crate::id::{RenderPassId, ResourceId, SharedQuadStateId, SurfaceId};
use crate::resource::ResourceList;

use super::{DrawQuad, QuadKind};

/// Draws the output of another render pass.
///
/// The optional mask is `resources[0]`; a pass quad without a mask cites no
/// resources.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPassQuad {
    /// The pass whose output is drawn.
    pub render_pass_id: RenderPassId,
    /// Scale from quad space to normalized mask space.
    pub mask_uv_scale: Vec2,
    /// Size of the mask texture.
    pub mask_texture_size: IntSize,
    /// Filters applied to the pass content.
    pub filters: FilterOperations,
    /// Scale applied to filter parameters (device scale).
    pub filters_scale: Vec2,
    /// Filters applied to the content behind the quad.
    pub background_filters: FilterOperations,
}

impl RenderPassQuad {
    /// Initializes `quad` as a pass reference. Pass quads are never opaque.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        visible_rect: IntRect,
        render_pass_id: RenderPassId,
        mask_resource_id: ResourceId,
        mask_uv_scale: Vec2,
        mask_texture_size: IntSize,
        filters: FilterOperations,
        filters_scale: Vec2,
        background_filters: FilterOperations,
    ) {
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            IntRect::default(),
            visible_rect,
            false,
            render_pass_id,
            mask_resource_id,
            mask_uv_scale,
            mask_texture_size,
            filters,
            filters_scale,
            background_filters,
        );
    }

    /// Initializes every field of `quad` as a pass reference.
    pub fn set_all(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        render_pass_id: RenderPassId,
        mask_resource_id: ResourceId,
        mask_uv_scale: Vec2,
        mask_texture_size: IntSize,
        filters: FilterOperations,
        filters_scale: Vec2,
        background_filters: FilterOperations,
    ) {
        assert!(
            render_pass_id.is_valid(),
            "render pass quad must reference a valid pass"
        );
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::RenderPass(Self {
                render_pass_id,
                mask_uv_scale,
                mask_texture_size,
                filters,
                filters_scale,
                background_filters,
            }),
        );
        quad.resources = if mask_resource_id.is_valid() {
            ResourceList::one(mask_resource_id)
        } else {
            ResourceList::EMPTY
        };
    }

    /// The mask's normalized UV rect for a quad covering `rect`.
    #[must_use]
    pub fn mask_uv_rect(&self, rect: IntRect) -> Rect {
        let w = f64::from(rect.width);
        let h = f64::from(rect.height);
        let x = if w == 0.0 {
            0.0
        } else {
            self.mask_uv_scale.x * f64::from(rect.x) / w
        };
        let y = if h == 0.0 {
            0.0
        } else {
            self.mask_uv_scale.y * f64::from(rect.y) / h
        };
        Rect::new(x, y, x + self.mask_uv_scale.x, y + self.mask_uv_scale.y)
    }
}

impl DrawQuad {
    /// The mask resource of a pass quad, if it has one.
    #[must_use]
    pub fn mask_resource_id(&self) -> Option<ResourceId> {
        match self.kind {
            QuadKind::RenderPass(_) => self.resources.get(0),
            _ => None,
        }
    }
}

/// Embeds a surface produced by another compositor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceQuad {
    /// The embedded surface.
    pub surface_id: SurfaceId,
}

impl SurfaceQuad {
    /// Initializes `quad` as a surface embedding. Surfaces are never opaque.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        visible_rect: IntRect,
        surface_id: SurfaceId,
    ) {
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            IntRect::default(),
            visible_rect,
            false,
            surface_id,
        );
    }

    /// Initializes every field of `quad` as a surface embedding.
    pub fn set_all(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        surface_id: SurfaceId,
    ) {
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::Surface(Self { surface_id }),
        );
        quad.resources = ResourceList::EMPTY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterOperation;

    fn pass_quad(mask: ResourceId) -> DrawQuad {
        let mut quad = DrawQuad::default();
        let mut filters = FilterOperations::new();
        filters.append(FilterOperation::Blur(2.0));
        RenderPassQuad::set_new(
            &mut quad,
            SharedQuadStateId(1),
            IntRect::new(20, 10, 40, 20),
            IntRect::new(20, 10, 40, 20),
            RenderPassId::new(5, 1),
            mask,
            Vec2::new(0.5, 0.25),
            IntSize::new(40, 20),
            filters,
            Vec2::new(1.0, 1.0),
            FilterOperations::new(),
        );
        quad
    }

    #[test]
    fn mask_is_the_only_resource() {
        assert_eq!(pass_quad(ResourceId::NONE).resources.iter().count(), 0);
        let quad = pass_quad(ResourceId(6));
        assert_eq!(quad.mask_resource_id(), Some(ResourceId(6)));
        assert!(quad.opaque_rect.is_empty());
    }

    #[test]
    fn mask_uv_rect_scales_origin_by_rect_size() {
        let quad = pass_quad(ResourceId(6));
        let payload = quad.as_render_pass();
        assert!(payload.is_some(), "pass quad payload");
        if let Some(payload) = payload {
            let uv = payload.mask_uv_rect(quad.rect);
            // (0.5 * 20 / 40, 0.25 * 10 / 20, 0.5, 0.25)
            assert_eq!(uv, Rect::new(0.25, 0.125, 0.75, 0.375));
        }
    }

    #[test]
    #[should_panic(expected = "valid pass")]
    fn invalid_pass_id_panics() {
        let mut quad = DrawQuad::default();
        let rect = IntRect::new(0, 0, 1, 1);
        RenderPassQuad::set_new(
            &mut quad,
            SharedQuadStateId(0),
            rect,
            rect,
            RenderPassId::default(),
            ResourceId::NONE,
            Vec2::ZERO,
            IntSize::default(),
            FilterOperations::new(),
            Vec2::ZERO,
            FilterOperations::new(),
        );
    }

    #[test]
    fn surface_quad_has_no_resources() {
        let mut quad = DrawQuad::default();
        let rect = IntRect::new(0, 0, 5, 5);
        SurfaceQuad::set_new(&mut quad, SharedQuadStateId(0), rect, rect, SurfaceId(42));
        assert_eq!(quad.as_surface().map(|s| s.surface_id), Some(SurfaceId(42)));
        assert!(quad.resources.is_empty());
    }
}
