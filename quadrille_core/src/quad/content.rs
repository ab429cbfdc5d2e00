// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bitmap-backed materials: generic textures and rasterized tiles.

use kurbo::{Point, Rect};

use crate::color::Color;
use crate::geometry::{IntRect, IntSize};
use crate::id::{ResourceId, SharedQuadStateId};
use crate::resource::ResourceList;

use super::{DrawQuad, QuadKind};

/// A textured rect. The texture is `resources[0]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureQuad {
    /// Whether texel colors are already multiplied by alpha.
    pub premultiplied_alpha: bool,
    /// Normalized texture coordinate of the rect's top-left corner.
    pub uv_top_left: Point,
    /// Normalized texture coordinate of the rect's bottom-right corner.
    pub uv_bottom_right: Point,
    /// Color drawn beneath the texture.
    pub background_color: Color,
    /// Per-vertex opacity: bottom-left, top-left, top-right, bottom-right.
    pub vertex_opacity: [f32; 4],
    /// Whether texture rows are stored bottom-up.
    pub y_flipped: bool,
    /// Sample with nearest-neighbor filtering.
    pub nearest_neighbor: bool,
    /// Size of the backing resource; only needed for overlays.
    pub resource_size_in_pixels: IntSize,
    /// Whether the texture may be promoted to a hardware overlay.
    pub allow_overlay: bool,
}

impl Default for TextureQuad {
    fn default() -> Self {
        Self {
            premultiplied_alpha: true,
            uv_top_left: Point::ZERO,
            uv_bottom_right: Point::new(1.0, 1.0),
            background_color: Color::TRANSPARENT,
            vertex_opacity: [1.0; 4],
            y_flipped: false,
            nearest_neighbor: false,
            resource_size_in_pixels: IntSize::default(),
            allow_overlay: false,
        }
    }
}

impl TextureQuad {
    /// Initializes `quad` as a texture. Blending is needed when any vertex
    /// is translucent; overlay metadata is left at its defaults.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        resource_id: ResourceId,
        premultiplied_alpha: bool,
        uv_top_left: Point,
        uv_bottom_right: Point,
        background_color: Color,
        vertex_opacity: [f32; 4],
        y_flipped: bool,
        nearest_neighbor: bool,
    ) {
        let needs_blending = vertex_opacity.iter().any(|&o| o != 1.0);
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            resource_id,
            IntSize::default(),
            false,
            premultiplied_alpha,
            uv_top_left,
            uv_bottom_right,
            background_color,
            vertex_opacity,
            y_flipped,
            nearest_neighbor,
        );
    }

    /// Initializes every field of `quad` as a texture.
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
        premultiplied_alpha: bool,
        uv_top_left: Point,
        uv_bottom_right: Point,
        background_color: Color,
        vertex_opacity: [f32; 4],
        y_flipped: bool,
        nearest_neighbor: bool,
    ) {
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::Texture(Self {
                premultiplied_alpha,
                uv_top_left,
                uv_bottom_right,
                background_color,
                vertex_opacity,
                y_flipped,
                nearest_neighbor,
                resource_size_in_pixels,
                allow_overlay,
            }),
        );
        quad.resources = ResourceList::one(resource_id);
    }

    /// The texture coordinates as a rect (not normalized for flips).
    #[must_use]
    pub fn uv_rect(&self) -> Rect {
        Rect::new(
            self.uv_top_left.x,
            self.uv_top_left.y,
            self.uv_bottom_right.x,
            self.uv_bottom_right.y,
        )
    }
}

/// A rasterized tile of layer content. The tile texture is `resources[0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TileQuad {
    /// Texel rect sampled for the quad rect.
    pub tex_coord_rect: Rect,
    /// Size of the tile texture.
    pub texture_size: IntSize,
    /// Whether the texture stores BGRA that must be swizzled to RGBA.
    pub swizzle_contents: bool,
    /// Sample with nearest-neighbor filtering.
    pub nearest_neighbor: bool,
}

impl TileQuad {
    /// Initializes `quad` as a tile.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        resource_id: ResourceId,
        tex_coord_rect: Rect,
        texture_size: IntSize,
        swizzle_contents: bool,
        nearest_neighbor: bool,
    ) {
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            false,
            resource_id,
            tex_coord_rect,
            texture_size,
            swizzle_contents,
            nearest_neighbor,
        );
    }

    /// Initializes every field of `quad` as a tile.
    pub fn set_all(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        resource_id: ResourceId,
        tex_coord_rect: Rect,
        texture_size: IntSize,
        swizzle_contents: bool,
        nearest_neighbor: bool,
    ) {
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::Tile(Self {
                tex_coord_rect,
                texture_size,
                swizzle_contents,
                nearest_neighbor,
            }),
        );
        quad.resources = ResourceList::one(resource_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(vertex_opacity: [f32; 4]) -> DrawQuad {
        let rect = IntRect::new(0, 0, 40, 40);
        let mut quad = DrawQuad::default();
        TextureQuad::set_new(
            &mut quad,
            SharedQuadStateId(0),
            rect,
            rect,
            rect,
            ResourceId(7),
            true,
            Point::ZERO,
            Point::new(1.0, 1.0),
            Color::TRANSPARENT,
            vertex_opacity,
            false,
            false,
        );
        quad
    }

    #[test]
    fn texture_blends_with_translucent_vertex() {
        assert!(!texture([1.0; 4]).needs_blending);
        assert!(texture([1.0, 1.0, 0.5, 1.0]).needs_blending);
    }

    #[test]
    fn texture_set_new_matches_set_all() {
        let a = texture([1.0; 4]);
        let rect = IntRect::new(0, 0, 40, 40);
        let mut b = DrawQuad::default();
        TextureQuad::set_all(
            &mut b,
            SharedQuadStateId(0),
            rect,
            rect,
            rect,
            false,
            ResourceId(7),
            IntSize::default(),
            false,
            true,
            Point::ZERO,
            Point::new(1.0, 1.0),
            Color::TRANSPARENT,
            [1.0; 4],
            false,
            false,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn texture_and_tile_cite_one_resource() {
        let mut quad = texture([1.0; 4]);
        assert_eq!(quad.resources.iter().count(), 1);
        for id in quad.resources.iter_mut() {
            id.0 += 1;
        }
        assert_eq!(quad.resource_id(), ResourceId(8));

        let rect = IntRect::new(0, 0, 16, 16);
        let mut tile = DrawQuad::default();
        TileQuad::set_new(
            &mut tile,
            SharedQuadStateId(0),
            rect,
            rect,
            rect,
            ResourceId(3),
            Rect::new(0.0, 0.0, 16.0, 16.0),
            IntSize::new(16, 16),
            false,
            false,
        );
        assert_eq!(tile.resources.as_slice(), &[ResourceId(3)]);
        assert!(!tile.needs_blending);
    }

    #[test]
    fn tile_visible_content_rect_is_in_texel_space() {
        let rect = IntRect::new(0, 0, 100, 100);
        let mut tile = DrawQuad::default();
        TileQuad::set_new(
            &mut tile,
            SharedQuadStateId(0),
            rect,
            rect,
            IntRect::new(50, 0, 50, 100),
            ResourceId(1),
            Rect::new(0.0, 0.0, 50.0, 50.0),
            IntSize::new(50, 50),
            false,
            false,
        );
        assert_eq!(tile.visible_content_rect(), Rect::new(25.0, 0.0, 50.0, 50.0));
    }
}
