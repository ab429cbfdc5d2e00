// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat-color materials: solid fills and debug borders.

use crate::color::Color;
use crate::geometry::IntRect;
use crate::id::SharedQuadStateId;
use crate::resource::ResourceList;

use super::{DrawQuad, QuadKind};

/// A rect filled with one color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolidColorQuad {
    /// Fill color.
    pub color: Color,
    /// Draw with hard edges even when the transform would anti-alias.
    pub force_anti_aliasing_off: bool,
}

impl SolidColorQuad {
    /// Initializes `quad` as a solid fill. An opaque color makes the whole
    /// rect opaque.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        visible_rect: IntRect,
        color: Color,
        force_anti_aliasing_off: bool,
    ) {
        let opaque_rect = if color.is_opaque() {
            rect
        } else {
            IntRect::default()
        };
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            false,
            color,
            force_anti_aliasing_off,
        );
    }

    /// Initializes every field of `quad` as a solid fill.
    pub fn set_all(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        color: Color,
        force_anti_aliasing_off: bool,
    ) {
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::SolidColor(Self {
                color,
                force_anti_aliasing_off,
            }),
        );
        quad.resources = ResourceList::EMPTY;
    }
}

/// A stroked outline drawn for debugging layer and pass bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugBorderQuad {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in device pixels.
    pub width: i32,
}

impl DebugBorderQuad {
    /// Initializes `quad` as a debug border. Borders are never opaque and
    /// blend when their color is translucent.
    pub fn set_new(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        visible_rect: IntRect,
        color: Color,
        width: i32,
    ) {
        Self::set_all(
            quad,
            shared_quad_state,
            rect,
            IntRect::default(),
            visible_rect,
            !color.is_opaque(),
            color,
            width,
        );
    }

    /// Initializes every field of `quad` as a debug border.
    pub fn set_all(
        quad: &mut DrawQuad,
        shared_quad_state: SharedQuadStateId,
        rect: IntRect,
        opaque_rect: IntRect,
        visible_rect: IntRect,
        needs_blending: bool,
        color: Color,
        width: i32,
    ) {
        quad.set_all(
            shared_quad_state,
            rect,
            opaque_rect,
            visible_rect,
            needs_blending,
            QuadKind::DebugBorder(Self { color, width }),
        );
        quad.resources = ResourceList::EMPTY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quad::Material;

    #[test]
    fn solid_set_new_matches_set_all() {
        let rect = IntRect::new(0, 0, 30, 30);
        let visible = IntRect::new(0, 0, 20, 30);
        let mut a = DrawQuad::default();
        SolidColorQuad::set_new(&mut a, SharedQuadStateId(2), rect, visible, Color::GREEN, true);
        let mut b = DrawQuad::default();
        SolidColorQuad::set_all(&mut b, SharedQuadStateId(2), rect, rect, visible, false, Color::GREEN, true);
        assert_eq!(a, b);
        assert_eq!(a.resources.iter().count(), 0);
    }

    #[test]
    fn translucent_solid_has_empty_opaque_rect() {
        let rect = IntRect::new(0, 0, 30, 30);
        let mut quad = DrawQuad::default();
        SolidColorQuad::set_new(&mut quad, SharedQuadStateId(0), rect, rect, Color::RED.with_alpha(1), false);
        assert!(quad.opaque_rect.is_empty());
        assert!(!quad.needs_blending);
    }

    #[test]
    fn debug_border_blends_when_translucent() {
        let rect = IntRect::new(0, 0, 30, 30);
        let mut quad = DrawQuad::default();
        DebugBorderQuad::set_new(&mut quad, SharedQuadStateId(0), rect, rect, Color::RED.with_alpha(0x40), 2);
        assert_eq!(quad.material(), Material::DebugBorder);
        assert!(quad.needs_blending);
        assert!(quad.opaque_rect.is_empty());
        assert!(quad.is_debug_quad());

        let mut opaque = DrawQuad::default();
        DebugBorderQuad::set_new(&mut opaque, SharedQuadStateId(0), rect, rect, Color::RED, 2);
        assert!(!opaque.needs_blending);
    }
}
