// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canvas interface display items replay into.

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Rect, RoundedRect, Vec2};
use quadrille_core::filter::FilterOperations;
use quadrille_core::shared_quad_state::BlendMode;
use quadrille_core::transform::Transform3d;

use crate::item::ColorFilter;
use crate::picture::Picture;

/// A stateful canvas.
///
/// `save`/`restore` bracket clip and transform state. Layers and filters
/// have their own begin/end calls; every begin is matched by its end before
/// replay finishes.
pub trait GraphicsContext {
    /// Pushes the clip and transform state.
    fn save(&mut self);
    /// Pops the state pushed by the matching `save`.
    fn restore(&mut self);
    /// Intersects the clip with `rect`.
    fn clip_rect(&mut self, rect: Rect);
    /// Intersects the clip with a rounded rect.
    fn clip_rounded_rect(&mut self, rect: RoundedRect);
    /// Intersects the clip with a path.
    fn clip_path(&mut self, path: &BezPath, anti_alias: bool);
    /// Pre-concatenates a 3-D transform.
    fn concat_transform(&mut self, transform: &Transform3d);
    /// Pre-concatenates an affine transform.
    fn concat_affine(&mut self, affine: Affine);
    /// Pre-concatenates a translation.
    fn translate(&mut self, dx: f64, dy: f64);
    /// Begins an offscreen layer composited on [`end_layer`](Self::end_layer).
    fn begin_layer(
        &mut self,
        opacity: f32,
        blend_mode: BlendMode,
        bounds: Option<Rect>,
        color_filter: ColorFilter,
    );
    /// Composites the innermost layer.
    fn end_layer(&mut self);
    /// Begins content filtered on [`end_filter`](Self::end_filter).
    fn begin_filter(&mut self, filters: &FilterOperations, bounds: Rect);
    /// Applies the innermost filter.
    fn end_filter(&mut self);
    /// Draws recorded content under the current state.
    fn draw_picture(&mut self, picture: &Picture);
}

/// A call recorded by [`RecordingContext`].
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs, reason = "mirrors GraphicsContext one-to-one")]
pub enum ContextOp {
    Save,
    Restore,
    ClipRect(Rect),
    ClipRoundedRect(RoundedRect),
    ClipPath { path: BezPath, anti_alias: bool },
    ConcatTransform(Transform3d),
    ConcatAffine(Affine),
    Translate(Vec2),
    BeginLayer {
        opacity: f32,
        blend_mode: BlendMode,
        bounds: Option<Rect>,
        color_filter: ColorFilter,
    },
    EndLayer,
    BeginFilter { filters: FilterOperations, bounds: Rect },
    EndFilter,
    DrawPicture { op_count: usize, cull_rect: Rect },
}

/// A [`GraphicsContext`] that records every call.
///
/// Used to inspect replay output and to check that brackets balance.
#[derive(Clone, Debug, Default)]
pub struct RecordingContext {
    ops: Vec<ContextOp>,
    depth: isize,
    min_depth: isize,
}

impl RecordingContext {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[ContextOp] {
        &self.ops
    }

    /// Whether every save, layer, and filter has been closed and nothing was
    /// closed that was never opened.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.depth == 0 && self.min_depth == 0
    }

    fn open(&mut self, op: ContextOp) {
        self.depth += 1;
        self.ops.push(op);
    }

    fn close(&mut self, op: ContextOp) {
        self.depth -= 1;
        self.min_depth = self.min_depth.min(self.depth);
        self.ops.push(op);
    }
}

impl GraphicsContext for RecordingContext {
    fn save(&mut self) {
        self.open(ContextOp::Save);
    }

    fn restore(&mut self) {
        self.close(ContextOp::Restore);
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.ops.push(ContextOp::ClipRect(rect));
    }

    fn clip_rounded_rect(&mut self, rect: RoundedRect) {
        self.ops.push(ContextOp::ClipRoundedRect(rect));
    }

    fn clip_path(&mut self, path: &BezPath, anti_alias: bool) {
        self.ops.push(ContextOp::ClipPath {
            path: path.clone(),
            anti_alias,
        });
    }

    fn concat_transform(&mut self, transform: &Transform3d) {
        self.ops.push(ContextOp::ConcatTransform(*transform));
    }

    fn concat_affine(&mut self, affine: Affine) {
        self.ops.push(ContextOp::ConcatAffine(affine));
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.ops.push(ContextOp::Translate(Vec2::new(dx, dy)));
    }

    fn begin_layer(
        &mut self,
        opacity: f32,
        blend_mode: BlendMode,
        bounds: Option<Rect>,
        color_filter: ColorFilter,
    ) {
        self.open(ContextOp::BeginLayer {
            opacity,
            blend_mode,
            bounds,
            color_filter,
        });
    }

    fn end_layer(&mut self) {
        self.close(ContextOp::EndLayer);
    }

    fn begin_filter(&mut self, filters: &FilterOperations, bounds: Rect) {
        self.open(ContextOp::BeginFilter {
            filters: filters.clone(),
            bounds,
        });
    }

    fn end_filter(&mut self) {
        self.close(ContextOp::EndFilter);
    }

    fn draw_picture(&mut self, picture: &Picture) {
        self.ops.push(ContextOp::DrawPicture {
            op_count: picture.op_count(),
            cull_rect: picture.cull_rect,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_restore_is_unbalanced() {
        let mut context = RecordingContext::new();
        context.restore();
        context.save();
        assert!(!context.is_balanced());
    }

    #[test]
    fn nested_layers_balance() {
        let mut context = RecordingContext::new();
        context.begin_layer(0.5, BlendMode::SrcOver, None, ColorFilter::None);
        context.save();
        context.clip_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        context.restore();
        context.end_layer();
        assert!(context.is_balanced());
        assert_eq!(context.ops().len(), 5);
    }
}
