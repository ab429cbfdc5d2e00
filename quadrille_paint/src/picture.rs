// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded drawing content.

use alloc::vec::Vec;

use kurbo::{BezPath, Rect, RoundedRect, Shape};
use quadrille_core::color::Color;
use quadrille_core::id::ResourceId;

/// One recorded drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    /// Fills a rect.
    FillRect {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// Strokes the outline of a rect.
    StrokeRect {
        /// Rect whose edges are stroked.
        rect: Rect,
        /// Stroke color.
        color: Color,
        /// Stroke width.
        width: f64,
    },
    /// Fills a rect with rounded corners.
    FillRoundedRect {
        /// Area to fill.
        rect: RoundedRect,
        /// Fill color.
        color: Color,
    },
    /// Fills an arbitrary path.
    FillPath {
        /// Path to fill with the non-zero rule.
        path: BezPath,
        /// Fill color.
        color: Color,
    },
    /// Draws an image resource scaled into a rect.
    DrawImage {
        /// The image.
        image: ResourceId,
        /// Destination.
        dest: Rect,
    },
}

impl PaintOp {
    /// Conservative bounds of the pixels the op touches.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::FillRect { rect, .. } | Self::DrawImage { dest: rect, .. } => *rect,
            Self::StrokeRect { rect, width, .. } => rect.inflate(width / 2.0, width / 2.0),
            Self::FillRoundedRect { rect, .. } => rect.rect(),
            Self::FillPath { path, .. } => path.bounding_box(),
        }
    }
}

/// An immutable program of [`PaintOp`]s with a cull rect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Picture {
    /// Area the recorder declared it would draw into.
    pub cull_rect: Rect,
    /// Operations in paint order.
    pub ops: Vec<PaintOp>,
}

impl Picture {
    /// Creates an empty picture.
    #[must_use]
    pub fn new(cull_rect: Rect) -> Self {
        Self {
            cull_rect,
            ops: Vec::new(),
        }
    }

    /// Whether the picture records nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of recorded operations.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Union of the bounds of every op, or `None` for an empty picture.
    #[must_use]
    pub fn content_bounds(&self) -> Option<Rect> {
        self.ops.iter().map(PaintOp::bounds).reduce(|a, b| a.union(b))
    }
}
