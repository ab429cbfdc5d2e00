// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor-facing wire form of a display list.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{BezPath, Rect, RoundedRect, Vec2};
use quadrille_core::filter::FilterOperations;
use quadrille_core::shared_quad_state::BlendMode;
use quadrille_core::transform::Transform3d;

use crate::item::ColorFilter;
use crate::picture::Picture;

/// Receiver of a display list in the compositor's vocabulary.
///
/// Affine and 3-D transforms share one transform item; fixed-position
/// brackets have no wire form.
pub trait WebDisplayItemList {
    /// Appends recorded content.
    fn append_drawing_item(&mut self, picture: &Picture);
    /// Begins a rect clip limited by rounded rects.
    fn append_clip_item(&mut self, rect: Rect, rounded_rect_clips: &[RoundedRect]);
    /// Ends a rect clip.
    fn append_end_clip_item(&mut self);
    /// Begins a fractional rect clip.
    fn append_float_clip_item(&mut self, rect: Rect);
    /// Ends a fractional rect clip.
    fn append_end_float_clip_item(&mut self);
    /// Begins a transform.
    fn append_transform_item(&mut self, transform: &Transform3d);
    /// Ends a transform.
    fn append_end_transform_item(&mut self);
    /// Begins a filter.
    fn append_filter_item(&mut self, filters: &FilterOperations, bounds: Rect);
    /// Ends a filter.
    fn append_end_filter_item(&mut self);
    /// Begins a scroll offset.
    fn append_scroll_item(&mut self, offset: Vec2);
    /// Ends a scroll offset.
    fn append_end_scroll_item(&mut self);
    /// Begins a compositing layer.
    fn append_compositing_item(
        &mut self,
        opacity: f32,
        blend_mode: BlendMode,
        bounds: Option<Rect>,
        color_filter: ColorFilter,
    );
    /// Ends a compositing layer.
    fn append_end_compositing_item(&mut self);
    /// Begins a path clip.
    fn append_clip_path_item(&mut self, path: &BezPath, anti_alias: bool);
    /// Ends a path clip.
    fn append_end_clip_path_item(&mut self);
}

/// One item of a [`CompositorDisplayItemList`].
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs, reason = "mirrors WebDisplayItemList one-to-one")]
pub enum WireItem {
    Drawing(Picture),
    Clip {
        rect: Rect,
        rounded_rect_clips: Vec<RoundedRect>,
    },
    EndClip,
    FloatClip(Rect),
    EndFloatClip,
    Transform(Transform3d),
    EndTransform,
    Filter {
        filters: FilterOperations,
        bounds: Rect,
    },
    EndFilter,
    Scroll(Vec2),
    EndScroll,
    Compositing {
        opacity: f32,
        blend_mode: BlendMode,
        bounds: Option<Rect>,
        color_filter: ColorFilter,
    },
    EndCompositing,
    ClipPath {
        path: BezPath,
        anti_alias: bool,
    },
    EndClipPath,
}

/// Bracket category of a wire item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bracket {
    Clip,
    FloatClip,
    Transform,
    Filter,
    Scroll,
    Compositing,
    ClipPath,
}

impl Bracket {
    const fn name(self) -> &'static str {
        match self {
            Self::Clip => "clip",
            Self::FloatClip => "float clip",
            Self::Transform => "transform",
            Self::Filter => "filter",
            Self::Scroll => "scroll",
            Self::Compositing => "compositing",
            Self::ClipPath => "clip path",
        }
    }
}

impl WireItem {
    /// `(category, is_begin)`, or `None` for drawings.
    fn bracket(&self) -> Option<(Bracket, bool)> {
        Some(match self {
            Self::Drawing(_) => return None,
            Self::Clip { .. } => (Bracket::Clip, true),
            Self::EndClip => (Bracket::Clip, false),
            Self::FloatClip(_) => (Bracket::FloatClip, true),
            Self::EndFloatClip => (Bracket::FloatClip, false),
            Self::Transform(_) => (Bracket::Transform, true),
            Self::EndTransform => (Bracket::Transform, false),
            Self::Filter { .. } => (Bracket::Filter, true),
            Self::EndFilter => (Bracket::Filter, false),
            Self::Scroll(_) => (Bracket::Scroll, true),
            Self::EndScroll => (Bracket::Scroll, false),
            Self::Compositing { .. } => (Bracket::Compositing, true),
            Self::EndCompositing => (Bracket::Compositing, false),
            Self::ClipPath { .. } => (Bracket::ClipPath, true),
            Self::EndClipPath => (Bracket::ClipPath, false),
        })
    }
}

/// A begin/end nesting violation found by
/// [`CompositorDisplayItemList::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NestingError {
    /// An end item with no open begin.
    UnmatchedEnd {
        /// Index of the end item.
        index: usize,
        /// Category of the end item.
        found: &'static str,
    },
    /// An end item that closes a different category than the innermost
    /// open begin.
    Mismatched {
        /// Index of the end item.
        index: usize,
        /// Category of the innermost open begin.
        expected: &'static str,
        /// Category of the end item.
        found: &'static str,
    },
    /// Begins left open at the end of the list.
    Unclosed {
        /// Number of open begins.
        count: usize,
    },
}

impl fmt::Display for NestingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedEnd { index, found } => {
                write!(f, "end {found} at {index} has no matching begin")
            }
            Self::Mismatched {
                index,
                expected,
                found,
            } => write!(f, "end {found} at {index} closes an open {expected}"),
            Self::Unclosed { count } => write!(f, "{count} begin items left open"),
        }
    }
}

impl core::error::Error for NestingError {}

/// Wire-form display list as received by the compositor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositorDisplayItemList {
    items: Vec<WireItem>,
}

impl CompositorDisplayItemList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in append order.
    #[must_use]
    pub fn items(&self) -> &[WireItem] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Checks that every begin is closed by an end of its category, in
    /// stack order.
    pub fn validate(&self) -> Result<(), NestingError> {
        let mut stack: Vec<Bracket> = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            match item.bracket() {
                None => {}
                Some((bracket, true)) => stack.push(bracket),
                Some((bracket, false)) => match stack.pop() {
                    None => {
                        return Err(NestingError::UnmatchedEnd {
                            index,
                            found: bracket.name(),
                        });
                    }
                    Some(open) if open != bracket => {
                        return Err(NestingError::Mismatched {
                            index,
                            expected: open.name(),
                            found: bracket.name(),
                        });
                    }
                    Some(_) => {}
                },
            }
        }
        if stack.is_empty() {
            Ok(())
        } else {
            Err(NestingError::Unclosed { count: stack.len() })
        }
    }
}

impl WebDisplayItemList for CompositorDisplayItemList {
    fn append_drawing_item(&mut self, picture: &Picture) {
        self.items.push(WireItem::Drawing(picture.clone()));
    }

    fn append_clip_item(&mut self, rect: Rect, rounded_rect_clips: &[RoundedRect]) {
        self.items.push(WireItem::Clip {
            rect,
            rounded_rect_clips: rounded_rect_clips.to_vec(),
        });
    }

    fn append_end_clip_item(&mut self) {
        self.items.push(WireItem::EndClip);
    }

    fn append_float_clip_item(&mut self, rect: Rect) {
        self.items.push(WireItem::FloatClip(rect));
    }

    fn append_end_float_clip_item(&mut self) {
        self.items.push(WireItem::EndFloatClip);
    }

    fn append_transform_item(&mut self, transform: &Transform3d) {
        self.items.push(WireItem::Transform(*transform));
    }

    fn append_end_transform_item(&mut self) {
        self.items.push(WireItem::EndTransform);
    }

    fn append_filter_item(&mut self, filters: &FilterOperations, bounds: Rect) {
        self.items.push(WireItem::Filter {
            filters: filters.clone(),
            bounds,
        });
    }

    fn append_end_filter_item(&mut self) {
        self.items.push(WireItem::EndFilter);
    }

    fn append_scroll_item(&mut self, offset: Vec2) {
        self.items.push(WireItem::Scroll(offset));
    }

    fn append_end_scroll_item(&mut self) {
        self.items.push(WireItem::EndScroll);
    }

    fn append_compositing_item(
        &mut self,
        opacity: f32,
        blend_mode: BlendMode,
        bounds: Option<Rect>,
        color_filter: ColorFilter,
    ) {
        self.items.push(WireItem::Compositing {
            opacity,
            blend_mode,
            bounds,
            color_filter,
        });
    }

    fn append_end_compositing_item(&mut self) {
        self.items.push(WireItem::EndCompositing);
    }

    fn append_clip_path_item(&mut self, path: &BezPath, anti_alias: bool) {
        self.items.push(WireItem::ClipPath {
            path: path.clone(),
            anti_alias,
        });
    }

    fn append_end_clip_path_item(&mut self) {
        self.items.push(WireItem::EndClipPath);
    }
}
