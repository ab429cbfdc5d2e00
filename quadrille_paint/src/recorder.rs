// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped recorders.
//!
//! Each paired recorder appends a begin item when constructed and the
//! matching end item when dropped, so brackets nest with Rust scopes. A
//! recorder dereferences to the list it borrows, which lets nested
//! recorders and drawings be created through it:
//!
//! ```
//! use kurbo::Rect;
//! use quadrille_core::color::Color;
//! use quadrille_paint::item::{ClipType, DisplayItemClient, DrawingType, PaintPhase};
//! use quadrille_paint::list::DisplayItemList;
//! use quadrille_paint::recorder::{ClipRecorder, DrawingRecorder};
//!
//! let client = DisplayItemClient(1);
//! let mut list = DisplayItemList::new();
//! {
//!     let bounds = Rect::new(0.0, 0.0, 50.0, 50.0);
//!     let mut clip = ClipRecorder::new(&mut list, client, ClipType::LayerForeground, bounds, vec![]);
//!     let phase = DrawingType::PaintPhase(PaintPhase::Foreground);
//!     let mut drawing = DrawingRecorder::new(&mut clip, client, phase, bounds);
//!     drawing.fill_rect(bounds, Color::RED);
//! }
//! assert_eq!(list.new_display_items().len(), 3);
//! ```

use alloc::vec::Vec;
use core::mem;
use core::ops::{Deref, DerefMut};

use kurbo::{Affine, BezPath, Rect, RoundedRect, Vec2};
use quadrille_core::color::Color;
use quadrille_core::filter::FilterOperations;
use quadrille_core::id::ResourceId;
use quadrille_core::shared_quad_state::BlendMode;
use quadrille_core::transform::Transform3d;

use crate::item::{
    ClipType, ColorFilter, DisplayItem, DisplayItemClient, DisplayItemType, DrawingType,
    FloatClipType, ScrollType, Transform3DType,
};
use crate::list::DisplayItemList;
use crate::picture::{PaintOp, Picture};

macro_rules! deref_to_list {
    ($($recorder:ident),* $(,)?) => {$(
        impl Deref for $recorder<'_> {
            type Target = DisplayItemList;

            fn deref(&self) -> &DisplayItemList {
                self.list
            }
        }

        impl DerefMut for $recorder<'_> {
            fn deref_mut(&mut self) -> &mut DisplayItemList {
                self.list
            }
        }
    )*};
}

deref_to_list!(
    ClipRecorder,
    FloatClipRecorder,
    ScrollRecorder,
    Transform3DRecorder,
    TransformRecorder,
    CompositingRecorder,
    FilterRecorder,
    ClipPathRecorder,
    FixedPositionRecorder,
    FixedPositionContainerRecorder,
    ScopeRecorder,
    DisplayItemCacheSkipper,
);

/// Rect clip for the recorder's lifetime.
#[derive(Debug)]
pub struct ClipRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
    clip_type: ClipType,
}

impl<'a> ClipRecorder<'a> {
    /// Begins a clip to `rect`, further limited by `rounded_rect_clips`.
    pub fn new(
        list: &'a mut DisplayItemList,
        client: DisplayItemClient,
        clip_type: ClipType,
        rect: Rect,
        rounded_rect_clips: Vec<RoundedRect>,
    ) -> Self {
        list.create_and_append(DisplayItem::clip(client, clip_type, rect, rounded_rect_clips));
        Self {
            list,
            client,
            clip_type,
        }
    }
}

impl Drop for ClipRecorder<'_> {
    fn drop(&mut self) {
        self.list
            .end_item(self.client, DisplayItemType::EndClip(self.clip_type));
    }
}

/// Fractional rect clip for the recorder's lifetime.
#[derive(Debug)]
pub struct FloatClipRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
    clip_type: FloatClipType,
}

impl<'a> FloatClipRecorder<'a> {
    /// Begins a clip to `rect`.
    pub fn new(
        list: &'a mut DisplayItemList,
        client: DisplayItemClient,
        clip_type: FloatClipType,
        rect: Rect,
    ) -> Self {
        list.create_and_append(DisplayItem::float_clip(client, clip_type, rect));
        Self {
            list,
            client,
            clip_type,
        }
    }
}

impl Drop for FloatClipRecorder<'_> {
    fn drop(&mut self) {
        self.list
            .end_item(self.client, DisplayItemType::EndFloatClip(self.clip_type));
    }
}

/// Scroll offset for the recorder's lifetime.
#[derive(Debug)]
pub struct ScrollRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
    scroll_type: ScrollType,
}

impl<'a> ScrollRecorder<'a> {
    /// Begins scrolling content by `offset`.
    pub fn new(
        list: &'a mut DisplayItemList,
        client: DisplayItemClient,
        scroll_type: ScrollType,
        offset: Vec2,
    ) -> Self {
        list.create_and_append(DisplayItem::scroll(client, scroll_type, offset));
        Self {
            list,
            client,
            scroll_type,
        }
    }
}

impl Drop for ScrollRecorder<'_> {
    fn drop(&mut self) {
        self.list
            .end_item(self.client, DisplayItemType::EndScroll(self.scroll_type));
    }
}

/// 3-D transform for the recorder's lifetime. Identity transforms record
/// nothing.
#[derive(Debug)]
pub struct Transform3DRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
    transform_type: Transform3DType,
    skip: bool,
}

impl<'a> Transform3DRecorder<'a> {
    /// Begins `transform` applied about `origin`.
    pub fn new(
        list: &'a mut DisplayItemList,
        client: DisplayItemClient,
        transform_type: Transform3DType,
        transform: Transform3d,
        origin: [f64; 3],
    ) -> Self {
        let skip = transform.is_identity();
        if !skip {
            list.create_and_append(DisplayItem::transform_3d(
                client,
                transform_type,
                transform,
                origin,
            ));
        }
        Self {
            list,
            client,
            transform_type,
            skip,
        }
    }
}

impl Drop for Transform3DRecorder<'_> {
    fn drop(&mut self) {
        if !self.skip {
            self.list.end_item(
                self.client,
                DisplayItemType::EndTransform3D(self.transform_type),
            );
        }
    }
}

/// Affine transform for the recorder's lifetime. Identity transforms record
/// nothing.
#[derive(Debug)]
pub struct TransformRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
    skip: bool,
}

impl<'a> TransformRecorder<'a> {
    /// Begins `affine`.
    pub fn new(list: &'a mut DisplayItemList, client: DisplayItemClient, affine: Affine) -> Self {
        let skip = affine == Affine::IDENTITY;
        if !skip {
            list.create_and_append(DisplayItem::transform(client, affine));
        }
        Self { list, client, skip }
    }
}

impl Drop for TransformRecorder<'_> {
    fn drop(&mut self) {
        if !self.skip {
            self.list.end_item(self.client, DisplayItemType::EndTransform);
        }
    }
}

/// Offscreen compositing layer for the recorder's lifetime.
#[derive(Debug)]
pub struct CompositingRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
}

impl<'a> CompositingRecorder<'a> {
    /// Begins a layer composited with `blend_mode` and `opacity`.
    pub fn new(
        list: &'a mut DisplayItemList,
        client: DisplayItemClient,
        blend_mode: BlendMode,
        opacity: f32,
        bounds: Option<Rect>,
        color_filter: ColorFilter,
    ) -> Self {
        list.create_and_append(DisplayItem::compositing(
            client,
            blend_mode,
            opacity,
            bounds,
            color_filter,
        ));
        Self { list, client }
    }
}

impl Drop for CompositingRecorder<'_> {
    fn drop(&mut self) {
        self.list.end_item(self.client, DisplayItemType::EndCompositing);
    }
}

/// Filter for the recorder's lifetime.
#[derive(Debug)]
pub struct FilterRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
}

impl<'a> FilterRecorder<'a> {
    /// Begins content filtered by `filters`.
    pub fn new(
        list: &'a mut DisplayItemList,
        client: DisplayItemClient,
        filters: FilterOperations,
        bounds: Rect,
    ) -> Self {
        list.create_and_append(DisplayItem::filter(client, filters, bounds));
        Self { list, client }
    }
}

impl Drop for FilterRecorder<'_> {
    fn drop(&mut self) {
        self.list.end_item(self.client, DisplayItemType::EndFilter);
    }
}

/// Path clip for the recorder's lifetime.
#[derive(Debug)]
pub struct ClipPathRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
}

impl<'a> ClipPathRecorder<'a> {
    /// Begins a clip to `path`.
    pub fn new(
        list: &'a mut DisplayItemList,
        client: DisplayItemClient,
        path: BezPath,
        anti_alias: bool,
    ) -> Self {
        list.create_and_append(DisplayItem::clip_path(client, path, anti_alias));
        Self { list, client }
    }
}

impl Drop for ClipPathRecorder<'_> {
    fn drop(&mut self) {
        self.list.end_item(self.client, DisplayItemType::EndClipPath);
    }
}

/// Fixed-position content.
#[derive(Debug)]
pub struct FixedPositionRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
}

impl<'a> FixedPositionRecorder<'a> {
    /// Begins fixed-position content.
    pub fn new(list: &'a mut DisplayItemList, client: DisplayItemClient) -> Self {
        list.create_and_append(DisplayItem::bracket(client, DisplayItemType::BeginFixedPosition));
        Self { list, client }
    }
}

impl Drop for FixedPositionRecorder<'_> {
    fn drop(&mut self) {
        self.list.end_item(self.client, DisplayItemType::EndFixedPosition);
    }
}

/// Container of fixed-position content.
#[derive(Debug)]
pub struct FixedPositionContainerRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
}

impl<'a> FixedPositionContainerRecorder<'a> {
    /// Begins a fixed-position container.
    pub fn new(list: &'a mut DisplayItemList, client: DisplayItemClient) -> Self {
        list.create_and_append(DisplayItem::bracket(
            client,
            DisplayItemType::BeginFixedPositionContainer,
        ));
        Self { list, client }
    }
}

impl Drop for FixedPositionContainerRecorder<'_> {
    fn drop(&mut self) {
        self.list
            .end_item(self.client, DisplayItemType::EndFixedPositionContainer);
    }
}

/// Scope for the recorder's lifetime.
#[derive(Debug)]
pub struct ScopeRecorder<'a> {
    list: &'a mut DisplayItemList,
    id: u32,
}

impl<'a> ScopeRecorder<'a> {
    /// Opens a scope owned by `client`.
    pub fn new(list: &'a mut DisplayItemList, client: DisplayItemClient) -> Self {
        let id = list.begin_scope(client);
        Self { list, id }
    }

    /// Id of the open scope.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for ScopeRecorder<'_> {
    fn drop(&mut self) {
        self.list.end_scope();
    }
}

/// Bypasses the display item cache for the skipper's lifetime.
#[derive(Debug)]
pub struct DisplayItemCacheSkipper<'a> {
    list: &'a mut DisplayItemList,
}

impl<'a> DisplayItemCacheSkipper<'a> {
    /// Starts skipping.
    pub fn new(list: &'a mut DisplayItemList) -> Self {
        list.begin_skipping_cache();
        Self { list }
    }
}

impl Drop for DisplayItemCacheSkipper<'_> {
    fn drop(&mut self) {
        self.list.end_skipping_cache();
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Records paint ops into a [`Picture`] and appends it as a drawing item
/// when dropped.
#[derive(Debug)]
pub struct DrawingRecorder<'a> {
    list: &'a mut DisplayItemList,
    client: DisplayItemClient,
    drawing_type: DrawingType,
    picture: Picture,
}

impl<'a> DrawingRecorder<'a> {
    /// Starts recording `client`'s `drawing_type` content inside `cull_rect`.
    pub fn new(
        list: &'a mut DisplayItemList,
        client: DisplayItemClient,
        drawing_type: DrawingType,
        cull_rect: Rect,
    ) -> Self {
        Self {
            list,
            client,
            drawing_type,
            picture: Picture::new(cull_rect),
        }
    }

    /// Appends a cached stand-in instead of recording, if `client`'s cache
    /// is valid. Returns whether it did.
    pub fn use_cached_drawing_if_possible(
        list: &mut DisplayItemList,
        client: DisplayItemClient,
        drawing_type: DrawingType,
    ) -> bool {
        if list.display_item_construction_is_disabled() || !list.client_cache_is_valid(client) {
            return false;
        }
        list.create_and_append(DisplayItem::cached(client, drawing_type));
        true
    }

    /// Records an op.
    pub fn record(&mut self, op: PaintOp) {
        self.picture.ops.push(op);
    }

    /// Records a rect fill.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.record(PaintOp::FillRect { rect, color });
    }

    /// Records a rect outline.
    pub fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        self.record(PaintOp::StrokeRect { rect, color, width });
    }

    /// Records a rounded rect fill.
    pub fn fill_rounded_rect(&mut self, rect: RoundedRect, color: Color) {
        self.record(PaintOp::FillRoundedRect { rect, color });
    }

    /// Records a path fill.
    pub fn fill_path(&mut self, path: BezPath, color: Color) {
        self.record(PaintOp::FillPath { path, color });
    }

    /// Records an image draw.
    pub fn draw_image(&mut self, image: ResourceId, dest: Rect) {
        self.record(PaintOp::DrawImage { image, dest });
    }
}

impl Drop for DrawingRecorder<'_> {
    fn drop(&mut self) {
        let picture = mem::take(&mut self.picture);
        self.list
            .create_and_append(DisplayItem::drawing(self.client, self.drawing_type, picture));
    }
}
