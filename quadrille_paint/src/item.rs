// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display items: the unit of paint recording.
//!
//! Every item carries the client that produced it and a [`DisplayItemType`].
//! Types fall into categories: drawings (and their cached stand-ins), and
//! begin/end pairs that bracket other items with a clip, transform, effect,
//! or positioning scope. A begin and its end always belong to the same
//! category; see [`DisplayItemType::is_end_and_paired_with`].

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, BezPath, Rect, RoundedRect, Vec2};
use quadrille_core::filter::FilterOperations;
use quadrille_core::shared_quad_state::BlendMode;
use quadrille_core::transform::Transform3d;

use crate::context::GraphicsContext;
use crate::picture::Picture;
use crate::web::WebDisplayItemList;

/// Opaque identity of the object that painted an item.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayItemClient(pub u64);

impl fmt::Debug for DisplayItemClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayItemClient({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Painting phases of a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaintPhase {
    /// Background and borders of the box itself.
    BlockBackground,
    /// Backgrounds of child blocks.
    ChildBlockBackground,
    /// Backgrounds of all descendant blocks.
    ChildBlockBackgrounds,
    /// Floating descendants.
    Float,
    /// Inline content.
    Foreground,
    /// Outlines of the box and its descendants.
    Outline,
    /// Outlines of descendants only.
    ChildOutlines,
    /// Outline of the box only.
    SelfOutline,
    /// Selection highlight.
    Selection,
    /// CSS mask.
    Mask,
    /// Mask that implements clipping.
    ClippingMask,
}

impl PaintPhase {
    fn name(self) -> &'static str {
        match self {
            Self::BlockBackground => "BlockBackground",
            Self::ChildBlockBackground => "ChildBlockBackground",
            Self::ChildBlockBackgrounds => "ChildBlockBackgrounds",
            Self::Float => "Float",
            Self::Foreground => "Foreground",
            Self::Outline => "Outline",
            Self::ChildOutlines => "ChildOutlines",
            Self::SelfOutline => "SelfOutline",
            Self::Selection => "Selection",
            Self::Mask => "Mask",
            Self::ClippingMask => "ClippingMask",
        }
    }
}

/// What a drawing item paints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawingType {
    /// One phase of ordinary box painting.
    PaintPhase(PaintPhase),
    /// Background and border decoration.
    BoxDecorationBackground,
    /// Text caret.
    Caret,
    /// Multi-column rules.
    ColumnRules,
    /// Debug fill for unpainted regions.
    DebugRedFill,
    /// Drag image snapshot.
    DragImage,
    /// Tap highlight.
    LinkHighlight,
    /// Page overlay.
    PageOverlay,
    /// Scroll corner.
    ScrollbarCorner,
    /// Scrollbar thumb.
    ScrollbarThumb,
    /// Scrollbar track.
    ScrollbarTrack,
    /// Resize handle.
    Resizer,
    /// SVG clip content.
    SvgClip,
    /// SVG filter content.
    SvgFilter,
    /// SVG mask content.
    SvgMask,
    /// Video frame snapshot.
    VideoBitmap,
    /// Plugin content.
    WebPlugin,
}

impl fmt::Display for DrawingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PaintPhase(phase) => return write!(f, "PaintPhase{}", phase.name()),
            Self::BoxDecorationBackground => "BoxDecorationBackground",
            Self::Caret => "Caret",
            Self::ColumnRules => "ColumnRules",
            Self::DebugRedFill => "DebugRedFill",
            Self::DragImage => "DragImage",
            Self::LinkHighlight => "LinkHighlight",
            Self::PageOverlay => "PageOverlay",
            Self::ScrollbarCorner => "ScrollbarCorner",
            Self::ScrollbarThumb => "ScrollbarThumb",
            Self::ScrollbarTrack => "ScrollbarTrack",
            Self::Resizer => "Resizer",
            Self::SvgClip => "SvgClip",
            Self::SvgFilter => "SvgFilter",
            Self::SvgMask => "SvgMask",
            Self::VideoBitmap => "VideoBitmap",
            Self::WebPlugin => "WebPlugin",
        };
        f.write_str(name)
    }
}

/// Why a rect clip was pushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClipType {
    /// Overflow clip of a box during one phase.
    BoxPaintPhase(PaintPhase),
    /// Column bounds during one phase.
    ColumnBoundsPaintPhase(PaintPhase),
    /// One fragment of a paginated layer during one phase.
    LayerFragment(PaintPhase),
    /// File upload control button area.
    FileUploadControlRect,
    /// Frame contents to the visible content rect.
    FrameToVisibleContentRect,
    /// Frame scrollbars.
    FrameScrollbars,
    /// Layer background.
    LayerBackground,
    /// Layer column bounds.
    LayerColumnBounds,
    /// Layer filter region.
    LayerFilter,
    /// Layer foreground.
    LayerForeground,
    /// Clip inherited from the parent layer.
    LayerParent,
    /// Layer overflow controls.
    LayerOverflowControls,
    /// Node image snapshot.
    NodeImage,
    /// Popup list box frame.
    PopupListBoxFrame,
    /// Selection image snapshot.
    SelectionImage,
    /// Embedder-supplied clip.
    PageWidgetDelegate,
    /// One printed page.
    PrintedPage,
}

impl fmt::Display for ClipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BoxPaintPhase(p) => return write!(f, "Box{}", p.name()),
            Self::ColumnBoundsPaintPhase(p) => return write!(f, "ColumnBounds{}", p.name()),
            Self::LayerFragment(p) => return write!(f, "LayerFragment{}", p.name()),
            Self::FileUploadControlRect => "FileUploadControlRect",
            Self::FrameToVisibleContentRect => "FrameToVisibleContentRect",
            Self::FrameScrollbars => "FrameScrollbars",
            Self::LayerBackground => "LayerBackground",
            Self::LayerColumnBounds => "LayerColumnBounds",
            Self::LayerFilter => "LayerFilter",
            Self::LayerForeground => "LayerForeground",
            Self::LayerParent => "LayerParent",
            Self::LayerOverflowControls => "LayerOverflowControls",
            Self::NodeImage => "NodeImage",
            Self::PopupListBoxFrame => "PopupListBoxFrame",
            Self::SelectionImage => "SelectionImage",
            Self::PageWidgetDelegate => "PageWidgetDelegate",
            Self::PrintedPage => "PrintedPage",
        };
        f.write_str(name)
    }
}

/// Why a fractional clip was pushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloatClipType {
    /// Clip applied during one phase.
    PaintPhase(PaintPhase),
}

/// Why a scroll offset was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScrollType {
    /// Scroll applied during one phase.
    PaintPhase(PaintPhase),
}

/// Why a 3-D transform was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Transform3DType {
    /// CSS `transform` on an element.
    ElementTransform,
}

/// Closed set of display item types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DisplayItemType {
    /// Recorded drawing content.
    Drawing(DrawingType),
    /// Stand-in for a drawing to be copied from the previous commit.
    CachedDrawing(DrawingType),
    /// Begins a rect clip.
    Clip(ClipType),
    /// Ends a rect clip.
    EndClip(ClipType),
    /// Begins a fractional rect clip.
    FloatClip(FloatClipType),
    /// Ends a fractional rect clip.
    EndFloatClip(FloatClipType),
    /// Begins a scroll offset.
    Scroll(ScrollType),
    /// Ends a scroll offset.
    EndScroll(ScrollType),
    /// Begins a 3-D transform.
    Transform3D(Transform3DType),
    /// Ends a 3-D transform.
    EndTransform3D(Transform3DType),
    /// Begins a filter.
    BeginFilter,
    /// Ends a filter.
    EndFilter,
    /// Begins a compositing layer.
    BeginCompositing,
    /// Ends a compositing layer.
    EndCompositing,
    /// Begins an affine transform.
    BeginTransform,
    /// Ends an affine transform.
    EndTransform,
    /// Begins a path clip.
    BeginClipPath,
    /// Ends a path clip.
    EndClipPath,
    /// Begins fixed-position content.
    BeginFixedPosition,
    /// Ends fixed-position content.
    EndFixedPosition,
    /// Begins a container of fixed-position content.
    BeginFixedPositionContainer,
    /// Ends a container of fixed-position content.
    EndFixedPositionContainer,
    /// Placeholder left behind when an item is moved out.
    #[default]
    Uninitialized,
}

impl DisplayItemType {
    /// Drawing content, cached or not.
    #[must_use]
    pub const fn is_drawing(self) -> bool {
        matches!(self, Self::Drawing(_) | Self::CachedDrawing(_))
    }

    /// A stand-in for a previous drawing.
    #[must_use]
    pub const fn is_cached(self) -> bool {
        matches!(self, Self::CachedDrawing(_))
    }

    /// Opens a bracket.
    #[must_use]
    pub const fn is_begin(self) -> bool {
        matches!(
            self,
            Self::Clip(_)
                | Self::FloatClip(_)
                | Self::Scroll(_)
                | Self::Transform3D(_)
                | Self::BeginFilter
                | Self::BeginCompositing
                | Self::BeginTransform
                | Self::BeginClipPath
                | Self::BeginFixedPosition
                | Self::BeginFixedPositionContainer
        )
    }

    /// Closes a bracket.
    #[must_use]
    pub const fn is_end(self) -> bool {
        matches!(
            self,
            Self::EndClip(_)
                | Self::EndFloatClip(_)
                | Self::EndScroll(_)
                | Self::EndTransform3D(_)
                | Self::EndFilter
                | Self::EndCompositing
                | Self::EndTransform
                | Self::EndClipPath
                | Self::EndFixedPosition
                | Self::EndFixedPositionContainer
        )
    }

    /// Whether `self` is an end that closes a `begin` of the same category.
    ///
    /// Clip, float-clip, scroll, and 3-D transform ends close any begin of
    /// their category regardless of the specific reason.
    #[must_use]
    pub const fn is_end_and_paired_with(self, begin: Self) -> bool {
        matches!(
            (self, begin),
            (Self::EndClip(_), Self::Clip(_))
                | (Self::EndFloatClip(_), Self::FloatClip(_))
                | (Self::EndScroll(_), Self::Scroll(_))
                | (Self::EndTransform3D(_), Self::Transform3D(_))
                | (Self::EndFilter, Self::BeginFilter)
                | (Self::EndCompositing, Self::BeginCompositing)
                | (Self::EndTransform, Self::BeginTransform)
                | (Self::EndClipPath, Self::BeginClipPath)
                | (Self::EndFixedPosition, Self::BeginFixedPosition)
                | (Self::EndFixedPositionContainer, Self::BeginFixedPositionContainer)
        )
    }

    /// The end type that closes this begin, or `None` for non-begins.
    #[must_use]
    pub const fn to_end(self) -> Option<Self> {
        Some(match self {
            Self::Clip(t) => Self::EndClip(t),
            Self::FloatClip(t) => Self::EndFloatClip(t),
            Self::Scroll(t) => Self::EndScroll(t),
            Self::Transform3D(t) => Self::EndTransform3D(t),
            Self::BeginFilter => Self::EndFilter,
            Self::BeginCompositing => Self::EndCompositing,
            Self::BeginTransform => Self::EndTransform,
            Self::BeginClipPath => Self::EndClipPath,
            Self::BeginFixedPosition => Self::EndFixedPosition,
            Self::BeginFixedPositionContainer => Self::EndFixedPositionContainer,
            _ => return None,
        })
    }

    /// Collapses a cached drawing type to the drawing type it stands for.
    #[must_use]
    pub const fn non_cached(self) -> Self {
        match self {
            Self::CachedDrawing(t) => Self::Drawing(t),
            other => other,
        }
    }
}

impl fmt::Display for DisplayItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drawing(t) => write!(f, "Drawing{t}"),
            Self::CachedDrawing(t) => write!(f, "CachedDrawing{t}"),
            Self::Clip(t) => write!(f, "Clip{t}"),
            Self::EndClip(t) => write!(f, "EndClip{t}"),
            Self::FloatClip(FloatClipType::PaintPhase(p)) => write!(f, "FloatClip{}", p.name()),
            Self::EndFloatClip(FloatClipType::PaintPhase(p)) => {
                write!(f, "EndFloatClip{}", p.name())
            }
            Self::Scroll(ScrollType::PaintPhase(p)) => write!(f, "Scroll{}", p.name()),
            Self::EndScroll(ScrollType::PaintPhase(p)) => write!(f, "EndScroll{}", p.name()),
            Self::Transform3D(Transform3DType::ElementTransform) => {
                f.write_str("Transform3DElementTransform")
            }
            Self::EndTransform3D(Transform3DType::ElementTransform) => {
                f.write_str("EndTransform3DElementTransform")
            }
            Self::BeginFilter => f.write_str("BeginFilter"),
            Self::EndFilter => f.write_str("EndFilter"),
            Self::BeginCompositing => f.write_str("BeginCompositing"),
            Self::EndCompositing => f.write_str("EndCompositing"),
            Self::BeginTransform => f.write_str("BeginTransform"),
            Self::EndTransform => f.write_str("EndTransform"),
            Self::BeginClipPath => f.write_str("BeginClipPath"),
            Self::EndClipPath => f.write_str("EndClipPath"),
            Self::BeginFixedPosition => f.write_str("BeginFixedPosition"),
            Self::EndFixedPosition => f.write_str("EndFixedPosition"),
            Self::BeginFixedPositionContainer => f.write_str("BeginFixedPositionContainer"),
            Self::EndFixedPositionContainer => f.write_str("EndFixedPositionContainer"),
            Self::Uninitialized => f.write_str("Uninitialized"),
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Color transform applied when a compositing layer is restored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorFilter {
    /// No transform.
    #[default]
    None,
    /// Alpha becomes the luminance of the color.
    LuminanceToAlpha,
    /// sRGB-encoded values are linearized.
    SrgbToLinearRgb,
    /// Linear values are sRGB-encoded.
    LinearRgbToSrgb,
}

/// A nested repetition of a client's painting.
///
/// Items painted inside a scope get the scope's id, so a client that paints
/// the same content more than once per frame still produces unique ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope {
    /// Per-container counter.
    pub id: u32,
    /// Client that opened the scope.
    pub container: DisplayItemClient,
}

/// Identity of an item across commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayItemId {
    /// Painting client.
    pub client: DisplayItemClient,
    /// Item type, with cached drawings collapsed to drawings.
    pub item_type: DisplayItemType,
    /// Scope id, or 0 outside any scope.
    pub scope_id: u32,
    /// Scope container, or the default client outside any scope.
    pub scope_container: DisplayItemClient,
}

/// Type-specific data of a [`DisplayItem`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DisplayItemPayload {
    /// Items with no data: cached drawings, ends, fixed-position brackets.
    #[default]
    Empty,
    /// Recorded drawing content.
    Drawing(Picture),
    /// Rect clip, further limited by rounded rects.
    Clip {
        /// Clip rect.
        rect: Rect,
        /// Rounded rects intersected with the clip.
        rounded_rect_clips: Vec<RoundedRect>,
    },
    /// Fractional rect clip.
    FloatClip {
        /// Clip rect.
        rect: Rect,
    },
    /// Scroll offset.
    Scroll {
        /// Content offset; content moves by the negation.
        offset: Vec2,
    },
    /// 3-D transform about an origin.
    Transform3D {
        /// The transform.
        transform: Transform3d,
        /// Point the transform is applied around.
        origin: [f64; 3],
    },
    /// Filter chain.
    Filter {
        /// Filters in application order.
        filters: FilterOperations,
        /// Region the filter output covers.
        bounds: Rect,
    },
    /// Offscreen compositing layer.
    Compositing {
        /// Blend mode used when the layer is restored.
        blend_mode: BlendMode,
        /// Layer opacity.
        opacity: f32,
        /// Layer bounds, if known.
        bounds: Option<Rect>,
        /// Color transform applied on restore.
        color_filter: ColorFilter,
    },
    /// Affine transform.
    Transform {
        /// The transform.
        affine: Affine,
    },
    /// Path clip.
    ClipPath {
        /// Clip path.
        path: BezPath,
        /// Whether the clip edge is anti-aliased.
        anti_alias: bool,
    },
}

/// One recorded item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayItem {
    /// Painting client.
    pub client: DisplayItemClient,
    /// Item type.
    pub item_type: DisplayItemType,
    /// Scope the item was painted in.
    pub scope: Option<Scope>,
    /// Painted while the cache was bypassed; never reused.
    pub skipped_cache: bool,
    /// Type-specific data.
    pub payload: DisplayItemPayload,
}

impl DisplayItem {
    fn new(client: DisplayItemClient, item_type: DisplayItemType, payload: DisplayItemPayload) -> Self {
        Self {
            client,
            item_type,
            scope: None,
            skipped_cache: false,
            payload,
        }
    }

    /// A drawing.
    #[must_use]
    pub fn drawing(client: DisplayItemClient, t: DrawingType, picture: Picture) -> Self {
        Self::new(client, DisplayItemType::Drawing(t), DisplayItemPayload::Drawing(picture))
    }

    /// A stand-in for `client`'s previous drawing of type `t`.
    #[must_use]
    pub fn cached(client: DisplayItemClient, t: DrawingType) -> Self {
        Self::new(client, DisplayItemType::CachedDrawing(t), DisplayItemPayload::Empty)
    }

    /// Begins a rect clip.
    #[must_use]
    pub fn clip(
        client: DisplayItemClient,
        t: ClipType,
        rect: Rect,
        rounded_rect_clips: Vec<RoundedRect>,
    ) -> Self {
        Self::new(
            client,
            DisplayItemType::Clip(t),
            DisplayItemPayload::Clip {
                rect,
                rounded_rect_clips,
            },
        )
    }

    /// Begins a fractional rect clip.
    #[must_use]
    pub fn float_clip(client: DisplayItemClient, t: FloatClipType, rect: Rect) -> Self {
        Self::new(client, DisplayItemType::FloatClip(t), DisplayItemPayload::FloatClip { rect })
    }

    /// Begins a scroll offset.
    #[must_use]
    pub fn scroll(client: DisplayItemClient, t: ScrollType, offset: Vec2) -> Self {
        Self::new(client, DisplayItemType::Scroll(t), DisplayItemPayload::Scroll { offset })
    }

    /// Begins a 3-D transform about `origin`.
    #[must_use]
    pub fn transform_3d(
        client: DisplayItemClient,
        t: Transform3DType,
        transform: Transform3d,
        origin: [f64; 3],
    ) -> Self {
        Self::new(
            client,
            DisplayItemType::Transform3D(t),
            DisplayItemPayload::Transform3D { transform, origin },
        )
    }

    /// Begins a filter.
    #[must_use]
    pub fn filter(client: DisplayItemClient, filters: FilterOperations, bounds: Rect) -> Self {
        Self::new(
            client,
            DisplayItemType::BeginFilter,
            DisplayItemPayload::Filter { filters, bounds },
        )
    }

    /// Begins a compositing layer.
    #[must_use]
    pub fn compositing(
        client: DisplayItemClient,
        blend_mode: BlendMode,
        opacity: f32,
        bounds: Option<Rect>,
        color_filter: ColorFilter,
    ) -> Self {
        Self::new(
            client,
            DisplayItemType::BeginCompositing,
            DisplayItemPayload::Compositing {
                blend_mode,
                opacity,
                bounds,
                color_filter,
            },
        )
    }

    /// Begins an affine transform.
    #[must_use]
    pub fn transform(client: DisplayItemClient, affine: Affine) -> Self {
        Self::new(
            client,
            DisplayItemType::BeginTransform,
            DisplayItemPayload::Transform { affine },
        )
    }

    /// Begins a path clip.
    #[must_use]
    pub fn clip_path(client: DisplayItemClient, path: BezPath, anti_alias: bool) -> Self {
        Self::new(
            client,
            DisplayItemType::BeginClipPath,
            DisplayItemPayload::ClipPath { path, anti_alias },
        )
    }

    /// A bracket item with no payload: any end, or a fixed-position begin.
    ///
    /// # Panics
    ///
    /// Panics if `item_type` is not such a type.
    #[must_use]
    pub fn bracket(client: DisplayItemClient, item_type: DisplayItemType) -> Self {
        assert!(
            item_type.is_end()
                || matches!(
                    item_type,
                    DisplayItemType::BeginFixedPosition
                        | DisplayItemType::BeginFixedPositionContainer
                ),
            "{item_type} carries a payload"
        );
        Self::new(client, item_type, DisplayItemPayload::Empty)
    }

    /// Identity used to match this item against the previous commit.
    #[must_use]
    pub fn id(&self) -> DisplayItemId {
        let scope = self.scope.unwrap_or_default();
        DisplayItemId {
            client: self.client,
            item_type: self.item_type.non_cached(),
            scope_id: scope.id,
            scope_container: scope.container,
        }
    }

    /// Whether the item still holds content; moved-out slots do not.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.item_type != DisplayItemType::Uninitialized
    }

    /// Whether the item contributes pixels by itself.
    ///
    /// Begins never do, which is what lets an empty begin/end pair be
    /// dropped.
    #[must_use]
    pub fn draws_content(&self) -> bool {
        match &self.payload {
            DisplayItemPayload::Drawing(picture) => !picture.is_empty(),
            _ => self.item_type.is_cached(),
        }
    }

    /// Replays the item into `context`.
    ///
    /// Cached stand-ins and placeholders replay nothing; a committed list
    /// contains neither.
    pub fn replay(&self, context: &mut dyn GraphicsContext) {
        match (&self.payload, self.item_type) {
            (DisplayItemPayload::Drawing(picture), _) => context.draw_picture(picture),
            (
                DisplayItemPayload::Clip {
                    rect,
                    rounded_rect_clips,
                },
                _,
            ) => {
                context.save();
                context.clip_rect(*rect);
                for rounded in rounded_rect_clips {
                    context.clip_rounded_rect(*rounded);
                }
            }
            (DisplayItemPayload::FloatClip { rect }, _) => {
                context.save();
                context.clip_rect(*rect);
            }
            (DisplayItemPayload::Scroll { offset }, _) => {
                context.save();
                context.translate(-offset.x, -offset.y);
            }
            (DisplayItemPayload::Transform3D { transform, origin }, _) => {
                context.save();
                context.concat_transform(&transform_about_origin(transform, *origin));
            }
            (DisplayItemPayload::Filter { filters, bounds }, _) => {
                context.begin_filter(filters, *bounds);
            }
            (
                DisplayItemPayload::Compositing {
                    blend_mode,
                    opacity,
                    bounds,
                    color_filter,
                },
                _,
            ) => context.begin_layer(*opacity, *blend_mode, *bounds, *color_filter),
            (DisplayItemPayload::Transform { affine }, _) => {
                context.save();
                context.concat_affine(*affine);
            }
            (DisplayItemPayload::ClipPath { path, anti_alias }, _) => {
                context.save();
                context.clip_path(path, *anti_alias);
            }
            (
                DisplayItemPayload::Empty,
                DisplayItemType::EndClip(_)
                | DisplayItemType::EndFloatClip(_)
                | DisplayItemType::EndScroll(_)
                | DisplayItemType::EndTransform3D(_)
                | DisplayItemType::EndTransform
                | DisplayItemType::EndClipPath,
            ) => context.restore(),
            (DisplayItemPayload::Empty, DisplayItemType::EndFilter) => context.end_filter(),
            (DisplayItemPayload::Empty, DisplayItemType::EndCompositing) => context.end_layer(),
            (DisplayItemPayload::Empty, _) => {}
        }
    }

    /// Appends the item to `list` in compositor wire form.
    ///
    /// Fixed-position brackets have no wire form; cached stand-ins and
    /// placeholders append nothing.
    pub fn append_to_web_display_item_list(&self, list: &mut dyn WebDisplayItemList) {
        match (&self.payload, self.item_type) {
            (DisplayItemPayload::Drawing(picture), _) => list.append_drawing_item(picture),
            (
                DisplayItemPayload::Clip {
                    rect,
                    rounded_rect_clips,
                },
                _,
            ) => list.append_clip_item(*rect, rounded_rect_clips),
            (DisplayItemPayload::FloatClip { rect }, _) => list.append_float_clip_item(*rect),
            (DisplayItemPayload::Scroll { offset }, _) => list.append_scroll_item(*offset),
            (DisplayItemPayload::Transform3D { transform, origin }, _) => {
                list.append_transform_item(&transform_about_origin(transform, *origin));
            }
            (DisplayItemPayload::Filter { filters, bounds }, _) => {
                list.append_filter_item(filters, *bounds);
            }
            (
                DisplayItemPayload::Compositing {
                    blend_mode,
                    opacity,
                    bounds,
                    color_filter,
                },
                _,
            ) => list.append_compositing_item(*opacity, *blend_mode, *bounds, *color_filter),
            (DisplayItemPayload::Transform { affine }, _) => {
                list.append_transform_item(&Transform3d::from_affine(*affine));
            }
            (DisplayItemPayload::ClipPath { path, anti_alias }, _) => {
                list.append_clip_path_item(path, *anti_alias);
            }
            (DisplayItemPayload::Empty, DisplayItemType::EndClip(_)) => list.append_end_clip_item(),
            (DisplayItemPayload::Empty, DisplayItemType::EndFloatClip(_)) => {
                list.append_end_float_clip_item();
            }
            (DisplayItemPayload::Empty, DisplayItemType::EndScroll(_)) => {
                list.append_end_scroll_item();
            }
            (
                DisplayItemPayload::Empty,
                DisplayItemType::EndTransform3D(_) | DisplayItemType::EndTransform,
            ) => list.append_end_transform_item(),
            (DisplayItemPayload::Empty, DisplayItemType::EndFilter) => {
                list.append_end_filter_item();
            }
            (DisplayItemPayload::Empty, DisplayItemType::EndCompositing) => {
                list.append_end_compositing_item();
            }
            (DisplayItemPayload::Empty, DisplayItemType::EndClipPath) => {
                list.append_end_clip_path_item();
            }
            (DisplayItemPayload::Empty, _) => {}
        }
    }
}

/// `translate(origin) * transform * translate(-origin)`.
fn transform_about_origin(transform: &Transform3d, [ox, oy, oz]: [f64; 3]) -> Transform3d {
    Transform3d::from_translation(ox, oy, oz) * *transform * Transform3d::from_translation(-ox, -oy, -oz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextOp, RecordingContext};

    const CLIENT: DisplayItemClient = DisplayItemClient(7);

    #[test]
    fn categories_are_disjoint() {
        let samples = [
            DisplayItemType::Drawing(DrawingType::Caret),
            DisplayItemType::CachedDrawing(DrawingType::Caret),
            DisplayItemType::Clip(ClipType::LayerParent),
            DisplayItemType::EndClip(ClipType::LayerParent),
            DisplayItemType::BeginFilter,
            DisplayItemType::EndFilter,
            DisplayItemType::Uninitialized,
        ];
        for t in samples {
            let flags = [t.is_drawing(), t.is_begin(), t.is_end()];
            assert!(flags.iter().filter(|&&f| f).count() <= 1, "{t} is in two categories");
        }
        assert!(DisplayItemType::CachedDrawing(DrawingType::Caret).is_cached());
        assert!(!DisplayItemType::Drawing(DrawingType::Caret).is_cached());
    }

    #[test]
    fn every_begin_has_a_paired_end() {
        let begins = [
            DisplayItemType::Clip(ClipType::BoxPaintPhase(PaintPhase::Foreground)),
            DisplayItemType::FloatClip(FloatClipType::PaintPhase(PaintPhase::Float)),
            DisplayItemType::Scroll(ScrollType::PaintPhase(PaintPhase::Foreground)),
            DisplayItemType::Transform3D(Transform3DType::ElementTransform),
            DisplayItemType::BeginFilter,
            DisplayItemType::BeginCompositing,
            DisplayItemType::BeginTransform,
            DisplayItemType::BeginClipPath,
            DisplayItemType::BeginFixedPosition,
            DisplayItemType::BeginFixedPositionContainer,
        ];
        for begin in begins {
            let end = begin.to_end();
            assert!(end.is_some_and(|e| e.is_end() && e.is_end_and_paired_with(begin)), "{begin}");
        }
        assert_eq!(DisplayItemType::EndFilter.to_end(), None);
    }

    #[test]
    fn clip_ends_pair_by_category() {
        let end = DisplayItemType::EndClip(ClipType::LayerForeground);
        assert!(end.is_end_and_paired_with(DisplayItemType::Clip(ClipType::LayerBackground)));
        assert!(!end.is_end_and_paired_with(DisplayItemType::BeginTransform));
        assert!(!DisplayItemType::Clip(ClipType::LayerForeground)
            .is_end_and_paired_with(DisplayItemType::Clip(ClipType::LayerForeground)));
    }

    #[test]
    fn names_follow_category_and_reason() {
        let t = DisplayItemType::Clip(ClipType::BoxPaintPhase(PaintPhase::Foreground));
        assert_eq!(alloc::format!("{t}"), "ClipBoxForeground");
        let t = DisplayItemType::CachedDrawing(DrawingType::PaintPhase(PaintPhase::Outline));
        assert_eq!(alloc::format!("{t}"), "CachedDrawingPaintPhaseOutline");
        assert_eq!(
            alloc::format!("{}", DisplayItemType::EndTransform3D(Transform3DType::ElementTransform)),
            "EndTransform3DElementTransform"
        );
    }

    #[test]
    fn cached_id_matches_drawing_id() {
        let drawing = DisplayItem::drawing(CLIENT, DrawingType::Caret, Picture::default());
        let cached = DisplayItem::cached(CLIENT, DrawingType::Caret);
        assert_eq!(drawing.id(), cached.id());
        assert!(cached.draws_content());
        assert!(!drawing.draws_content());
    }

    #[test]
    #[should_panic(expected = "carries a payload")]
    fn bracket_rejects_payload_types() {
        let _ = DisplayItem::bracket(CLIENT, DisplayItemType::BeginFilter);
    }

    #[test]
    fn replay_brackets_balance_save_restore() {
        let items = [
            DisplayItem::scroll(
                CLIENT,
                ScrollType::PaintPhase(PaintPhase::Foreground),
                Vec2::new(5.0, 10.0),
            ),
            DisplayItem::bracket(
                CLIENT,
                DisplayItemType::EndScroll(ScrollType::PaintPhase(PaintPhase::Foreground)),
            ),
            DisplayItem::bracket(CLIENT, DisplayItemType::BeginFixedPosition),
        ];
        let mut context = RecordingContext::new();
        for item in &items {
            item.replay(&mut context);
        }
        assert_eq!(
            context.ops(),
            &[
                ContextOp::Save,
                ContextOp::Translate(Vec2::new(-5.0, -10.0)),
                ContextOp::Restore,
            ]
        );
        assert!(context.is_balanced());
    }

    #[test]
    fn transform_3d_applies_about_origin() {
        let item = DisplayItem::transform_3d(
            CLIENT,
            Transform3DType::ElementTransform,
            Transform3d::from_scale(2.0, 2.0, 1.0),
            [10.0, 10.0, 0.0],
        );
        let mut context = RecordingContext::new();
        item.replay(&mut context);
        let Some(ContextOp::ConcatTransform(t)) = context.ops().get(1) else {
            panic!("expected a concatenated transform, got {:?}", context.ops());
        };
        // The origin is a fixed point.
        assert_eq!(t.map_point(kurbo::Point::new(10.0, 10.0)), kurbo::Point::new(10.0, 10.0));
        assert_eq!(t.map_point(kurbo::Point::new(11.0, 10.0)), kurbo::Point::new(12.0, 10.0));
    }
}
