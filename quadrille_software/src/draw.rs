// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-material quad drawing onto a scissored tiny-skia target.
//!
//! Quads are drawn in their unit space: the device transform maps
//! [`UNIT_QUAD`] onto the quad's rect in window space, and every paint,
//! shader, and stroke is positioned relative to that square.

use std::collections::BTreeMap;

use kurbo::{Affine, Point, Rect, Vec2};
use quadrille_core::color::Color;
use quadrille_core::geometry::{IntRect, map_rect_proportional};
use quadrille_core::id::RenderPassId;
use quadrille_core::quad::{
    DebugBorderQuad, DrawQuad, QuadKind, RenderPassQuad, SolidColorQuad, TextureQuad, TileQuad,
};
use quadrille_core::shared_quad_state::{BlendMode, SharedQuadState};
use quadrille_core::transform::Transform3d;
use tiny_skia::{
    FilterQuality, Mask, MaskType, Paint, PathBuilder, Pattern, Pixmap, PixmapRef, SpreadMode,
    Stroke, Transform,
};

use crate::error::ResourceError;
use crate::filters::{apply_filters, to_u8};
use crate::renderer::DrawingFrame;
use crate::resource_provider::{
    ScopedReadLockSoftware, SoftwareResourceProvider, new_pixmap, pixmap_size,
};
use crate::settings::RendererSettings;

/// The square every quad is drawn in before its device transform.
pub(crate) const UNIT_QUAD: Rect = Rect::new(-0.5, -0.5, 0.5, 0.5);

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

#[expect(
    clippy::cast_possible_truncation,
    reason = "device coordinates fit comfortably in f32"
)]
fn sk_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "device coordinates fit comfortably in f32"
)]
fn sk_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "device coordinates fit comfortably in f32"
)]
fn sk_point(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

/// Maps a compositor blend mode to the rasterizer's.
pub(crate) const fn sk_blend_mode(mode: BlendMode) -> tiny_skia::BlendMode {
    use tiny_skia::BlendMode as Sk;
    match mode {
        BlendMode::Clear => Sk::Clear,
        BlendMode::Src => Sk::Source,
        BlendMode::Dst => Sk::Destination,
        BlendMode::SrcOver => Sk::SourceOver,
        BlendMode::DstOver => Sk::DestinationOver,
        BlendMode::SrcIn => Sk::SourceIn,
        BlendMode::DstIn => Sk::DestinationIn,
        BlendMode::SrcOut => Sk::SourceOut,
        BlendMode::DstOut => Sk::DestinationOut,
        BlendMode::SrcATop => Sk::SourceAtop,
        BlendMode::DstATop => Sk::DestinationAtop,
        BlendMode::Xor => Sk::Xor,
        BlendMode::Plus => Sk::Plus,
        BlendMode::Modulate => Sk::Modulate,
        BlendMode::Screen => Sk::Screen,
        BlendMode::Overlay => Sk::Overlay,
        BlendMode::Darken => Sk::Darken,
        BlendMode::Lighten => Sk::Lighten,
        BlendMode::ColorDodge => Sk::ColorDodge,
        BlendMode::ColorBurn => Sk::ColorBurn,
        BlendMode::HardLight => Sk::HardLight,
        BlendMode::SoftLight => Sk::SoftLight,
        BlendMode::Difference => Sk::Difference,
        BlendMode::Exclusion => Sk::Exclusion,
        BlendMode::Multiply => Sk::Multiply,
        BlendMode::Hue => Sk::Hue,
        BlendMode::Saturation => Sk::Saturation,
        BlendMode::Color => Sk::Color,
        BlendMode::Luminosity => Sk::Luminosity,
    }
}

/// The transform that maps `src` onto `dst`, or `None` if `src` is empty.
fn rect_to_rect(src: Rect, dst: Rect) -> Option<Affine> {
    if src.width() == 0.0 || src.height() == 0.0 {
        return None;
    }
    let sx = dst.width() / src.width();
    let sy = dst.height() / src.height();
    Some(Affine::new([
        sx,
        0.0,
        0.0,
        sy,
        dst.x0 - src.x0 * sx,
        dst.y0 - src.y0 * sy,
    ]))
}

/// `quad_to_target` followed by the mapping of [`UNIT_QUAD`] onto `rect`.
pub(crate) fn quad_rect_transform(quad_to_target: &Transform3d, rect: IntRect) -> Transform3d {
    let r = rect.to_rect();
    let center = r.center();
    quad_to_target
        .pre_translate(center.x, center.y)
        .pre_scale(r.width(), r.height())
}

/// Maps a quad's unit square to window pixels in the current pass.
pub(crate) fn contents_device_transform(
    frame: &DrawingFrame,
    quad_to_target: &Transform3d,
    rect: IntRect,
) -> Transform3d {
    (frame.window_matrix * frame.projection_matrix * quad_rect_transform(quad_to_target, rect))
        .flatten_to_2d()
}

/// The visible part of `quad` in unit-quad space.
fn visible_vertex_rect(quad: &DrawQuad) -> Rect {
    map_rect_proportional(quad.rect.to_rect(), UNIT_QUAD, quad.visible_rect.to_rect())
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// A render target with an optional rectangular scissor.
///
/// The clip is kept as a coverage mask so that transformed and
/// anti-aliased draws are cut exactly at the scissor edges.
pub(crate) struct Canvas<'a> {
    pixmap: &'a mut Pixmap,
    bounds: IntRect,
    scissor_rect: IntRect,
    clip_mask: Option<Mask>,
    is_scissor_enabled: bool,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(pixmap: &'a mut Pixmap) -> Self {
        let bounds = IntRect::from_size(pixmap_size(pixmap.as_ref()));
        Self {
            pixmap,
            bounds,
            scissor_rect: bounds,
            clip_mask: None,
            is_scissor_enabled: false,
        }
    }

    /// The whole target.
    pub(crate) fn bounds(&self) -> IntRect {
        self.bounds
    }

    /// Restricts subsequent draws to `rect` in window space.
    pub(crate) fn set_scissor_test_rect(&mut self, rect: IntRect) {
        self.is_scissor_enabled = true;
        self.set_clip(rect.intersection(self.bounds));
    }

    pub(crate) fn ensure_scissor_test_disabled(&mut self) {
        if !self.is_scissor_enabled {
            return;
        }
        self.is_scissor_enabled = false;
        self.set_clip(self.bounds);
    }

    fn set_clip(&mut self, clip: IntRect) {
        if clip == self.scissor_rect {
            return;
        }
        self.scissor_rect = clip;
        self.clip_mask = if clip == self.bounds {
            None
        } else {
            rect_mask(self.bounds, clip)
        };
    }

    /// Replaces every pixel inside the clip with `color`.
    pub(crate) fn clear(&mut self, color: Color) {
        let sk_color = tiny_skia::Color::from_rgba8(
            color.red(),
            color.green(),
            color.blue(),
            color.alpha(),
        );
        if self.scissor_rect.is_empty() {
            return;
        }
        if self.scissor_rect == self.bounds {
            self.pixmap.fill(sk_color);
            return;
        }
        let Some(rect) = sk_rect(self.scissor_rect.to_rect()) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(sk_color);
        paint.blend_mode = tiny_skia::BlendMode::Source;
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Fills `rect` (in the space `affine` maps from) through the clip.
    fn fill_rect(&mut self, rect: Rect, paint: &Paint<'_>, affine: Affine) {
        let Some(rect) = sk_rect(rect) else {
            return;
        };
        self.pixmap
            .fill_rect(rect, paint, sk_transform(affine), self.clip_mask.as_ref());
    }

    /// Fills `rect` with an explicit coverage mask instead of the clip.
    fn fill_rect_with_mask(&mut self, rect: Rect, paint: &Paint<'_>, affine: Affine, mask: &Mask) {
        let Some(rect) = sk_rect(rect) else {
            return;
        };
        self.pixmap
            .fill_rect(rect, paint, sk_transform(affine), Some(mask));
    }

    /// Strokes a path given in window pixels.
    fn stroke_path(&mut self, path: &tiny_skia::Path, paint: &Paint<'_>, stroke: &Stroke) {
        self.pixmap.stroke_path(
            path,
            paint,
            stroke,
            Transform::identity(),
            self.clip_mask.as_ref(),
        );
    }

    /// Renders `paint` over `rect` into an empty layer and returns its alpha
    /// as a mask, already cut by the clip.
    fn coverage(&self, rect: Rect, paint: &Paint<'_>, affine: Affine) -> Option<Mask> {
        let mut layer = new_pixmap(self.bounds.size())?;
        let mut paint = paint.clone();
        paint.blend_mode = tiny_skia::BlendMode::SourceOver;
        layer.fill_rect(
            sk_rect(rect)?,
            &paint,
            sk_transform(affine),
            self.clip_mask.as_ref(),
        );
        Some(Mask::from_pixmap(layer.as_ref(), MaskType::Alpha))
    }

    /// Copies the pixels under `rect`, clamped to the target.
    pub(crate) fn read_pixels(&self, rect: IntRect) -> Option<Pixmap> {
        let rect = rect.intersection(self.bounds);
        if rect.is_empty() {
            return None;
        }
        let mut out = new_pixmap(rect.size())?;
        let stride = usize::try_from(self.bounds.width).ok()? * 4;
        let left = usize::try_from(rect.x).ok()? * 4;
        let top = usize::try_from(rect.y).ok()?;
        let row_bytes = usize::try_from(rect.width).ok()? * 4;
        let src = self.pixmap.data();
        for (row, dst) in out.data_mut().chunks_exact_mut(row_bytes).enumerate() {
            let start = (top + row) * stride + left;
            dst.copy_from_slice(src.get(start..start + row_bytes)?);
        }
        Some(out)
    }
}

/// A mask of `bounds` size that is opaque inside `clip`.
fn rect_mask(bounds: IntRect, clip: IntRect) -> Option<Mask> {
    let width = u32::try_from(bounds.width).ok()?;
    let height = u32::try_from(bounds.height).ok()?;
    let mut mask = Mask::new(width, height)?;
    let clip = clip.intersection(bounds);
    if clip.is_empty() {
        return Some(mask);
    }
    let stride = usize::try_from(bounds.width).ok()?;
    let left = usize::try_from(clip.x).ok()?;
    let right = usize::try_from(clip.right()).ok()?;
    let top = usize::try_from(clip.y).ok()?;
    let bottom = usize::try_from(clip.bottom()).ok()?;
    for row in mask.data_mut().chunks_exact_mut(stride).take(bottom).skip(top) {
        row[left..right].fill(u8::MAX);
    }
    Some(mask)
}

// ---------------------------------------------------------------------------
// Quad paint
// ---------------------------------------------------------------------------

/// What became of one quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DrawOutcome {
    Drawn,
    DrawnAntiAliased,
    ClippedOut,
    ResourceUnavailable,
    Unsupported,
}

impl DrawOutcome {
    /// Whether the quad touched the target.
    pub(crate) const fn produced_pixels(self) -> bool {
        matches!(
            self,
            Self::Drawn | Self::DrawnAntiAliased | Self::Unsupported
        )
    }

    #[cfg(feature = "trace-rich")]
    pub(crate) const fn to_trace(self) -> quadrille_core::trace::QuadOutcome {
        use quadrille_core::trace::QuadOutcome;
        match self {
            Self::Drawn => QuadOutcome::Drawn,
            Self::DrawnAntiAliased => QuadOutcome::DrawnAntiAliased,
            Self::ClippedOut => QuadOutcome::ClippedOut,
            Self::ResourceUnavailable => QuadOutcome::ResourceUnavailable,
            Self::Unsupported => QuadOutcome::Unsupported,
        }
    }
}

/// Paint state shared by every material: edge treatment, sampling, and
/// compositing.
#[derive(Clone, Copy, Debug)]
struct QuadPaint {
    anti_alias: bool,
    quality: FilterQuality,
    blend_mode: tiny_skia::BlendMode,
    alpha: f32,
}

impl QuadPaint {
    fn solid(self, color: Color, opacity: f32) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(
            color.red(),
            color.green(),
            color.blue(),
            to_u8(color.alpha_f32() * opacity),
        );
        paint.anti_alias = self.anti_alias;
        paint.blend_mode = self.blend_mode;
        paint
    }

    fn pattern<'p>(
        self,
        pixmap: PixmapRef<'p>,
        spread: SpreadMode,
        quality: FilterQuality,
        opacity: f32,
        pattern_to_quad: Affine,
    ) -> Paint<'p> {
        let mut paint = Paint::default();
        paint.shader = Pattern::new(
            pixmap,
            spread,
            quality,
            opacity,
            sk_transform(pattern_to_quad),
        );
        paint.anti_alias = self.anti_alias;
        paint.blend_mode = self.blend_mode;
        paint
    }

    const fn drawn(self) -> DrawOutcome {
        if self.anti_alias {
            DrawOutcome::DrawnAntiAliased
        } else {
            DrawOutcome::Drawn
        }
    }
}

/// Everything the renderer shares with the quad handlers for one pass.
pub(crate) struct QuadContext<'a> {
    pub(crate) frame: &'a DrawingFrame,
    pub(crate) resources: &'a SoftwareResourceProvider,
    pub(crate) pass_textures: &'a BTreeMap<RenderPassId, Pixmap>,
    pub(crate) settings: &'a RendererSettings,
}

struct QuadDraw<'q> {
    quad: &'q DrawQuad,
    sqs: &'q SharedQuadState,
    device: Transform3d,
    affine: Affine,
    paint: QuadPaint,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Draws one quad through the canvas's current scissor.
pub(crate) fn do_draw_quad(
    ctx: &QuadContext<'_>,
    canvas: &mut Canvas<'_>,
    sqs: &SharedQuadState,
    quad: &DrawQuad,
) -> DrawOutcome {
    let device = contents_device_transform(ctx.frame, &sqs.quad_to_target_transform, quad.rect);
    let settings = ctx.settings;

    let mut paint = QuadPaint {
        anti_alias: false,
        quality: FilterQuality::Nearest,
        blend_mode: tiny_skia::BlendMode::Source,
        alpha: 1.0,
    };
    if settings.force_antialiasing || !device.is_positive_scale_with_integer_translation() {
        let all_four_edges_are_exterior = quad.is_top_edge()
            && quad.is_left_edge()
            && quad.is_bottom_edge(sqs)
            && quad.is_right_edge(sqs);
        paint.anti_alias = settings.allow_antialiasing
            && (settings.force_antialiasing || all_four_edges_are_exterior);
        paint.quality = FilterQuality::Bilinear;
    }
    if quad.should_draw_with_blending(sqs) || sqs.blend_mode != BlendMode::SrcOver {
        paint.alpha = sqs.opacity;
        paint.blend_mode = sk_blend_mode(sqs.blend_mode);
    }

    let q = QuadDraw {
        quad,
        sqs,
        device,
        affine: device.to_affine(),
        paint,
    };
    match &quad.kind {
        QuadKind::SolidColor(solid) => draw_solid_color(canvas, &q, solid),
        QuadKind::DebugBorder(border) => draw_debug_border(canvas, &q, border),
        QuadKind::Texture(texture) => draw_texture(ctx, canvas, &q, texture),
        QuadKind::Tile(tile) => draw_tile(ctx, canvas, &q, tile),
        QuadKind::RenderPass(pass) => draw_render_pass(ctx, canvas, &q, pass),
        QuadKind::Invalid
        | QuadKind::IoSurface(_)
        | QuadKind::StreamVideo(_)
        | QuadKind::Surface(_)
        | QuadKind::YuvVideo(_) => draw_unsupported(canvas, &q),
    }
}

/// Locks the quad's first resource, mapping the failure to an outcome.
fn lock_content<'r>(
    ctx: &QuadContext<'r>,
    canvas: &mut Canvas<'_>,
    q: &QuadDraw<'_>,
) -> Result<ScopedReadLockSoftware<'r>, DrawOutcome> {
    match ctx.resources.lock_for_read(q.quad.resource_id()) {
        Ok(lock) => Ok(lock),
        Err(ResourceError::NotSoftware(_)) => Err(draw_unsupported(canvas, q)),
        Err(_) => Err(DrawOutcome::ResourceUnavailable),
    }
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

fn draw_solid_color(canvas: &mut Canvas<'_>, q: &QuadDraw<'_>, solid: &SolidColorQuad) -> DrawOutcome {
    let mut paint = q.paint;
    if solid.force_anti_aliasing_off {
        paint.anti_alias = false;
    }
    canvas.fill_rect(
        visible_vertex_rect(q.quad),
        &paint.solid(solid.color, q.sqs.opacity),
        q.affine,
    );
    paint.drawn()
}

fn draw_debug_border(
    canvas: &mut Canvas<'_>,
    q: &QuadDraw<'_>,
    border: &DebugBorderQuad,
) -> DrawOutcome {
    // Map the corners by hand so the stroke width stays in device pixels.
    let corners = [
        Point::new(UNIT_QUAD.x0, UNIT_QUAD.y0),
        Point::new(UNIT_QUAD.x1, UNIT_QUAD.y0),
        Point::new(UNIT_QUAD.x1, UNIT_QUAD.y1),
        Point::new(UNIT_QUAD.x0, UNIT_QUAD.y1),
    ]
    .map(|p| sk_point(q.affine * p));
    let mut builder = PathBuilder::new();
    builder.move_to(corners[0].0, corners[0].1);
    for &(x, y) in &corners[1..] {
        builder.line_to(x, y);
    }
    builder.close();
    let Some(path) = builder.finish() else {
        return DrawOutcome::Drawn;
    };
    let stroke = Stroke {
        width: border.width.max(1) as f32,
        ..Stroke::default()
    };
    canvas.stroke_path(&path, &q.paint.solid(border.color, q.sqs.opacity), &stroke);
    q.paint.drawn()
}

fn draw_texture(
    ctx: &QuadContext<'_>,
    canvas: &mut Canvas<'_>,
    q: &QuadDraw<'_>,
    texture: &TextureQuad,
) -> DrawOutcome {
    let lock = match lock_content(ctx, canvas, q) {
        Ok(lock) => lock,
        Err(outcome) => return outcome,
    };
    let size = lock.size().to_size();
    let uv = Rect::from_points(texture.uv_top_left, texture.uv_bottom_right);
    let uv_rect = Rect::new(
        uv.x0 * size.width,
        uv.y0 * size.height,
        uv.x1 * size.width,
        uv.y1 * size.height,
    );
    let visible_uv = map_rect_proportional(
        q.quad.rect.to_rect(),
        uv_rect,
        q.quad.visible_rect.to_rect(),
    );
    let dest = visible_vertex_rect(q.quad);
    let Some(uv_to_dest) = rect_to_rect(visible_uv, dest) else {
        return q.paint.drawn();
    };
    let affine = if texture.y_flipped {
        q.affine * Affine::scale_non_uniform(1.0, -1.0)
    } else {
        q.affine
    };
    let quality = if texture.nearest_neighbor {
        FilterQuality::Nearest
    } else {
        FilterQuality::Bilinear
    };
    let spread = lock.wrap_mode().spread_mode();

    if texture.background_color.alpha() == 0 {
        let paint = q.paint.pattern(lock.pixmap(), spread, quality, q.paint.alpha, uv_to_dest);
        canvas.fill_rect(dest, &paint, affine);
        return q.paint.drawn();
    }

    // The bitmap composites over its background first; the pair then
    // composites into the target as one layer.
    let Some(mut layer) = new_pixmap(canvas.bounds().size()) else {
        return DrawOutcome::ResourceUnavailable;
    };
    let layer_paint = QuadPaint {
        blend_mode: tiny_skia::BlendMode::SourceOver,
        alpha: 1.0,
        ..q.paint
    };
    if let Some(rect) = sk_rect(dest) {
        let transform = sk_transform(affine);
        layer.fill_rect(
            rect,
            &layer_paint.solid(texture.background_color, 1.0),
            transform,
            None,
        );
        layer.fill_rect(
            rect,
            &layer_paint.pattern(lock.pixmap(), spread, quality, 1.0, uv_to_dest),
            transform,
            None,
        );
    }
    draw_device_layer(canvas, q, layer.as_ref(), dest, affine);
    q.paint.drawn()
}

fn draw_tile(
    ctx: &QuadContext<'_>,
    canvas: &mut Canvas<'_>,
    q: &QuadDraw<'_>,
    tile: &TileQuad,
) -> DrawOutcome {
    let lock = match lock_content(ctx, canvas, q) {
        Ok(lock) => lock,
        Err(outcome) => return outcome,
    };
    let visible_tex = map_rect_proportional(
        q.quad.rect.to_rect(),
        tile.tex_coord_rect,
        q.quad.visible_rect.to_rect(),
    );
    let dest = visible_vertex_rect(q.quad);
    let Some(tex_to_dest) = rect_to_rect(visible_tex, dest) else {
        return q.paint.drawn();
    };
    let quality = if tile.nearest_neighbor {
        FilterQuality::Nearest
    } else {
        FilterQuality::Bilinear
    };
    let paint = q.paint.pattern(
        lock.pixmap(),
        lock.wrap_mode().spread_mode(),
        quality,
        q.paint.alpha,
        tex_to_dest,
    );
    canvas.fill_rect(dest, &paint, q.affine);
    q.paint.drawn()
}

fn draw_render_pass(
    ctx: &QuadContext<'_>,
    canvas: &mut Canvas<'_>,
    q: &QuadDraw<'_>,
    pass_quad: &RenderPassQuad,
) -> DrawOutcome {
    let Some(content) = ctx.pass_textures.get(&pass_quad.render_pass_id) else {
        return DrawOutcome::ResourceUnavailable;
    };
    let filtered;
    let source = if pass_quad.filters.is_empty() {
        content.as_ref()
    } else {
        let Some(pixmap) =
            apply_filters(content.as_ref(), &pass_quad.filters, pass_quad.filters_scale)
        else {
            return DrawOutcome::ResourceUnavailable;
        };
        filtered = pixmap;
        filtered.as_ref()
    };

    let dest = visible_vertex_rect(q.quad);
    let content_rect = Rect::from_origin_size(Point::ZERO, q.quad.rect.size().to_size());
    let Some(content_to_dest) = rect_to_rect(content_rect, UNIT_QUAD) else {
        return q.paint.drawn();
    };

    if !pass_quad.background_filters.is_empty() {
        let output = ctx
            .frame
            .move_from_draw_to_window_space(ctx.frame.current_output_rect);
        draw_backdrop(canvas, q, pass_quad, output);
    }

    let paint = q.paint.pattern(
        source,
        SpreadMode::Pad,
        q.paint.quality,
        q.paint.alpha,
        content_to_dest,
    );
    let Some(mask_id) = q.quad.mask_resource_id() else {
        canvas.fill_rect(dest, &paint, q.affine);
        return q.paint.drawn();
    };

    let Ok(mask) = ctx.resources.lock_for_read(mask_id) else {
        return DrawOutcome::ResourceUnavailable;
    };
    let mask_uv = pass_quad.mask_uv_rect(q.quad.rect);
    let mask_size = pass_quad.mask_texture_size.to_size();
    let mask_rect = Rect::new(
        mask_uv.x0 * mask_size.width,
        mask_uv.y0 * mask_size.height,
        mask_uv.x1 * mask_size.width,
        mask_uv.y1 * mask_size.height,
    );
    let Some(mask_to_dest) = rect_to_rect(mask_rect, UNIT_QUAD) else {
        return DrawOutcome::ResourceUnavailable;
    };
    let mask_paint = q.paint.pattern(
        mask.pixmap(),
        mask.wrap_mode().spread_mode(),
        FilterQuality::Bilinear,
        1.0,
        mask_to_dest,
    );
    let Some(coverage) = canvas.coverage(dest, &mask_paint, q.affine) else {
        return DrawOutcome::ResourceUnavailable;
    };
    canvas.fill_rect_with_mask(dest, &paint, q.affine, &coverage);
    q.paint.drawn()
}

/// Replaces the pixels behind a pass quad with a filtered copy of
/// themselves. `output` is the pass output in window space.
fn draw_backdrop(
    canvas: &mut Canvas<'_>,
    q: &QuadDraw<'_>,
    pass_quad: &RenderPassQuad,
    output: IntRect,
) {
    let quad_bounds = IntRect::enclosing(q.device.map_rect(UNIT_QUAD));
    let backdrop = pass_quad
        .background_filters
        .outsets()
        .expand(quad_bounds)
        .intersection(output)
        .intersection(canvas.bounds());
    if backdrop.is_empty() || q.affine.determinant() == 0.0 {
        return;
    }
    let Some(source) = canvas.read_pixels(backdrop) else {
        return;
    };
    let Some(filtered) = apply_filters(
        source.as_ref(),
        &pass_quad.background_filters,
        Vec2::new(1.0, 1.0),
    ) else {
        return;
    };
    let backdrop_to_quad = q.affine.inverse()
        * Affine::translate((f64::from(backdrop.x), f64::from(backdrop.y)));
    let mut paint = q.paint.pattern(
        filtered.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Nearest,
        1.0,
        backdrop_to_quad,
    );
    paint.blend_mode = tiny_skia::BlendMode::Source;
    canvas.fill_rect(visible_vertex_rect(q.quad), &paint, q.affine);
}

/// Composites a canvas-sized layer into the quad's area with the quad's
/// blend mode and opacity.
fn draw_device_layer(
    canvas: &mut Canvas<'_>,
    q: &QuadDraw<'_>,
    layer: PixmapRef<'_>,
    dest: Rect,
    affine: Affine,
) {
    if affine.determinant() == 0.0 {
        return;
    }
    let paint = q.paint.pattern(
        layer,
        SpreadMode::Pad,
        FilterQuality::Nearest,
        q.paint.alpha,
        affine.inverse(),
    );
    canvas.fill_rect(dest, &paint, affine);
}

/// Materials the software path cannot sample are drawn as a flat
/// placeholder.
fn draw_unsupported(canvas: &mut Canvas<'_>, q: &QuadDraw<'_>) -> DrawOutcome {
    let color = if cfg!(debug_assertions) {
        Color::MAGENTA
    } else {
        Color::WHITE
    };
    canvas.fill_rect(
        visible_vertex_rect(q.quad),
        &q.paint.solid(color, q.sqs.opacity),
        q.affine,
    );
    DrawOutcome::Unsupported
}
