// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame driver.
//!
//! [`SoftwareRenderer::draw_frame`] walks a [`RenderPassList`] in order,
//! drawing each non-root pass into a cached bitmap and the root pass into
//! the [`SoftwareOutputDevice`]. Pass quads sample the bitmaps of the
//! passes they name, so children must precede their parents in the list.

use std::collections::BTreeMap;
use std::fmt;

use quadrille_core::geometry::{IntRect, IntSize};
use quadrille_core::id::RenderPassId;
use quadrille_core::overlay::{OverlayCandidateList, OverlayCandidateValidator, OverlayProcessor};
use quadrille_core::render_pass::{CopyOutputResult, RenderPass, RenderPassList};
use quadrille_core::trace::{
    CopyOutputEvent, FrameBeginEvent, FrameSummary, FrameSummaryBuilder, OverlayEvent,
    PassBeginEvent, PassEndEvent, SurfaceInitializationMode, SwapEvent, Tracer,
};
use quadrille_core::transform::Transform3d;
use tiny_skia::{Pixmap, PixmapRef};

use crate::draw::{Canvas, DrawOutcome, QuadContext, do_draw_quad};
use crate::output_device::{SoftwareOutputDevice, SwapResult};
use crate::resource_provider::{SoftwareResourceProvider, new_pixmap, pixmap_size};
use crate::settings::RendererSettings;

// ---------------------------------------------------------------------------
// DrawingFrame
// ---------------------------------------------------------------------------

/// Per-frame drawing state.
///
/// "Draw space" is the space of the pass being drawn; "window space" is
/// pixels of its target bitmap. The two differ by the offset between the
/// pass output rect and its viewport.
#[derive(Clone, Debug, Default)]
pub struct DrawingFrame {
    /// Index of the frame among those drawn by the renderer.
    pub frame_index: u64,
    /// Part of the root pass redrawn this frame, in root draw space.
    pub root_damage_rect: IntRect,
    /// Output rect of the root pass.
    pub root_output_rect: IntRect,
    /// Where the root pass lands on the output surface.
    pub device_viewport_rect: IntRect,
    /// Part of the output surface that may be touched.
    pub device_clip_rect: IntRect,
    /// Position of the root pass in the pass list.
    pub root_render_pass: usize,
    /// Position of the pass being drawn.
    pub current_render_pass: usize,
    /// Output rect of the pass being drawn, in draw space.
    pub current_output_rect: IntRect,
    /// Where that output lands in its target, in window space.
    pub current_viewport_rect: IntRect,
    /// Maps draw space to normalized device coordinates.
    pub projection_matrix: Transform3d,
    /// Maps normalized device coordinates to window space.
    pub window_matrix: Transform3d,
    /// Hardware planes this frame: the main plane first, then promoted quads.
    pub overlay_list: OverlayCandidateList,
}

impl DrawingFrame {
    /// Whether the pass being drawn is the root pass.
    #[must_use]
    pub fn is_drawing_root_pass(&self) -> bool {
        self.current_render_pass == self.root_render_pass
    }

    /// Converts a rect of the current pass to target pixels.
    #[must_use]
    pub fn move_from_draw_to_window_space(&self, rect: IntRect) -> IntRect {
        rect.offset(
            self.current_viewport_rect.x - self.current_output_rect.x,
            self.current_viewport_rect.y - self.current_output_rect.y,
        )
    }

    /// Converts target pixels to a rect of the current pass.
    #[must_use]
    pub fn move_from_window_to_draw_space(&self, rect: IntRect) -> IntRect {
        rect.offset(
            self.current_output_rect.x - self.current_viewport_rect.x,
            self.current_output_rect.y - self.current_viewport_rect.y,
        )
    }

    fn initialize_viewport(&mut self, draw_rect: IntRect, viewport_rect: IntRect) {
        self.current_output_rect = draw_rect;
        self.current_viewport_rect = viewport_rect;
        self.projection_matrix = Transform3d::orthographic(
            f64::from(draw_rect.x),
            f64::from(draw_rect.right()),
            f64::from(draw_rect.y),
            f64::from(draw_rect.bottom()),
        );
        // NDC [-1, 1] onto the viewport.
        self.window_matrix = Transform3d::from_translation(
            f64::from(viewport_rect.x),
            f64::from(viewport_rect.y),
            0.0,
        )
        .pre_scale(
            f64::from(viewport_rect.width),
            f64::from(viewport_rect.height),
        )
        .pre_translate(0.5, 0.5)
        .pre_scale(0.5, 0.5);
    }

    /// Limits drawing of the current pass to what the root damage can see.
    fn compute_scissor_rect_for_render_pass(
        &self,
        pass: &RenderPass,
        has_copy_requests: bool,
    ) -> IntRect {
        let scissor = pass.output_rect;
        if self.root_damage_rect == self.root_output_rect || has_copy_requests {
            return scissor;
        }
        match pass.transform_to_root_target.inverse() {
            Some(inverse) => scissor.intersection(IntRect::enclosing(
                inverse.map_rect(self.root_damage_rect.to_rect()),
            )),
            None => scissor,
        }
    }
}

// ---------------------------------------------------------------------------
// SoftwareRenderer
// ---------------------------------------------------------------------------

/// Draws render passes with tiny-skia.
pub struct SoftwareRenderer {
    settings: RendererSettings,
    output: SoftwareOutputDevice,
    overlay_processor: OverlayProcessor,
    pass_textures: BTreeMap<RenderPassId, Pixmap>,
    last_frame: Option<DrawingFrame>,
    frame_count: u64,
}

impl fmt::Debug for SoftwareRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareRenderer")
            .field("settings", &self.settings)
            .field("output", &self.output)
            .field("overlay_processor", &self.overlay_processor)
            .field("pass_textures", &self.pass_textures.keys())
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

impl SoftwareRenderer {
    /// Creates a renderer drawing into `output`, without overlay support.
    #[must_use]
    pub fn new(settings: RendererSettings, output: SoftwareOutputDevice) -> Self {
        Self {
            settings,
            output,
            overlay_processor: OverlayProcessor::new(None),
            pass_textures: BTreeMap::new(),
            last_frame: None,
            frame_count: 0,
        }
    }

    /// The renderer configuration.
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Installs the platform's overlay validator; `None` disables overlays
    /// even when the settings enable them.
    pub fn set_overlay_validator(&mut self, validator: Option<Box<dyn OverlayCandidateValidator>>) {
        self.overlay_processor = OverlayProcessor::new(validator);
    }

    /// The root surface.
    #[must_use]
    pub fn output_device(&self) -> &SoftwareOutputDevice {
        &self.output
    }

    /// The root surface, for resizing.
    pub fn output_device_mut(&mut self) -> &mut SoftwareOutputDevice {
        &mut self.output
    }

    /// State of the most recent frame, kept for inspection.
    #[must_use]
    pub fn last_frame(&self) -> Option<&DrawingFrame> {
        self.last_frame.as_ref()
    }

    /// Whether a bitmap is cached for pass `id`.
    #[must_use]
    pub fn has_render_pass_texture(&self, id: RenderPassId) -> bool {
        self.pass_textures.contains_key(&id)
    }

    /// The cached bitmap of pass `id`.
    #[must_use]
    pub fn render_pass_texture(&self, id: RenderPassId) -> Option<PixmapRef<'_>> {
        self.pass_textures.get(&id).map(Pixmap::as_ref)
    }

    /// Drops every cached pass bitmap.
    pub fn release_render_pass_textures(&mut self) {
        self.pass_textures.clear();
    }

    /// Draws `passes`, root last, and empties the list.
    ///
    /// Every copy request in the list is answered, with pixels when its pass
    /// was drawn. `device_viewport_rect` places the root pass on the output
    /// surface and `device_clip_rect` bounds what may be touched.
    pub fn draw_frame(
        &mut self,
        passes: &mut RenderPassList,
        resources: &SoftwareResourceProvider,
        device_viewport_rect: IntRect,
        device_clip_rect: IntRect,
        tracer: &mut Tracer<'_>,
    ) -> FrameSummary {
        let frame_index = self.frame_count;
        self.frame_count += 1;

        let root_output_rect = passes.last().map_or(IntRect::default(), |root| root.output_rect);
        let root_damage_rect = match passes.last() {
            Some(root) if self.settings.partial_swap_enabled => {
                root.damage_rect.intersection(root.output_rect)
            }
            _ => root_output_rect,
        };

        let begin = FrameBeginEvent {
            frame_index,
            timestamp: self.settings.now(),
            pass_count: u32::try_from(passes.len()).unwrap_or(u32::MAX),
            device_viewport: device_viewport_rect,
            root_damage: root_damage_rect,
        };
        tracer.frame_begin(&begin);
        let mut summary = FrameSummaryBuilder::new(&begin);

        let mut frame = DrawingFrame {
            frame_index,
            root_damage_rect,
            root_output_rect,
            device_viewport_rect,
            device_clip_rect,
            root_render_pass: passes.len().saturating_sub(1),
            ..DrawingFrame::default()
        };

        if !passes.is_empty() {
            if self.settings.enable_overlays {
                self.overlay_processor
                    .process_for_overlays(passes, &mut frame.overlay_list);
                let promoted = frame
                    .overlay_list
                    .iter()
                    .filter(|candidate| !candidate.use_output_surface_for_resource)
                    .count();
                let event = OverlayEvent {
                    frame_index,
                    promoted: u32::try_from(promoted).unwrap_or(u32::MAX),
                };
                tracer.overlay(&event);
                summary.overlay(&event);
            }
            self.decide_render_pass_allocations_for_frame(passes);
            self.begin_drawing_frame(&frame, tracer);
            for index in 0..passes.len() {
                self.draw_render_pass(&mut frame, passes, index, resources, tracer, &mut summary);
            }
            self.finish_drawing_frame(passes);
        }

        let summary = summary.finish(self.settings.now());
        tracer.frame_summary(&summary);
        self.last_frame = Some(frame);
        summary
    }

    /// Presents the output surface.
    pub fn swap_buffers(&mut self, tracer: &mut Tracer<'_>) -> SwapResult {
        let result = self.output.swap_buffers();
        tracer.swap(&SwapEvent {
            frame_index: result.frame_index,
            damage: result.damage.bounds(self.output.bounds()),
            timestamp: self.settings.now(),
        });
        result
    }

    /// Releases cached bitmaps whose pass left the frame or changed size.
    fn decide_render_pass_allocations_for_frame(&mut self, passes: &[RenderPass]) {
        let Some((_, children)) = passes.split_last() else {
            return;
        };
        let wanted: BTreeMap<RenderPassId, IntSize> = children
            .iter()
            .map(|pass| (pass.id, pass.output_rect.size()))
            .collect();
        self.pass_textures
            .retain(|id, texture| wanted.get(id) == Some(&pixmap_size(texture.as_ref())));
    }

    fn begin_drawing_frame(&mut self, frame: &DrawingFrame, tracer: &mut Tracer<'_>) {
        let damage = frame.root_damage_rect.offset(
            frame.device_viewport_rect.x - frame.root_output_rect.x,
            frame.device_viewport_rect.y - frame.root_output_rect.y,
        );
        self.output.begin_paint(damage);
        #[cfg(feature = "trace-rich")]
        tracer.damage_rects(
            frame.frame_index,
            &[quadrille_core::trace::DamageRect::from(damage)],
        );
        #[cfg(not(feature = "trace-rich"))]
        let _ = tracer;
    }

    /// Ends painting on the output surface. Drawn passes are consumed.
    fn finish_drawing_frame(&mut self, passes: &mut RenderPassList) {
        self.output.end_paint();
        passes.clear();
    }

    fn draw_render_pass(
        &mut self,
        frame: &mut DrawingFrame,
        passes: &mut [RenderPass],
        index: usize,
        resources: &SoftwareResourceProvider,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
    ) {
        let is_root = index == frame.root_render_pass;
        let copy_requests = core::mem::take(&mut passes[index].copy_requests);
        let pass = &passes[index];
        let frame_index = frame.frame_index;

        let Self {
            settings,
            output,
            pass_textures,
            ..
        } = self;

        let mut texture = match use_render_pass(frame, pass, index, pass_textures) {
            PassTarget::Output => None,
            PassTarget::Texture(pixmap) => Some(pixmap),
            PassTarget::Unavailable => {
                for request in copy_requests {
                    request.send_empty_result();
                    report_copy(tracer, summary, frame_index, pass.id, IntRect::default());
                }
                return;
            }
        };
        let target = match texture.as_mut() {
            Some(pixmap) => pixmap,
            None => output.pixmap_mut(),
        };
        let mut canvas = Canvas::new(target);

        let surface = if is_root {
            frame.move_from_window_to_draw_space(canvas.bounds())
        } else {
            pass.output_rect
        };
        let mut scissor = surface;
        if is_root {
            scissor.intersect(frame.move_from_window_to_draw_space(frame.device_viewport_rect));
        }
        if settings.partial_swap_enabled {
            scissor.intersect(
                frame.compute_scissor_rect_for_render_pass(pass, !copy_requests.is_empty()),
            );
        }
        if is_root && frame.device_clip_rect != frame.device_viewport_rect {
            scissor.intersect(frame.move_from_window_to_draw_space(frame.device_clip_rect));
        }
        let pass_is_clipped = !scissor.contains(surface);

        let should_clear = !is_root || settings.should_clear_root_render_pass;
        let initialization = match (should_clear, pass_is_clipped) {
            (true, true) => SurfaceInitializationMode::ScissoredClear,
            (true, false) => SurfaceInitializationMode::FullSurfaceClear,
            (false, _) => SurfaceInitializationMode::Preserve,
        };

        let begin = PassBeginEvent {
            frame_index,
            pass_id: pass.id,
            output_rect: pass.output_rect,
            quad_count: u32::try_from(pass.quad_list.len()).unwrap_or(u32::MAX),
            initialization,
            timestamp: settings.now(),
        };
        tracer.pass_begin(&begin);
        summary.pass_begin(&begin);

        let frame: &DrawingFrame = frame;
        prepare_surface_for_pass(&mut canvas, frame, pass, settings, initialization, scissor);

        let ctx = QuadContext {
            frame,
            resources,
            pass_textures,
            settings,
        };
        let mut quads_drawn = 0_u32;
        let mut quads_skipped = 0_u32;
        for (quad_index, quad) in pass.quad_list.iter().enumerate() {
            let sqs = pass.state_for(quad);
            let quad_scissor = match (pass_is_clipped, sqs.is_clipped) {
                (true, true) => Some(scissor.intersection(sqs.clip_rect)),
                (true, false) => Some(scissor),
                (false, true) => Some(sqs.clip_rect),
                (false, false) => None,
            };
            let outcome = match quad_scissor {
                Some(rect) if rect.is_empty() => DrawOutcome::ClippedOut,
                Some(rect) => {
                    canvas.set_scissor_test_rect(frame.move_from_draw_to_window_space(rect));
                    do_draw_quad(&ctx, &mut canvas, sqs, quad)
                }
                None => {
                    canvas.ensure_scissor_test_disabled();
                    do_draw_quad(&ctx, &mut canvas, sqs, quad)
                }
            };
            if outcome.produced_pixels() {
                quads_drawn += 1;
            } else {
                quads_skipped += 1;
            }
            #[cfg(feature = "trace-rich")]
            tracer.quad(&quadrille_core::trace::QuadEvent {
                frame_index,
                pass_id: pass.id,
                quad_index: u32::try_from(quad_index).unwrap_or(u32::MAX),
                material: quad.material(),
                outcome: outcome.to_trace(),
            });
            #[cfg(not(feature = "trace-rich"))]
            let _ = quad_index;
        }

        for request in copy_requests {
            let mut copy_rect = pass.output_rect;
            if let Some(area) = request.area() {
                copy_rect.intersect(area);
            }
            let window_rect = frame
                .move_from_draw_to_window_space(copy_rect)
                .intersection(canvas.bounds());
            match canvas.read_pixels(window_rect) {
                Some(pixels) => request.send_result(CopyOutputResult::Bitmap {
                    size: window_rect.size(),
                    rgba_premul: pixels.take(),
                }),
                None => request.send_empty_result(),
            }
            report_copy(tracer, summary, frame_index, pass.id, window_rect);
        }

        let end = PassEndEvent {
            frame_index,
            pass_id: pass.id,
            quads_drawn,
            quads_skipped,
            timestamp: settings.now(),
        };
        tracer.pass_end(&end);
        summary.pass_end(&end);

        if let Some(texture) = texture {
            pass_textures.insert(pass.id, texture);
        }
    }
}

/// Where a pass draws this frame.
enum PassTarget {
    /// The root pass draws straight to the output surface.
    Output,
    Texture(Pixmap),
    /// Empty or oversized passes have nothing to draw into.
    Unavailable,
}

/// Makes pass `index` current: maps its output rect onto the viewport and
/// binds its cached bitmap, allocating one when none fits.
fn use_render_pass(
    frame: &mut DrawingFrame,
    pass: &RenderPass,
    index: usize,
    pass_textures: &mut BTreeMap<RenderPassId, Pixmap>,
) -> PassTarget {
    let is_root = index == frame.root_render_pass;
    frame.current_render_pass = index;
    let viewport = if is_root {
        frame.device_viewport_rect
    } else {
        IntRect::from_size(pass.output_rect.size())
    };
    frame.initialize_viewport(pass.output_rect, viewport);

    if is_root {
        return PassTarget::Output;
    }
    match pass_textures
        .remove(&pass.id)
        .or_else(|| new_pixmap(pass.output_rect.size()))
    {
        Some(pixmap) => PassTarget::Texture(pixmap),
        None => PassTarget::Unavailable,
    }
}

/// Sets the scissor for `mode` and clears what the mode asks for.
/// `scissor` is in draw space.
fn prepare_surface_for_pass(
    canvas: &mut Canvas<'_>,
    frame: &DrawingFrame,
    pass: &RenderPass,
    settings: &RendererSettings,
    mode: SurfaceInitializationMode,
    scissor: IntRect,
) {
    match mode {
        SurfaceInitializationMode::Preserve => canvas.ensure_scissor_test_disabled(),
        SurfaceInitializationMode::FullSurfaceClear => {
            canvas.ensure_scissor_test_disabled();
            clear_framebuffer(canvas, pass, settings);
        }
        SurfaceInitializationMode::ScissoredClear => {
            canvas.set_scissor_test_rect(frame.move_from_draw_to_window_space(scissor));
            clear_framebuffer(canvas, pass, settings);
        }
    }
}

/// Transparent passes clear to transparent. Opaque passes are covered by
/// their quads; debug builds paint them with the debug color so gaps show.
fn clear_framebuffer(canvas: &mut Canvas<'_>, pass: &RenderPass, settings: &RendererSettings) {
    if pass.has_transparent_background {
        canvas.clear(quadrille_core::color::Color::TRANSPARENT);
    } else if cfg!(debug_assertions) {
        canvas.clear(settings.debug_clear_color);
    }
}

fn report_copy(
    tracer: &mut Tracer<'_>,
    summary: &mut FrameSummaryBuilder,
    frame_index: u64,
    pass_id: RenderPassId,
    area: IntRect,
) {
    tracer.copy_output(&CopyOutputEvent {
        frame_index,
        pass_id,
        area,
    });
    summary.copy_output();
}
