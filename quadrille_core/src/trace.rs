// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for drawing and paint recording.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! renderer and display-list instrumentation call at each stage. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects pass timings and counters during a frame
//! and produces a [`FrameSummary`] at the end.
//!
//! Timestamps are nanoseconds from a caller-chosen origin. The core never
//! reads a clock itself.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`QuadEvent`] and [`DamageRect`]
//!   events plus the corresponding `TraceSink` methods.

use crate::geometry::IntRect;
use crate::id::RenderPassId;
#[cfg(feature = "trace-rich")]
use crate::quad::Material;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How a pass's target is prepared before its quads are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SurfaceInitializationMode {
    /// Keep the existing contents.
    #[default]
    Preserve,
    /// Clear the whole target, ignoring the scissor.
    FullSurfaceClear,
    /// Clear only the scissored region.
    ScissoredClear,
}

impl SurfaceInitializationMode {
    /// Short name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::FullSurfaceClear => "full-clear",
            Self::ScissoredClear => "scissored-clear",
        }
    }
}

/// What happened to one quad during drawing.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuadOutcome {
    /// Drawn without anti-aliasing.
    Drawn,
    /// Drawn with anti-aliased edges.
    DrawnAntiAliased,
    /// Skipped because its clip missed the pass scissor.
    ClippedOut,
    /// Skipped because a cited resource could not be locked.
    ResourceUnavailable,
    /// Drawn as a placeholder; the renderer does not support the material.
    Unsupported,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the renderer begins drawing a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Time the frame began.
    pub timestamp: u64,
    /// Number of passes in the frame.
    pub pass_count: u32,
    /// Device viewport.
    pub device_viewport: IntRect,
    /// Damage of the root pass.
    pub root_damage: IntRect,
}

/// Emitted before a pass's quads are drawn.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The pass being drawn.
    pub pass_id: RenderPassId,
    /// Pass output bounds.
    pub output_rect: IntRect,
    /// Number of quads in the pass.
    pub quad_count: u32,
    /// How the target was prepared.
    pub initialization: SurfaceInitializationMode,
    /// Time drawing of the pass began.
    pub timestamp: u64,
}

/// Emitted after a pass's quads are drawn.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The pass that was drawn.
    pub pass_id: RenderPassId,
    /// Quads that produced pixels.
    pub quads_drawn: u32,
    /// Quads that were skipped.
    pub quads_skipped: u32,
    /// Time drawing of the pass ended.
    pub timestamp: u64,
}

/// Emitted after overlay processing of a frame.
#[derive(Clone, Copy, Debug)]
pub struct OverlayEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Number of candidates the hardware accepted.
    pub promoted: u32,
}

/// Emitted when a copy-output request is answered.
#[derive(Clone, Copy, Debug)]
pub struct CopyOutputEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Pass whose pixels were copied.
    pub pass_id: RenderPassId,
    /// Region that was copied; empty for an empty result.
    pub area: IntRect,
}

/// Emitted when the output device presents a frame.
#[derive(Clone, Copy, Debug)]
pub struct SwapEvent {
    /// Frame counter of the output device.
    pub frame_index: u64,
    /// Region reported as changed.
    pub damage: IntRect,
    /// Time of the swap.
    pub timestamp: u64,
}

/// Emitted when a display list commits its new items.
#[derive(Clone, Copy, Debug)]
pub struct DisplayListCommitEvent {
    /// Commit counter of the list.
    pub commit_index: u64,
    /// Items recorded during the paint.
    pub new_items: u32,
    /// Items copied forward from the previous commit.
    pub cached_items_reused: u32,
    /// Items in the list after the commit.
    pub total_items: u32,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Passes drawn.
    pub pass_count: u32,
    /// Quads that produced pixels, across all passes.
    pub quads_drawn: u32,
    /// Quads skipped, across all passes.
    pub quads_skipped: u32,
    /// Candidates promoted to overlays.
    pub overlays: u32,
    /// Copy-output requests answered.
    pub copy_requests: u32,
    /// Time spent inside passes, in nanoseconds.
    pub pass_nanos: u64,
    /// Time from frame begin to finish, in nanoseconds.
    pub total_nanos: u64,
}

/// Outcome of one quad (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct QuadEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Pass containing the quad.
    pub pass_id: RenderPassId,
    /// Position of the quad in the pass's quad list.
    pub quad_index: u32,
    /// Material of the quad.
    pub material: Material,
    /// What the renderer did with it.
    pub outcome: QuadOutcome,
}

/// An axis-aligned damage rectangle.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

#[cfg(feature = "trace-rich")]
impl From<IntRect> for DamageRect {
    fn from(rect: IntRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width.unsigned_abs(),
            height: rect.height.unsigned_abs(),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from drawing and paint recording.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when the renderer begins a frame.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called before a pass is drawn.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called after a pass is drawn.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called after overlay processing.
    fn on_overlay(&mut self, e: &OverlayEvent) {
        _ = e;
    }

    /// Called when a copy-output request is answered.
    fn on_copy_output(&mut self, e: &CopyOutputEvent) {
        _ = e;
    }

    /// Called when a frame is presented.
    fn on_swap(&mut self, e: &SwapEvent) {
        _ = e;
    }

    /// Called when a display list commits.
    fn on_display_list_commit(&mut self, e: &DisplayListCommitEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called for every quad the renderer visits (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_quad(&mut self, e: &QuadEvent) {
        _ = e;
    }

    /// Called with per-frame damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`OverlayEvent`].
    #[inline]
    pub fn overlay(&mut self, e: &OverlayEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_overlay(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CopyOutputEvent`].
    #[inline]
    pub fn copy_output(&mut self, e: &CopyOutputEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_copy_output(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SwapEvent`].
    #[inline]
    pub fn swap(&mut self, e: &SwapEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_swap(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DisplayListCommitEvent`].
    #[inline]
    pub fn display_list_commit(&mut self, e: &DisplayListCommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_display_list_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`QuadEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn quad(&mut self, e: &QuadEvent) {
        if let Some(s) = &mut self.sink {
            s.on_quad(e);
        }
    }

    /// Emits damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects pass timings and counters during a frame and produces a
/// [`FrameSummary`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    begin: u64,
    pass_count: u32,
    pass_start: Option<u64>,
    pass_nanos: u64,
    quads_drawn: u32,
    quads_skipped: u32,
    overlays: u32,
    copy_requests: u32,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the frame `e` begins.
    #[must_use]
    pub fn new(e: &FrameBeginEvent) -> Self {
        Self {
            frame_index: e.frame_index,
            begin: e.timestamp,
            pass_count: 0,
            pass_start: None,
            pass_nanos: 0,
            quads_drawn: 0,
            quads_skipped: 0,
            overlays: 0,
            copy_requests: 0,
        }
    }

    /// Records the start of a pass.
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        self.pass_start = Some(e.timestamp);
    }

    /// Records the end of a pass. An end without a matching begin still
    /// counts the pass but contributes no time.
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        self.pass_count += 1;
        self.quads_drawn += e.quads_drawn;
        self.quads_skipped += e.quads_skipped;
        if let Some(start) = self.pass_start.take() {
            self.pass_nanos += e.timestamp.saturating_sub(start);
        }
    }

    /// Records overlay promotion results.
    pub fn overlay(&mut self, e: &OverlayEvent) {
        self.overlays += e.promoted;
    }

    /// Records an answered copy-output request.
    pub fn copy_output(&mut self) {
        self.copy_requests += 1;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self, end: u64) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            pass_count: self.pass_count,
            quads_drawn: self.quads_drawn,
            quads_skipped: self.quads_skipped,
            overlays: self.overlays,
            copy_requests: self.copy_requests,
            pass_nanos: self.pass_nanos,
            total_nanos: end.saturating_sub(self.begin),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> FrameBeginEvent {
        FrameBeginEvent {
            frame_index: 42,
            timestamp: 1_000_000,
            pass_count: 2,
            device_viewport: IntRect::new(0, 0, 800, 600),
            root_damage: IntRect::new(0, 0, 100, 100),
        }
    }

    fn pass_begin(timestamp: u64) -> PassBeginEvent {
        PassBeginEvent {
            frame_index: 42,
            pass_id: RenderPassId::new(1, 1),
            output_rect: IntRect::new(0, 0, 800, 600),
            quad_count: 3,
            initialization: SurfaceInitializationMode::ScissoredClear,
            timestamp,
        }
    }

    fn pass_end(timestamp: u64, drawn: u32, skipped: u32) -> PassEndEvent {
        PassEndEvent {
            frame_index: 42,
            pass_id: RenderPassId::new(1, 1),
            quads_drawn: drawn,
            quads_skipped: skipped,
            timestamp,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&sample_begin());
        sink.on_pass_begin(&pass_begin(0));
        sink.on_display_list_commit(&DisplayListCommitEvent {
            commit_index: 1,
            new_items: 4,
            cached_items_reused: 2,
            total_items: 6,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_begin(&sample_begin());
        tracer.swap(&SwapEvent {
            frame_index: 1,
            damage: IntRect::default(),
            timestamp: 0,
        });
    }

    #[test]
    fn summary_builder_sums_passes() {
        let mut builder = FrameSummaryBuilder::new(&sample_begin());

        builder.pass_begin(&pass_begin(1_000_100));
        builder.pass_end(&pass_end(1_000_600, 3, 1));
        builder.pass_begin(&pass_begin(1_000_700));
        builder.pass_end(&pass_end(1_002_000, 5, 0));
        builder.overlay(&OverlayEvent {
            frame_index: 42,
            promoted: 1,
        });
        builder.copy_output();

        let summary = builder.finish(1_002_500);
        assert_eq!(summary.frame_index, 42);
        assert_eq!(summary.pass_count, 2);
        assert_eq!(summary.quads_drawn, 8);
        assert_eq!(summary.quads_skipped, 1);
        assert_eq!(summary.overlays, 1);
        assert_eq!(summary.copy_requests, 1);
        assert_eq!(summary.pass_nanos, 1800);
        assert_eq!(summary.total_nanos, 2500);
    }

    #[test]
    fn unmatched_pass_end_adds_no_time() {
        let mut builder = FrameSummaryBuilder::new(&sample_begin());
        builder.pass_end(&pass_end(2_000_000, 1, 0));
        let summary = builder.finish(999);
        assert_eq!(summary.pass_count, 1);
        assert_eq!(summary.pass_nanos, 0);
        // Clock going backwards saturates.
        assert_eq!(summary.total_nanos, 0);
    }

    #[test]
    fn initialization_mode_names() {
        assert_eq!(SurfaceInitializationMode::default().name(), "preserve");
        assert_eq!(
            SurfaceInitializationMode::ScissoredClear.name(),
            "scissored-clear"
        );
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            passes: Vec<RenderPassId>,
            commits: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_pass_end(&mut self, e: &PassEndEvent) {
                self.passes.push(e.pass_id);
            }
            fn on_display_list_commit(&mut self, e: &DisplayListCommitEvent) {
                self.commits.push(e.commit_index);
            }
        }

        let mut sink = RecordingSink {
            passes: Vec::new(),
            commits: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.pass_end(&pass_end(5, 1, 0));
        tracer.display_list_commit(&DisplayListCommitEvent {
            commit_index: 9,
            new_items: 0,
            cached_items_reused: 0,
            total_items: 0,
        });
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.passes, &[RenderPassId::new(1, 1)]);
        assert_eq!(sink.commits, &[9]);
    }

    #[cfg(feature = "trace-rich")]
    #[test]
    fn damage_rect_from_int_rect() {
        let rect = DamageRect::from(IntRect::new(-4, 2, 10, 20));
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (-4, 2, 10, 20));
    }
}
