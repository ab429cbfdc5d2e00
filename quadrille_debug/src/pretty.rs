// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds.

use std::io::Write;

use quadrille_core::geometry::IntRect;
use quadrille_core::id::RenderPassId;
use quadrille_core::trace::{
    CopyOutputEvent, DamageRect, DisplayListCommitEvent, FrameBeginEvent, FrameSummary,
    OverlayEvent, PassBeginEvent, PassEndEvent, QuadEvent, SwapEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

struct R(IntRect);

impl std::fmt::Display for R {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{} {}x{}", self.0.x, self.0.y, self.0.width, self.0.height)
    }
}

struct P(RenderPassId);

impl std::fmt::Display for P {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0.layer_id, self.0.index)
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} passes={} viewport={} damage={} at {:.1}µs",
            e.frame_index,
            e.pass_count,
            R(e.device_viewport),
            R(e.root_damage),
            us(e.timestamp),
        );
    }

    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] frame={} pass={} output={} quads={} init={} at {:.1}µs",
            e.frame_index,
            P(e.pass_id),
            R(e.output_rect),
            e.quad_count,
            e.initialization.name(),
            us(e.timestamp),
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] frame={} pass={} drawn={} skipped={} at {:.1}µs",
            e.frame_index,
            P(e.pass_id),
            e.quads_drawn,
            e.quads_skipped,
            us(e.timestamp),
        );
    }

    fn on_overlay(&mut self, e: &OverlayEvent) {
        let _ = writeln!(
            self.writer,
            "[overlay] frame={} promoted={}",
            e.frame_index, e.promoted,
        );
    }

    fn on_copy_output(&mut self, e: &CopyOutputEvent) {
        let area = if e.area.is_empty() {
            "empty".to_owned()
        } else {
            R(e.area).to_string()
        };
        let _ = writeln!(
            self.writer,
            "[copy] frame={} pass={} area={area}",
            e.frame_index,
            P(e.pass_id),
        );
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        let _ = writeln!(
            self.writer,
            "[swap] frame={} damage={} at {:.1}µs",
            e.frame_index,
            R(e.damage),
            us(e.timestamp),
        );
    }

    fn on_display_list_commit(&mut self, e: &DisplayListCommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] commit={} new={} reused={} total={}",
            e.commit_index, e.new_items, e.cached_items_reused, e.total_items,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} passes={} drawn={} skipped={} overlays={} copies={} \
             pass={:.1}µs total={:.1}µs",
            s.frame_index,
            s.pass_count,
            s.quads_drawn,
            s.quads_skipped,
            s.overlays,
            s.copy_requests,
            us(s.pass_nanos),
            us(s.total_nanos),
        );
    }

    fn on_quad(&mut self, e: &QuadEvent) {
        let _ = writeln!(
            self.writer,
            "[quad] frame={} pass={} index={} material={} outcome={:?}",
            e.frame_index,
            P(e.pass_id),
            e.quad_index,
            e.material.name(),
            e.outcome,
        );
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} rects={}",
            rects.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadrille_core::quad::Material;
    use quadrille_core::trace::{QuadOutcome, SurfaceInitializationMode};

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_pass_lines() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_pass_begin(&PassBeginEvent {
            frame_index: 3,
            pass_id: RenderPassId::new(7, 1),
            output_rect: IntRect::new(0, 0, 64, 32),
            quad_count: 2,
            initialization: SurfaceInitializationMode::ScissoredClear,
            timestamp: 1_500,
        });
        sink.on_pass_end(&PassEndEvent {
            frame_index: 3,
            pass_id: RenderPassId::new(7, 1),
            quads_drawn: 1,
            quads_skipped: 1,
            timestamp: 2_000,
        });
        let out = output(sink);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2, "got: {out}");
        assert_eq!(
            lines[0],
            "[pass:begin] frame=3 pass=7.1 output=0,0 64x32 quads=2 init=scissored-clear at 1.5µs"
        );
        assert_eq!(
            lines[1],
            "[pass:end] frame=3 pass=7.1 drawn=1 skipped=1 at 2.0µs"
        );
    }

    #[test]
    fn empty_copy_area_is_named() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_copy_output(&CopyOutputEvent {
            frame_index: 0,
            pass_id: RenderPassId::new(1, 0),
            area: IntRect::default(),
        });
        let out = output(sink);
        assert!(out.contains("area=empty"), "got: {out}");
    }

    #[test]
    fn quad_line_uses_material_name() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_quad(&QuadEvent {
            frame_index: 1,
            pass_id: RenderPassId::new(1, 0),
            quad_index: 4,
            material: Material::DebugBorder,
            outcome: QuadOutcome::ClippedOut,
        });
        sink.on_display_list_commit(&DisplayListCommitEvent {
            commit_index: 2,
            new_items: 5,
            cached_items_reused: 3,
            total_items: 8,
        });
        let out = output(sink);
        assert!(
            out.contains("material=debug-border outcome=ClippedOut"),
            "got: {out}"
        );
        assert!(out.contains("[commit] commit=2 new=5 reused=3 total=8"), "got: {out}");
    }
}
