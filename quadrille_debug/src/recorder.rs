// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records, each led by a one-byte tag.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`].
//!
//! [`on_damage_rects`](TraceSink::on_damage_rects) stores only the count.

use quadrille_core::geometry::IntRect;
use quadrille_core::id::RenderPassId;
use quadrille_core::quad::Material;
use quadrille_core::trace::{
    CopyOutputEvent, DamageRect, DisplayListCommitEvent, FrameBeginEvent, FrameSummary,
    OverlayEvent, PassBeginEvent, PassEndEvent, QuadEvent, QuadOutcome,
    SurfaceInitializationMode, SwapEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_PASS_BEGIN: u8 = 2;
const TAG_PASS_END: u8 = 3;
const TAG_OVERLAY: u8 = 4;
const TAG_COPY_OUTPUT: u8 = 5;
const TAG_SWAP: u8 = 6;
const TAG_DISPLAY_LIST_COMMIT: u8 = 7;
const TAG_FRAME_SUMMARY: u8 = 8;
const TAG_QUAD: u8 = 9;
const TAG_DAMAGE_RECTS_COUNT: u8 = 10;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_rect(&mut self, r: IntRect) {
        self.write_i32(r.x);
        self.write_i32(r.y);
        self.write_i32(r.width);
        self.write_i32(r.height);
    }

    fn write_pass_id(&mut self, id: RenderPassId) {
        self.write_i32(id.layer_id);
        self.write_u32(id.index);
    }

    fn write_initialization(&mut self, mode: SurfaceInitializationMode) {
        self.write_u8(match mode {
            SurfaceInitializationMode::Preserve => 0,
            SurfaceInitializationMode::FullSurfaceClear => 1,
            SurfaceInitializationMode::ScissoredClear => 2,
        });
    }

    fn write_outcome(&mut self, outcome: QuadOutcome) {
        self.write_u8(match outcome {
            QuadOutcome::Drawn => 0,
            QuadOutcome::DrawnAntiAliased => 1,
            QuadOutcome::ClippedOut => 2,
            QuadOutcome::ResourceUnavailable => 3,
            QuadOutcome::Unsupported => 4,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u64(e.timestamp);
        self.write_u32(e.pass_count);
        self.write_rect(e.device_viewport);
        self.write_rect(e.root_damage);
    }

    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.frame_index);
        self.write_pass_id(e.pass_id);
        self.write_rect(e.output_rect);
        self.write_u32(e.quad_count);
        self.write_initialization(e.initialization);
        self.write_u64(e.timestamp);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.write_u8(TAG_PASS_END);
        self.write_u64(e.frame_index);
        self.write_pass_id(e.pass_id);
        self.write_u32(e.quads_drawn);
        self.write_u32(e.quads_skipped);
        self.write_u64(e.timestamp);
    }

    fn on_overlay(&mut self, e: &OverlayEvent) {
        self.write_u8(TAG_OVERLAY);
        self.write_u64(e.frame_index);
        self.write_u32(e.promoted);
    }

    fn on_copy_output(&mut self, e: &CopyOutputEvent) {
        self.write_u8(TAG_COPY_OUTPUT);
        self.write_u64(e.frame_index);
        self.write_pass_id(e.pass_id);
        self.write_rect(e.area);
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        self.write_u8(TAG_SWAP);
        self.write_u64(e.frame_index);
        self.write_rect(e.damage);
        self.write_u64(e.timestamp);
    }

    fn on_display_list_commit(&mut self, e: &DisplayListCommitEvent) {
        self.write_u8(TAG_DISPLAY_LIST_COMMIT);
        self.write_u64(e.commit_index);
        self.write_u32(e.new_items);
        self.write_u32(e.cached_items_reused);
        self.write_u32(e.total_items);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.pass_count);
        self.write_u32(s.quads_drawn);
        self.write_u32(s.quads_skipped);
        self.write_u32(s.overlays);
        self.write_u32(s.copy_requests);
        self.write_u64(s.pass_nanos);
        self.write_u64(s.total_nanos);
    }

    fn on_quad(&mut self, e: &QuadEvent) {
        self.write_u8(TAG_QUAD);
        self.write_u64(e.frame_index);
        self.write_pass_id(e.pass_id);
        self.write_u32(e.quad_index);
        self.write_u8(e.material.code());
        self.write_outcome(e.outcome);
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.write_u8(TAG_DAMAGE_RECTS_COUNT);
        self.write_u64(frame_index);
        self.write_u32(u32::try_from(rects.len()).unwrap_or(u32::MAX));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// An [`OverlayEvent`].
    Overlay(OverlayEvent),
    /// A [`CopyOutputEvent`].
    CopyOutput(CopyOutputEvent),
    /// A [`SwapEvent`].
    Swap(SwapEvent),
    /// A [`DisplayListCommitEvent`].
    DisplayListCommit(DisplayListCommitEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// A [`QuadEvent`].
    Quad(QuadEvent),
    /// Damage-rect count for a frame.
    DamageRectsCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of damage rects.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_rect(&mut self) -> Option<IntRect> {
        Some(IntRect::new(
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
        ))
    }

    fn read_pass_id(&mut self) -> Option<RenderPassId> {
        Some(RenderPassId::new(self.read_i32()?, self.read_u32()?))
    }

    fn read_initialization(&mut self) -> Option<SurfaceInitializationMode> {
        Some(match self.read_u8()? {
            0 => SurfaceInitializationMode::Preserve,
            1 => SurfaceInitializationMode::FullSurfaceClear,
            _ => SurfaceInitializationMode::ScissoredClear,
        })
    }

    fn read_outcome(&mut self) -> Option<QuadOutcome> {
        Some(match self.read_u8()? {
            0 => QuadOutcome::Drawn,
            1 => QuadOutcome::DrawnAntiAliased,
            2 => QuadOutcome::ClippedOut,
            3 => QuadOutcome::ResourceUnavailable,
            _ => QuadOutcome::Unsupported,
        })
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            timestamp: self.read_u64()?,
            pass_count: self.read_u32()?,
            device_viewport: self.read_rect()?,
            root_damage: self.read_rect()?,
        }))
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            frame_index: self.read_u64()?,
            pass_id: self.read_pass_id()?,
            output_rect: self.read_rect()?,
            quad_count: self.read_u32()?,
            initialization: self.read_initialization()?,
            timestamp: self.read_u64()?,
        }))
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd(PassEndEvent {
            frame_index: self.read_u64()?,
            pass_id: self.read_pass_id()?,
            quads_drawn: self.read_u32()?,
            quads_skipped: self.read_u32()?,
            timestamp: self.read_u64()?,
        }))
    }

    fn decode_overlay(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Overlay(OverlayEvent {
            frame_index: self.read_u64()?,
            promoted: self.read_u32()?,
        }))
    }

    fn decode_copy_output(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CopyOutput(CopyOutputEvent {
            frame_index: self.read_u64()?,
            pass_id: self.read_pass_id()?,
            area: self.read_rect()?,
        }))
    }

    fn decode_swap(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Swap(SwapEvent {
            frame_index: self.read_u64()?,
            damage: self.read_rect()?,
            timestamp: self.read_u64()?,
        }))
    }

    fn decode_display_list_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DisplayListCommit(DisplayListCommitEvent {
            commit_index: self.read_u64()?,
            new_items: self.read_u32()?,
            cached_items_reused: self.read_u32()?,
            total_items: self.read_u32()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            pass_count: self.read_u32()?,
            quads_drawn: self.read_u32()?,
            quads_skipped: self.read_u32()?,
            overlays: self.read_u32()?,
            copy_requests: self.read_u32()?,
            pass_nanos: self.read_u64()?,
            total_nanos: self.read_u64()?,
        }))
    }

    fn decode_quad(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Quad(QuadEvent {
            frame_index: self.read_u64()?,
            pass_id: self.read_pass_id()?,
            quad_index: self.read_u32()?,
            material: Material::from_code(self.read_u8()?)?,
            outcome: self.read_outcome()?,
        }))
    }

    fn decode_damage_rects_count(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::DamageRectsCount { frame_index, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_OVERLAY => self.decode_overlay(),
            TAG_COPY_OUTPUT => self.decode_copy_output(),
            TAG_SWAP => self.decode_swap(),
            TAG_DISPLAY_LIST_COMMIT => self.decode_display_list_commit(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_QUAD => self.decode_quad(),
            TAG_DAMAGE_RECTS_COUNT => self.decode_damage_rects_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame_begin() -> FrameBeginEvent {
        FrameBeginEvent {
            frame_index: 7,
            timestamp: 1_000_000,
            pass_count: 2,
            device_viewport: IntRect::new(0, 0, 800, 600),
            root_damage: IntRect::new(-5, 10, 20, 30),
        }
    }

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 7,
            pass_count: 2,
            quads_drawn: 11,
            quads_skipped: 3,
            overlays: 1,
            copy_requests: 2,
            pass_nanos: 4_500,
            total_nanos: 9_000,
        }
    }

    #[test]
    fn frame_begin_keeps_negative_rects() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&sample_frame_begin());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::FrameBegin(e) => {
                assert_eq!(e.frame_index, 7);
                assert_eq!(e.timestamp, 1_000_000);
                assert_eq!(e.pass_count, 2);
                assert_eq!(e.device_viewport, IntRect::new(0, 0, 800, 600));
                assert_eq!(e.root_damage, IntRect::new(-5, 10, 20, 30));
            }
            other => panic!("expected FrameBegin, got {other:?}"),
        }
    }

    #[test]
    fn pass_events_keep_ids_and_modes() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&PassBeginEvent {
            frame_index: 5,
            pass_id: RenderPassId::new(-3, 2),
            output_rect: IntRect::new(0, 0, 10, 10),
            quad_count: 4,
            initialization: SurfaceInitializationMode::FullSurfaceClear,
            timestamp: 2_000,
        });
        rec.on_pass_end(&PassEndEvent {
            frame_index: 5,
            pass_id: RenderPassId::new(-3, 2),
            quads_drawn: 3,
            quads_skipped: 1,
            timestamp: 3_000,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::PassBegin(e) => {
                assert_eq!(e.pass_id, RenderPassId::new(-3, 2));
                assert_eq!(e.quad_count, 4);
                assert_eq!(
                    e.initialization,
                    SurfaceInitializationMode::FullSurfaceClear
                );
                assert_eq!(e.timestamp, 2_000);
            }
            other => panic!("expected PassBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::PassEnd(e) => {
                assert_eq!(e.quads_drawn, 3);
                assert_eq!(e.quads_skipped, 1);
                assert_eq!(e.timestamp, 3_000);
            }
            other => panic!("expected PassEnd, got {other:?}"),
        }
    }

    #[test]
    fn summary_decodes_equal() {
        let mut rec = RecorderSink::new();
        rec.on_frame_summary(&sample_summary());
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::FrameSummary(s)] => assert_eq!(*s, sample_summary()),
            other => panic!("expected one FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn mixed_stream_keeps_order() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&sample_frame_begin());
        rec.on_overlay(&OverlayEvent {
            frame_index: 7,
            promoted: 1,
        });
        rec.on_quad(&QuadEvent {
            frame_index: 7,
            pass_id: RenderPassId::new(1, 0),
            quad_index: 9,
            material: Material::Tile,
            outcome: QuadOutcome::ResourceUnavailable,
        });
        rec.on_copy_output(&CopyOutputEvent {
            frame_index: 7,
            pass_id: RenderPassId::new(1, 0),
            area: IntRect::new(1, 2, 3, 4),
        });
        rec.on_damage_rects(7, &[DamageRect::from(IntRect::new(0, 0, 1, 1)); 3]);
        rec.on_swap(&SwapEvent {
            frame_index: 0,
            damage: IntRect::new(0, 0, 8, 8),
            timestamp: 1_010_000,
        });
        rec.on_display_list_commit(&DisplayListCommitEvent {
            commit_index: 4,
            new_items: 6,
            cached_items_reused: 2,
            total_items: 8,
        });
        rec.on_frame_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 8);
        assert!(matches!(events[0], RecordedEvent::FrameBegin(_)));
        assert!(matches!(events[1], RecordedEvent::Overlay(e) if e.promoted == 1));
        assert!(matches!(
            events[2],
            RecordedEvent::Quad(QuadEvent {
                quad_index: 9,
                material: Material::Tile,
                outcome: QuadOutcome::ResourceUnavailable,
                ..
            })
        ));
        assert!(matches!(events[3], RecordedEvent::CopyOutput(e) if e.area == IntRect::new(1, 2, 3, 4)));
        assert!(matches!(
            events[4],
            RecordedEvent::DamageRectsCount {
                frame_index: 7,
                count: 3
            }
        ));
        assert!(matches!(events[5], RecordedEvent::Swap(_)));
        assert!(matches!(
            events[6],
            RecordedEvent::DisplayListCommit(e) if e.cached_items_reused == 2
        ));
        assert!(matches!(events[7], RecordedEvent::FrameSummary(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_overlay(&OverlayEvent {
            frame_index: 1,
            promoted: 2,
        });
        rec.on_frame_begin(&sample_frame_begin());
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::Overlay(_)));
    }

    #[test]
    fn unknown_tag_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_overlay(&OverlayEvent {
            frame_index: 1,
            promoted: 0,
        });
        let mut bytes = rec.into_bytes();
        bytes.push(0xEE);
        bytes.extend_from_slice(&[0; 16]);
        assert_eq!(decode(&bytes).count(), 1);
    }
}
