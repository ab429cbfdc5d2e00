// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use quadrille_core::geometry::IntRect;
use quadrille_core::id::RenderPassId;
use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Passes become duration slices. Events that carry no timestamp of their
/// own (overlays, copies, quads, commits, summaries) are placed at the most
/// recent timestamp seen in the recording.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut now = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                now = nanos_to_us(e.timestamp);
                events.push(json!({
                    "ph": "i",
                    "name": "FrameBegin",
                    "cat": "Frame",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "pass_count": e.pass_count,
                        "device_viewport": rect(e.device_viewport),
                        "root_damage": rect(e.root_damage),
                    }
                }));
            }
            RecordedEvent::PassBegin(e) => {
                now = nanos_to_us(e.timestamp);
                events.push(json!({
                    "ph": "B",
                    "name": pass_name(e.pass_id),
                    "cat": "Pass",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "output_rect": rect(e.output_rect),
                        "quad_count": e.quad_count,
                        "initialization": e.initialization.name(),
                    }
                }));
            }
            RecordedEvent::PassEnd(e) => {
                now = nanos_to_us(e.timestamp);
                events.push(json!({
                    "ph": "E",
                    "name": pass_name(e.pass_id),
                    "cat": "Pass",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "quads_drawn": e.quads_drawn,
                        "quads_skipped": e.quads_skipped,
                    }
                }));
            }
            RecordedEvent::Overlay(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Overlay",
                    "cat": "Frame",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "promoted": e.promoted,
                    }
                }));
            }
            RecordedEvent::CopyOutput(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "CopyOutput",
                    "cat": "Pass",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "pass": pass_name(e.pass_id),
                        "area": rect(e.area),
                    }
                }));
            }
            RecordedEvent::Swap(e) => {
                now = nanos_to_us(e.timestamp);
                events.push(json!({
                    "ph": "i",
                    "name": "Swap",
                    "cat": "Frame",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "damage": rect(e.damage),
                    }
                }));
            }
            RecordedEvent::DisplayListCommit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DisplayListCommit",
                    "cat": "Paint",
                    "ts": now,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "commit_index": e.commit_index,
                        "new_items": e.new_items,
                        "cached_items_reused": e.cached_items_reused,
                        "total_items": e.total_items,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "pass_count": s.pass_count,
                        "quads_drawn": s.quads_drawn,
                        "quads_skipped": s.quads_skipped,
                        "overlays": s.overlays,
                        "copy_requests": s.copy_requests,
                        "pass_us": nanos_to_us(s.pass_nanos),
                        "total_us": nanos_to_us(s.total_nanos),
                    }
                }));
            }
            RecordedEvent::Quad(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Quad",
                    "cat": "Rich",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "pass": pass_name(e.pass_id),
                        "quad_index": e.quad_index,
                        "material": e.material.name(),
                        "outcome": format!("{:?}", e.outcome),
                    }
                }));
            }
            RecordedEvent::DamageRectsCount { frame_index, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DamageRects",
                    "cat": "Rich",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

fn pass_name(id: RenderPassId) -> String {
    format!("Pass {}.{}", id.layer_id, id.index)
}

fn rect(r: IntRect) -> Value {
    json!([r.x, r.y, r.width, r.height])
}
