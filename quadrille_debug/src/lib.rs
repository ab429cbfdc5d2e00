// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for quadrille
//! diagnostics.
//!
//! This crate provides [`TraceSink`](quadrille_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one `[tag] key=value` line per event.
//! - [`recorder::RecorderSink`]: compact binary recording, with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! [`dump`] renders frames and display lists as JSON for inspection.

pub mod chrome;
pub mod dump;
pub mod pretty;
pub mod recorder;
