// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software rasterization of quadrille render passes.
//!
//! This crate draws a [`RenderPassList`](quadrille_core::render_pass::RenderPassList)
//! with [tiny-skia](tiny_skia). It provides:
//!
//! - [`SoftwareRenderer`]: the frame driver. Draws passes in order, clears
//!   and scissors targets, answers copy requests, and runs overlay
//!   promotion.
//! - [`SoftwareResourceProvider`]: owns the bitmaps quads refer to and hands
//!   out scoped read and write locks.
//! - [`SoftwareOutputDevice`]: the root surface and its accumulated
//!   [`DamageRegion`].
//! - [`filters`]: raster implementations of filter chains.
//!
//! ```text
//!   RenderPassList ──draw_frame──► per pass: clear, scissor, quads, copies
//!                                      │
//!          child passes ──► cached Pixmap      root pass ──► output device
//!                                                               │
//!                                                          swap_buffers
//! ```
//!
//! Materials the software path cannot sample (video planes, IOSurfaces,
//! embedded surfaces, and GPU-only textures) are drawn as flat placeholders:
//! magenta in debug builds and white otherwise.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Reports frame, pass, copy, overlay, and
//!   swap events through [`Tracer`](quadrille_core::trace::Tracer).
//! - `trace-rich` (disabled by default): Adds per-quad outcomes and damage
//!   rects.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod draw;
mod error;
pub mod filters;
mod output_device;
mod renderer;
mod resource_provider;
mod settings;

pub use error::{OutputError, ResourceError};
pub use output_device::{DamageRegion, SoftwareOutputDevice, SwapResult};
pub use renderer::{DrawingFrame, SoftwareRenderer};
pub use resource_provider::{
    ScopedReadLockSoftware, ScopedWriteLockSoftware, SoftwareResourceProvider, WrapMode,
};
pub use settings::{RendererSettings, TimeSource};
