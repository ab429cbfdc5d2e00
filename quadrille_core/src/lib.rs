// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quad, shared-state, and render-pass data model for compositing.
//!
//! `quadrille_core` provides the in-memory representation of one compositor
//! frame: an ordered list of [`RenderPass`](render_pass::RenderPass)es, each
//! owning an arena of [`SharedQuadState`](shared_quad_state::SharedQuadState)s
//! and an arena of [`DrawQuad`](quad::DrawQuad)s. It is `no_std` compatible
//! (with `alloc`) and uses index handles rather than pointers for every
//! back-reference.
//!
//! # Architecture
//!
//! ```text
//!   producers (layers, surfaces)
//!       │  create_and_append_shared_quad_state / create_and_append_draw_quad
//!       ▼
//!   RenderPassList (draw order, root last)
//!       │
//!       ├──► OverlayProcessor::process_for_overlays ──► OverlayCandidateList
//!       │
//!       ▼
//!   renderer (quadrille_software) ──► pixels
//! ```
//!
//! **[`list`]**: Chunked arena ([`ListContainer`](list::ListContainer)) with
//! geometric growth, lazy compaction, erase, and in-place replacement.
//!
//! **[`shared_quad_state`]**: Transform, clip, opacity, and blend attributes
//! shared by a contiguous run of quads.
//!
//! **[`quad`]**: The closed [`DrawQuad`](quad::DrawQuad) material set and
//! the per-material `set_new` / `set_all` constructors.
//!
//! **[`render_pass`]**: Pass storage, deep copy, and copy-output requests.
//!
//! **[`overlay`]**: Overlay candidate extraction, the overlay transform
//! algebra, and promotion strategies.
//!
//! **[`filter`]**: Filter operation chains and their pixel outsets.
//!
//! **[`geometry`]**, **[`color`]**, **[`id`]**, **[`resource`]**: Integer
//! rects, packed colors, identity handles, and per-quad resource lists.
//!
//! **[`transform`]**: Column-major 4×4 transform with the 2-D queries the
//! compositor needs.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! renderer and paint instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-quad and
//!   damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod color;
pub mod filter;
pub mod geometry;
pub mod id;
pub mod list;
pub mod overlay;
pub mod quad;
pub mod render_pass;
pub mod resource;
pub mod shared_quad_state;
pub mod trace;
pub mod transform;
