// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-item recording, caching, and replay.
//!
//! `quadrille_paint` records paint output as a flat list of
//! [`DisplayItem`](item::DisplayItem)s bracketed by begin/end pairs. Each
//! paint appends to a new list; clients whose output is unchanged append a
//! cached stand-in that the commit replaces with the item from the previous
//! list.
//!
//! ```text
//!   paint (recorders)
//!       │  create_and_append / end_item
//!       ▼
//!   DisplayItemList ──commit_new_display_items──► current list
//!       │                                             │
//!       │ apply_invalidations                         ├──► replay(GraphicsContext)
//!   PaintInvalidator                                  └──► append_to_web_display_item_list
//! ```
//!
//! **[`item`]**: Item types, payloads, and identities.
//!
//! **[`list`]**: [`DisplayItemList`](list::DisplayItemList): scopes, cache
//! skipping, invalidation, and the commit merge.
//!
//! **[`recorder`]**: Scoped recorders that append begin/end pairs and
//! drawings.
//!
//! **[`invalidation`]**: [`PaintInvalidator`](invalidation::PaintInvalidator)
//! with local and subtree channels.
//!
//! **[`context`]**, **[`web`]**: Replay targets: a canvas trait and the
//! compositor wire form.
//!
//! **[`picture`]**: Recorded drawing content.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Reports commits through
//!   [`Tracer`](quadrille_core::trace::Tracer).

#![no_std]

extern crate alloc;

pub mod context;
pub mod invalidation;
pub mod item;
pub mod list;
pub mod picture;
pub mod recorder;
pub mod web;
