// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint invalidation tracking.
//!
//! Clients are invalidated between paints through [`PaintInvalidator`], which
//! uses multi-channel dirty tracking (via [`understory_dirty`]). The result is
//! drained into a [`DisplayItemList`](crate::list::DisplayItemList) with
//! [`apply_invalidations`](crate::list::DisplayItemList::apply_invalidations)
//! before the next paint.
//!
//! # Channels
//!
//! - [`PAINT`] is local. Only the marked client repaints.
//! - [`SUBTREE`] uses [`EagerPolicy`] over container dependencies, so marking
//!   a container marks every client registered under it.
//! - [`DELAYED_FULL`] is local. The client repaints and its new items are
//!   excluded from the cache for one more commit.

use alloc::vec::Vec;
use core::fmt;

use understory_dirty::{Channel, CycleHandling, DirtyTracker, EagerPolicy};

use crate::item::DisplayItemClient;

/// Client repaints.
pub const PAINT: Channel = Channel::new(0);

/// Client and every client contained in it repaint.
pub const SUBTREE: Channel = Channel::new(1);

/// Client repaints and stays uncached for one commit.
pub const DELAYED_FULL: Channel = Channel::new(2);

/// Clients drained from a [`PaintInvalidator`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainedInvalidations {
    /// Clients to repaint, in deterministic order.
    pub paint: Vec<DisplayItemClient>,
    /// Clients with a delayed full invalidation.
    pub delayed_full: Vec<DisplayItemClient>,
}

impl DrainedInvalidations {
    /// Whether nothing was invalidated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paint.is_empty() && self.delayed_full.is_empty()
    }
}

/// Accumulates client invalidations between paints.
pub struct PaintInvalidator {
    dirty: DirtyTracker<u64>,
}

impl fmt::Debug for PaintInvalidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintInvalidator").finish_non_exhaustive()
    }
}

impl Default for PaintInvalidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintInvalidator {
    /// Creates an invalidator with no pending invalidations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    /// Registers `child` as painted inside `container`.
    ///
    /// Edges that would form a cycle are ignored.
    pub fn add_container_dependency(&mut self, child: DisplayItemClient, container: DisplayItemClient) {
        let _ = self.dirty.add_dependency(child.0, container.0, SUBTREE);
    }

    /// Removes a registration made by
    /// [`add_container_dependency`](Self::add_container_dependency).
    pub fn remove_container_dependency(
        &mut self,
        child: DisplayItemClient,
        container: DisplayItemClient,
    ) {
        self.dirty.remove_dependency(child.0, container.0, SUBTREE);
    }

    /// Forgets `client` and its edges.
    pub fn remove_client(&mut self, client: DisplayItemClient) {
        self.dirty.remove_key(client.0);
    }

    /// Marks `client` for repaint.
    pub fn invalidate(&mut self, client: DisplayItemClient) {
        self.dirty.mark(client.0, PAINT);
    }

    /// Marks `client` and everything contained in it for repaint.
    pub fn invalidate_including_descendants(&mut self, client: DisplayItemClient) {
        self.dirty.mark_with(client.0, SUBTREE, &EagerPolicy);
    }

    /// Marks `client` for repaint with its cache held back for one commit.
    pub fn invalidate_delayed_full(&mut self, client: DisplayItemClient) {
        self.dirty.mark(client.0, DELAYED_FULL);
    }

    /// Takes every pending invalidation.
    pub fn drain(&mut self) -> DrainedInvalidations {
        let mut paint: Vec<u64> = self.dirty.drain(PAINT).deterministic().run().collect();
        let subtree: Vec<u64> = self
            .dirty
            .drain(SUBTREE)
            .affected()
            .deterministic()
            .run()
            .collect();
        paint.extend(subtree);
        paint.sort_unstable();
        paint.dedup();

        let delayed_full = self
            .dirty
            .drain(DELAYED_FULL)
            .deterministic()
            .run()
            .map(DisplayItemClient)
            .collect();

        DrainedInvalidations {
            paint: paint.into_iter().map(DisplayItemClient).collect(),
            delayed_full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: DisplayItemClient = DisplayItemClient(1);
    const CHILD: DisplayItemClient = DisplayItemClient(2);
    const GRANDCHILD: DisplayItemClient = DisplayItemClient(3);

    #[test]
    fn local_invalidation_does_not_propagate() {
        let mut inv = PaintInvalidator::new();
        inv.add_container_dependency(CHILD, ROOT);
        inv.invalidate(ROOT);
        let drained = inv.drain();
        assert_eq!(drained.paint, [ROOT]);
        assert!(drained.delayed_full.is_empty());
    }

    #[test]
    fn subtree_invalidation_reaches_descendants() {
        let mut inv = PaintInvalidator::new();
        inv.add_container_dependency(CHILD, ROOT);
        inv.add_container_dependency(GRANDCHILD, CHILD);
        inv.invalidate_including_descendants(ROOT);
        inv.invalidate(CHILD);
        assert_eq!(inv.drain().paint, [ROOT, CHILD, GRANDCHILD]);
    }

    #[test]
    fn drain_empties_pending_state() {
        let mut inv = PaintInvalidator::new();
        inv.invalidate_delayed_full(CHILD);
        let drained = inv.drain();
        assert_eq!(drained.delayed_full, [CHILD]);
        assert!(inv.drain().is_empty());
    }

    #[test]
    fn removed_dependency_stops_propagation() {
        let mut inv = PaintInvalidator::new();
        inv.add_container_dependency(CHILD, ROOT);
        inv.remove_container_dependency(CHILD, ROOT);
        inv.invalidate_including_descendants(ROOT);
        assert_eq!(inv.drain().paint, [ROOT]);
    }
}
