// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered display item list with per-client caching.
//!
//! Painting appends to the *new* list. A client whose output has not changed
//! appends a cached stand-in instead of re-recording; on commit, each
//! stand-in is replaced by the matching item moved out of the *current*
//! list, and the merged result becomes the current list.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::{fmt, mem};

use quadrille_core::trace::{DisplayListCommitEvent, Tracer};

use crate::context::GraphicsContext;
use crate::invalidation::PaintInvalidator;
use crate::item::{DisplayItem, DisplayItemClient, DisplayItemId, DisplayItemType, Scope};
use crate::web::WebDisplayItemList;

/// Lazily built index of current items, used when a cached item is found
/// out of order.
#[derive(Default)]
struct OutOfOrderIndex {
    by_id: BTreeMap<DisplayItemId, usize>,
    next_to_index: usize,
}

/// Display items of the last commit plus those being painted.
pub struct DisplayItemList {
    current: Vec<DisplayItem>,
    new_items: Vec<DisplayItem>,
    validly_cached_clients: BTreeSet<DisplayItemClient>,
    delayed_full_clients: BTreeSet<DisplayItemClient>,
    client_scope_ids: BTreeMap<DisplayItemClient, u32>,
    scope_stack: Vec<Scope>,
    skipping_cache_count: u32,
    construction_disabled: bool,
    num_cached_items: usize,
    commit_count: u64,
    #[cfg(debug_assertions)]
    new_drawing_ids: BTreeSet<DisplayItemId>,
}

impl fmt::Debug for DisplayItemList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayItemList")
            .field("current", &self.current.len())
            .field("new_items", &self.new_items.len())
            .field("validly_cached_clients", &self.validly_cached_clients.len())
            .field("skipping_cache_count", &self.skipping_cache_count)
            .field("construction_disabled", &self.construction_disabled)
            .field("commit_count", &self.commit_count)
            .finish_non_exhaustive()
    }
}

impl Default for DisplayItemList {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayItemList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Vec::new(),
            new_items: Vec::new(),
            validly_cached_clients: BTreeSet::new(),
            delayed_full_clients: BTreeSet::new(),
            client_scope_ids: BTreeMap::new(),
            scope_stack: Vec::new(),
            skipping_cache_count: 0,
            construction_disabled: false,
            num_cached_items: 0,
            commit_count: 0,
            #[cfg(debug_assertions)]
            new_drawing_ids: BTreeSet::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Appending
    // -----------------------------------------------------------------------

    /// Appends `item` to the new list.
    ///
    /// The item picks up the innermost scope and is marked as having skipped
    /// the cache when caching is bypassed for it. Does nothing while
    /// construction is disabled.
    pub fn create_and_append(&mut self, mut item: DisplayItem) {
        if self.construction_disabled {
            return;
        }
        if let Some(scope) = self.scope_stack.last() {
            item.scope = Some(*scope);
        }
        if self.skipping_cache() || self.delayed_full_clients.contains(&item.client) {
            item.skipped_cache = true;
        }
        if item.item_type.is_cached() {
            self.num_cached_items += 1;
        }

        #[cfg(debug_assertions)]
        {
            if item.item_type.is_drawing() && !item.skipped_cache {
                let fresh = self.new_drawing_ids.insert(item.id());
                debug_assert!(fresh, "duplicate display item {:?}", item.id());
            }
            if let Some(last) = self.new_items.last() {
                debug_assert!(
                    !(last.item_type.is_begin()
                        && !last.draws_content()
                        && item.item_type.is_end_and_paired_with(last.item_type)),
                    "no-op {} left before {}",
                    last.item_type,
                    item.item_type
                );
            }
        }

        self.new_items.push(item);
    }

    /// Closes the innermost bracket.
    ///
    /// If the last new item is a begin with no content that `end` pairs
    /// with, the begin is dropped and nothing is appended.
    pub fn end_item(&mut self, client: DisplayItemClient, end: DisplayItemType) {
        if self.construction_disabled {
            return;
        }
        debug_assert!(end.is_end(), "{end} is not an end item");
        if let Some(last) = self.new_items.last()
            && last.item_type.is_begin()
            && !last.draws_content()
            && end.is_end_and_paired_with(last.item_type)
        {
            self.new_items.pop();
            return;
        }
        self.create_and_append(DisplayItem::bracket(client, end));
    }

    /// Opens a scope for `client` and returns its id.
    ///
    /// Ids count up per client until the next commit.
    pub fn begin_scope(&mut self, client: DisplayItemClient) -> u32 {
        let next = self.client_scope_ids.entry(client).or_insert(0);
        *next += 1;
        let id = *next;
        self.scope_stack.push(Scope {
            id,
            container: client,
        });
        id
    }

    /// Closes the innermost scope.
    pub fn end_scope(&mut self) {
        let popped = self.scope_stack.pop();
        debug_assert!(popped.is_some(), "end_scope without begin_scope");
    }

    /// Bypasses the cache until the matching
    /// [`end_skipping_cache`](Self::end_skipping_cache).
    pub fn begin_skipping_cache(&mut self) {
        self.skipping_cache_count += 1;
    }

    /// Undoes one [`begin_skipping_cache`](Self::begin_skipping_cache).
    pub fn end_skipping_cache(&mut self) {
        debug_assert!(self.skipping_cache_count > 0, "unbalanced end_skipping_cache");
        self.skipping_cache_count = self.skipping_cache_count.saturating_sub(1);
    }

    /// Whether the cache is currently bypassed.
    #[must_use]
    pub fn skipping_cache(&self) -> bool {
        self.skipping_cache_count > 0
    }

    /// Whether appends are currently ignored.
    #[must_use]
    pub fn display_item_construction_is_disabled(&self) -> bool {
        self.construction_disabled
    }

    /// Enables or disables appends.
    pub fn set_display_item_construction_is_disabled(&mut self, disabled: bool) {
        self.construction_disabled = disabled;
    }

    // -----------------------------------------------------------------------
    // Caching
    // -----------------------------------------------------------------------

    /// Whether `client`'s drawings from the last commit can be reused.
    #[must_use]
    pub fn client_cache_is_valid(&self, client: DisplayItemClient) -> bool {
        if self.skipping_cache() || self.delayed_full_clients.contains(&client) {
            return false;
        }
        self.validly_cached_clients.contains(&client)
    }

    /// Forces `client` to repaint.
    pub fn invalidate(&mut self, client: DisplayItemClient) {
        self.validly_cached_clients.remove(&client);
    }

    /// Drops every cached item.
    pub fn invalidate_all(&mut self) {
        self.current.clear();
        self.validly_cached_clients.clear();
    }

    /// Drains `invalidator` into the cache state.
    ///
    /// Painted clients lose their cache. Delayed-full clients repaint with
    /// their items marked as having skipped the cache, so they stay invalid
    /// for one more commit.
    pub fn apply_invalidations(&mut self, invalidator: &mut PaintInvalidator) {
        let drained = invalidator.drain();
        for client in drained.paint {
            self.invalidate(client);
        }
        for client in drained.delayed_full {
            self.invalidate(client);
            self.delayed_full_clients.insert(client);
        }
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    /// Merges the new list into the current list.
    ///
    /// Each cached stand-in takes the matching current item: the one at the
    /// merge cursor when ids line up, otherwise one found through a lazily
    /// built index of the remaining items.
    pub fn commit_new_display_items(&mut self) -> DisplayListCommitEvent {
        self.commit_count += 1;
        let new_count = self.new_items.len();
        let mut cached_count = self.num_cached_items;

        self.scope_stack.clear();
        self.client_scope_ids.clear();
        #[cfg(debug_assertions)]
        self.new_drawing_ids.clear();

        if self.current.is_empty() {
            debug_assert!(cached_count == 0, "cached items with no previous commit");
            mem::swap(&mut self.current, &mut self.new_items);
            // Stand-ins have nothing to copy forward from.
            self.current.retain(|item| !item.item_type.is_cached());
            cached_count = 0;
        } else {
            let mut new_items = mem::take(&mut self.new_items);
            let mut updated = Vec::with_capacity(new_items.len());
            let mut index = OutOfOrderIndex::default();
            let mut cursor = 0;
            for item in new_items.drain(..) {
                let id = item.id();
                let synchronized = self
                    .current
                    .get(cursor)
                    .is_some_and(|c| c.is_valid() && c.id() == id);
                if item.item_type.is_cached() {
                    if !synchronized {
                        let found = self.find_out_of_order_cached_item(cursor, id, &mut index);
                        debug_assert!(found.is_some(), "cached item {id:?} has no match");
                        let Some(found) = found else { continue };
                        cursor = found;
                    }
                    updated.push(mem::take(&mut self.current[cursor]));
                    cursor += 1;
                } else {
                    updated.push(item);
                    if synchronized {
                        cursor += 1;
                    }
                }
            }
            self.current = updated;
            // Hand the allocation back for the next paint.
            self.new_items = new_items;
        }

        self.update_validly_cached_clients();
        self.delayed_full_clients.clear();
        self.num_cached_items = 0;

        #[cfg(debug_assertions)]
        debug_assert!(
            nesting_is_valid(&self.current),
            "committed display list is not properly nested"
        );

        DisplayListCommitEvent {
            commit_index: self.commit_count,
            new_items: saturating_u32(new_count),
            cached_items_reused: saturating_u32(cached_count),
            total_items: saturating_u32(self.current.len()),
        }
    }

    /// [`commit_new_display_items`](Self::commit_new_display_items), reporting
    /// the result to `tracer`.
    pub fn commit_new_display_items_traced(&mut self, tracer: &mut Tracer<'_>) {
        let event = self.commit_new_display_items();
        tracer.display_list_commit(&event);
    }

    fn find_out_of_order_cached_item(
        &self,
        cursor: usize,
        id: DisplayItemId,
        index: &mut OutOfOrderIndex,
    ) -> Option<usize> {
        if let Some(&found) = index.by_id.get(&id)
            && self.current[found].is_valid()
        {
            return Some(found);
        }
        let start = index.next_to_index.max(cursor);
        for i in start..self.current.len() {
            let item = &self.current[i];
            if !item.is_valid()
                || !item.item_type.is_drawing()
                || !self.validly_cached_clients.contains(&item.client)
            {
                continue;
            }
            let item_id = item.id();
            if item_id == id {
                index.next_to_index = i + 1;
                return Some(i);
            }
            index.by_id.entry(item_id).or_insert(i);
        }
        index.next_to_index = self.current.len();
        None
    }

    fn update_validly_cached_clients(&mut self) {
        self.validly_cached_clients.clear();
        let mut invalid = BTreeSet::new();
        for item in &self.current {
            if item.skipped_cache {
                invalid.insert(item.client);
            } else {
                self.validly_cached_clients.insert(item.client);
            }
        }
        for client in invalid {
            self.validly_cached_clients.remove(&client);
        }
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Items of the last commit.
    #[must_use]
    pub fn display_items(&self) -> &[DisplayItem] {
        &self.current
    }

    /// Items appended since the last commit.
    #[must_use]
    pub fn new_display_items(&self) -> &[DisplayItem] {
        &self.new_items
    }

    /// Number of commits so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }

    /// Replays the committed list into `context`.
    pub fn replay(&self, context: &mut dyn GraphicsContext) {
        debug_assert!(self.new_items.is_empty(), "replay with uncommitted items");
        for item in &self.current {
            item.replay(context);
        }
    }

    /// Appends the committed list to `list` in wire form.
    pub fn append_to_web_display_item_list(&self, list: &mut dyn WebDisplayItemList) {
        for item in &self.current {
            item.append_to_web_display_item_list(list);
        }
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(debug_assertions)]
fn nesting_is_valid(items: &[DisplayItem]) -> bool {
    let mut stack: Vec<DisplayItemType> = Vec::new();
    for item in items {
        let t = item.item_type;
        if t.is_begin() {
            stack.push(t);
        } else if t.is_end() {
            match stack.pop() {
                Some(begin) if t.is_end_and_paired_with(begin) => {}
                _ => return false,
            }
        }
    }
    stack.is_empty()
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;
    use quadrille_core::color::Color;

    use super::*;
    use crate::item::{ClipType, DrawingType, PaintPhase};
    use crate::picture::{PaintOp, Picture};

    const A: DisplayItemClient = DisplayItemClient(1);
    const B: DisplayItemClient = DisplayItemClient(2);
    const BG: DrawingType = DrawingType::PaintPhase(PaintPhase::BlockBackground);
    const FG: DrawingType = DrawingType::PaintPhase(PaintPhase::Foreground);

    fn picture(color: Color) -> Picture {
        let mut picture = Picture::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        picture.ops.push(PaintOp::FillRect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            color,
        });
        picture
    }

    fn drawing(client: DisplayItemClient, t: DrawingType, color: Color) -> DisplayItem {
        DisplayItem::drawing(client, t, picture(color))
    }

    fn fill_color(item: &DisplayItem) -> Option<Color> {
        match &item.payload {
            crate::item::DisplayItemPayload::Drawing(p) => match p.ops.first() {
                Some(PaintOp::FillRect { color, .. }) => Some(*color),
                _ => None,
            },
            _ => None,
        }
    }

    #[test]
    fn first_commit_swaps_lists() {
        let mut list = DisplayItemList::new();
        list.create_and_append(drawing(A, BG, Color::RED));
        list.create_and_append(drawing(B, BG, Color::BLUE));
        let event = list.commit_new_display_items();
        assert_eq!(event.commit_index, 1);
        assert_eq!(event.total_items, 2);
        assert_eq!(list.display_items().len(), 2);
        assert!(list.new_display_items().is_empty());
        assert!(list.client_cache_is_valid(A));
        assert!(list.client_cache_is_valid(B));
    }

    #[test]
    fn cached_items_are_copied_forward() {
        let mut list = DisplayItemList::new();
        list.create_and_append(drawing(A, BG, Color::RED));
        list.create_and_append(drawing(B, BG, Color::BLUE));
        list.commit_new_display_items();

        list.invalidate(B);
        assert!(!list.client_cache_is_valid(B));
        list.create_and_append(DisplayItem::cached(A, BG));
        list.create_and_append(drawing(B, BG, Color::GREEN));
        let event = list.commit_new_display_items();
        assert_eq!(event.cached_items_reused, 1);

        let items = list.display_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_type, DisplayItemType::Drawing(BG));
        assert_eq!(fill_color(&items[0]), Some(Color::RED));
        assert_eq!(fill_color(&items[1]), Some(Color::GREEN));
    }

    #[test]
    #[cfg_attr(
        debug_assertions,
        should_panic(expected = "cached items with no previous commit")
    )]
    fn cached_items_without_previous_commit_are_dropped() {
        let mut list = DisplayItemList::new();
        list.create_and_append(DisplayItem::cached(A, BG));
        list.create_and_append(drawing(B, BG, Color::BLUE));
        let event = list.commit_new_display_items();
        assert_eq!(event.cached_items_reused, 0);
        assert_eq!(event.total_items, 1);
        let items = list.display_items();
        assert_eq!(items.len(), 1);
        assert_eq!(fill_color(&items[0]), Some(Color::BLUE));
    }

    #[test]
    fn out_of_order_cached_items_are_found() {
        let mut list = DisplayItemList::new();
        list.create_and_append(drawing(A, BG, Color::RED));
        list.create_and_append(drawing(A, FG, Color::YELLOW));
        list.create_and_append(drawing(B, BG, Color::BLUE));
        list.commit_new_display_items();

        // B now paints below A.
        list.create_and_append(DisplayItem::cached(B, BG));
        list.create_and_append(DisplayItem::cached(A, BG));
        list.create_and_append(DisplayItem::cached(A, FG));
        list.commit_new_display_items();

        let colors: Vec<_> = list.display_items().iter().map(fill_color).collect();
        assert_eq!(
            colors,
            [Some(Color::BLUE), Some(Color::RED), Some(Color::YELLOW)]
        );
    }

    #[test]
    fn empty_begin_end_pair_is_dropped() {
        let mut list = DisplayItemList::new();
        let clip = ClipType::LayerForeground;
        list.create_and_append(DisplayItem::clip(A, clip, Rect::ZERO, Vec::new()));
        list.end_item(A, DisplayItemType::EndClip(clip));
        assert!(list.new_display_items().is_empty());

        list.create_and_append(DisplayItem::clip(A, clip, Rect::ZERO, Vec::new()));
        list.create_and_append(drawing(A, FG, Color::RED));
        list.end_item(A, DisplayItemType::EndClip(clip));
        assert_eq!(list.new_display_items().len(), 3);
    }

    #[test]
    fn skipped_items_invalidate_their_client() {
        let mut list = DisplayItemList::new();
        list.begin_skipping_cache();
        assert!(!list.client_cache_is_valid(A));
        list.create_and_append(drawing(A, BG, Color::RED));
        list.end_skipping_cache();
        list.create_and_append(drawing(B, BG, Color::BLUE));
        assert!(list.new_display_items()[0].skipped_cache);
        list.commit_new_display_items();
        assert!(!list.client_cache_is_valid(A));
        assert!(list.client_cache_is_valid(B));
    }

    #[test]
    fn scopes_number_repeated_painting() {
        let mut list = DisplayItemList::new();
        for color in [Color::RED, Color::BLUE] {
            let id = list.begin_scope(B);
            list.create_and_append(drawing(A, BG, color));
            list.end_scope();
            assert!(id > 0);
        }
        let items = list.new_display_items();
        assert_eq!(items[0].scope.map(|s| s.id), Some(1));
        assert_eq!(items[1].scope.map(|s| s.id), Some(2));
        assert_ne!(items[0].id(), items[1].id());

        list.commit_new_display_items();
        assert_eq!(list.begin_scope(B), 1);
    }

    #[test]
    fn disabled_construction_ignores_appends() {
        let mut list = DisplayItemList::new();
        list.set_display_item_construction_is_disabled(true);
        list.create_and_append(drawing(A, BG, Color::RED));
        list.end_item(A, DisplayItemType::EndFilter);
        assert!(list.new_display_items().is_empty());
        assert!(list.display_item_construction_is_disabled());
    }

    #[test]
    fn invalidate_all_drops_current_items() {
        let mut list = DisplayItemList::new();
        list.create_and_append(drawing(A, BG, Color::RED));
        list.commit_new_display_items();
        list.invalidate_all();
        assert!(list.display_items().is_empty());
        assert!(!list.client_cache_is_valid(A));
    }

    #[test]
    fn invalidator_drain_applies_to_cache() {
        let mut list = DisplayItemList::new();
        list.create_and_append(drawing(A, BG, Color::RED));
        list.create_and_append(drawing(B, BG, Color::BLUE));
        list.commit_new_display_items();

        let mut invalidator = PaintInvalidator::new();
        invalidator.add_container_dependency(B, A);
        invalidator.invalidate_including_descendants(A);
        list.apply_invalidations(&mut invalidator);
        assert!(!list.client_cache_is_valid(A));
        assert!(!list.client_cache_is_valid(B));
    }

    #[test]
    fn delayed_full_client_stays_invalid_for_one_commit() {
        let mut list = DisplayItemList::new();
        list.create_and_append(drawing(A, BG, Color::RED));
        list.commit_new_display_items();

        let mut invalidator = PaintInvalidator::new();
        invalidator.invalidate_delayed_full(A);
        list.apply_invalidations(&mut invalidator);
        assert!(!list.client_cache_is_valid(A));

        list.create_and_append(drawing(A, BG, Color::GREEN));
        assert!(list.new_display_items()[0].skipped_cache);
        list.commit_new_display_items();
        assert!(!list.client_cache_is_valid(A));

        list.create_and_append(drawing(A, BG, Color::GREEN));
        list.commit_new_display_items();
        assert!(list.client_cache_is_valid(A));
    }
}
