// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render passes: one compositing target and the quads drawn into it.
//!
//! A frame is a [`RenderPassList`] in draw order with the root pass last.
//! Each [`RenderPass`] owns two arenas:
//!
//! - `shared_quad_state_list`, holding [`SharedQuadState`]s;
//! - `quad_list`, holding [`DrawQuad`]s that cite those states by index.
//!
//! Quads citing the same state are adjacent and state indices never decrease
//! along the quad list. Because quads store indices rather than pointers, a
//! deep copy copies both arenas element for element and every citation stays
//! valid without any fix-up.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::color::Color;
use crate::geometry::{IntRect, IntSize};
use crate::list::ListContainer;
use crate::quad::{DrawQuad, Material, QuadKind, SolidColorQuad};
use crate::shared_quad_state::SharedQuadState;
use crate::transform::Transform3d;

pub use crate::id::{RenderPassId, SharedQuadStateId};

/// Shared states reserved by [`RenderPass::new`].
pub const DEFAULT_NUM_SHARED_QUAD_STATES_TO_RESERVE: usize = 32;

/// Quads reserved by [`RenderPass::new`].
pub const DEFAULT_NUM_QUADS_TO_RESERVE: usize = 128;

/// A frame's passes in draw order, root last.
pub type RenderPassList = Vec<RenderPass>;

/// Returns the position of the pass with `id`, if present.
#[must_use]
pub fn find_render_pass(passes: &[RenderPass], id: RenderPassId) -> Option<usize> {
    passes.iter().position(|pass| pass.id == id)
}

// ---------------------------------------------------------------------------
// Copy output
// ---------------------------------------------------------------------------

/// The pixels delivered to a [`CopyOutputRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyOutputResult {
    /// Premultiplied RGBA8 pixels, row-major without padding.
    Bitmap {
        /// Size of the copied area.
        size: IntSize,
        /// `size.width * size.height * 4` bytes.
        rgba_premul: Vec<u8>,
    },
    /// The request could not be fulfilled.
    Empty,
}

impl CopyOutputResult {
    /// Returns `true` for [`CopyOutputResult::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

type CopyOutputCallback = Box<dyn FnOnce(CopyOutputResult) + Send>;

/// A one-shot request for the pixels of a pass, fulfilled after the pass is
/// drawn.
///
/// A request that is dropped without a result delivers
/// [`CopyOutputResult::Empty`] to its callback, so every request is answered
/// exactly once.
pub struct CopyOutputRequest {
    area: Option<IntRect>,
    callback: Option<CopyOutputCallback>,
}

impl fmt::Debug for CopyOutputRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOutputRequest")
            .field("area", &self.area)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

impl CopyOutputRequest {
    /// Creates a request for the whole pass.
    pub fn new(callback: impl FnOnce(CopyOutputResult) + Send + 'static) -> Self {
        Self {
            area: None,
            callback: Some(Box::new(callback)),
        }
    }

    /// Restricts the request to `area` in pass space.
    #[must_use]
    pub fn with_area(mut self, area: IntRect) -> Self {
        self.area = Some(area);
        self
    }

    /// The requested sub-area, if any.
    #[must_use]
    pub const fn area(&self) -> Option<IntRect> {
        self.area
    }

    /// Delivers `result` and consumes the request.
    pub fn send_result(mut self, result: CopyOutputResult) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }

    /// Delivers [`CopyOutputResult::Empty`] and consumes the request.
    pub fn send_empty_result(self) {
        self.send_result(CopyOutputResult::Empty);
    }
}

impl Drop for CopyOutputRequest {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(CopyOutputResult::Empty);
        }
    }
}

// ---------------------------------------------------------------------------
// QuadList
// ---------------------------------------------------------------------------

/// The quad arena of a pass, in back-to-front draw order.
#[derive(Clone, Debug, Default)]
pub struct QuadList(ListContainer<DrawQuad>);

impl QuadList {
    /// Creates an empty list reserving `count` quads in its first chunk.
    #[must_use]
    pub fn with_capacity(count: usize) -> Self {
        Self(ListContainer::with_capacity(count))
    }

    /// Replaces the quad at `index` with a transparent solid-color quad drawn
    /// without blending, which punches a hole through to whatever lies
    /// beneath the target.
    ///
    /// The replacement covers the old quad's rect and keeps its shared
    /// state.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace_existing_quad_with_opaque_transparent_solid_color(
        &mut self,
        index: usize,
    ) -> &mut DrawQuad {
        let old = &self.0[index];
        let rect = old.rect;
        let shared_quad_state = old.shared_quad_state;
        let mut replacement = DrawQuad::default();
        SolidColorQuad::set_all(
            &mut replacement,
            shared_quad_state,
            rect,
            rect,
            rect,
            false,
            Color::TRANSPARENT,
            true,
        );
        self.0.replace_existing_element(index, replacement);
        &mut self.0[index]
    }
}

impl Deref for QuadList {
    type Target = ListContainer<DrawQuad>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for QuadList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

// ---------------------------------------------------------------------------
// RenderPass
// ---------------------------------------------------------------------------

/// One compositing target and the quads drawn into it.
#[derive(Debug)]
pub struct RenderPass {
    /// Identity of the pass.
    pub id: RenderPassId,
    /// Bounds of the pass output in its own space.
    pub output_rect: IntRect,
    /// Part of `output_rect` that changed since the last frame.
    pub damage_rect: IntRect,
    /// Maps pass space to the root target.
    pub transform_to_root_target: Transform3d,
    /// Whether pixels not covered by quads are transparent.
    pub has_transparent_background: bool,
    /// Pending pixel read-backs, fulfilled after the pass is drawn.
    pub copy_requests: Vec<CopyOutputRequest>,
    /// Shared-state arena.
    pub shared_quad_state_list: ListContainer<SharedQuadState>,
    /// Quad arena in back-to-front order.
    pub quad_list: QuadList,
}

impl Default for RenderPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass {
    /// Creates an empty pass with default arena reservations.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(
            DEFAULT_NUM_SHARED_QUAD_STATES_TO_RESERVE,
            DEFAULT_NUM_QUADS_TO_RESERVE,
        )
    }

    /// Creates an empty pass reserving the given arena sizes.
    #[must_use]
    pub fn with_capacity(shared_quad_states: usize, quads: usize) -> Self {
        Self {
            id: RenderPassId::default(),
            output_rect: IntRect::default(),
            damage_rect: IntRect::default(),
            transform_to_root_target: Transform3d::IDENTITY,
            has_transparent_background: true,
            copy_requests: Vec::new(),
            shared_quad_state_list: ListContainer::with_capacity(shared_quad_states),
            quad_list: QuadList::with_capacity(quads),
        }
    }

    /// Initializes the pass attributes.
    ///
    /// # Panics
    ///
    /// Panics if the id is invalid, the damage escapes the output rect, or
    /// the pass already holds states or quads.
    pub fn set_new(
        &mut self,
        id: RenderPassId,
        output_rect: IntRect,
        damage_rect: IntRect,
        transform_to_root_target: Transform3d,
    ) {
        self.check_initializable(id, output_rect, damage_rect);
        self.id = id;
        self.output_rect = output_rect;
        self.damage_rect = damage_rect;
        self.transform_to_root_target = transform_to_root_target;
    }

    /// Initializes every pass attribute.
    ///
    /// # Panics
    ///
    /// Same conditions as [`RenderPass::set_new`].
    pub fn set_all(
        &mut self,
        id: RenderPassId,
        output_rect: IntRect,
        damage_rect: IntRect,
        transform_to_root_target: Transform3d,
        has_transparent_background: bool,
    ) {
        self.set_new(id, output_rect, damage_rect, transform_to_root_target);
        self.has_transparent_background = has_transparent_background;
    }

    fn check_initializable(&self, id: RenderPassId, output_rect: IntRect, damage_rect: IntRect) {
        assert!(id.is_valid(), "render pass id {id:?} is not valid");
        assert!(
            damage_rect.is_empty() || output_rect.contains(damage_rect),
            "damage {damage_rect:?} escapes output rect {output_rect:?}"
        );
        assert!(
            self.shared_quad_state_list.is_empty() && self.quad_list.is_empty(),
            "render pass must be empty when initialized"
        );
    }

    /// Appends a default shared state and returns its id.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a pass never holds more than u32::MAX shared states"
    )]
    pub fn create_and_append_shared_quad_state(&mut self) -> SharedQuadStateId {
        self.shared_quad_state_list.push_default();
        SharedQuadStateId((self.shared_quad_state_list.len() - 1) as u32)
    }

    /// The shared state with `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a state of this pass.
    #[must_use]
    pub fn shared_quad_state(&self, id: SharedQuadStateId) -> &SharedQuadState {
        &self.shared_quad_state_list[id.index()]
    }

    /// The shared state with `id`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a state of this pass.
    pub fn shared_quad_state_mut(&mut self, id: SharedQuadStateId) -> &mut SharedQuadState {
        &mut self.shared_quad_state_list[id.index()]
    }

    /// The state cited by `quad`.
    #[must_use]
    pub fn state_for(&self, quad: &DrawQuad) -> &SharedQuadState {
        self.shared_quad_state(quad.shared_quad_state)
    }

    /// Appends an uninitialized quad. The caller must run a material's
    /// `set_new` or `set_all` on it.
    pub fn create_and_append_draw_quad(&mut self) -> &mut DrawQuad {
        self.quad_list.push_default()
    }

    /// Appends a copy of `quad` citing `new_state`.
    ///
    /// # Panics
    ///
    /// Panics for render-pass quads, which need
    /// [`RenderPass::copy_from_and_append_render_pass_draw_quad`], and for
    /// uninitialized quads.
    pub fn copy_from_and_append_draw_quad(
        &mut self,
        quad: &DrawQuad,
        new_state: SharedQuadStateId,
    ) -> &mut DrawQuad {
        match quad.material() {
            Material::RenderPass => {
                panic!("render pass quads are copied with copy_from_and_append_render_pass_draw_quad")
            }
            Material::Invalid => panic!("cannot copy an uninitialized quad"),
            _ => {}
        }
        let slot = self.quad_list.push(quad.clone());
        slot.shared_quad_state = new_state;
        slot
    }

    /// Appends a copy of render-pass quad `quad` citing `new_state` and
    /// referencing `child_id` instead of its original pass.
    ///
    /// # Panics
    ///
    /// Panics if `quad` is not a render-pass quad.
    pub fn copy_from_and_append_render_pass_draw_quad(
        &mut self,
        quad: &DrawQuad,
        new_state: SharedQuadStateId,
        child_id: RenderPassId,
    ) -> &mut DrawQuad {
        assert_eq!(
            quad.material(),
            Material::RenderPass,
            "expected a render pass quad"
        );
        let slot = self.quad_list.push(quad.clone());
        slot.shared_quad_state = new_state;
        if let QuadKind::RenderPass(payload) = &mut slot.kind {
            payload.render_pass_id = child_id;
        }
        slot
    }

    /// Returns `true` when state citations never decrease along the quad
    /// list and all name existing states.
    #[must_use]
    pub fn shared_quad_states_are_contiguous(&self) -> bool {
        let states = self.shared_quad_state_list.len();
        let mut last = 0;
        for quad in self.quad_list.iter() {
            let index = quad.shared_quad_state.index();
            if index < last || index >= states {
                return false;
            }
            last = index;
        }
        true
    }

    /// Deep-copies the pass under `new_id`.
    ///
    /// States and quads are copied one for one, so every quad in the copy
    /// cites the copy of its original state. The copy has no copy requests.
    ///
    /// # Panics
    ///
    /// Panics if the pass has pending copy requests.
    #[must_use]
    pub fn copy(&self, new_id: RenderPassId) -> Self {
        assert!(
            self.copy_requests.is_empty(),
            "cannot copy a render pass with pending copy requests"
        );
        debug_assert!(
            self.shared_quad_states_are_contiguous(),
            "quads citing one shared state must be adjacent"
        );
        let mut copy = Self::with_capacity(
            self.shared_quad_state_list.len(),
            self.quad_list.len(),
        );
        copy.set_all(
            new_id,
            self.output_rect,
            self.damage_rect,
            self.transform_to_root_target,
            self.has_transparent_background,
        );
        for state in self.shared_quad_state_list.iter() {
            copy.shared_quad_state_list.push(state.clone());
        }
        for quad in self.quad_list.iter() {
            copy.quad_list.push(quad.clone());
        }
        copy
    }

    /// Deep-copies every pass of `passes` into `out`, keeping ids.
    ///
    /// # Panics
    ///
    /// Panics if any pass has pending copy requests.
    pub fn copy_all(passes: &[Self], out: &mut RenderPassList) {
        out.reserve(passes.len());
        for pass in passes {
            out.push(pass.copy(pass.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterOperations;
    use crate::id::ResourceId;
    use crate::quad::{RenderPassQuad, TextureQuad};
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use kurbo::{Point, Vec2};

    fn root_pass() -> RenderPass {
        let mut pass = RenderPass::new();
        pass.set_new(
            RenderPassId::new(1, 1),
            IntRect::new(0, 0, 100, 100),
            IntRect::new(0, 0, 100, 100),
            Transform3d::IDENTITY,
        );
        pass
    }

    fn append_solid(pass: &mut RenderPass, sqs: SharedQuadStateId, rect: IntRect, color: Color) {
        let quad = pass.create_and_append_draw_quad();
        SolidColorQuad::set_new(quad, sqs, rect, rect, color, false);
    }

    #[test]
    fn solid_color_pass_round_trip() {
        let mut pass = root_pass();
        let sqs = pass.create_and_append_shared_quad_state();
        append_solid(&mut pass, sqs, IntRect::new(10, 10, 50, 50), Color::RED);

        assert_eq!(pass.quad_list.len(), 1);
        let quad = pass.quad_list.front();
        assert!(quad.is_some_and(|q| !q.should_draw_with_blending(pass.state_for(q))));

        let copy = pass.copy(RenderPassId::new(2, 1));
        assert_eq!(copy.id, RenderPassId::new(2, 1));
        assert_eq!(
            copy.quad_list.front().and_then(|q| q.as_solid_color()).map(|s| s.color),
            Some(Color::RED)
        );
    }

    #[test]
    fn copy_preserves_state_citations() {
        let mut pass = root_pass();
        for i in 0..3 {
            let sqs = pass.create_and_append_shared_quad_state();
            pass.shared_quad_state_mut(sqs).opacity = 0.25 * (i + 1) as f32;
            for j in 0..2 {
                append_solid(&mut pass, sqs, IntRect::new(j * 10, 0, 10, 10), Color::BLUE);
            }
        }
        let copy = pass.copy(RenderPassId::new(9, 0));
        assert_eq!(copy.shared_quad_state_list.len(), 3);
        assert_eq!(copy.quad_list.len(), 6);
        for (orig, copied) in pass.quad_list.iter().zip(copy.quad_list.iter()) {
            assert_eq!(orig, copied);
            assert_eq!(pass.state_for(orig), copy.state_for(copied));
        }
        assert!(copy.copy_requests.is_empty());
    }

    #[test]
    fn copy_all_keeps_ids_and_order() {
        let mut child = RenderPass::new();
        child.set_new(
            RenderPassId::new(3, 0),
            IntRect::new(0, 0, 10, 10),
            IntRect::default(),
            Transform3d::IDENTITY,
        );
        let passes = alloc::vec![child, root_pass()];
        let mut out = RenderPassList::new();
        RenderPass::copy_all(&passes, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, RenderPassId::new(3, 0));
        assert_eq!(find_render_pass(&out, RenderPassId::new(1, 1)), Some(1));
    }

    #[test]
    #[should_panic(expected = "pending copy requests")]
    fn copy_with_pending_requests_panics() {
        let mut pass = root_pass();
        pass.copy_requests.push(CopyOutputRequest::new(|_| {}));
        let _ = pass.copy(RenderPassId::new(2, 0));
    }

    #[test]
    #[should_panic(expected = "escapes output rect")]
    fn damage_outside_output_panics() {
        let mut pass = RenderPass::new();
        pass.set_new(
            RenderPassId::new(1, 0),
            IntRect::new(0, 0, 10, 10),
            IntRect::new(5, 5, 10, 10),
            Transform3d::IDENTITY,
        );
    }

    #[test]
    #[should_panic(expected = "not valid")]
    fn invalid_id_panics() {
        let mut pass = RenderPass::new();
        pass.set_new(
            RenderPassId::default(),
            IntRect::new(0, 0, 10, 10),
            IntRect::default(),
            Transform3d::IDENTITY,
        );
    }

    #[test]
    fn copy_from_and_append_rebinds_state() {
        let mut src = root_pass();
        let sqs = src.create_and_append_shared_quad_state();
        let rect = IntRect::new(0, 0, 10, 10);
        let quad = src.create_and_append_draw_quad();
        TextureQuad::set_new(
            quad,
            sqs,
            rect,
            rect,
            rect,
            ResourceId(4),
            true,
            Point::ZERO,
            Point::new(1.0, 1.0),
            Color::TRANSPARENT,
            [1.0; 4],
            false,
            false,
        );

        let mut dst = root_pass();
        let _ = dst.create_and_append_shared_quad_state();
        let new_state = dst.create_and_append_shared_quad_state();
        let original = src.quad_list[0].clone();
        let copied = dst.copy_from_and_append_draw_quad(&original, new_state);
        assert_eq!(copied.shared_quad_state, new_state);
        assert_eq!(copied.as_texture(), original.as_texture());
    }

    #[test]
    #[should_panic(expected = "copy_from_and_append_render_pass_draw_quad")]
    fn generic_copy_rejects_pass_quads() {
        let mut pass = root_pass();
        let sqs = pass.create_and_append_shared_quad_state();
        let rect = IntRect::new(0, 0, 10, 10);
        RenderPassQuad::set_new(
            pass.create_and_append_draw_quad(),
            sqs,
            rect,
            rect,
            RenderPassId::new(2, 0),
            ResourceId::NONE,
            Vec2::ZERO,
            IntSize::default(),
            FilterOperations::new(),
            Vec2::new(1.0, 1.0),
            FilterOperations::new(),
        );
        let quad = pass.quad_list[0].clone();
        pass.copy_from_and_append_draw_quad(&quad, sqs);
    }

    #[test]
    fn pass_quad_copy_retargets_child() {
        let mut pass = root_pass();
        let sqs = pass.create_and_append_shared_quad_state();
        let rect = IntRect::new(0, 0, 10, 10);
        RenderPassQuad::set_new(
            pass.create_and_append_draw_quad(),
            sqs,
            rect,
            rect,
            RenderPassId::new(2, 0),
            ResourceId::NONE,
            Vec2::ZERO,
            IntSize::default(),
            FilterOperations::new(),
            Vec2::new(1.0, 1.0),
            FilterOperations::new(),
        );
        let quad = pass.quad_list[0].clone();
        let copied =
            pass.copy_from_and_append_render_pass_draw_quad(&quad, sqs, RenderPassId::new(7, 3));
        assert_eq!(
            copied.as_render_pass().map(|p| p.render_pass_id),
            Some(RenderPassId::new(7, 3))
        );
    }

    #[test]
    fn contiguity_detects_interleaving() {
        let mut pass = root_pass();
        let a = pass.create_and_append_shared_quad_state();
        let b = pass.create_and_append_shared_quad_state();
        let rect = IntRect::new(0, 0, 1, 1);
        append_solid(&mut pass, a, rect, Color::RED);
        append_solid(&mut pass, b, rect, Color::RED);
        assert!(pass.shared_quad_states_are_contiguous());
        append_solid(&mut pass, a, rect, Color::RED);
        assert!(!pass.shared_quad_states_are_contiguous());
    }

    #[test]
    fn punch_through_replacement() {
        let mut pass = root_pass();
        let sqs = pass.create_and_append_shared_quad_state();
        let rect = IntRect::new(5, 5, 20, 20);
        crate::quad::DebugBorderQuad::set_new(
            pass.create_and_append_draw_quad(),
            sqs,
            rect,
            IntRect::new(5, 5, 10, 10),
            Color::YELLOW,
            1,
        );

        let replaced = pass
            .quad_list
            .replace_existing_quad_with_opaque_transparent_solid_color(0);
        assert_eq!(replaced.shared_quad_state, sqs);
        assert_eq!(replaced.rect, rect);
        assert_eq!(replaced.opaque_rect, rect);
        assert_eq!(replaced.visible_rect, rect);
        assert!(!replaced.needs_blending);
        let solid = replaced.as_solid_color().copied();
        assert_eq!(
            solid,
            Some(SolidColorQuad {
                color: Color::TRANSPARENT,
                force_anti_aliasing_off: true,
            })
        );
        assert_eq!(pass.quad_list.len(), 1);
    }

    #[test]
    fn dropped_request_sends_empty_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let request = CopyOutputRequest::new(move |result| {
            assert!(result.is_empty(), "dropped request must report empty");
            seen.fetch_add(1, Ordering::SeqCst);
        });
        drop(request);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sent_result_is_not_followed_by_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let request = CopyOutputRequest::new(move |result| {
            assert!(!result.is_empty(), "bitmap expected");
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .with_area(IntRect::new(0, 0, 1, 1));
        assert_eq!(request.area(), Some(IntRect::new(0, 0, 1, 1)));
        request.send_result(CopyOutputResult::Bitmap {
            size: IntSize::new(1, 1),
            rgba_premul: alloc::vec![0; 4],
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
