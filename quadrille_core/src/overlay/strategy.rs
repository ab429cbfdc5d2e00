// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Promotion strategies and the processor that runs them.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::geometry::IntRect;
use crate::quad::{DrawQuad, QuadKind};
use crate::render_pass::RenderPass;
use crate::shared_quad_state::SharedQuadState;

use super::{OverlayCandidate, OverlayCandidateList};

/// Platform hook that reports which candidates the display hardware can
/// scan out.
pub trait OverlayCandidateValidator {
    /// Sets `overlay_handled` on each candidate the hardware accepts.
    ///
    /// The list starts with the main plane, the output surface at
    /// `plane_z_order` 0. Previously accepted planes follow, then the one
    /// being tried. Only the last entry's verdict is consulted.
    fn check_overlay_support(&mut self, candidates: &mut [OverlayCandidate]);

    /// Strategies to try, in order. Defaults to [`SingleOnTop`] then
    /// [`Underlay`].
    fn strategies(&self) -> Vec<Box<dyn OverlayStrategy>> {
        vec![Box::new(SingleOnTop), Box::new(Underlay)]
    }
}

/// One way of moving a quad out of the root pass and onto a plane.
pub trait OverlayStrategy: fmt::Debug {
    /// Tries to promote one quad of the root pass, the last of `passes`.
    ///
    /// On success the accepted candidate is appended to `candidates`, the
    /// root pass is rewritten so the renderer no longer draws the quad, and
    /// `true` is returned. On failure nothing is modified.
    fn attempt(
        &self,
        validator: &mut dyn OverlayCandidateValidator,
        passes: &mut [RenderPass],
        candidates: &mut OverlayCandidateList,
    ) -> bool;
}

/// A solid-color quad that contributes nothing when drawn.
fn is_invisible_quad(quad: &DrawQuad, sqs: &SharedQuadState) -> bool {
    let QuadKind::SolidColor(solid) = &quad.kind else {
        return false;
    };
    let alpha = solid.color.alpha_f32() * sqs.opacity;
    quad.should_draw_with_blending(sqs) && alpha < f32::EPSILON
}

/// Appends `candidate` at `plane_z_order` to a copy of `candidates` and asks
/// the validator. Returns the extended list when the hardware accepts it.
///
/// An empty list is seeded with the main plane covering `root_output_rect`.
fn validate(
    validator: &mut dyn OverlayCandidateValidator,
    candidates: &OverlayCandidateList,
    root_output_rect: IntRect,
    mut candidate: OverlayCandidate,
    plane_z_order: i32,
) -> Option<OverlayCandidateList> {
    let mut trial = candidates.clone();
    if trial.is_empty() {
        trial.push(OverlayCandidate {
            display_rect: root_output_rect.to_rect(),
            quad_rect_in_target_space: root_output_rect,
            use_output_surface_for_resource: true,
            plane_z_order: 0,
            ..OverlayCandidate::default()
        });
    }
    candidate.plane_z_order = plane_z_order;
    trial.push(candidate);
    validator.check_overlay_support(&mut trial);
    trial.last().is_some_and(|c| c.overlay_handled).then_some(trial)
}

/// Promotes the frontmost eligible quad of the root pass to a plane above
/// the main surface.
///
/// A quad qualifies only when nothing drawn after it covers any part of it,
/// since the plane would otherwise paint over that content. The promoted
/// quad is erased from the pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleOnTop;

impl OverlayStrategy for SingleOnTop {
    fn attempt(
        &self,
        validator: &mut dyn OverlayCandidateValidator,
        passes: &mut [RenderPass],
        candidates: &mut OverlayCandidateList,
    ) -> bool {
        let Some(root) = passes.last_mut() else {
            return false;
        };
        let root_output_rect = root.output_rect;
        for index in (0..root.quad_list.len()).rev() {
            let quad = &root.quad_list[index];
            let Some(candidate) = OverlayCandidate::from_draw_quad(quad, root.state_for(quad)) else {
                continue;
            };
            if is_occluded(root, index, &candidate) {
                continue;
            }
            if let Some(accepted) = validate(validator, candidates, root_output_rect, candidate, 1) {
                root.quad_list.erase_and_invalidate_all_pointers(index);
                *candidates = accepted;
                return true;
            }
        }
        false
    }
}

/// Whether a visible quad drawn after `index` overlaps the candidate.
fn is_occluded(pass: &RenderPass, index: usize, candidate: &OverlayCandidate) -> bool {
    pass.quad_list.iter().skip(index + 1).any(|above| {
        let sqs = pass.state_for(above);
        let rect = sqs.quad_to_target_transform.map_rect(above.rect.to_rect());
        intersects(candidate.display_rect, rect) && !is_invisible_quad(above, sqs)
    })
}

/// Strict overlap: rects that only share an edge do not intersect.
fn intersects(a: kurbo::Rect, b: kurbo::Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Promotes the frontmost eligible quad of the root pass to a plane beneath
/// the main surface.
///
/// The quad's slot is replaced with a transparent solid color drawn without
/// blending, which punches a hole through which the plane shows. Content
/// drawn above the quad is kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct Underlay;

impl OverlayStrategy for Underlay {
    fn attempt(
        &self,
        validator: &mut dyn OverlayCandidateValidator,
        passes: &mut [RenderPass],
        candidates: &mut OverlayCandidateList,
    ) -> bool {
        let Some(root) = passes.last_mut() else {
            return false;
        };
        let root_output_rect = root.output_rect;
        for index in (0..root.quad_list.len()).rev() {
            let quad = &root.quad_list[index];
            let Some(candidate) = OverlayCandidate::from_draw_quad(quad, root.state_for(quad)) else {
                continue;
            };
            if let Some(accepted) = validate(validator, candidates, root_output_rect, candidate, -1) {
                root.quad_list
                    .replace_existing_quad_with_opaque_transparent_solid_color(index);
                *candidates = accepted;
                return true;
            }
        }
        false
    }
}

/// Runs overlay strategies against a frame.
///
/// Without a validator no overlay support exists and every frame is left
/// alone.
pub struct OverlayProcessor {
    validator: Option<Box<dyn OverlayCandidateValidator>>,
    strategies: Vec<Box<dyn OverlayStrategy>>,
}

impl fmt::Debug for OverlayProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayProcessor")
            .field("validator", &self.validator.is_some())
            .field("strategies", &self.strategies)
            .finish()
    }
}

impl OverlayProcessor {
    /// Creates a processor using the validator's preferred strategies.
    #[must_use]
    pub fn new(validator: Option<Box<dyn OverlayCandidateValidator>>) -> Self {
        let strategies = validator
            .as_ref()
            .map(|v| v.strategies())
            .unwrap_or_default();
        Self {
            validator,
            strategies,
        }
    }

    /// Creates a processor with an explicit strategy order.
    #[must_use]
    pub fn with_strategies(
        validator: Box<dyn OverlayCandidateValidator>,
        strategies: Vec<Box<dyn OverlayStrategy>>,
    ) -> Self {
        Self {
            validator: Some(validator),
            strategies,
        }
    }

    /// Whether a validator is installed.
    #[must_use]
    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// The strategies in the order they are tried.
    #[must_use]
    pub fn strategies(&self) -> &[Box<dyn OverlayStrategy>] {
        &self.strategies
    }

    /// Tries each strategy in order and stops at the first that promotes a
    /// quad. Returns whether any did.
    pub fn process_for_overlays(
        &mut self,
        passes: &mut [RenderPass],
        candidates: &mut OverlayCandidateList,
    ) -> bool {
        let Some(validator) = self.validator.as_deref_mut() else {
            return false;
        };
        self.strategies
            .iter()
            .any(|strategy| strategy.attempt(validator, passes, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::IntSize;
    use crate::id::{RenderPassId, ResourceId, SharedQuadStateId};
    use crate::quad::{Material, SolidColorQuad, TextureQuad};
    use crate::transform::Transform3d;
    use kurbo::Point;

    /// Accepts every candidate and remembers how many lists it saw.
    #[derive(Debug, Default)]
    struct AcceptAll {
        calls: usize,
    }

    impl OverlayCandidateValidator for AcceptAll {
        fn check_overlay_support(&mut self, candidates: &mut [OverlayCandidate]) {
            self.calls += 1;
            for c in candidates {
                c.overlay_handled = true;
            }
        }
    }

    /// Accepts only underlays.
    #[derive(Debug)]
    struct UnderlayOnly;

    impl OverlayCandidateValidator for UnderlayOnly {
        fn check_overlay_support(&mut self, candidates: &mut [OverlayCandidate]) {
            for c in candidates {
                c.overlay_handled = c.plane_z_order < 0;
            }
        }
    }

    #[derive(Debug)]
    struct RejectAll;

    impl OverlayCandidateValidator for RejectAll {
        fn check_overlay_support(&mut self, _candidates: &mut [OverlayCandidate]) {}
    }

    const FULL: IntRect = IntRect::new(0, 0, 256, 256);
    const OVERLAY_RECT: IntRect = IntRect::new(0, 0, 128, 128);

    fn root_pass() -> RenderPass {
        let mut pass = RenderPass::new();
        pass.set_new(RenderPassId::new(1, 1), FULL, FULL, Transform3d::IDENTITY);
        pass.create_and_append_shared_quad_state();
        pass
    }

    fn push_overlay_texture(pass: &mut RenderPass, rect: IntRect) {
        let quad = pass.create_and_append_draw_quad();
        TextureQuad::set_all(
            quad,
            SharedQuadStateId(0),
            rect,
            rect,
            rect,
            false,
            ResourceId(9),
            IntSize::new(rect.width, rect.height),
            true,
            false,
            Point::ZERO,
            Point::new(1.0, 1.0),
            Color::TRANSPARENT,
            [1.0; 4],
            false,
            false,
        );
    }

    fn push_solid(pass: &mut RenderPass, rect: IntRect, color: Color) {
        let quad = pass.create_and_append_draw_quad();
        SolidColorQuad::set_new(quad, SharedQuadStateId(0), rect, rect, color, false);
    }

    fn materials(pass: &RenderPass) -> Vec<Material> {
        pass.quad_list.iter().map(DrawQuad::material).collect()
    }

    #[test]
    fn single_on_top_erases_promoted_quad() {
        let mut passes = vec![root_pass()];
        push_solid(&mut passes[0], FULL, Color::WHITE);
        push_overlay_texture(&mut passes[0], OVERLAY_RECT);

        let mut candidates = OverlayCandidateList::new();
        let mut validator = AcceptAll::default();
        assert!(SingleOnTop.attempt(&mut validator, &mut passes, &mut candidates));

        assert_eq!(materials(&passes[0]), [Material::SolidColor]);
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].use_output_surface_for_resource);
        assert_eq!(candidates[0].plane_z_order, 0);
        assert_eq!(candidates[0].display_rect, FULL.to_rect());
        assert_eq!(candidates[1].plane_z_order, 1);
        assert!(candidates[1].overlay_handled);
        assert!(!candidates[1].use_output_surface_for_resource);
        assert_eq!(candidates[1].resource_id, ResourceId(9));
    }

    #[test]
    fn single_on_top_skips_quads_covered_from_above() {
        let mut passes = vec![root_pass()];
        push_overlay_texture(&mut passes[0], OVERLAY_RECT);
        push_solid(&mut passes[0], IntRect::new(64, 64, 16, 16), Color::RED);

        let mut candidates = OverlayCandidateList::new();
        let mut validator = AcceptAll::default();
        assert!(!SingleOnTop.attempt(&mut validator, &mut passes, &mut candidates));
        assert_eq!(validator.calls, 0);
        assert_eq!(passes[0].quad_list.len(), 2);
        assert!(candidates.is_empty());
    }

    #[test]
    fn single_on_top_ignores_invisible_and_disjoint_quads_above() {
        let mut passes = vec![root_pass()];
        push_overlay_texture(&mut passes[0], OVERLAY_RECT);
        push_solid(&mut passes[0], IntRect::new(0, 0, 32, 32), Color::TRANSPARENT);
        push_solid(&mut passes[0], IntRect::new(200, 200, 16, 16), Color::RED);

        let mut candidates = OverlayCandidateList::new();
        assert!(SingleOnTop.attempt(&mut AcceptAll::default(), &mut passes, &mut candidates));
        assert_eq!(materials(&passes[0]), [Material::SolidColor, Material::SolidColor]);
    }

    #[test]
    fn rejected_candidate_leaves_frame_untouched() {
        let mut passes = vec![root_pass()];
        push_overlay_texture(&mut passes[0], OVERLAY_RECT);
        let mut candidates = OverlayCandidateList::new();
        assert!(!SingleOnTop.attempt(&mut RejectAll, &mut passes, &mut candidates));
        assert!(!Underlay.attempt(&mut RejectAll, &mut passes, &mut candidates));
        assert_eq!(materials(&passes[0]), [Material::Texture]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn underlay_punches_transparent_hole() {
        let mut passes = vec![root_pass()];
        push_overlay_texture(&mut passes[0], OVERLAY_RECT);
        push_solid(&mut passes[0], IntRect::new(64, 64, 16, 16), Color::RED);

        let mut candidates = OverlayCandidateList::new();
        assert!(Underlay.attempt(&mut AcceptAll::default(), &mut passes, &mut candidates));
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].use_output_surface_for_resource);
        assert_eq!(candidates[1].plane_z_order, -1);

        let root = &passes[0];
        assert_eq!(materials(root), [Material::SolidColor, Material::SolidColor]);
        let hole = &root.quad_list[0];
        assert_eq!(hole.rect, OVERLAY_RECT);
        assert!(!hole.should_draw_with_blending(root.state_for(hole)));
        assert_eq!(hole.as_solid_color().map(|s| s.color), Some(Color::TRANSPARENT));
    }

    #[test]
    fn processor_falls_back_to_underlay() {
        let mut passes = vec![root_pass()];
        push_overlay_texture(&mut passes[0], OVERLAY_RECT);
        let mut processor = OverlayProcessor::new(Some(Box::new(UnderlayOnly)));
        assert_eq!(processor.strategies().len(), 2);

        let mut candidates = OverlayCandidateList::new();
        assert!(processor.process_for_overlays(&mut passes, &mut candidates));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].plane_z_order, -1);
        assert_eq!(materials(&passes[0]), [Material::SolidColor]);
    }

    /// Records every list it is shown and accepts only the last entry.
    #[derive(Debug, Default)]
    struct Snapshot {
        seen: Vec<OverlayCandidateList>,
    }

    impl OverlayCandidateValidator for Snapshot {
        fn check_overlay_support(&mut self, candidates: &mut [OverlayCandidate]) {
            self.seen.push(candidates.to_vec());
            if let Some(last) = candidates.last_mut() {
                last.overlay_handled = true;
            }
        }
    }

    #[test]
    fn validator_sees_main_plane_below_underlay() {
        let mut passes = vec![root_pass()];
        push_overlay_texture(&mut passes[0], OVERLAY_RECT);
        let mut validator = Snapshot::default();
        let mut candidates = OverlayCandidateList::new();
        assert!(Underlay.attempt(&mut validator, &mut passes, &mut candidates));

        assert_eq!(validator.seen.len(), 1);
        let trial = &validator.seen[0];
        assert_eq!(trial.len(), 2);
        assert!(trial[0].use_output_surface_for_resource);
        assert_eq!(trial[0].plane_z_order, 0);
        assert_eq!(trial[0].display_rect, FULL.to_rect());
        assert_eq!(trial[1].plane_z_order, -1);
        assert_eq!(trial[1].display_rect, OVERLAY_RECT.to_rect());
        // Only the tried plane's verdict matters.
        assert!(!candidates[0].overlay_handled);
        assert!(candidates[1].overlay_handled);
    }

    #[test]
    fn processor_without_validator_does_nothing() {
        let mut passes = vec![root_pass()];
        push_overlay_texture(&mut passes[0], OVERLAY_RECT);
        let mut processor = OverlayProcessor::new(None);
        assert!(!processor.has_validator());
        let mut candidates = OverlayCandidateList::new();
        assert!(!processor.process_for_overlays(&mut passes, &mut candidates));
        assert_eq!(materials(&passes[0]), [Material::Texture]);
    }

    #[test]
    fn empty_frame_is_not_an_error() {
        let mut candidates = OverlayCandidateList::new();
        let mut processor = OverlayProcessor::with_strategies(
            Box::new(AcceptAll::default()),
            vec![Box::new(SingleOnTop)],
        );
        assert!(!processor.process_for_overlays(&mut [], &mut candidates));
    }
}
