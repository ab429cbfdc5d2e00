// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity types for resources, surfaces, passes, and shared states.

use core::fmt;

/// An opaque handle into an external resource table.
///
/// Ids are assigned by the resource provider and carried by quads without
/// interpretation. `ResourceId(0)` means "no resource".
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// The "no resource" id.
    pub const NONE: Self = Self(0);

    /// Returns `true` for any id other than [`ResourceId::NONE`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

/// An opaque reference to a surface embedded from another compositor.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// Identifies a render pass: the layer that owns it plus a per-layer index.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderPassId {
    /// Owning layer id.
    pub layer_id: i32,
    /// Index among the layer's passes.
    pub index: u32,
}

impl RenderPassId {
    /// Creates a pass id.
    #[inline]
    #[must_use]
    pub const fn new(layer_id: i32, index: u32) -> Self {
        Self { layer_id, index }
    }

    /// The default id is `(0, 0)` and is not valid for a constructed pass.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.layer_id != 0 || self.index != 0
    }
}

impl fmt::Debug for RenderPassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderPassId({}.{})", self.layer_id, self.index)
    }
}

/// Index of a [`SharedQuadState`](crate::shared_quad_state::SharedQuadState)
/// within its owning pass.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SharedQuadStateId(pub u32);

impl SharedQuadStateId {
    /// Returns the index as `usize`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SharedQuadStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedQuadStateId({})", self.0)
    }
}
