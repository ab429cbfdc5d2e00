// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The root raster surface and its damage bookkeeping.

use std::fmt;

use quadrille_core::geometry::{IntRect, IntSize};
use tiny_skia::Pixmap;

use crate::error::OutputError;

/// A region of the output that changed since the last swap.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DamageRegion {
    /// The entire output changed.
    #[default]
    Full,
    /// The union of these device-space rects changed.
    Rects(Vec<IntRect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&mut *self, other) {
            (Self::Full, _) | (_, Self::None) => {}
            (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (Self::Rects(a), Self::Rects(b)) => a.extend_from_slice(b),
        }
    }

    /// Adds one rect. Empty rects are ignored.
    pub fn add_rect(&mut self, rect: IntRect) {
        if rect.is_empty() {
            return;
        }
        match self {
            Self::Full => {}
            Self::Rects(rects) => rects.push(rect),
            Self::None => *self = Self::Rects(vec![rect]),
        }
    }

    /// Bounding box of the damage, clamped to `viewport`.
    #[must_use]
    pub fn bounds(&self, viewport: IntRect) -> IntRect {
        match self {
            Self::Full => viewport,
            Self::Rects(rects) => rects
                .iter()
                .fold(IntRect::default(), |acc, r| acc.union(*r))
                .intersection(viewport),
            Self::None => IntRect::default(),
        }
    }
}

/// Result of [`SoftwareOutputDevice::swap_buffers`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapResult {
    /// Number of frames presented before this one.
    pub frame_index: u64,
    /// What changed since the previous swap.
    pub damage: DamageRegion,
}

/// Owns the root pass's target bitmap.
///
/// Painting happens between [`begin_paint`](Self::begin_paint) and
/// [`end_paint`](Self::end_paint); every painted rect accumulates into the
/// damage reported by the next [`swap_buffers`](Self::swap_buffers).
pub struct SoftwareOutputDevice {
    pixmap: Pixmap,
    scale_factor: f32,
    damage: DamageRegion,
    painting: bool,
    frame_count: u64,
}

impl fmt::Debug for SoftwareOutputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareOutputDevice")
            .field("size", &self.size())
            .field("scale_factor", &self.scale_factor)
            .field("damage", &self.damage)
            .field("painting", &self.painting)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

fn allocate(size: IntSize) -> Result<Pixmap, OutputError> {
    if size.is_empty() {
        return Err(OutputError::ZeroSize);
    }
    let width = u32::try_from(size.width).map_err(|_| OutputError::TooLarge(size))?;
    let height = u32::try_from(size.height).map_err(|_| OutputError::TooLarge(size))?;
    Pixmap::new(width, height).ok_or(OutputError::TooLarge(size))
}

impl SoftwareOutputDevice {
    /// Creates a transparent surface at scale 1.
    pub fn new(size: IntSize) -> Result<Self, OutputError> {
        Ok(Self {
            pixmap: allocate(size)?,
            scale_factor: 1.0,
            damage: DamageRegion::Full,
            painting: false,
            frame_count: 0,
        })
    }

    /// Reallocates the surface. The contents are discarded and the next swap
    /// reports full damage. Resizing to the current size and scale is a
    /// no-op.
    pub fn resize(&mut self, size: IntSize, scale_factor: f32) -> Result<(), OutputError> {
        if size == self.size() && scale_factor == self.scale_factor {
            return Ok(());
        }
        self.pixmap = allocate(size)?;
        self.scale_factor = scale_factor;
        self.damage = DamageRegion::Full;
        Ok(())
    }

    /// Surface size in device pixels.
    #[must_use]
    pub fn size(&self) -> IntSize {
        crate::resource_provider::pixmap_size(self.pixmap.as_ref())
    }

    /// Device scale factor the surface was sized for.
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// The whole surface as a rect at the origin.
    #[must_use]
    pub fn bounds(&self) -> IntRect {
        IntRect::from_size(self.size())
    }

    /// Starts painting `damage` and returns the surface to paint into.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if a paint is already in progress.
    pub fn begin_paint(&mut self, damage: IntRect) -> &mut Pixmap {
        debug_assert!(!self.painting, "begin_paint without end_paint");
        self.painting = true;
        self.damage.add_rect(damage.intersection(self.bounds()));
        &mut self.pixmap
    }

    /// Finishes the paint started by [`begin_paint`](Self::begin_paint).
    pub fn end_paint(&mut self) {
        debug_assert!(self.painting, "end_paint without begin_paint");
        self.painting = false;
    }

    /// Whether a paint is in progress.
    #[must_use]
    pub fn is_painting(&self) -> bool {
        self.painting
    }

    /// The surface, for reading back presented pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Mutable access to the surface while a paint is in progress.
    pub(crate) fn pixmap_mut(&mut self) -> &mut Pixmap {
        debug_assert!(self.painting, "surface written outside a paint");
        &mut self.pixmap
    }

    /// Damage accumulated since the last swap.
    #[must_use]
    pub fn pending_damage(&self) -> &DamageRegion {
        &self.damage
    }

    /// Presents the surface and resets the accumulated damage.
    pub fn swap_buffers(&mut self) -> SwapResult {
        debug_assert!(!self.painting, "swap_buffers during a paint");
        let damage = core::mem::replace(&mut self.damage, DamageRegion::None);
        let frame_index = self.frame_count;
        self.frame_count += 1;
        SwapResult {
            frame_index,
            damage,
        }
    }

    /// Number of swaps so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
