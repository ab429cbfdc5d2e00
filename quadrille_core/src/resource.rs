// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-size per-quad resource id lists.

use crate::id::ResourceId;

/// Upper bound on resources a single quad may cite (Y, U, V, and A planes).
pub const MAX_RESOURCES: usize = 4;

/// The resource ids a quad cites, in material-defined order.
///
/// Only the first `count` ids are meaningful; iteration never yields more.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceList {
    /// Id storage. Entries at or after `count` are unused.
    pub ids: [ResourceId; MAX_RESOURCES],
    /// Number of ids in use.
    pub count: u32,
}

impl ResourceList {
    /// An empty list.
    pub const EMPTY: Self = Self {
        ids: [ResourceId::NONE; MAX_RESOURCES],
        count: 0,
    };

    /// A list holding one id.
    #[must_use]
    pub const fn one(id: ResourceId) -> Self {
        let mut list = Self::EMPTY;
        list.ids[0] = id;
        list.count = 1;
        list
    }

    /// A list holding the given ids.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_RESOURCES`] ids are given.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "length is bounded by MAX_RESOURCES"
    )]
    pub fn from_slice(ids: &[ResourceId]) -> Self {
        assert!(
            ids.len() <= MAX_RESOURCES,
            "a quad cites at most {MAX_RESOURCES} resources, got {}",
            ids.len()
        );
        let mut list = Self::EMPTY;
        list.ids[..ids.len()].copy_from_slice(ids);
        list.count = ids.len() as u32;
        list
    }

    /// Number of ids in use.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count as usize
    }

    /// Returns `true` when no id is in use.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The id at `index`, if it is in use.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ResourceId> {
        self.as_slice().get(index).copied()
    }

    /// The ids in use.
    #[must_use]
    pub fn as_slice(&self) -> &[ResourceId] {
        &self.ids[..self.len()]
    }

    /// Iterates over the ids in use.
    pub fn iter(&self) -> core::slice::Iter<'_, ResourceId> {
        self.as_slice().iter()
    }

    /// Iterates mutably over the ids in use, for id remapping.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, ResourceId> {
        let len = self.len();
        self.ids[..len].iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_stops_at_count() {
        let mut list = ResourceList::from_slice(&[ResourceId(1), ResourceId(2), ResourceId(3)]);
        for id in list.iter_mut() {
            id.0 += 1;
        }
        assert_eq!(list.iter().count(), 3);
        assert_eq!(list.as_slice(), &[ResourceId(2), ResourceId(3), ResourceId(4)]);
        // The unused slot is untouched.
        assert_eq!(list.ids[3], ResourceId::NONE);
    }

    #[test]
    #[should_panic(expected = "at most")]
    fn too_many_ids_panics() {
        let _ = ResourceList::from_slice(&[ResourceId(1); 5]);
    }
}
