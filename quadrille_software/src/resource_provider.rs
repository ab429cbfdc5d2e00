// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Id-keyed bitmap storage with scoped locks.
//!
//! Quads cite resources by [`ResourceId`]. The renderer resolves an id with
//! [`SoftwareResourceProvider::lock_for_read`], which returns a
//! [`ScopedReadLockSoftware`] guard. The guard borrows the provider, so no
//! resource can be deleted or written while a draw holds it, and dropping the
//! guard on any exit path releases the lock.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use quadrille_core::geometry::IntSize;
use quadrille_core::id::ResourceId;
use tiny_skia::{Pixmap, PixmapMut, PixmapRef};

use crate::error::ResourceError;

/// How sampling outside a resource's bounds behaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Repeat the edge pixels.
    #[default]
    ClampToEdge,
    /// Tile the resource.
    Repeat,
}

impl WrapMode {
    pub(crate) const fn spread_mode(self) -> tiny_skia::SpreadMode {
        match self {
            Self::ClampToEdge => tiny_skia::SpreadMode::Pad,
            Self::Repeat => tiny_skia::SpreadMode::Repeat,
        }
    }
}

enum Backing {
    Bitmap(Pixmap),
    /// A texture owned by a GPU context; the software path cannot read it.
    GpuTexture(IntSize),
}

struct Entry {
    backing: Backing,
    wrap_mode: WrapMode,
    read_locks: Cell<u32>,
}

impl Entry {
    fn size(&self) -> IntSize {
        match &self.backing {
            Backing::Bitmap(pixmap) => pixmap_size(pixmap.as_ref()),
            Backing::GpuTexture(size) => *size,
        }
    }
}

pub(crate) fn pixmap_size(pixmap: PixmapRef<'_>) -> IntSize {
    IntSize::new(
        i32::try_from(pixmap.width()).unwrap_or(i32::MAX),
        i32::try_from(pixmap.height()).unwrap_or(i32::MAX),
    )
}

pub(crate) fn new_pixmap(size: IntSize) -> Option<Pixmap> {
    let width = u32::try_from(size.width).ok()?;
    let height = u32::try_from(size.height).ok()?;
    Pixmap::new(width, height)
}

/// Owns the bitmaps quads refer to.
///
/// Ids start at 1; [`ResourceId::NONE`] is never assigned.
#[derive(Default)]
pub struct SoftwareResourceProvider {
    entries: BTreeMap<ResourceId, Entry>,
    next_id: u32,
}

impl fmt::Debug for SoftwareResourceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareResourceProvider")
            .field("resources", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl SoftwareResourceProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, backing: Backing) -> ResourceId {
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        self.entries.insert(
            id,
            Entry {
                backing,
                wrap_mode: WrapMode::default(),
                read_locks: Cell::new(0),
            },
        );
        id
    }

    /// Allocates a transparent bitmap.
    pub fn create_resource(&mut self, size: IntSize) -> Result<ResourceId, ResourceError> {
        let pixmap = new_pixmap(size).ok_or(ResourceError::InvalidSize(size))?;
        Ok(self.insert(Backing::Bitmap(pixmap)))
    }

    /// Takes ownership of an existing bitmap.
    pub fn create_resource_from_pixmap(&mut self, pixmap: Pixmap) -> ResourceId {
        self.insert(Backing::Bitmap(pixmap))
    }

    /// Registers a texture that lives outside this provider. Locking it for
    /// software access fails with [`ResourceError::NotSoftware`].
    pub fn import_gpu_texture(&mut self, size: IntSize) -> ResourceId {
        self.insert(Backing::GpuTexture(size))
    }

    /// Replaces the pixels of a bitmap resource.
    ///
    /// `rgba_premul` holds premultiplied RGBA8 rows of `size`, which must
    /// equal the resource size.
    pub fn upload(
        &mut self,
        id: ResourceId,
        size: IntSize,
        rgba_premul: &[u8],
    ) -> Result<(), ResourceError> {
        let lock = self.lock_for_write(id)?;
        let expected = lock.size();
        if size != expected || rgba_premul.len() != lock.pixmap.data().len() {
            return Err(ResourceError::SizeMismatch {
                id,
                expected,
                found: size,
            });
        }
        lock.pixmap.data_mut().copy_from_slice(rgba_premul);
        Ok(())
    }

    /// Sets how the resource is sampled outside its bounds.
    pub fn set_wrap_mode(&mut self, id: ResourceId, wrap_mode: WrapMode) -> Result<(), ResourceError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(ResourceError::UnknownId(id))?;
        entry.wrap_mode = wrap_mode;
        Ok(())
    }

    /// Frees a resource.
    pub fn delete_resource(&mut self, id: ResourceId) -> Result<(), ResourceError> {
        let entry = self
            .entries
            .remove(&id)
            .ok_or(ResourceError::UnknownId(id))?;
        debug_assert_eq!(
            entry.read_locks.get(),
            0,
            "resource {id:?} deleted while locked"
        );
        Ok(())
    }

    /// Whether `id` names a live resource.
    #[must_use]
    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of live resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no resource is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of a resource.
    pub fn size(&self, id: ResourceId) -> Result<IntSize, ResourceError> {
        self.entries
            .get(&id)
            .map(Entry::size)
            .ok_or(ResourceError::UnknownId(id))
    }

    /// Whether a read lock on `id` is outstanding.
    #[must_use]
    pub fn in_use_by_consumer(&self, id: ResourceId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.read_locks.get() > 0)
    }

    /// Locks a bitmap resource for sampling.
    pub fn lock_for_read(&self, id: ResourceId) -> Result<ScopedReadLockSoftware<'_>, ResourceError> {
        let entry = self.entries.get(&id).ok_or(ResourceError::UnknownId(id))?;
        let Backing::Bitmap(pixmap) = &entry.backing else {
            return Err(ResourceError::NotSoftware(id));
        };
        entry.read_locks.set(entry.read_locks.get() + 1);
        Ok(ScopedReadLockSoftware {
            id,
            pixmap: pixmap.as_ref(),
            wrap_mode: entry.wrap_mode,
            read_locks: &entry.read_locks,
        })
    }

    /// Locks a bitmap resource for writing.
    pub fn lock_for_write(
        &mut self,
        id: ResourceId,
    ) -> Result<ScopedWriteLockSoftware<'_>, ResourceError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(ResourceError::UnknownId(id))?;
        let Backing::Bitmap(pixmap) = &mut entry.backing else {
            return Err(ResourceError::NotSoftware(id));
        };
        Ok(ScopedWriteLockSoftware { id, pixmap })
    }
}

/// Read access to one bitmap resource, released on drop.
pub struct ScopedReadLockSoftware<'a> {
    id: ResourceId,
    pixmap: PixmapRef<'a>,
    wrap_mode: WrapMode,
    read_locks: &'a Cell<u32>,
}

impl fmt::Debug for ScopedReadLockSoftware<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedReadLockSoftware")
            .field("id", &self.id)
            .field("size", &self.size())
            .field("wrap_mode", &self.wrap_mode)
            .finish_non_exhaustive()
    }
}

impl<'a> ScopedReadLockSoftware<'a> {
    /// The locked resource.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The locked pixels.
    #[must_use]
    pub fn pixmap(&self) -> PixmapRef<'a> {
        self.pixmap
    }

    /// Size of the locked bitmap.
    #[must_use]
    pub fn size(&self) -> IntSize {
        pixmap_size(self.pixmap)
    }

    /// Sampling behavior outside the bitmap.
    #[must_use]
    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }
}

impl Drop for ScopedReadLockSoftware<'_> {
    fn drop(&mut self) {
        self.read_locks.set(self.read_locks.get() - 1);
    }
}

/// Write access to one bitmap resource.
pub struct ScopedWriteLockSoftware<'a> {
    id: ResourceId,
    pixmap: &'a mut Pixmap,
}

impl fmt::Debug for ScopedWriteLockSoftware<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedWriteLockSoftware")
            .field("id", &self.id)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl ScopedWriteLockSoftware<'_> {
    /// The locked resource.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Size of the locked bitmap.
    #[must_use]
    pub fn size(&self) -> IntSize {
        pixmap_size(self.pixmap.as_ref())
    }

    /// Mutable access to the pixels.
    pub fn pixmap_mut(&mut self) -> PixmapMut<'_> {
        self.pixmap.as_mut()
    }
}
