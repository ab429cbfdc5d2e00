// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable failures of the software backend.

use core::fmt;

use quadrille_core::geometry::IntSize;
use quadrille_core::id::ResourceId;

/// Why a resource could not be created, written, or locked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceError {
    /// No resource has this id.
    UnknownId(ResourceId),
    /// The resource is not backed by a software bitmap.
    NotSoftware(ResourceId),
    /// Uploaded pixels do not match the resource size.
    SizeMismatch {
        /// The resource written to.
        id: ResourceId,
        /// Size of the resource.
        expected: IntSize,
        /// Size implied by the upload.
        found: IntSize,
    },
    /// A bitmap of this size cannot be allocated.
    InvalidSize(IntSize),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownId(id) => write!(f, "unknown resource {}", id.0),
            Self::NotSoftware(id) => write!(f, "resource {} is not a software bitmap", id.0),
            Self::SizeMismatch {
                id,
                expected,
                found,
            } => write!(
                f,
                "resource {} is {}x{}, upload is {}x{}",
                id.0, expected.width, expected.height, found.width, found.height
            ),
            Self::InvalidSize(size) => {
                write!(f, "cannot allocate a {}x{} bitmap", size.width, size.height)
            }
        }
    }
}

impl core::error::Error for ResourceError {}

/// Why the output surface could not be (re)allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputError {
    /// Width or height is zero.
    ZeroSize,
    /// The surface exceeds the rasterizer's limits.
    TooLarge(IntSize),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => f.write_str("output surface has zero size"),
            Self::TooLarge(size) => write!(
                f,
                "output surface {}x{} is too large",
                size.width, size.height
            ),
        }
    }
}

impl core::error::Error for OutputError {}
