// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filter operation chains applied to render-pass content and backdrops.

use alloc::vec::Vec;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::color::Color;
use crate::geometry::IntRect;

/// A row-major 4×5 color matrix over unpremultiplied, normalized channels.
///
/// Row `i` computes output channel `i` (R, G, B, A) as
/// `m[i*5]*r + m[i*5+1]*g + m[i*5+2]*b + m[i*5+3]*a + m[i*5+4]`.
pub type ColorMatrix = [f32; 20];

/// The identity color matrix.
pub const IDENTITY_COLOR_MATRIX: ColorMatrix = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// One step of a filter chain.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterOperation {
    /// Desaturate by `amount` in `[0, 1]`.
    Grayscale(f32),
    /// Sepia tone by `amount` in `[0, 1]`.
    Sepia(f32),
    /// Saturation multiplier; 1 is identity.
    Saturate(f32),
    /// Hue rotation in degrees.
    HueRotate(f32),
    /// Invert by `amount` in `[0, 1]`.
    Invert(f32),
    /// Multiply color channels.
    Brightness(f32),
    /// Scale channels around mid-gray.
    Contrast(f32),
    /// Multiply alpha.
    Opacity(f32),
    /// Gaussian blur with the given standard deviation.
    Blur(f32),
    /// Blurred, offset, tinted copy of the alpha drawn beneath the content.
    DropShadow {
        /// Shadow offset in pixels.
        offset: (i32, i32),
        /// Shadow blur standard deviation.
        std_deviation: f32,
        /// Shadow color.
        color: Color,
    },
    /// Arbitrary color matrix; the fifth column is a normalized offset.
    ColorMatrix(ColorMatrix),
    /// Magnify the center of the content.
    Zoom {
        /// Magnification factor; 1 is identity.
        amount: f32,
        /// Width of the blended border, in pixels.
        inset: i32,
    },
    /// Add a constant to every color channel.
    SaturatingBrightness(f32),
    /// Raise alpha inside `region` to at least `inner_threshold` and lower
    /// alpha outside it to at most `outer_threshold`.
    AlphaThreshold {
        /// Region in content space.
        region: Vec<IntRect>,
        /// Minimum alpha inside the region.
        inner_threshold: f32,
        /// Maximum alpha outside the region.
        outer_threshold: f32,
    },
}

impl FilterOperation {
    /// Short name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Grayscale(_) => "grayscale",
            Self::Sepia(_) => "sepia",
            Self::Saturate(_) => "saturate",
            Self::HueRotate(_) => "hue-rotate",
            Self::Invert(_) => "invert",
            Self::Brightness(_) => "brightness",
            Self::Contrast(_) => "contrast",
            Self::Opacity(_) => "opacity",
            Self::Blur(_) => "blur",
            Self::DropShadow { .. } => "drop-shadow",
            Self::ColorMatrix(_) => "color-matrix",
            Self::Zoom { .. } => "zoom",
            Self::SaturatingBrightness(_) => "saturating-brightness",
            Self::AlphaThreshold { .. } => "alpha-threshold",
        }
    }

    /// The color matrix equivalent of a per-pixel color operation, or `None`
    /// for operations that move pixels or depend on position.
    #[must_use]
    pub fn to_color_matrix(&self) -> Option<ColorMatrix> {
        let mut m = [0.0_f32; 20];
        m[18] = 1.0;
        match *self {
            Self::Grayscale(amount) => {
                let c = 1.0 - amount.clamp(0.0, 1.0);
                m[0] = 0.2126 + 0.7874 * c;
                m[1] = 0.7152 - 0.7152 * c;
                m[2] = 0.0722 - 0.0722 * c;
                m[5] = 0.2126 - 0.2126 * c;
                m[6] = 0.7152 + 0.2848 * c;
                m[7] = 0.0722 - 0.0722 * c;
                m[10] = 0.2126 - 0.2126 * c;
                m[11] = 0.7152 - 0.7152 * c;
                m[12] = 0.0722 + 0.9278 * c;
            }
            Self::Sepia(amount) => {
                let c = 1.0 - amount.clamp(0.0, 1.0);
                m[0] = 0.393 + 0.607 * c;
                m[1] = 0.769 - 0.769 * c;
                m[2] = 0.189 - 0.189 * c;
                m[5] = 0.349 - 0.349 * c;
                m[6] = 0.686 + 0.314 * c;
                m[7] = 0.168 - 0.168 * c;
                m[10] = 0.272 - 0.272 * c;
                m[11] = 0.534 - 0.534 * c;
                m[12] = 0.131 + 0.869 * c;
            }
            Self::Saturate(s) => {
                m[0] = 0.213 + 0.787 * s;
                m[1] = 0.715 - 0.715 * s;
                m[2] = 0.072 - 0.072 * s;
                m[5] = 0.213 - 0.213 * s;
                m[6] = 0.715 + 0.285 * s;
                m[7] = 0.072 - 0.072 * s;
                m[10] = 0.213 - 0.213 * s;
                m[11] = 0.715 - 0.715 * s;
                m[12] = 0.072 + 0.928 * s;
            }
            Self::HueRotate(degrees) => {
                let radians = f64::from(degrees).to_radians();
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "trigonometry in f64, matrix stored in f32"
                )]
                let (sin, cos) = (radians.sin() as f32, radians.cos() as f32);
                m[0] = 0.213 + cos * 0.787 - sin * 0.213;
                m[1] = 0.715 - cos * 0.715 - sin * 0.715;
                m[2] = 0.072 - cos * 0.072 + sin * 0.928;
                m[5] = 0.213 - cos * 0.213 + sin * 0.143;
                m[6] = 0.715 + cos * 0.285 + sin * 0.140;
                m[7] = 0.072 - cos * 0.072 - sin * 0.283;
                m[10] = 0.213 - cos * 0.213 - sin * 0.787;
                m[11] = 0.715 - cos * 0.715 + sin * 0.715;
                m[12] = 0.072 + cos * 0.928 + sin * 0.072;
            }
            Self::Invert(amount) => {
                let a = amount.clamp(0.0, 1.0);
                m[0] = 1.0 - 2.0 * a;
                m[4] = a;
                m[6] = 1.0 - 2.0 * a;
                m[9] = a;
                m[12] = 1.0 - 2.0 * a;
                m[14] = a;
            }
            Self::Brightness(amount) => {
                m[0] = amount;
                m[6] = amount;
                m[12] = amount;
            }
            Self::SaturatingBrightness(amount) => {
                m[0] = 1.0;
                m[4] = amount;
                m[6] = 1.0;
                m[9] = amount;
                m[12] = 1.0;
                m[14] = amount;
            }
            Self::Contrast(amount) => {
                let offset = (1.0 - amount) * 0.5;
                m[0] = amount;
                m[4] = offset;
                m[6] = amount;
                m[9] = offset;
                m[12] = amount;
                m[14] = offset;
            }
            Self::Opacity(amount) => {
                m[0] = 1.0;
                m[6] = 1.0;
                m[12] = 1.0;
                m[18] = amount;
            }
            Self::ColorMatrix(matrix) => return Some(matrix),
            Self::Blur(_)
            | Self::DropShadow { .. }
            | Self::Zoom { .. }
            | Self::AlphaThreshold { .. } => return None,
        }
        Some(m)
    }
}

/// Pixel spread of a Gaussian blur approximated by three box filters.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "spread is a small non-negative pixel count"
)]
pub fn spread_for_std_deviation(std_deviation: f32) -> i32 {
    // sqrt(2 * pi)
    const SQRT_TAU: f64 = 2.506_628_274_631_000_2;
    let std_deviation = f64::from(std_deviation);
    let d = (std_deviation * 3.0 * SQRT_TAU / 4.0 + 0.5).floor();
    (d * 3.0 / 2.0).ceil() as i32
}

/// How far a filter chain can move pixels past the content bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterOutsets {
    /// Pixels above the content.
    pub top: i32,
    /// Pixels right of the content.
    pub right: i32,
    /// Pixels below the content.
    pub bottom: i32,
    /// Pixels left of the content.
    pub left: i32,
}

impl FilterOutsets {
    /// Returns `rect` grown by the outsets.
    #[must_use]
    pub const fn expand(self, rect: IntRect) -> IntRect {
        rect.inset(-self.left, -self.top, -self.right, -self.bottom)
    }
}

/// An ordered filter chain. Operations apply in list order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterOperations {
    operations: Vec<FilterOperation>,
}

impl FilterOperations {
    /// Creates an empty chain.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    /// Returns `true` for the identity chain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Appends an operation.
    pub fn append(&mut self, op: FilterOperation) {
        self.operations.push(op);
    }

    /// Removes every operation.
    pub fn clear(&mut self) {
        self.operations.clear();
    }

    /// The operation at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&FilterOperation> {
        self.operations.get(index)
    }

    /// Iterates over operations in application order.
    pub fn iter(&self) -> core::slice::Iter<'_, FilterOperation> {
        self.operations.iter()
    }

    /// Accumulated outsets of every blur and drop shadow in the chain.
    #[must_use]
    pub fn outsets(&self) -> FilterOutsets {
        let mut out = FilterOutsets::default();
        for op in &self.operations {
            match *op {
                FilterOperation::Blur(std_deviation) => {
                    let spread = spread_for_std_deviation(std_deviation);
                    out.top += spread;
                    out.right += spread;
                    out.bottom += spread;
                    out.left += spread;
                }
                FilterOperation::DropShadow {
                    offset: (dx, dy),
                    std_deviation,
                    ..
                } => {
                    let spread = spread_for_std_deviation(std_deviation);
                    out.top += spread - dy;
                    out.right += spread + dx;
                    out.bottom += spread + dy;
                    out.left += spread - dx;
                }
                _ => {}
            }
        }
        out
    }

    /// Returns `true` when some operation samples pixels other than the one
    /// it writes.
    #[must_use]
    pub fn has_filter_that_moves_pixels(&self) -> bool {
        self.operations.iter().any(|op| {
            matches!(
                op,
                FilterOperation::Blur(_)
                    | FilterOperation::DropShadow { .. }
                    | FilterOperation::Zoom { .. }
            )
        })
    }

    /// Returns `true` when some operation can make transparent pixels
    /// non-transparent or change alpha.
    #[must_use]
    pub fn has_filter_that_affects_opacity(&self) -> bool {
        self.operations.iter().any(|op| match op {
            FilterOperation::Opacity(_)
            | FilterOperation::Blur(_)
            | FilterOperation::DropShadow { .. }
            | FilterOperation::Zoom { .. }
            | FilterOperation::AlphaThreshold { .. } => true,
            FilterOperation::ColorMatrix(m) => {
                m[15] != 0.0 || m[16] != 0.0 || m[17] != 0.0 || m[18] != 1.0 || m[19] != 0.0
            }
            _ => false,
        })
    }
}

impl FromIterator<FilterOperation> for FilterOperations {
    fn from_iter<I: IntoIterator<Item = FilterOperation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FilterOperations {
    type Item = &'a FilterOperation;
    type IntoIter = core::slice::Iter<'a, FilterOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
