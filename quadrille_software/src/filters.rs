// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster implementations of [`FilterOperations`].
//!
//! Every filter maps a premultiplied RGBA bitmap to a bitmap of the same
//! size. Pixels outside the bitmap read as transparent, so blurs and shadows
//! fade out at the edges rather than smearing edge pixels.
//!
//! Adjacent color-matrix operations are folded into one matrix unless the
//! first can produce out-of-range channels, since clamping between the two
//! would otherwise be lost.

use bytemuck::{Pod, Zeroable};
use kurbo::Vec2;
use quadrille_core::color::Color;
use quadrille_core::filter::{ColorMatrix, FilterOperation, FilterOperations};
use quadrille_core::geometry::IntRect;
use tiny_skia::{Pixmap, PixmapPaint, PixmapRef, Transform};

// ---------------------------------------------------------------------------
// Pixel view
// ---------------------------------------------------------------------------

/// One premultiplied RGBA8 pixel, laid out as tiny-skia stores it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct Rgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Rgba8 {
    fn to_f32(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }

    /// Premultiplied floats back to bytes; color never exceeds alpha.
    fn from_f32(v: [f32; 4]) -> Self {
        let a = to_u8(v[3]);
        Self {
            r: to_u8(v[0]).min(a),
            g: to_u8(v[1]).min(a),
            b: to_u8(v[2]).min(a),
            a,
        }
    }

    fn unpremultiplied(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_f32();
        if a == 0.0 {
            [0.0; 4]
        } else {
            [r / a, g / a, b / a, a]
        }
    }

    fn premultiplied(v: [f32; 4]) -> Self {
        let a = v[3].clamp(0.0, 1.0);
        Self::from_f32([
            v[0].clamp(0.0, 1.0) * a,
            v[1].clamp(0.0, 1.0) * a,
            v[2].clamp(0.0, 1.0) * a,
            a,
        ])
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is clamped to [0, 255] before the cast"
)]
pub(crate) fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn pixels_mut(pixmap: &mut Pixmap) -> &mut [Rgba8] {
    bytemuck::cast_slice_mut(pixmap.data_mut())
}

fn pixels(pixmap: &Pixmap) -> &[Rgba8] {
    bytemuck::cast_slice(pixmap.data())
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Applies `filters` to a copy of `source` and returns it.
///
/// `scale` multiplies blur deviations and shadow offsets, converting them
/// from layer to device pixels. Returns `None` only when the copy cannot be
/// allocated.
#[must_use]
pub fn apply_filters(
    source: PixmapRef<'_>,
    filters: &FilterOperations,
    scale: Vec2,
) -> Option<Pixmap> {
    let mut out = source.to_owned();
    let mut pending: Option<ColorMatrix> = None;
    for op in filters.iter() {
        if let Some(matrix) = op.to_color_matrix() {
            pending = Some(match pending {
                Some(first) if !needs_clamping(&first) => concat_color_matrices(&first, &matrix),
                Some(first) => {
                    apply_color_matrix(&mut out, &first);
                    matrix
                }
                None => matrix,
            });
            continue;
        }
        if let Some(matrix) = pending.take() {
            apply_color_matrix(&mut out, &matrix);
        }
        apply_spatial(&mut out, op, scale)?;
    }
    if let Some(matrix) = pending {
        apply_color_matrix(&mut out, &matrix);
    }
    Some(out)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "filter parameters are small and stored in f32"
)]
fn apply_spatial(pixmap: &mut Pixmap, op: &FilterOperation, scale: Vec2) -> Option<()> {
    let (sx, sy) = (scale.x as f32, scale.y as f32);
    match *op {
        FilterOperation::Blur(std_deviation) => {
            blur(pixmap, std_deviation * sx, std_deviation * sy);
        }
        FilterOperation::DropShadow {
            offset: (dx, dy),
            std_deviation,
            color,
        } => {
            let offset = (dx as f32 * sx, dy as f32 * sy);
            drop_shadow(
                pixmap,
                offset,
                (std_deviation * sx, std_deviation * sy),
                color,
            )?;
        }
        FilterOperation::Zoom { amount, inset } => zoom(pixmap, amount, inset),
        FilterOperation::AlphaThreshold {
            ref region,
            inner_threshold,
            outer_threshold,
        } => alpha_threshold(pixmap, region, inner_threshold, outer_threshold),
        // Color operations are handled by the caller.
        _ => {}
    }
    Some(())
}

// ---------------------------------------------------------------------------
// Color matrix
// ---------------------------------------------------------------------------

/// Applies a row-major 4×5 matrix to unpremultiplied channels.
pub fn apply_color_matrix(pixmap: &mut Pixmap, m: &ColorMatrix) {
    for px in pixels_mut(pixmap) {
        let c = px.unpremultiplied();
        let row = |i: usize| {
            m[i * 5] * c[0] + m[i * 5 + 1] * c[1] + m[i * 5 + 2] * c[2] + m[i * 5 + 3] * c[3]
                + m[i * 5 + 4]
        };
        *px = Rgba8::premultiplied([row(0), row(1), row(2), row(3)]);
    }
}

/// The matrix equivalent to applying `first` and then `second`.
#[must_use]
pub fn concat_color_matrices(first: &ColorMatrix, second: &ColorMatrix) -> ColorMatrix {
    let mut out = [0.0_f32; 20];
    for i in 0..4 {
        for j in 0..5 {
            let mut sum = (0..4).map(|k| second[i * 5 + k] * first[k * 5 + j]).sum::<f32>();
            if j == 4 {
                sum += second[i * 5 + 4];
            }
            out[i * 5 + j] = sum;
        }
    }
    out
}

/// Whether some input in `[0, 1]` maps outside `[0, 1]`.
fn needs_clamping(m: &ColorMatrix) -> bool {
    (0..4).any(|i| {
        let row = &m[i * 5..i * 5 + 5];
        let lo: f32 = row[..4].iter().map(|v| v.min(0.0)).sum::<f32>() + row[4];
        let hi: f32 = row[..4].iter().map(|v| v.max(0.0)).sum::<f32>() + row[4];
        lo < 0.0 || hi > 1.0
    })
}

// ---------------------------------------------------------------------------
// Blur
// ---------------------------------------------------------------------------

#[expect(
    clippy::cast_possible_truncation,
    reason = "radius is a small non-negative pixel count"
)]
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma.abs() * 3.0).ceil() as usize;
    if radius == 0 {
        return Vec::new();
    }
    let sigma_sq = sigma * sigma;
    let mut kernel: Vec<f32> = (0..=radius * 2)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / (2.0 * sigma_sq)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    if sum != 0.0 {
        for k in &mut kernel {
            *k /= sum;
        }
    }
    kernel
}

/// Separable Gaussian blur with independent horizontal and vertical
/// deviations.
pub fn blur(pixmap: &mut Pixmap, sigma_x: f32, sigma_y: f32) {
    let kernel_x = gaussian_kernel(sigma_x);
    let kernel_y = gaussian_kernel(sigma_y);
    if kernel_x.is_empty() && kernel_y.is_empty() {
        return;
    }
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let mut buf: Vec<[f32; 4]> = pixels(pixmap).iter().map(|p| p.to_f32()).collect();

    if !kernel_x.is_empty() {
        buf = convolve(&buf, width, height, &kernel_x, |x, y| (x, y), width);
    }
    if !kernel_y.is_empty() {
        buf = convolve(&buf, width, height, &kernel_y, |x, y| (y, x), height);
    }

    for (px, v) in pixels_mut(pixmap).iter_mut().zip(&buf) {
        *px = Rgba8::from_f32(*v);
    }
}

/// One convolution pass. `axis(i, j)` maps a position `i` along the blurred
/// axis and `j` across it to `(x, y)`; `len` is the length of the blurred
/// axis.
fn convolve(
    src: &[[f32; 4]],
    width: usize,
    height: usize,
    kernel: &[f32],
    axis: impl Fn(usize, usize) -> (usize, usize),
    len: usize,
) -> Vec<[f32; 4]> {
    let radius = kernel.len() / 2;
    let across = if len == width { height } else { width };
    let mut dst = vec![[0.0_f32; 4]; src.len()];
    for j in 0..across {
        for i in 0..len {
            let mut acc = [0.0_f32; 4];
            for (k, weight) in kernel.iter().enumerate() {
                let s = i + k;
                if s < radius || s - radius >= len {
                    continue;
                }
                let (x, y) = axis(s - radius, j);
                let sample = src[y * width + x];
                for (a, s) in acc.iter_mut().zip(sample) {
                    *a += s * weight;
                }
            }
            let (x, y) = axis(i, j);
            dst[y * width + x] = acc;
        }
    }
    dst
}

// ---------------------------------------------------------------------------
// Drop shadow
// ---------------------------------------------------------------------------

/// Draws `pixmap` over a blurred, offset copy of its alpha tinted with
/// `color`.
pub fn drop_shadow(
    pixmap: &mut Pixmap,
    offset: (f32, f32),
    sigma: (f32, f32),
    color: Color,
) -> Option<()> {
    let mut shadow = pixmap.clone();
    let tint = [
        f32::from(color.red()) / 255.0,
        f32::from(color.green()) / 255.0,
        f32::from(color.blue()) / 255.0,
    ];
    let color_alpha = color.alpha_f32();
    for px in pixels_mut(&mut shadow) {
        let a = f32::from(px.a) / 255.0 * color_alpha;
        *px = Rgba8::from_f32([tint[0] * a, tint[1] * a, tint[2] * a, a]);
    }
    blur(&mut shadow, sigma.0, sigma.1);

    let mut out = Pixmap::new(pixmap.width(), pixmap.height())?;
    out.draw_pixmap(
        0,
        0,
        shadow.as_ref(),
        &PixmapPaint::default(),
        Transform::from_translate(offset.0, offset.1),
        None,
    );
    out.draw_pixmap(
        0,
        0,
        pixmap.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    *pixmap = out;
    Some(())
}

// ---------------------------------------------------------------------------
// Zoom
// ---------------------------------------------------------------------------

/// Magnifies the center of the bitmap by `amount`.
///
/// Within `inset` pixels of an edge the sample position blends linearly
/// back to the unmagnified pixel, so the lens has a soft border.
#[expect(
    clippy::cast_possible_truncation,
    reason = "sample coordinates are clamped into the bitmap"
)]
pub fn zoom(pixmap: &mut Pixmap, amount: f32, inset: i32) {
    if amount <= 1.0 {
        return;
    }
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let (w, h) = (width as f32, height as f32);
    let src_x0 = (w - w / amount) / 2.0;
    let src_y0 = (h - h / amount) / 2.0;
    let inset = inset.max(0) as f32;

    let src: Vec<Rgba8> = pixels(pixmap).to_vec();
    for (index, px) in pixels_mut(pixmap).iter_mut().enumerate() {
        let (x, y) = ((index % width) as f32, (index / width) as f32);
        let edge = x.min(y).min(w - 1.0 - x).min(h - 1.0 - y);
        let weight = if inset > 0.0 {
            (edge / inset).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let zx = src_x0 + x / amount;
        let zy = src_y0 + y / amount;
        let sx = (x + (zx - x) * weight).clamp(0.0, w - 1.0) as usize;
        let sy = (y + (zy - y) * weight).clamp(0.0, h - 1.0) as usize;
        *px = src[sy * width + sx];
    }
}

// ---------------------------------------------------------------------------
// Alpha threshold
// ---------------------------------------------------------------------------

/// Raises alpha inside `region` to at least `inner` and lowers alpha outside
/// it to at most `outer`, scaling color with alpha.
///
/// Fully transparent pixels stay transparent.
#[expect(
    clippy::cast_possible_truncation,
    reason = "bitmap dimensions fit in i32"
)]
pub fn alpha_threshold(pixmap: &mut Pixmap, region: &[IntRect], inner: f32, outer: f32) {
    let width = pixmap.width() as usize;
    for (index, px) in pixels_mut(pixmap).iter_mut().enumerate() {
        if px.a == 0 {
            continue;
        }
        let x = (index % width) as i32;
        let y = (index / width) as i32;
        let inside = region.iter().any(|r| r.contains_point(x, y));
        let v = px.to_f32();
        let a = v[3];
        let scale = if inside && a < inner {
            inner / a
        } else if !inside && a > outer {
            outer / a
        } else {
            continue;
        };
        *px = Rgba8::from_f32([v[0] * scale, v[1] * scale, v[2] * scale, a * scale]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadrille_core::filter::IDENTITY_COLOR_MATRIX;
    use tiny_skia::{Color as SkColor, Paint, Rect};

    fn solid(w: u32, h: u32, r: u8, g: u8, b: u8, a: u8) -> Pixmap {
        let mut p = Pixmap::new(w, h).unwrap();
        p.fill(SkColor::from_rgba8(r, g, b, a));
        p
    }

    fn px(p: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = p.pixel(x, y).unwrap();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    #[test]
    fn identity_matrix_leaves_pixels() {
        let mut p = solid(2, 2, 10, 200, 30, 255);
        apply_color_matrix(&mut p, &IDENTITY_COLOR_MATRIX);
        assert_eq!(px(&p, 1, 1), (10, 200, 30, 255));
    }

    #[test]
    fn full_grayscale_equalizes_channels() {
        let mut ops = FilterOperations::new();
        ops.append(FilterOperation::Grayscale(1.0));
        let p = solid(1, 1, 255, 0, 0, 255);
        let out = apply_filters(p.as_ref(), &ops, Vec2::new(1.0, 1.0)).unwrap();
        let (r, g, b, a) = px(&out, 0, 0);
        assert_eq!(a, 255);
        assert_eq!(r, g, "grayscale red and green match");
        assert_eq!(g, b, "grayscale green and blue match");
    }

    #[test]
    fn opacity_scales_premultiplied_pixels() {
        let mut ops = FilterOperations::new();
        ops.append(FilterOperation::Opacity(0.5));
        let p = solid(1, 1, 255, 255, 255, 255);
        let out = apply_filters(p.as_ref(), &ops, Vec2::new(1.0, 1.0)).unwrap();
        assert_eq!(px(&out, 0, 0), (128, 128, 128, 128));
    }

    #[test]
    fn concatenation_matches_sequential_application() {
        let a = FilterOperation::Opacity(0.5).to_color_matrix().unwrap();
        let b = FilterOperation::Sepia(0.5).to_color_matrix().unwrap();
        assert!(!needs_clamping(&a), "opacity stays in range");
        let mut seq = solid(1, 1, 200, 100, 50, 255);
        apply_color_matrix(&mut seq, &a);
        apply_color_matrix(&mut seq, &b);
        let mut folded = solid(1, 1, 200, 100, 50, 255);
        apply_color_matrix(&mut folded, &concat_color_matrices(&a, &b));
        let (s, f) = (px(&seq, 0, 0), px(&folded, 0, 0));
        assert!(s.0.abs_diff(f.0) <= 2, "red {s:?} vs {f:?}");
        assert!(s.3.abs_diff(f.3) <= 1, "alpha {s:?} vs {f:?}");
    }

    #[test]
    fn brightness_above_one_needs_clamping() {
        let m = FilterOperation::Brightness(2.0).to_color_matrix().unwrap();
        assert!(needs_clamping(&m), "brightness 2 can exceed 1");
    }

    #[test]
    fn blur_spreads_into_transparent_neighbors() {
        let mut p = Pixmap::new(9, 1).unwrap();
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        p.fill_rect(
            Rect::from_xywh(4.0, 0.0, 1.0, 1.0).unwrap(),
            &paint,
            Transform::identity(),
            None,
        );
        blur(&mut p, 1.0, 0.0);
        let center = px(&p, 4, 0).3;
        let side = px(&p, 3, 0).3;
        let far = px(&p, 0, 0).3;
        assert!(center < 255, "center lost coverage");
        assert!(side > 0, "neighbor gained coverage");
        assert!(side < center, "coverage falls off");
        assert_eq!(far, 0, "edge pixels stay clear");
    }

    #[test]
    fn drop_shadow_appears_at_offset() {
        let mut p = Pixmap::new(4, 4).unwrap();
        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        p.fill_rect(
            Rect::from_xywh(0.0, 0.0, 2.0, 2.0).unwrap(),
            &paint,
            Transform::identity(),
            None,
        );
        drop_shadow(&mut p, (2.0, 2.0), (0.0, 0.0), Color::RED).unwrap();
        assert_eq!(px(&p, 0, 0), (255, 255, 255, 255));
        assert_eq!(px(&p, 3, 3), (255, 0, 0, 255));
        assert_eq!(px(&p, 3, 0).3, 0, "no shadow above the offset");
    }

    #[test]
    fn zoom_magnifies_center() {
        let mut p = Pixmap::new(4, 1).unwrap();
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        p.fill_rect(
            Rect::from_xywh(1.0, 0.0, 2.0, 1.0).unwrap(),
            &paint,
            Transform::identity(),
            None,
        );
        zoom(&mut p, 2.0, 0);
        // The center two pixels now fill the row.
        for x in 0..4 {
            assert_eq!(px(&p, x, 0).3, 255, "pixel {x} is covered");
        }
    }

    #[test]
    fn alpha_threshold_raises_inside_and_lowers_outside() {
        let mut p = solid(2, 1, 255, 255, 255, 128);
        alpha_threshold(&mut p, &[IntRect::new(0, 0, 1, 1)], 1.0, 0.25);
        assert_eq!(px(&p, 0, 0).3, 255);
        assert_eq!(px(&p, 1, 0).3, 64);
    }

    #[test]
    fn empty_chain_copies_source() {
        let p = solid(3, 3, 1, 2, 3, 255);
        let out = apply_filters(p.as_ref(), &FilterOperations::new(), Vec2::new(1.0, 1.0)).unwrap();
        assert_eq!(out.data(), p.data());
    }
}
