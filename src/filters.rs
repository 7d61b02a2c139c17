//! Per-pixel and neighborhood filters used by the engraving pipeline.
//!
//! In-place filters take `&mut [RGBA8]` and touch only the color channels;
//! neighborhood filters read a source slice and return a new buffer so the
//! caller's pixels are never read after being overwritten. Alpha is always
//! carried through unchanged.

use crate::image_processor::{luma_709, store_clamped, truncate};
use rgb::RGBA8;

/// Smallest gamma accepted by [`apply_gamma`].
pub const MIN_GAMMA: f64 = 0.01;

#[inline]
fn map_rgb(pixels: &mut [RGBA8], mut f: impl FnMut(u8) -> u8) {
    for p in pixels.iter_mut() {
        p.r = f(p.r);
        p.g = f(p.g);
        p.b = f(p.b);
    }
}

/// Linear contrast around mid-gray. `level` 100 leaves the image unchanged.
pub fn apply_contrast(pixels: &mut [RGBA8], level: i32) {
    let factor = level as f64 / 100.0;
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = truncate(factor * (v as f64 - 128.0) + 128.0);
    }
    map_rgb(pixels, |v| lut[v as usize]);
}

/// Power-law gamma. Non-positive values are floored to [`MIN_GAMMA`].
pub fn apply_gamma(pixels: &mut [RGBA8], gamma: f64) {
    let gamma = if gamma <= 0.0 { MIN_GAMMA } else { gamma };
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = truncate(255.0 * (v as f64 / 255.0).powf(gamma));
    }
    map_rgb(pixels, |v| lut[v as usize]);
}

/// Levels remap from the black/white points, then the additive
/// shadow and highlight curves.
pub fn apply_levels(
    pixels: &mut [RGBA8],
    blacks: f64,
    whites: f64,
    highlights: f64,
    shadows: f64,
) {
    let mut input_black = blacks * 0.5;
    let mut input_white = 255.0 + whites * 0.5;
    if input_black >= input_white - 1.0 {
        input_black = 0.0;
        input_white = 255.0;
    }
    let range = input_white - input_black;

    let mut levels_lut = [0u8; 256];
    for (v, out) in levels_lut.iter_mut().enumerate() {
        *out = truncate((v as f64 - input_black) * 255.0 / range);
    }

    let shadow_effect = shadows / 2.0;
    let highlight_effect = highlights / 2.0;

    let mut curve_lut = [0u8; 256];
    for (v, out) in curve_lut.iter_mut().enumerate() {
        let mut value = levels_lut[v];
        if shadow_effect != 0.0 {
            let factor = (255.0 - value as f64) / 255.0;
            value = truncate(value as f64 + shadow_effect * factor);
        }
        if highlight_effect != 0.0 {
            let factor = value as f64 / 255.0;
            value = truncate(value as f64 + highlight_effect * factor);
        }
        *out = value;
    }

    map_rgb(pixels, |v| curve_lut[v as usize]);
}

/// BT.709 grayscale replicated into all three color channels.
pub fn convert_to_grayscale(pixels: &mut [RGBA8]) {
    for p in pixels.iter_mut() {
        let gray = store_clamped(luma_709(p));
        p.r = gray;
        p.g = gray;
        p.b = gray;
    }
}

pub fn invert(pixels: &mut [RGBA8]) {
    map_rgb(pixels, |v| 255 - v);
}

/// Normalized 1-D Gaussian kernel with sigma `max(0.1, radius)` and
/// half-width `ceil(3 * sigma)`.
pub fn gaussian_kernel(radius: f64) -> Vec<f64> {
    let sigma = radius.max(0.1);
    let half = (sigma * 3.0).ceil() as i64;
    let mut kernel: Vec<f64> = (-half..=half)
        .map(|x| (-((x * x) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    let len = kernel.len() as f64;
    if sum > 0.0 {
        kernel.iter_mut().for_each(|k| *k /= sum);
    } else {
        kernel.iter_mut().for_each(|k| *k = 1.0 / len);
    }
    kernel
}

/// Separable Gaussian blur that keeps dark pixels from bleeding into their
/// surroundings.
///
/// When a neighbor's red value is below `dark_threshold` and the center's is
/// not, the neighbor contributes the center's original color instead. The
/// decision always looks at `source`; the horizontal pass result feeds the
/// vertical pass. Samples outside the image clamp to the border.
pub fn edge_aware_gaussian_blur(
    source: &[RGBA8],
    width: u32,
    height: u32,
    radius: f64,
    dark_threshold: u8,
) -> Vec<RGBA8> {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 || source.len() != w * h {
        return source.to_vec();
    }

    let kernel = gaussian_kernel(radius);
    let half = (kernel.len() / 2) as i64;
    let is_dark = |p: &RGBA8| p.r < dark_threshold;

    let mut temp = vec![RGBA8::new(0, 0, 0, 0); source.len()];
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let center = source[row + x];
            let center_dark = is_dark(&center);
            let (mut sr, mut sg, mut sb) = (0.0f64, 0.0f64, 0.0f64);
            for (k, weight) in kernel.iter().enumerate() {
                let nx = (x as i64 + k as i64 - half).clamp(0, w as i64 - 1) as usize;
                let neighbor = source[row + nx];
                let used = if !center_dark && is_dark(&neighbor) {
                    center
                } else {
                    neighbor
                };
                sr += used.r as f64 * weight;
                sg += used.g as f64 * weight;
                sb += used.b as f64 * weight;
            }
            temp[row + x] = RGBA8::new(
                store_clamped(sr),
                store_clamped(sg),
                store_clamped(sb),
                center.a,
            );
        }
    }

    let mut output = vec![RGBA8::new(0, 0, 0, 0); source.len()];
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let center = source[idx];
            let center_dark = is_dark(&center);
            let (mut sr, mut sg, mut sb) = (0.0f64, 0.0f64, 0.0f64);
            for (k, weight) in kernel.iter().enumerate() {
                let ny = (y as i64 + k as i64 - half).clamp(0, h as i64 - 1) as usize;
                let nidx = ny * w + x;
                let used = if !center_dark && is_dark(&source[nidx]) {
                    center
                } else {
                    temp[nidx]
                };
                sr += used.r as f64 * weight;
                sg += used.g as f64 * weight;
                sb += used.b as f64 * weight;
            }
            output[idx] = RGBA8::new(
                store_clamped(sr),
                store_clamped(sg),
                store_clamped(sb),
                temp[idx].a,
            );
        }
    }

    output
}

/// Bilateral filter: spatial Gaussian weight times a range weight from the
/// red-channel difference to the center, applied to all three channels.
/// A zero weight sum keeps the center pixel.
pub fn bilateral_filter(
    source: &[RGBA8],
    width: u32,
    height: u32,
    kernel_radius: u32,
    sigma_d: f64,
    sigma_r: f64,
) -> Vec<RGBA8> {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 || source.len() != w * h {
        return source.to_vec();
    }
    let sigma_d = if sigma_d <= 0.0 { 0.1 } else { sigma_d };
    let sigma_r = if sigma_r <= 0.0 { 0.1 } else { sigma_r };
    let r = kernel_radius as i64;

    // Spatial weights depend only on the offset
    let side = (2 * r + 1) as usize;
    let mut spatial = vec![0.0f64; side * side];
    for ky in -r..=r {
        for kx in -r..=r {
            let dist_sq = (kx * kx + ky * ky) as f64;
            spatial[((ky + r) as usize) * side + (kx + r) as usize] =
                (-dist_sq / (2.0 * sigma_d * sigma_d)).exp();
        }
    }

    // Range weights depend only on the absolute red difference
    let mut range = [0.0f64; 256];
    for (d, weight) in range.iter_mut().enumerate() {
        let diff_sq = (d * d) as f64;
        *weight = (-diff_sq / (2.0 * sigma_r * sigma_r)).exp();
    }

    let mut output = vec![RGBA8::new(0, 0, 0, 0); source.len()];
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let center = source[idx];
            let (mut sr, mut sg, mut sb, mut sw) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);

            for ky in -r..=r {
                let ny = (y as i64 + ky).clamp(0, h as i64 - 1) as usize;
                for kx in -r..=r {
                    let nx = (x as i64 + kx).clamp(0, w as i64 - 1) as usize;
                    let neighbor = source[ny * w + nx];
                    let diff = (center.r as i32 - neighbor.r as i32).unsigned_abs() as usize;
                    let weight =
                        spatial[((ky + r) as usize) * side + (kx + r) as usize] * range[diff];
                    sr += neighbor.r as f64 * weight;
                    sg += neighbor.g as f64 * weight;
                    sb += neighbor.b as f64 * weight;
                    sw += weight;
                }
            }

            output[idx] = if sw == 0.0 {
                center
            } else {
                RGBA8::new(
                    store_clamped(sr / sw),
                    store_clamped(sg / sw),
                    store_clamped(sb / sw),
                    center.a,
                )
            };
        }
    }

    output
}

/// Soften vertical banding by blending toward a 9-tap horizontal Gaussian,
/// more strongly where horizontal variation dominates vertical variation.
///
/// Not part of the engraving pipeline; kept for callers that scan with
/// visible column artifacts.
pub fn remove_vertical_artifacts(pixels: &mut [RGBA8], width: u32, height: u32, strength: f64) {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 || pixels.len() != w * h {
        return;
    }

    const KERNEL_SIZE: usize = 9;
    const SIGMA: f64 = 2.0;
    let half = (KERNEL_SIZE / 2) as i64;
    let mut kernel = [0.0f64; KERNEL_SIZE];
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f64 - half as f64;
        *k = (-(x * x) / (2.0 * SIGMA * SIGMA)).exp();
    }
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);

    let mut blurred = vec![RGBA8::new(0, 0, 0, 0); pixels.len()];
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let (mut sr, mut sg, mut sb) = (0.0f64, 0.0f64, 0.0f64);
            for (k, weight) in kernel.iter().enumerate() {
                let nx = (x as i64 + k as i64 - half).clamp(0, w as i64 - 1) as usize;
                let p = pixels[row + nx];
                sr += p.r as f64 * weight;
                sg += p.g as f64 * weight;
                sb += p.b as f64 * weight;
            }
            blurred[row + x] = RGBA8::new(
                store_clamped(sr),
                store_clamped(sg),
                store_clamped(sb),
                pixels[row + x].a,
            );
        }
    }

    // Artifact strength from red-channel differences of the unblurred image
    let mut artifact = vec![0.0f64; w * h];
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let horizontal =
                (pixels[y * w + x - 1].r as f64 - pixels[y * w + x + 1].r as f64).abs();
            let vertical =
                (pixels[(y - 1) * w + x].r as f64 - pixels[(y + 1) * w + x].r as f64).abs();
            let ratio = (horizontal + 0.01) / (vertical + 0.01);
            artifact[y * w + x] = ((ratio - 1.0) * 0.5).clamp(0.0, 1.0);
        }
    }

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let interior = y >= 1 && y + 1 < h && x >= 1 && x + 1 < w;
            let s = if interior {
                strength * (0.3 + 0.7 * artifact[idx])
            } else {
                strength * 0.3
            };
            let src = pixels[idx];
            let blur = blurred[idx];
            let blend = |a: u8, b: u8| store_clamped(a as f64 * (1.0 - s) + b as f64 * s);
            pixels[idx] = RGBA8::new(
                blend(src.r, blur.r),
                blend(src.g, blur.g),
                blend(src.b, blur.b),
                src.a,
            );
        }
    }
}
