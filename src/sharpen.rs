//! Local-contrast and sharpening stages.

use crate::filters::{bilateral_filter, edge_aware_gaussian_blur};
use crate::image_processor::{store_clamped, truncate};
use rgb::RGBA8;

/// Blur radius used by the clarity stage.
const CLARITY_BLUR_RADIUS: f64 = 2.0;
/// Largest bilateral kernel radius used when building the sharpening base.
const MAX_BILATERAL_RADIUS: u32 = 3;
const BILATERAL_SIGMA_R: f64 = 15.0;
const GAUSSIAN_WEIGHT: f64 = 0.7;
/// Red values below this anchor the dark protection mask.
const DARK_ANCHOR: u8 = 2;
/// Positive sharpening tapers off above this value.
const HIGHLIGHT_PROTECTION_START: f64 = 204.0;

/// Boost local contrast: `v + s * (v - blurred)` with `s = level / 100`.
pub fn apply_clarity(pixels: &mut [RGBA8], width: u32, height: u32, level: i32) {
    if level == 0 {
        return;
    }
    let strength = level as f64 / 100.0;
    let blurred = edge_aware_gaussian_blur(pixels, width, height, CLARITY_BLUR_RADIUS, 0);

    for (p, b) in pixels.iter_mut().zip(&blurred) {
        p.r = truncate(p.r as f64 + strength * (p.r as f64 - b.r as f64));
        p.g = truncate(p.g as f64 + strength * (p.g as f64 - b.g as f64));
        p.b = truncate(p.b as f64 + strength * (p.b as f64 - b.b as f64));
    }
}

/// Protection strength per pixel: each near-black pixel protects a disc of
/// the given radius, fading linearly from 1 at the center to 0 at the rim.
pub fn dark_protection_mask(pixels: &[RGBA8], width: u32, height: u32, radius: u32) -> Vec<f64> {
    let w = width as usize;
    let h = height as usize;
    let mut mask = vec![0.0f64; w * h];
    if radius == 0 || pixels.len() != w * h {
        return mask;
    }

    let r = radius as i64;
    let rf = radius as f64;
    for ay in 0..h as i64 {
        for ax in 0..w as i64 {
            if pixels[ay as usize * w + ax as usize].r >= DARK_ANCHOR {
                continue;
            }
            for dy in -r..=r {
                let ny = ay + dy;
                if ny < 0 || ny >= h as i64 {
                    continue;
                }
                for dx in -r..=r {
                    let nx = ax + dx;
                    if nx < 0 || nx >= w as i64 {
                        continue;
                    }
                    let dist = ((dx * dx + dy * dy) as f64).sqrt();
                    if dist <= rf {
                        let slot = &mut mask[ny as usize * w + nx as usize];
                        *slot = slot.max(1.0 - dist / rf);
                    }
                }
            }
        }
    }
    mask
}

/// Unsharp mask against a blend of Gaussian and bilateral blurs.
///
/// `strength` is the fractional amount (amount / 100). Channels whose
/// difference from the blur is below `threshold` keep their value.
pub fn apply_unsharp_mask(
    pixels: &mut [RGBA8],
    width: u32,
    height: u32,
    strength: f64,
    radius: u32,
    threshold: i32,
) {
    if strength == 0.0 {
        return;
    }
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 || pixels.len() != w * h {
        return;
    }

    let snapshot = pixels.to_vec();
    let gaussian = edge_aware_gaussian_blur(&snapshot, width, height, radius as f64, 0);

    let bilateral_radius = radius.min(MAX_BILATERAL_RADIUS);
    let sigma_d = (bilateral_radius as f64).max(0.1);
    let bilateral = bilateral_filter(
        &snapshot,
        width,
        height,
        bilateral_radius,
        sigma_d,
        BILATERAL_SIGMA_R,
    );

    let mix = |g: u8, b: u8| store_clamped(GAUSSIAN_WEIGHT * g as f64 + (1.0 - GAUSSIAN_WEIGHT) * b as f64);
    let blurred: Vec<[u8; 3]> = gaussian
        .iter()
        .zip(&bilateral)
        .map(|(g, b)| [mix(g.r, b.r), mix(g.g, b.g), mix(g.b, b.b)])
        .collect();

    let protection = dark_protection_mask(&snapshot, width, height, radius + 2);

    for (idx, p) in pixels.iter_mut().enumerate() {
        let src = snapshot[idx];
        let level = protection[idx];
        let original = [src.r, src.g, src.b];
        let mut out = original;
        for c in 0..3 {
            let value = original[c] as f64;
            let diff = value - blurred[idx][c] as f64;
            if diff.abs() < threshold as f64 {
                continue;
            }
            let mut adjustment = strength * diff * (1.0 - level);
            if adjustment > 0.0 && value > HIGHLIGHT_PROTECTION_START {
                let factor = ((255.0 - value) / (255.0 - HIGHLIGHT_PROTECTION_START)).clamp(0.0, 1.0);
                adjustment *= factor * factor;
            }
            out[c] = truncate(value + adjustment);
        }
        p.r = out[0];
        p.g = out[1];
        p.b = out[2];
    }
}
