//! Texture statistics: tonal simplicity, flat-area coverage, skin tones,
//! quantized color blocks and block smoothness.

use crate::components::{scan_components, Connectivity};
use crate::image_processor::{brightness, truncate, ImageData};
use rgb::RGBA8;
use serde::Serialize;
use std::collections::HashSet;

/// Every n-th pixel is sampled for the simplicity and skin-tone statistics.
const SAMPLE_STEP: usize = 4;
const VARIANCE_BLOCK: usize = 3;
const LOW_VARIANCE_THRESHOLD: f64 = 30.0;
const COLOR_BLOCK: usize = 4;
const MIN_COLOR_BLOCK_SIZE: usize = 4;
const COMPONENT_CAP: usize = 1000;
const SMOOTH_BLOCK: usize = 8;
const SMOOTH_VARIANCE_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextureFeatures {
    pub color_simplicity: f64,
    pub low_variance_area_ratio: f64,
    pub skin_tone_ratio: f64,
    pub color_block_count: usize,
}

/// Share of smooth 8x8 blocks and their mean brightness variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Smoothness {
    pub smoothness: f64,
    pub avg_variance: f64,
}

/// Texture features from the gray plane, with skin tones read from the
/// original colors.
pub fn analyze_texture(gray: &[u8], original: &[RGBA8], width: u32, height: u32) -> TextureFeatures {
    TextureFeatures {
        color_simplicity: color_simplicity(gray),
        low_variance_area_ratio: low_variance_area_ratio(gray, width, height),
        skin_tone_ratio: skin_tone_ratio(original),
        color_block_count: color_block_count(gray, width, height),
    }
}

/// 1 minus the share of the 32 gray levels (value / 8) that occur among
/// sampled pixels.
pub fn color_simplicity(gray: &[u8]) -> f64 {
    let levels: HashSet<u8> = gray.iter().step_by(SAMPLE_STEP).map(|&v| v / 8).collect();
    1.0 - levels.len() as f64 / 32.0
}

/// Fraction of the image covered by non-overlapping 3x3 blocks whose
/// variance is below the threshold. Blocks touching the last three rows or
/// columns are skipped.
pub fn low_variance_area_ratio(gray: &[u8], width: u32, height: u32) -> f64 {
    let w = width as usize;
    let h = height as usize;
    let total = w * h;
    if total == 0 || gray.len() != total {
        return 0.0;
    }

    let mut low_variance_pixels = 0usize;
    for y in (0..h.saturating_sub(VARIANCE_BLOCK)).step_by(VARIANCE_BLOCK) {
        for x in (0..w.saturating_sub(VARIANCE_BLOCK)).step_by(VARIANCE_BLOCK) {
            let mut sum = 0.0f64;
            let mut sum_sq = 0.0f64;
            for by in 0..VARIANCE_BLOCK {
                for bx in 0..VARIANCE_BLOCK {
                    let v = gray[(y + by) * w + x + bx] as f64;
                    sum += v;
                    sum_sq += v * v;
                }
            }
            let count = (VARIANCE_BLOCK * VARIANCE_BLOCK) as f64;
            let mean = sum / count;
            let variance = sum_sq / count - mean * mean;
            if variance < LOW_VARIANCE_THRESHOLD {
                low_variance_pixels += VARIANCE_BLOCK * VARIANCE_BLOCK;
            }
        }
    }

    low_variance_pixels as f64 / total as f64
}

/// Standard, bright and pink skin-tone rules.
///
/// The rules compare channels, so callers pass the original colors; on the
/// grayscale copy r == g == b and no pixel could ever match.
pub fn is_skin_tone(p: &RGBA8) -> bool {
    let (r, g, b) = (p.r as i32, p.g as i32, p.b as i32);
    let base = r > 60 && g > 40 && b > 20 && r > g && r > b;
    let standard = base && r - g > 15 && r - b > 20 && r - b < 120;
    let bright = r > 150 && g > 120 && b > 100 && r > g + 10 && g > b && r - b < 140;
    let pink = r > 180 && g > 120 && b > 120 && r - g > 20 && g - b < 20;
    standard || bright || pink
}

pub fn skin_tone_ratio(pixels: &[RGBA8]) -> f64 {
    let mut sampled = 0usize;
    let mut skin = 0usize;
    for p in pixels.iter().step_by(SAMPLE_STEP) {
        sampled += 1;
        if is_skin_tone(p) {
            skin += 1;
        }
    }
    if sampled == 0 {
        0.0
    } else {
        skin as f64 / sampled as f64
    }
}

/// Number of 4-connected regions of at least four cells in the grid of
/// 4x4 block means quantized to eight levels.
pub fn color_block_count(gray: &[u8], width: u32, height: u32) -> usize {
    let w = width as usize;
    let h = height as usize;
    if gray.len() != w * h {
        return 0;
    }
    let qw = w / COLOR_BLOCK;
    let qh = h / COLOR_BLOCK;

    let mut quantized = Vec::with_capacity(qw * qh);
    for qy in 0..qh {
        for qx in 0..qw {
            let mut sum = 0u32;
            for by in 0..COLOR_BLOCK {
                let row = (qy * COLOR_BLOCK + by) * w + qx * COLOR_BLOCK;
                sum += gray[row..row + COLOR_BLOCK].iter().map(|&v| v as u32).sum::<u32>();
            }
            let mean = truncate(sum as f64 / (COLOR_BLOCK * COLOR_BLOCK) as f64);
            quantized.push(mean / 32);
        }
    }

    scan_components(
        qw as u32,
        qh as u32,
        &quantized,
        |_| true,
        Connectivity::Four,
        COMPONENT_CAP,
    )
    .iter()
    .filter(|c| c.size >= MIN_COLOR_BLOCK_SIZE)
    .count()
}

/// Brightness variance over full 8x8 blocks of the original image.
pub fn smoothness(image_data: &ImageData) -> Smoothness {
    let w = image_data.width as usize;
    let h = image_data.height as usize;
    let blocks_x = w / SMOOTH_BLOCK;
    let blocks_y = h / SMOOTH_BLOCK;
    if image_data.pixels.len() != w * h {
        return Smoothness {
            smoothness: 0.0,
            avg_variance: 0.0,
        };
    }

    let mut total_variance = 0.0f64;
    let mut block_count = 0usize;
    let mut smooth_blocks = 0usize;

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let mut sum = 0.0f64;
            let mut sum_sq = 0.0f64;
            for y in 0..SMOOTH_BLOCK {
                let row = (by * SMOOTH_BLOCK + y) * w + bx * SMOOTH_BLOCK;
                for p in &image_data.pixels[row..row + SMOOTH_BLOCK] {
                    let v = brightness(p) as f64;
                    sum += v;
                    sum_sq += v * v;
                }
            }
            let count = (SMOOTH_BLOCK * SMOOTH_BLOCK) as f64;
            let mean = sum / count;
            let variance = sum_sq / count - mean * mean;
            total_variance += variance;
            block_count += 1;
            if variance < SMOOTH_VARIANCE_THRESHOLD {
                smooth_blocks += 1;
            }
        }
    }

    let divisor = block_count.max(1) as f64;
    Smoothness {
        smoothness: smooth_blocks as f64 / divisor,
        avg_variance: total_variance / divisor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32, cell: u32) -> Vec<u8> {
        let mut gray = Vec::new();
        for y in 0..height {
            for x in 0..width {
                gray.push(if (x / cell + y / cell) % 2 == 0 { 0 } else { 255 });
            }
        }
        gray
    }

    #[test]
    fn test_color_simplicity_single_level() {
        let gray = vec![77u8; 64];
        assert!((color_simplicity(&gray) - 31.0 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_color_simplicity_samples_every_fourth() {
        // Only indices 0, 4, 8, ... are read
        let gray: Vec<u8> = (0..16).map(|i| if i % 4 == 0 { 0 } else { 255 }).collect();
        assert!((color_simplicity(&gray) - 31.0 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_low_variance_flat_image() {
        // 9x9 flat: blocks start at 0 and 3 on each axis (6 is not < 6)
        let gray = vec![50u8; 81];
        let ratio = low_variance_area_ratio(&gray, 9, 9);
        assert!((ratio - 36.0 / 81.0).abs() < 1e-12);
    }

    #[test]
    fn test_low_variance_noisy_blocks_excluded() {
        let gray = checkerboard(9, 9, 1);
        assert_eq!(low_variance_area_ratio(&gray, 9, 9), 0.0);
    }

    #[test]
    fn test_low_variance_tiny_image() {
        let gray = vec![10u8; 9];
        assert_eq!(low_variance_area_ratio(&gray, 3, 3), 0.0);
    }

    #[test]
    fn test_skin_tone_rules() {
        assert!(is_skin_tone(&RGBA8::new(200, 150, 120, 255)));
        assert!(is_skin_tone(&RGBA8::new(230, 160, 150, 255)));
        assert!(!is_skin_tone(&RGBA8::new(128, 128, 128, 255)));
        assert!(!is_skin_tone(&RGBA8::new(40, 30, 20, 255)));
        assert!(!is_skin_tone(&RGBA8::new(0, 0, 255, 255)));
    }

    #[test]
    fn test_skin_tone_ratio_samples() {
        let mut pixels = vec![RGBA8::new(128, 128, 128, 255); 8];
        pixels[0] = RGBA8::new(200, 150, 120, 255);
        // Sampled pixels are 0 and 4
        assert!((skin_tone_ratio(&pixels) - 0.5).abs() < 1e-12);
        assert_eq!(skin_tone_ratio(&[]), 0.0);
    }

    #[test]
    fn test_color_blocks_checkerboard() {
        // 8x8 cells on 32x32 give a 8x8 grid of 2x2 same-level cells
        let gray = checkerboard(32, 32, 8);
        assert_eq!(color_block_count(&gray, 32, 32), 16);
    }

    #[test]
    fn test_color_blocks_small_regions_ignored() {
        // 4x4 cells make every grid cell its own one-cell region
        let gray = checkerboard(16, 16, 4);
        assert_eq!(color_block_count(&gray, 16, 16), 0);
    }

    #[test]
    fn test_smoothness_flat_and_noisy() {
        let flat = ImageData {
            width: 16,
            height: 16,
            pixels: vec![RGBA8::new(90, 90, 90, 255); 256],
        };
        let s = smoothness(&flat);
        assert_eq!(s.smoothness, 1.0);
        assert_eq!(s.avg_variance, 0.0);

        let pixels = checkerboard(16, 16, 1)
            .into_iter()
            .map(|v| RGBA8::new(v, v, v, 255))
            .collect();
        let noisy = ImageData {
            width: 16,
            height: 16,
            pixels,
        };
        let s = smoothness(&noisy);
        assert_eq!(s.smoothness, 0.0);
        assert!((s.avg_variance - 127.5 * 127.5).abs() < 1e-6);
    }

    #[test]
    fn test_smoothness_without_full_blocks() {
        let img = ImageData {
            width: 7,
            height: 7,
            pixels: vec![RGBA8::new(0, 0, 0, 255); 49],
        };
        assert_eq!(smoothness(&img).smoothness, 0.0);
    }
}
