//! Contrast-limited adaptive histogram equalization with bicubic blending
//! between tile mappings.

use crate::image_processor::{luma_709, truncate};
use rgb::RGBA8;

/// Equalize luma per tile and recolor each pixel by the ratio of new to old
/// luma. `tile_size` of zero is treated as one.
pub fn apply_cubic_clahe(
    pixels: &mut [RGBA8],
    width: u32,
    height: u32,
    clip_limit: f64,
    tile_size: u32,
) {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 || pixels.len() != w * h {
        return;
    }
    let tile = tile_size.max(1) as usize;

    let luminance: Vec<f64> = pixels.iter().map(luma_709).collect();
    let tiles_x = w.div_ceil(tile);
    let tiles_y = h.div_ceil(tile);

    let mut mappings = Vec::with_capacity(tiles_x * tiles_y);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x_range = tx * tile..((tx + 1) * tile).min(w);
            let y_range = ty * tile..((ty + 1) * tile).min(h);
            let mut hist = [0u32; 256];
            let mut count = 0u32;
            for y in y_range {
                for x in x_range.clone() {
                    hist[truncate(luminance[y * w + x]) as usize] += 1;
                    count += 1;
                }
            }
            mappings.push(tile_mapping(&mut hist, count, clip_limit));
        }
    }

    log::debug!(
        "clahe: {}x{} tiles of {} px, clip {:.2}",
        tiles_x,
        tiles_y,
        tile,
        clip_limit
    );

    let max_tx = tiles_x as i64 - 1;
    let max_ty = tiles_y as i64 - 1;
    for y in 0..h {
        let tile_yf = y as f64 / tile as f64 - 0.5;
        let base_ty = tile_yf.floor();
        let y_frac = tile_yf - base_ty;
        for x in 0..w {
            let idx = y * w + x;
            let old_l = luminance[idx];
            let bin = truncate(old_l) as usize;

            let tile_xf = x as f64 / tile as f64 - 0.5;
            let base_tx = tile_xf.floor();
            let x_frac = tile_xf - base_tx;

            let mut rows = [0.0f64; 4];
            for (j, row) in rows.iter_mut().enumerate() {
                let ety = (base_ty as i64 + j as i64 - 1).clamp(0, max_ty) as usize;
                let mut samples = [0.0f64; 4];
                for (i, sample) in samples.iter_mut().enumerate() {
                    let etx = (base_tx as i64 + i as i64 - 1).clamp(0, max_tx) as usize;
                    *sample = mappings[ety * tiles_x + etx][bin] as f64;
                }
                *row = cubic_interpolate(&samples, x_frac);
            }
            let new_l = truncate(cubic_interpolate(&rows, y_frac));

            let p = &mut pixels[idx];
            if old_l > 0.0 && old_l < 255.0 {
                let ratio = new_l as f64 / old_l;
                p.r = truncate(p.r as f64 * ratio);
                p.g = truncate(p.g as f64 * ratio);
                p.b = truncate(p.b as f64 * ratio);
            } else if new_l == 0 && old_l == 0.0 {
                p.r = 0;
                p.g = 0;
                p.b = 0;
            } else {
                p.r = new_l;
                p.g = new_l;
                p.b = new_l;
            }
        }
    }
}

/// Clip the histogram, redistribute the excess and build the equalizing map.
fn tile_mapping(hist: &mut [u32; 256], count: u32, clip_limit: f64) -> [u8; 256] {
    let mut map = [0u8; 256];
    for (i, m) in map.iter_mut().enumerate() {
        *m = i as u8;
    }
    if count == 0 {
        return map;
    }

    let limit = ((clip_limit * count as f64 / 256.0).floor() as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let per_bin = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += per_bin;
        if i < remainder {
            *bin += 1;
        }
    }

    let mut cdf = [0u32; 256];
    let mut running = 0u32;
    for (c, &bin) in cdf.iter_mut().zip(hist.iter()) {
        running += bin;
        *c = running;
    }
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(cdf[0]);

    if count <= cdf_min {
        return map;
    }
    let span = (count - cdf_min) as f64;
    for (m, &c) in map.iter_mut().zip(cdf.iter()) {
        *m = truncate((c as f64 - cdf_min as f64) / span * 255.0);
    }
    map
}

/// Catmull-Rom spline through four samples at fraction `t` between p1 and p2.
#[inline]
fn cubic_interpolate(p: &[f64; 4], t: f64) -> f64 {
    p[1] + 0.5
        * t
        * (p[2] - p[0]
            + t * (2.0 * p[0] - 5.0 * p[1] + 4.0 * p[2] - p[3]
                + t * (3.0 * (p[1] - p[2]) + p[3] - p[0])))
}
