//! Sobel edge statistics for image classification.
//!
//! Gradients are taken over a one-byte gray plane. Pixels whose gradient
//! magnitude passes [`EDGE_THRESHOLD`] form the edge mask, which is then
//! grouped into 8-connected components to count long, thin edges.

use crate::components::{scan_components, Connectivity};
use serde::Serialize;

/// Gradient magnitude above which a pixel is an edge.
pub const EDGE_THRESHOLD: f64 = 20.0;
/// Gradient magnitude above which an edge is distinct.
pub const DISTINCT_EDGE_THRESHOLD: f64 = 50.0;
const COMPONENT_CAP: usize = 1000;

/// Edge statistics of a gray plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeFeatures {
    pub edge_ratio: f64,
    pub distinct_edge_ratio: f64,
    /// Long edges per 1% of the image area.
    pub long_edge_ratio: f64,
    /// Mean gradient magnitude over edge pixels.
    pub edge_contrast: f64,
}

/// Sobel gradient magnitude at every interior pixel; the border stays 0.
pub fn sobel_magnitude(gray: &[u8], width: u32, height: u32) -> Vec<f64> {
    let w = width as usize;
    let h = height as usize;
    let mut magnitude = vec![0.0f64; w * h];
    if w < 3 || h < 3 || gray.len() != w * h {
        return magnitude;
    }

    let sobel_x: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
    let sobel_y: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

    for y in 1..(h - 1) {
        for x in 1..(w - 1) {
            let mut gx = 0i32;
            let mut gy = 0i32;

            for ky in 0..3usize {
                for kx in 0..3usize {
                    let pixel = gray[(y + ky - 1) * w + (x + kx - 1)] as i32;
                    let idx = ky * 3 + kx;
                    gx += pixel * sobel_x[idx];
                    gy += pixel * sobel_y[idx];
                }
            }

            magnitude[y * w + x] = ((gx * gx + gy * gy) as f64).sqrt();
        }
    }

    magnitude
}

/// Whether an edge component is long enough and sparse enough to count as
/// a line rather than a textured patch.
fn is_long_edge(size: usize, bbox_width: u32, bbox_height: u32, density: f64) -> bool {
    size > 15 && (bbox_width > 20 || bbox_height > 20) && (density < 0.5 || size > 30)
}

pub fn analyze_edges(gray: &[u8], width: u32, height: u32) -> EdgeFeatures {
    let area = width as f64 * height as f64;
    if area == 0.0 {
        return EdgeFeatures {
            edge_ratio: 0.0,
            distinct_edge_ratio: 0.0,
            long_edge_ratio: 0.0,
            edge_contrast: 0.0,
        };
    }

    let magnitude = sobel_magnitude(gray, width, height);
    let mut edge_count = 0usize;
    let mut distinct_count = 0usize;
    let mut total_contrast = 0.0f64;
    let mut mask = vec![false; magnitude.len()];

    for (m, is_edge) in magnitude.iter().zip(mask.iter_mut()) {
        if *m > EDGE_THRESHOLD {
            *is_edge = true;
            edge_count += 1;
            total_contrast += m;
            if *m > DISTINCT_EDGE_THRESHOLD {
                distinct_count += 1;
            }
        }
    }

    let long_edges = scan_components(
        width,
        height,
        &mask,
        |edge| edge,
        Connectivity::Eight,
        COMPONENT_CAP,
    )
    .iter()
    .filter(|c| is_long_edge(c.size, c.bbox_width(), c.bbox_height(), c.density()))
    .count();

    EdgeFeatures {
        edge_ratio: edge_count as f64 / area,
        distinct_edge_ratio: distinct_count as f64 / area,
        long_edge_ratio: long_edges as f64 / (area * 0.01),
        edge_contrast: if edge_count > 0 {
            total_contrast / edge_count as f64
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_step(width: u32, height: u32, split: u32) -> Vec<u8> {
        let mut gray = Vec::new();
        for _y in 0..height {
            for x in 0..width {
                gray.push(if x < split { 0 } else { 255 });
            }
        }
        gray
    }

    #[test]
    fn test_sobel_detects_vertical_edge() {
        let gray = vertical_step(10, 10, 5);
        let magnitude = sobel_magnitude(&gray, 10, 10);
        // Full step: 4 * 255
        assert_eq!(magnitude[5 * 10 + 5], 1020.0);
        assert_eq!(magnitude[5 * 10 + 4], 1020.0);
        assert_eq!(magnitude[5 * 10 + 2], 0.0);
    }

    #[test]
    fn test_sobel_uniform_image_no_edges() {
        let gray = vec![128u8; 100];
        let features = analyze_edges(&gray, 10, 10);
        assert_eq!(features.edge_ratio, 0.0);
        assert_eq!(features.distinct_edge_ratio, 0.0);
        assert_eq!(features.long_edge_ratio, 0.0);
        assert_eq!(features.edge_contrast, 0.0);
    }

    #[test]
    fn test_border_is_skipped() {
        let gray = vertical_step(2, 2, 1);
        let magnitude = sobel_magnitude(&gray, 2, 2);
        assert!(magnitude.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_long_vertical_edge_counts() {
        // Interior rows 1..=38 on two columns: 76 edge pixels, 38 tall
        let gray = vertical_step(40, 40, 20);
        let features = analyze_edges(&gray, 40, 40);
        assert!((features.edge_ratio - 76.0 / 1600.0).abs() < 1e-12);
        assert_eq!(features.edge_ratio, features.distinct_edge_ratio);
        // One long edge over 16 (1% of 1600)
        assert!((features.long_edge_ratio - 1.0 / 16.0).abs() < 1e-12);
        assert_eq!(features.edge_contrast, 1020.0);
    }

    #[test]
    fn test_short_edge_is_not_long() {
        let gray = vertical_step(10, 10, 5);
        let features = analyze_edges(&gray, 10, 10);
        assert!(features.edge_ratio > 0.0);
        assert_eq!(features.long_edge_ratio, 0.0);
    }

    #[test]
    fn test_long_edge_rule() {
        assert!(is_long_edge(31, 25, 2, 0.62));
        assert!(!is_long_edge(20, 21, 1, 0.95));
        assert!(is_long_edge(20, 10, 40, 0.05));
        assert!(!is_long_edge(15, 30, 1, 0.5));
    }
}
