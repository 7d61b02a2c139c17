//! Assembles every classification feature for an image.

use crate::edge_detector::analyze_edges;
use crate::error::Result;
use crate::histogram::Histogram;
use crate::image_processor::ImageData;
use crate::texture::{analyze_texture, smoothness};
use serde::Serialize;

/// Brightness below which a pixel counts as dark.
pub const DARK_LEVEL: usize = 64;
/// Brightness above which a pixel counts as bright.
pub const BRIGHT_LEVEL: usize = 192;

/// Statistics the classifier and parameter optimizer work from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSet {
    /// Mean BT.601 brightness.
    pub brightness: f64,
    /// Population standard deviation of brightness.
    pub contrast: f64,
    pub dark_ratio: f64,
    pub bright_ratio: f64,
    pub peak_count: usize,
    /// Up to three histogram peaks, tallest first.
    pub peak_positions: Vec<u8>,
    pub bw_ratio: f64,
    pub valley_depth: f64,
    pub edge_ratio: f64,
    pub distinct_edge_ratio: f64,
    pub long_edge_ratio: f64,
    pub edge_contrast: f64,
    pub color_simplicity: f64,
    pub low_variance_area_ratio: f64,
    pub skin_tone_ratio: f64,
    pub color_block_count: usize,
    pub smoothness: f64,
    pub detail_richness: f64,
    pub avg_block_variance: f64,
}

/// Compute the feature set. Fails only on an empty or malformed buffer.
pub fn extract_features(image_data: &ImageData) -> Result<FeatureSet> {
    image_data.validate()?;
    let (width, height) = (image_data.width, image_data.height);

    let histogram = Histogram::from_image(image_data);
    let shape = histogram.analyze();

    let gray = image_data.gray_plane();
    let edges = analyze_edges(&gray, width, height);
    let texture = analyze_texture(&gray, &image_data.pixels, width, height);
    let smooth = smoothness(image_data);

    let features = FeatureSet {
        brightness: histogram.mean(),
        contrast: histogram.std_dev(),
        dark_ratio: histogram.ratio_below(DARK_LEVEL),
        bright_ratio: histogram.ratio_above(BRIGHT_LEVEL),
        peak_count: shape.peak_count,
        peak_positions: shape.peaks.iter().map(|p| p.position).collect(),
        bw_ratio: shape.bw_ratio,
        valley_depth: shape.valley_depth,
        edge_ratio: edges.edge_ratio,
        distinct_edge_ratio: edges.distinct_edge_ratio,
        long_edge_ratio: edges.long_edge_ratio,
        edge_contrast: edges.edge_contrast,
        color_simplicity: texture.color_simplicity,
        low_variance_area_ratio: texture.low_variance_area_ratio,
        skin_tone_ratio: texture.skin_tone_ratio,
        color_block_count: texture.color_block_count,
        smoothness: smooth.smoothness,
        detail_richness: 1.0 - smooth.smoothness,
        avg_block_variance: smooth.avg_variance,
    };

    log::debug!(
        "features: brightness {:.1}, contrast {:.1}, dark {:.3}, bright {:.3}, peaks {}, bw {:.3}, low variance {:.3}, skin {:.3}",
        features.brightness,
        features.contrast,
        features.dark_ratio,
        features.bright_ratio,
        features.peak_count,
        features.bw_ratio,
        features.low_variance_area_ratio,
        features.skin_tone_ratio
    );

    Ok(features)
}
