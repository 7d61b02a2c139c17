//! Brightness histogram and the statistics derived from it.

use crate::image_processor::{brightness, ImageData};
use serde::Serialize;

/// Minimum smoothed density for a bin to count as a peak.
const PEAK_THRESHOLD: f64 = 0.002;
/// Brightness at or below which a pixel counts as black.
const BW_LOW: usize = 10;
/// Brightness at or above which a pixel counts as white.
const BW_HIGH: usize = 245;

/// 256-bin brightness histogram. The bins always sum to the pixel count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    #[serde(with = "bins_serde")]
    bins: [u64; 256],
}

mod bins_serde {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bins: &[u64; 256], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(bins.iter())
    }
}

/// A histogram peak: bin position and smoothed density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub position: u8,
    pub height: f64,
}

/// Shape features of the histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramFeatures {
    pub peak_count: usize,
    /// Up to three peaks, tallest first.
    pub peaks: Vec<Peak>,
    pub bw_ratio: f64,
    pub valley_depth: f64,
}

impl Histogram {
    /// BT.601 brightness histogram of an image.
    pub fn from_image(image_data: &ImageData) -> Self {
        let mut bins = [0u64; 256];
        for p in &image_data.pixels {
            bins[brightness(p) as usize] += 1;
        }
        Self { bins }
    }

    pub fn from_bins(bins: [u64; 256]) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u64; 256] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &c)| i as f64 * c as f64)
            .sum();
        sum / total as f64
    }

    /// Population standard deviation of brightness.
    pub fn std_dev(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let variance: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as f64 - mean).powi(2) * c as f64)
            .sum();
        (variance / total as f64).sqrt()
    }

    /// Fraction of pixels with brightness strictly below `level`.
    pub fn ratio_below(&self, level: usize) -> f64 {
        self.ratio_of(0..level.min(256))
    }

    /// Fraction of pixels with brightness strictly above `level`.
    pub fn ratio_above(&self, level: usize) -> f64 {
        self.ratio_of((level + 1).min(256)..256)
    }

    fn ratio_of(&self, range: std::ops::Range<usize>) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let count: u64 = self.bins[range].iter().sum();
        count as f64 / total as f64
    }

    /// Density smoothed with a centered moving average of half-width 2.
    /// The window shrinks at both ends.
    pub fn smoothed_density(&self) -> [f64; 256] {
        let total = self.total();
        let mut smoothed = [0.0f64; 256];
        if total == 0 {
            return smoothed;
        }
        let normalized: Vec<f64> = self.bins.iter().map(|&c| c as f64 / total as f64).collect();
        for (i, slot) in smoothed.iter_mut().enumerate() {
            let start = i.saturating_sub(2);
            let end = (i + 2).min(255);
            let window = &normalized[start..=end];
            *slot = window.iter().sum::<f64>() / window.len() as f64;
        }
        smoothed
    }

    /// Peak count, top peaks, black/white ratio and valley depth.
    pub fn analyze(&self) -> HistogramFeatures {
        let smoothed = self.smoothed_density();
        let mut peaks = find_peaks(&smoothed);
        peaks.sort_by(|a, b| b.height.partial_cmp(&a.height).unwrap_or(std::cmp::Ordering::Equal));

        let total = self.total();
        let bw_ratio = if total > 0 {
            let dark: u64 = self.bins[..=BW_LOW].iter().sum();
            let light: u64 = self.bins[BW_HIGH..].iter().sum();
            (dark + light) as f64 / total as f64
        } else {
            0.0
        };

        let valley_depth = valley_depth(&smoothed, &peaks);
        let peak_count = peaks.len();
        peaks.truncate(3);

        HistogramFeatures {
            peak_count,
            peaks,
            bw_ratio,
            valley_depth,
        }
    }
}

fn find_peaks(smoothed: &[f64; 256]) -> Vec<Peak> {
    let mut peaks = Vec::new();
    for i in 2..254 {
        let s = smoothed[i];
        if s > PEAK_THRESHOLD
            && s > smoothed[i - 1]
            && s > smoothed[i - 2]
            && s >= smoothed[i + 1]
            && s >= smoothed[i + 2]
        {
            let local_min_left = smoothed[i - 1].min(smoothed[i - 2]);
            let local_min_right = smoothed[i + 1].min(smoothed[i + 2]);
            if s > local_min_left * 1.1 && s > local_min_right * 1.1 {
                peaks.push(Peak {
                    position: i as u8,
                    height: s,
                });
            }
        }
    }

    if peaks.is_empty() {
        for i in 1..255 {
            let s = smoothed[i];
            if s > PEAK_THRESHOLD && s > smoothed[i - 1] && s >= smoothed[i + 1] {
                let far_enough = peaks
                    .last()
                    .map_or(true, |p: &Peak| (i as i32 - p.position as i32).abs() > 3);
                if far_enough {
                    peaks.push(Peak {
                        position: i as u8,
                        height: s,
                    });
                }
            }
        }
    }

    peaks
}

/// Depth of the valley between the two tallest peaks, 0 when shallow.
fn valley_depth(smoothed: &[f64; 256], peaks: &[Peak]) -> f64 {
    if peaks.len() < 2 {
        return 0.0;
    }
    let start = peaks[0].position.min(peaks[1].position) as usize;
    let end = peaks[0].position.max(peaks[1].position) as usize;
    if end - start <= 5 {
        return 0.0;
    }

    let min_between = smoothed[start + 1..end]
        .iter()
        .fold(1.0f64, |acc, &v| acc.min(v));
    let lower_peak = peaks[0].height.min(peaks[1].height);
    if lower_peak > 0.0 && min_between < lower_peak * 0.9 {
        1.0 - min_between / lower_peak
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    fn histogram_with(entries: &[(usize, u64)]) -> Histogram {
        let mut bins = [0u64; 256];
        for &(i, c) in entries {
            bins[i] = c;
        }
        Histogram::from_bins(bins)
    }

    #[test]
    fn test_uniform_gray_spike() {
        let img = ImageData {
            width: 4,
            height: 4,
            pixels: vec![RGBA8::new(128, 128, 128, 255); 16],
        };
        let hist = Histogram::from_image(&img);
        assert_eq!(hist.total(), 16);
        assert_eq!(hist.bins()[128], 16);
        assert_eq!(hist.mean(), 128.0);
        assert_eq!(hist.std_dev(), 0.0);
        assert_eq!(hist.ratio_below(64), 0.0);
        assert_eq!(hist.ratio_above(192), 0.0);

        let features = hist.analyze();
        assert!(features.peak_count <= 1);
        assert_eq!(features.bw_ratio, 0.0);
        assert_eq!(features.valley_depth, 0.0);
    }

    #[test]
    fn test_dark_and_bright_ratios() {
        let hist = histogram_with(&[(10, 30), (63, 10), (64, 20), (192, 15), (193, 25)]);
        assert_eq!(hist.total(), 100);
        assert!((hist.ratio_below(64) - 0.4).abs() < 1e-12);
        assert!((hist.ratio_above(192) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_bimodal_peaks_and_valley() {
        let hist = histogram_with(&[(50, 500), (200, 400)]);
        let features = hist.analyze();
        assert_eq!(features.peak_count, 2);
        // Single-bin spikes smooth into plateaus, so the fallback scan picks
        // the left edge of each plateau.
        assert_eq!(features.peaks[0].position, 48);
        assert_eq!(features.peaks[1].position, 198);
        // Nothing between the peaks, so the valley is as deep as it gets.
        assert!((features.valley_depth - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_close_peaks_have_no_valley() {
        let hist = histogram_with(&[(100, 500), (104, 400)]);
        let features = hist.analyze();
        assert_eq!(features.valley_depth, 0.0);
    }

    #[test]
    fn test_bw_ratio_counts_extremes() {
        let hist = histogram_with(&[(0, 40), (10, 10), (11, 25), (245, 20), (255, 5)]);
        let features = hist.analyze();
        assert!((features.bw_ratio - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_window_shrinks_at_edges() {
        let hist = histogram_with(&[(0, 10)]);
        let smoothed = hist.smoothed_density();
        // Bin 0 averages bins 0..=2
        assert!((smoothed[0] - 1.0 / 3.0).abs() < 1e-12);
        // Bin 2 averages bins 0..=4
        assert!((smoothed[2] - 0.2).abs() < 1e-12);
        assert_eq!(smoothed[3], 0.0);
    }

    #[test]
    fn test_at_most_three_peaks_reported() {
        let hist = histogram_with(&[(20, 100), (70, 90), (120, 80), (170, 70), (220, 60)]);
        let features = hist.analyze();
        assert_eq!(features.peak_count, 5);
        assert_eq!(features.peaks.len(), 3);
        assert_eq!(features.peaks[0].position, 18);
    }
}
