//! Rule cascade that decides what kind of picture an image is.

use crate::features::FeatureSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Photo,
    Cartoon,
    Portrait,
    Text,
}

impl ImageType {
    /// Text is tuned exactly like cartoons.
    pub fn is_cartoon_family(self) -> bool {
        matches!(self, ImageType::Cartoon | ImageType::Text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::Photo => "photo",
            ImageType::Cartoon => "cartoon",
            ImageType::Portrait => "portrait",
            ImageType::Text => "text",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the cascade. The first rule whose predicate holds decides.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&FeatureSet) -> bool,
    pub result: ImageType,
}

fn line_art(f: &FeatureSet) -> bool {
    (f.peak_count <= 3 || f.peak_count == 0) && f.bw_ratio > 0.8
}

fn very_flat(f: &FeatureSet) -> bool {
    f.low_variance_area_ratio > 0.95 || (f.low_variance_area_ratio > 0.92 && f.bw_ratio > 0.001)
}

fn high_black_white(f: &FeatureSet) -> bool {
    f.bw_ratio > 0.7
}

fn black_white_and_flat(f: &FeatureSet) -> bool {
    f.bw_ratio > 0.5 && f.low_variance_area_ratio > 0.7
}

fn geometric(f: &FeatureSet) -> bool {
    f.long_edge_ratio > 0.15
        && f.color_block_count < 10
        && f.color_simplicity > 0.7
        && f.low_variance_area_ratio > 0.8
}

fn consistent_colors(f: &FeatureSet) -> bool {
    f.color_simplicity > 0.85 && f.low_variance_area_ratio > 0.75 && f.peak_count <= 4
}

fn flat_with_sharp_edges(f: &FeatureSet) -> bool {
    let flat = f.low_variance_area_ratio > 0.85 && f.bw_ratio > 0.01;
    let sharp = f.distinct_edge_ratio > 0.04 && f.edge_contrast > 50.0;
    if !(flat && sharp) {
        return false;
    }
    let photo_like = f.peak_count == 1 && f.contrast < 50.0;
    let busy = f.peak_count > 5;
    let skin = f.skin_tone_ratio > 0.3;
    !(photo_like || busy || skin)
}

fn skin_tones(f: &FeatureSet) -> bool {
    f.skin_tone_ratio > 0.15 && f.contrast < 70.0
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "line-art",
        matches: line_art,
        result: ImageType::Cartoon,
    },
    Rule {
        name: "very-flat",
        matches: very_flat,
        result: ImageType::Cartoon,
    },
    Rule {
        name: "high-black-white",
        matches: high_black_white,
        result: ImageType::Cartoon,
    },
    Rule {
        name: "black-white-and-flat",
        matches: black_white_and_flat,
        result: ImageType::Cartoon,
    },
    Rule {
        name: "geometric",
        matches: geometric,
        result: ImageType::Cartoon,
    },
    Rule {
        name: "consistent-colors",
        matches: consistent_colors,
        result: ImageType::Cartoon,
    },
    Rule {
        name: "flat-with-sharp-edges",
        matches: flat_with_sharp_edges,
        result: ImageType::Cartoon,
    },
    Rule {
        name: "skin-tones",
        matches: skin_tones,
        result: ImageType::Portrait,
    },
];

/// Name of the first rule that matches, if any.
pub fn matching_rule(features: &FeatureSet) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.matches)(features))
}

pub fn classify(features: &FeatureSet) -> ImageType {
    match matching_rule(features) {
        Some(rule) => {
            log::debug!("classified as {} by rule '{}'", rule.result, rule.name);
            rule.result
        }
        None => {
            log::debug!("no rule matched, classified as photo");
            ImageType::Photo
        }
    }
}
