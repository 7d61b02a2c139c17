//! Advisory outputs bundled for display or export: engraving depth, gamma
//! effect, a strategy summary and before/after histograms.

use crate::classifier::ImageType;
use crate::error::{EngraveError, Result};
use crate::features::FeatureSet;
use crate::histogram::Histogram;
use crate::optimizer::{BrightnessAdjust, ProcessingParameters};
use crate::session::{Selections, Session};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngravingDepth {
    Shallow,
    Medium,
    Deep,
}

impl EngravingDepth {
    pub fn recommend(image_type: ImageType, features: &FeatureSet) -> Self {
        match image_type {
            ImageType::Cartoon | ImageType::Text => EngravingDepth::Deep,
            ImageType::Portrait => EngravingDepth::Medium,
            ImageType::Photo if features.contrast < 40.0 || features.brightness < 80.0 => {
                EngravingDepth::Shallow
            }
            ImageType::Photo => EngravingDepth::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EngravingDepth::Shallow => "shallow",
            EngravingDepth::Medium => "medium",
            EngravingDepth::Deep => "deep",
        }
    }
}

impl fmt::Display for EngravingDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a gamma value does to the midtones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GammaEffect {
    StrongDarkening,
    Darkening,
    Balanced,
    Brightening,
    StrongBrightening,
}

impl GammaEffect {
    pub fn for_gamma(gamma: f64) -> Self {
        if gamma > 1.5 {
            GammaEffect::StrongDarkening
        } else if gamma > 1.2 {
            GammaEffect::Darkening
        } else if gamma <= 0.8 {
            GammaEffect::StrongBrightening
        } else if gamma < 0.9 {
            GammaEffect::Brightening
        } else {
            GammaEffect::Balanced
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GammaEffect::StrongDarkening => "midtones strongly darkened",
            GammaEffect::Darkening => "midtones darkened",
            GammaEffect::Balanced => "balanced adjustment",
            GammaEffect::Brightening => "overall brightened",
            GammaEffect::StrongBrightening => "overall strongly brightened",
        }
    }
}

impl fmt::Display for GammaEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

fn type_label(image_type: ImageType) -> &'static str {
    match image_type {
        ImageType::Photo => "photo",
        ImageType::Cartoon => "cartoon / line art",
        ImageType::Portrait => "portrait",
        ImageType::Text => "text / icon",
    }
}

/// One-line description of the tuning strategy for an image.
pub fn strategy_summary(image_type: ImageType, features: &FeatureSet) -> String {
    let strategy = match image_type {
        ImageType::Cartoon => {
            let lines = "sharpen line work, keep white areas unchanged, ";
            let tone = if features.bright_ratio > 0.3 {
                "raise gamma to deepen midtones"
            } else if features.dark_ratio > 0.85 {
                "lower gamma sharply so a very dark image opens up"
            } else if features.dark_ratio > 0.4 {
                "lower gamma so dark areas stand out"
            } else {
                "adjust midtones moderately"
            };
            format!("{lines}{tone}")
        }
        ImageType::Portrait => {
            "keep facial detail, bring out skin texture, soften contrast".to_string()
        }
        ImageType::Text => "maximize text clarity with crisp edges".to_string(),
        ImageType::Photo => {
            "balance overall detail, layer textures, keep natural tonal transitions".to_string()
        }
    };
    format!("Strategy for {}: {}", type_label(image_type), strategy)
}

/// Non-zero brightness adjustments as `name=value` pairs, or "none".
pub fn describe_brightness(b: &BrightnessAdjust) -> String {
    let parts: Vec<String> = [
        ("highlights", b.highlights),
        ("shadows", b.shadows),
        ("whites", b.whites),
        ("blacks", b.blacks),
    ]
    .iter()
    .filter(|(_, v)| *v != 0.0)
    .map(|(name, v)| format!("{name}={v}"))
    .collect();

    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

/// Everything a display or an export needs to explain one run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub width: u32,
    pub height: u32,
    pub image_type: ImageType,
    pub selections: SelectionsReport,
    pub features: FeatureSet,
    pub params: ProcessingParameters,
    pub recommended_gamma: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma_override: Option<f64>,
    pub depth: EngravingDepth,
    pub gamma_effect: GammaEffect,
    pub summary: String,
    pub histogram_before: Histogram,
    pub histogram_after: Histogram,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionsReport {
    pub material: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laser: Option<String>,
}

impl From<Selections> for SelectionsReport {
    fn from(s: Selections) -> Self {
        Self {
            material: s.material.to_string(),
            color: s.color.to_string(),
            laser: s.laser.map(|l| l.to_string()),
        }
    }
}

impl AnalysisReport {
    /// Build a report from an analyzed session.
    pub fn from_session(session: &Session) -> Result<Self> {
        let (Some(features), Some(image_type), Some(params), Some(recommended), Some(output)) = (
            session.features(),
            session.image_type(),
            session.params(),
            session.recommended_gamma(),
            session.output(),
        ) else {
            return Err(EngraveError::NotAnalyzed);
        };

        let original = session.original();
        Ok(Self {
            width: original.width,
            height: original.height,
            image_type,
            selections: session.selections().into(),
            features: features.clone(),
            params: params.clone(),
            recommended_gamma: recommended,
            gamma_override: session.gamma_override(),
            depth: EngravingDepth::recommend(image_type, features),
            gamma_effect: GammaEffect::for_gamma(params.gamma),
            summary: strategy_summary(image_type, features),
            histogram_before: Histogram::from_image(original),
            histogram_after: Histogram::from_image(output),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
