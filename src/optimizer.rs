//! Derives processing parameters from the image type, the selections and
//! the measured features.
//!
//! Parameters are built in passes: a baseline per image family, a material
//! pass, a laser pass and finally a feature pass that retunes contrast,
//! shadows and gamma. Each pass reads the result of the previous one.

use crate::classifier::ImageType;
use crate::features::FeatureSet;
use crate::material::{Laser, Material, MaterialColor};
use serde::Serialize;

pub const PHOTO_GAMMA_MIN: f64 = 1.0;
pub const PHOTO_GAMMA_MAX: f64 = 2.5;
pub const CARTOON_GAMMA_MAX: f64 = 3.0;
pub const CARTOON_CONTRAST_MIN: i32 = 105;
pub const CARTOON_CONTRAST_MAX: i32 = 140;

/// Levels and shadow/highlight adjustments, each roughly -100..100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BrightnessAdjust {
    pub highlights: f64,
    pub shadows: f64,
    pub whites: f64,
    pub blacks: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnsharpParams {
    /// Percent; the pipeline uses `amount / 100` as strength.
    pub amount: i32,
    pub radius: u32,
    pub threshold: i32,
}

/// Everything the pixel pipeline needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingParameters {
    pub contrast: i32,
    pub gamma: f64,
    pub clahe_clip_limit: f64,
    pub clahe_tile_size: u32,
    pub clarity: i32,
    pub brightness: BrightnessAdjust,
    pub usm: UnsharpParams,
    pub invert: bool,
}

impl ProcessingParameters {
    /// Starting point for the cartoon family or for photos and portraits.
    pub fn baseline(cartoon: bool) -> Self {
        if cartoon {
            Self {
                contrast: 120,
                gamma: 1.2,
                clahe_clip_limit: 2.8,
                clahe_tile_size: 128,
                clarity: 28,
                brightness: BrightnessAdjust {
                    highlights: 0.0,
                    shadows: 10.0,
                    whites: 0.0,
                    blacks: 0.0,
                },
                usm: UnsharpParams {
                    amount: 65,
                    radius: 4,
                    threshold: 8,
                },
                invert: false,
            }
        } else {
            Self {
                contrast: 95,
                gamma: 1.6,
                clahe_clip_limit: 3.8,
                clahe_tile_size: 128,
                clarity: 25,
                brightness: BrightnessAdjust {
                    highlights: -15.0,
                    shadows: 30.0,
                    whites: 0.0,
                    blacks: 3.0,
                },
                usm: UnsharpParams {
                    amount: 75,
                    radius: 10,
                    threshold: 5,
                },
                invert: false,
            }
        }
    }

    /// Copy with only gamma replaced.
    pub fn with_gamma(&self, gamma: f64) -> Self {
        Self {
            gamma,
            ..self.clone()
        }
    }

    fn apply_material(&mut self, material: Material, cartoon: bool) {
        let gamma = |c: f64, p: f64| if cartoon { c } else { p };
        match material {
            Material::Wood => {
                self.gamma = gamma(1.0, 1.5);
            }
            Material::Metal => {
                self.contrast = (self.contrast + 15).min(120);
                self.clarity = (self.clarity + 5).min(30);
                self.usm.amount = (self.usm.amount + 15).min(100);
                self.usm.threshold = (self.usm.threshold - 2).max(3);
                self.gamma = gamma(0.8, 1.4);
            }
            Material::Plastic => {
                self.contrast = (self.contrast + 5).min(105);
                self.clarity = (self.clarity - 5).max(15);
                self.usm.threshold += 3;
                self.gamma = gamma(1.0, 1.5);
            }
            Material::Vinyl => {
                self.contrast = (self.contrast + 7).min(110);
                self.clarity = (self.clarity + 3).min(30);
                self.usm.radius = (self.usm.radius + 2).min(12);
                self.gamma = gamma(0.7, 1.1);
            }
            Material::Paper => {
                self.contrast = (self.contrast - 5).max(90);
                self.usm.amount = (self.usm.amount - 10).max(50);
                self.usm.threshold += 5;
                self.clarity = (self.clarity - 5).max(15);
                self.gamma = gamma(0.65, 1.0);
            }
            Material::Silicone => {
                self.contrast = (self.contrast - 10).max(90);
                self.clarity = (self.clarity - 5).max(10);
                self.usm.amount = (self.usm.amount - 15).max(50);
                self.usm.threshold += 8;
                self.gamma = gamma(0.6, 1.0);
            }
            Material::Rubber => {
                self.contrast = (self.contrast + 10).min(115);
                self.clarity = (self.clarity + 3).min(30);
                self.brightness.shadows += 15.0;
                self.usm.threshold += 3;
                self.gamma = gamma(0.7, 1.2);
            }
            Material::Leather => {
                self.contrast = (self.contrast + 8).min(110);
                self.clarity = (self.clarity + 5).min(30);
                self.usm.amount = (self.usm.amount + 5).min(90);
                self.usm.radius = (self.usm.radius + 1).min(9);
                self.gamma = gamma(0.75, 1.3);
            }
            Material::Stone => {
                self.contrast = (self.contrast + 15).min(120);
                self.clarity = (self.clarity + 5).min(30);
                self.usm.amount = (self.usm.amount + 10).min(95);
                self.gamma = gamma(0.8, 1.4);
            }
            Material::ScreenPrinting => {
                self.contrast = (self.contrast + 25).min(130);
                self.clarity = (self.clarity + 5).min(30);
                self.usm.amount = (self.usm.amount + 20).min(100);
                self.usm.threshold = (self.usm.threshold - 3).max(2);
                self.gamma = gamma(0.9, 1.5);
            }
            Material::Other => {}
        }
    }

    fn apply_laser(&mut self, laser: Laser, cartoon: bool) {
        match laser {
            Laser::Co2 => {
                self.contrast = (self.contrast + 8).min(115);
                self.clarity = (self.clarity + 5).min(30);
                self.usm.amount = (self.usm.amount + 5).min(100);
                if !cartoon {
                    self.brightness.blacks -= 5.0;
                }
            }
            Laser::Blue => {
                self.contrast = (self.contrast - 3).max(95);
                self.clarity = (self.clarity + 5).min(30);
                self.usm.radius = self.usm.radius.saturating_sub(2).clamp(4, 9);
                self.usm.threshold = (self.usm.threshold - 3).max(1);
                self.brightness.shadows += 20.0;
                self.clahe_clip_limit = (self.clahe_clip_limit + 0.8).min(6.0);
            }
            Laser::Red => {
                self.contrast = (self.contrast + 15).min(125);
                self.clarity = (self.clarity + 5).min(30);
                self.gamma = (self.gamma + 0.2).min(2.0);
                self.usm.amount = (self.usm.amount + 15).min(100);
                self.usm.threshold = (self.usm.threshold - 2).max(2);
                self.brightness.blacks -= 8.0;
                self.brightness.whites += 5.0;
                self.brightness.shadows += 10.0;
            }
        }
    }

    fn apply_features(&mut self, features: &FeatureSet, material: Material, cartoon: bool) {
        if features.contrast < 40.0 {
            self.contrast = (self.contrast + 5).min(110);
            self.clahe_clip_limit = (self.clahe_clip_limit + 0.5).min(5.0);
        } else if features.contrast > 100.0 {
            self.contrast = (self.contrast - 5).max(90);
        }

        if !cartoon && features.dark_ratio > 0.25 {
            let boost = (20.0 + features.dark_ratio * 50.0).min(45.0);
            self.brightness.shadows = self.brightness.shadows.max(boost);
            if material == Material::Rubber {
                self.brightness.shadows += 10.0;
            }
            log::debug!(
                "dark ratio {:.3} raised shadows to {}",
                features.dark_ratio,
                self.brightness.shadows
            );
        }

        if cartoon {
            self.retune_cartoon(features);
        } else {
            self.retune_photo(features);
        }
    }

    fn retune_photo(&mut self, features: &FeatureSet) {
        let brightness = features.brightness;

        if features.dark_ratio > 0.4 {
            self.gamma = if features.dark_ratio > 0.8 {
                PHOTO_GAMMA_MIN
            } else {
                let reduction = (features.dark_ratio - 0.4).min(0.4);
                (self.gamma - reduction).max(PHOTO_GAMMA_MIN)
            };
        } else if brightness < 100.0 {
            let factor = ((100.0 - brightness) / 100.0).max(0.0) * 0.7;
            self.gamma -= factor * (self.gamma - PHOTO_GAMMA_MIN);
        } else if brightness > 160.0 {
            let factor = ((brightness - 160.0) / 95.0).clamp(0.0, 1.0);
            self.gamma += factor * (PHOTO_GAMMA_MAX - self.gamma);
        }

        if features.bright_ratio > 0.5 && features.dark_ratio < 0.3 {
            let boost = ((features.bright_ratio - 0.5) * 1.5).min(0.7);
            self.gamma = (self.gamma + boost).min(PHOTO_GAMMA_MAX);
        }

        self.gamma = self.gamma.clamp(PHOTO_GAMMA_MIN, PHOTO_GAMMA_MAX);
    }

    fn retune_cartoon(&mut self, features: &FeatureSet) {
        if features.brightness < 80.0 {
            self.contrast = (self.contrast + 20).min(CARTOON_CONTRAST_MAX);
        } else if features.brightness > 180.0 {
            self.contrast = (self.contrast - 5).max(CARTOON_CONTRAST_MIN);
            self.brightness.whites = (self.brightness.whites + 5.0).min(30.0);
        }

        if features.contrast < 40.0 {
            self.contrast = (self.contrast + 15).min(CARTOON_CONTRAST_MAX);
        } else if features.contrast > 100.0 {
            self.contrast = (self.contrast - 10).max(CARTOON_CONTRAST_MIN);
        }

        if features.bright_ratio > 0.3 {
            self.gamma = (self.gamma + 0.2).min(2.0);
        }

        self.contrast = self.contrast.clamp(CARTOON_CONTRAST_MIN, CARTOON_CONTRAST_MAX);

        let start = self.gamma;
        if features.dark_ratio > 0.4 {
            self.gamma = if features.dark_ratio > 0.85 {
                0.8
            } else {
                (start - 0.5).max(0.9)
            };
        } else if features.bright_ratio > 0.3 {
            let br = features.bright_ratio;
            let step = if br > 0.7 {
                1.2 + (br - 0.7) * 2.5
            } else if br > 0.5 {
                0.9 + (br - 0.5) * 1.5
            } else {
                0.8 * br
            };
            self.gamma = (start + step).min(CARTOON_GAMMA_MAX);
        }

        if features.dark_ratio <= 0.7 && self.gamma < 1.0 {
            self.gamma = 1.0;
        }
    }
}

/// Build parameters for an image. The emitted gamma is the recommended gamma.
pub fn optimize(
    image_type: ImageType,
    material: Material,
    color: MaterialColor,
    laser: Option<Laser>,
    features: &FeatureSet,
) -> ProcessingParameters {
    let cartoon = image_type.is_cartoon_family();
    let mut params = ProcessingParameters::baseline(cartoon);
    params.invert = color.is_dark();

    params.apply_material(material, cartoon);
    if let Some(laser) = laser {
        params.apply_laser(laser, cartoon);
    }
    params.apply_features(features, material, cartoon);

    log::debug!(
        "parameters for {} on {} ({}), laser {}: contrast {}, gamma {:.2}, clip {:.1}, clarity {}, usm {}/{}/{}",
        image_type,
        material,
        color,
        laser.map_or("none", Laser::as_str),
        params.contrast,
        params.gamma,
        params.clahe_clip_limit,
        params.clarity,
        params.usm.amount,
        params.usm.radius,
        params.usm.threshold
    );

    params
}
