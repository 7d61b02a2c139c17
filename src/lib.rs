//! img2laser - image preparation for laser engraving
//!
//! This library analyzes a raster image, decides what kind of picture it is
//! and derives processing parameters for the chosen material and laser, then
//! runs a fixed pixel pipeline that produces an engraving-ready grayscale
//! image.
//!
//! ## Features
//!
//! - **Feature extraction**: brightness histogram, Sobel edges, texture and
//!   skin-tone statistics
//! - **Rule-based classification** into photo, cartoon, portrait or text
//! - **Parameter optimization** per material, material color and laser source
//! - **Pixel pipeline**: contrast, gamma, cubic CLAHE, levels, clarity and an
//!   edge-aware unsharp mask, finished with BT.709 grayscale
//!
//! ## Example
//!
//! ```rust,no_run
//! use img2laser::{convert, ConversionOptions, Material, MaterialColor};
//! use std::path::Path;
//!
//! let options = ConversionOptions {
//!     material: Material::Leather,
//!     color: MaterialColor::Dark,
//!     ..Default::default()
//! };
//!
//! convert(Path::new("input.jpg"), Path::new("engrave.png"), &options)
//!     .expect("Conversion failed");
//! ```

pub mod clahe;
pub mod classifier;
pub mod components;
pub mod config;
pub mod edge_detector;
pub mod error;
pub mod features;
pub mod filters;
pub mod histogram;
pub mod image_processor;
pub mod material;
pub mod optimizer;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod sharpen;
pub mod texture;

pub use classifier::{classify, ImageType};
pub use config::Config;
pub use error::EngraveError;
pub use features::{extract_features, FeatureSet};
pub use image_processor::{load_image, save_image, ImageData, DEFAULT_MAX_DIMENSION};
pub use material::{Laser, Material, MaterialColor};
pub use optimizer::{optimize, ProcessingParameters};
pub use pipeline::process_image;
pub use report::{AnalysisReport, EngravingDepth, GammaEffect};
pub use session::{Selections, Session};
pub use anyhow::Result;

use anyhow::Context;
use std::path::Path;

/// Options for preparing an image file
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Engraving material (default: wood)
    pub material: Material,
    /// Surface tone; dark surfaces get an inverted output (default: light)
    pub color: MaterialColor,
    /// Laser source, `None` for no laser-specific tuning
    pub laser: Option<Laser>,
    /// Gamma to use instead of the recommended one
    pub gamma: Option<f64>,
    /// Longer side limit applied when loading (default: 2048)
    pub max_dimension: u32,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            material: Material::default(),
            color: MaterialColor::default(),
            laser: None,
            gamma: None,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl From<&Config> for ConversionOptions {
    fn from(config: &Config) -> Self {
        Self {
            material: config.material,
            color: config.color,
            laser: config.laser,
            gamma: config.gamma,
            max_dimension: config.max_dimension,
        }
    }
}

impl ConversionOptions {
    fn selections(&self) -> Selections {
        Selections {
            material: self.material,
            color: self.color,
            laser: self.laser,
        }
    }
}

/// Analyze and process in-memory image data.
///
/// The returned session holds the features, image type, parameters and the
/// processed output; a gamma override from the options is already applied.
pub fn prepare(image_data: ImageData, options: &ConversionOptions) -> Result<Session> {
    let mut session = Session::with_selections(image_data, options.selections());
    session.analyze()?;
    if let Some(gamma) = options.gamma {
        session.set_gamma(gamma)?;
    }
    Ok(session)
}

/// Analyze an image file without writing any output.
pub fn analyze_file(input_path: &Path, options: &ConversionOptions) -> Result<AnalysisReport> {
    let image_data = load_image(input_path, options.max_dimension)
        .with_context(|| format!("Failed to load {}", input_path.display()))?;
    let session = prepare(image_data, options)?;
    Ok(AnalysisReport::from_session(&session)?)
}

/// Prepare an image file for engraving and save the result as PNG
///
/// # Arguments
///
/// * `input_path` - Path to the input image file
/// * `output_path` - Path to the output PNG file
/// * `options` - Conversion options
///
/// # Example
///
/// ```rust,no_run
/// use img2laser::{convert, ConversionOptions};
/// use std::path::Path;
///
/// let options = ConversionOptions::default();
/// let report = convert(Path::new("input.png"), Path::new("output.png"), &options)?;
/// println!("{}", report.summary);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert(
    input_path: &Path,
    output_path: &Path,
    options: &ConversionOptions,
) -> Result<AnalysisReport> {
    let image_data = load_image(input_path, options.max_dimension)
        .with_context(|| format!("Failed to load {}", input_path.display()))?;
    let session = prepare(image_data, options)?;

    let output = session.output().ok_or(EngraveError::NotAnalyzed)?;
    save_image(output, output_path)
        .with_context(|| format!("Failed to save {}", output_path.display()))?;

    Ok(AnalysisReport::from_session(&session)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    #[test]
    fn test_conversion_options_default() {
        let options = ConversionOptions::default();
        assert_eq!(options.material, Material::Wood);
        assert_eq!(options.color, MaterialColor::Light);
        assert_eq!(options.laser, None);
        assert_eq!(options.gamma, None);
        assert_eq!(options.max_dimension, 2048);
    }

    #[test]
    fn test_options_from_config() {
        let config = Config {
            material: Material::Stone,
            laser: Some(Laser::Red),
            gamma: Some(1.1),
            ..Config::default()
        };
        let options = ConversionOptions::from(&config);
        assert_eq!(options.material, Material::Stone);
        assert_eq!(options.laser, Some(Laser::Red));
        assert_eq!(options.gamma, Some(1.1));
    }

    #[test]
    fn test_prepare_applies_gamma_override() {
        let pixels = (0..64u32)
            .map(|i| {
                let v = (i * 4) as u8;
                RGBA8::new(v, v, v, 255)
            })
            .collect();
        let image = ImageData {
            width: 8,
            height: 8,
            pixels,
        };
        let options = ConversionOptions {
            gamma: Some(2.2),
            ..Default::default()
        };
        let session = prepare(image, &options).unwrap();
        assert_eq!(session.gamma_override(), Some(2.2));
        assert_eq!(session.params().unwrap().gamma, 2.2);
    }
}
