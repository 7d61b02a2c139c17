//! Analysis session: keeps the original image and recomputes results when
//! selections or the gamma override change.

use crate::classifier::{classify, ImageType};
use crate::error::{EngraveError, Result};
use crate::features::{extract_features, FeatureSet};
use crate::image_processor::ImageData;
use crate::material::{Laser, Material, MaterialColor};
use crate::optimizer::{optimize, ProcessingParameters};
use crate::pipeline::process_image;

/// Material, surface color and laser chosen for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selections {
    pub material: Material,
    pub color: MaterialColor,
    pub laser: Option<Laser>,
}

/// Results of the last successful analysis.
#[derive(Debug, Clone)]
struct Analysis {
    features: FeatureSet,
    image_type: ImageType,
    params: ProcessingParameters,
    recommended_gamma: f64,
    gamma_override: Option<f64>,
    output: ImageData,
}

/// Holds an original image and the results derived from it.
///
/// Every recomputation starts from the retained original. A failing step
/// leaves the previously stored results as they were.
#[derive(Debug, Clone)]
pub struct Session {
    original: ImageData,
    selections: Selections,
    analysis: Option<Analysis>,
}

impl Session {
    pub fn new(original: ImageData) -> Self {
        Self::with_selections(original, Selections::default())
    }

    pub fn with_selections(original: ImageData, selections: Selections) -> Self {
        Self {
            original,
            selections,
            analysis: None,
        }
    }

    /// Extract features, classify, optimize and process.
    pub fn analyze(&mut self) -> Result<()> {
        let features = extract_features(&self.original)?;
        let image_type = classify(&features);
        let analysis = self.build(features, image_type)?;
        log::info!(
            "analyzed {}x{} image as {}, gamma {:.2}",
            self.original.width,
            self.original.height,
            image_type,
            analysis.recommended_gamma
        );
        self.analysis = Some(analysis);
        Ok(())
    }

    /// Re-optimize and re-process with new selections. Features and the
    /// image type are reused; a pending gamma override is dropped.
    pub fn set_selections(
        &mut self,
        material: Material,
        color: MaterialColor,
        laser: Option<Laser>,
    ) -> Result<()> {
        let selections = Selections {
            material,
            color,
            laser,
        };
        let previous = std::mem::replace(&mut self.selections, selections);
        let Some(current) = &self.analysis else {
            return Ok(());
        };
        match self.build(current.features.clone(), current.image_type) {
            Ok(analysis) => {
                self.analysis = Some(analysis);
                Ok(())
            }
            Err(err) => {
                self.selections = previous;
                Err(err)
            }
        }
    }

    /// Re-run only the pixel pipeline with a different gamma.
    pub fn set_gamma(&mut self, gamma: f64) -> Result<()> {
        let analysis = self.analysis.as_ref().ok_or(EngraveError::NotAnalyzed)?;
        let params = analysis.params.with_gamma(gamma);
        let output = process_image(&self.original, &params)?;
        log::debug!("gamma override {:.2}", gamma);
        if let Some(analysis) = self.analysis.as_mut() {
            analysis.params = params;
            analysis.gamma_override = Some(gamma);
            analysis.output = output;
        }
        Ok(())
    }

    /// Return to the recommended gamma.
    pub fn reset_gamma(&mut self) -> Result<()> {
        let recommended = self
            .analysis
            .as_ref()
            .ok_or(EngraveError::NotAnalyzed)?
            .recommended_gamma;
        self.set_gamma(recommended)?;
        if let Some(analysis) = self.analysis.as_mut() {
            analysis.gamma_override = None;
        }
        Ok(())
    }

    fn build(&self, features: FeatureSet, image_type: ImageType) -> Result<Analysis> {
        let s = self.selections;
        let params = optimize(image_type, s.material, s.color, s.laser, &features);
        let output = process_image(&self.original, &params)?;
        Ok(Analysis {
            features,
            image_type,
            recommended_gamma: params.gamma,
            params,
            gamma_override: None,
            output,
        })
    }

    pub fn original(&self) -> &ImageData {
        &self.original
    }

    pub fn selections(&self) -> Selections {
        self.selections
    }

    pub fn is_analyzed(&self) -> bool {
        self.analysis.is_some()
    }

    pub fn features(&self) -> Option<&FeatureSet> {
        self.analysis.as_ref().map(|a| &a.features)
    }

    pub fn image_type(&self) -> Option<ImageType> {
        self.analysis.as_ref().map(|a| a.image_type)
    }

    /// Parameters used for the current output, including any gamma override.
    pub fn params(&self) -> Option<&ProcessingParameters> {
        self.analysis.as_ref().map(|a| &a.params)
    }

    pub fn recommended_gamma(&self) -> Option<f64> {
        self.analysis.as_ref().map(|a| a.recommended_gamma)
    }

    pub fn gamma_override(&self) -> Option<f64> {
        self.analysis.as_ref().and_then(|a| a.gamma_override)
    }

    pub fn output(&self) -> Option<&ImageData> {
        self.analysis.as_ref().map(|a| &a.output)
    }
}
