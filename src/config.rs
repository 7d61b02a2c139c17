//! TOML configuration for batch runs.

use crate::error::{EngraveError, Result};
use crate::image_processor::DEFAULT_MAX_DIMENSION;
use crate::material::{Laser, Material, MaterialColor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

const GAMMA_RANGE: std::ops::RangeInclusive<f64> = 0.1..=3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub color: MaterialColor,
    /// Unknown laser names mean no laser adjustment.
    #[serde(default, deserialize_with = "lenient_laser", skip_serializing_if = "Option::is_none")]
    pub laser: Option<Laser>,
    /// Replaces the recommended gamma when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Appended to the input stem when no output path is given.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
    #[serde(default = "default_parallel")]
    pub use_parallel: bool,
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_output_suffix() -> String {
    "_laser".to_string()
}

fn default_parallel() -> bool {
    true
}

fn lenient_laser<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Laser>, D::Error> {
    let key = Option::<String>::deserialize(deserializer)?;
    Ok(key.as_deref().and_then(Laser::from_key))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            material: Material::default(),
            color: MaterialColor::default(),
            laser: None,
            gamma: None,
            max_dimension: default_max_dimension(),
            output_suffix: default_output_suffix(),
            use_parallel: default_parallel(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|source| EngraveError::ConfigLoad {
            source,
            path: path.to_path_buf(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngraveError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == 0 {
            return Err(EngraveError::Config("max_dimension must be > 0".to_string()));
        }

        if let Some(gamma) = self.gamma {
            if !GAMMA_RANGE.contains(&gamma) {
                return Err(EngraveError::Config(format!(
                    "gamma must be between 0.1 and 3.0, got {}",
                    gamma
                )));
            }
        }

        if self.output_suffix.contains(['/', '\\']) {
            return Err(EngraveError::Config(
                "output_suffix must not contain path separators".to_string(),
            ));
        }

        Ok(())
    }
}
