//! Engraving material, material color and laser source selections.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Material {
    #[default]
    Wood,
    Metal,
    Plastic,
    Vinyl,
    Paper,
    Silicone,
    Rubber,
    Leather,
    Stone,
    ScreenPrinting,
    Other,
}

impl Material {
    pub const ALL: [Material; 11] = [
        Material::Wood,
        Material::Metal,
        Material::Plastic,
        Material::Vinyl,
        Material::Paper,
        Material::Silicone,
        Material::Rubber,
        Material::Leather,
        Material::Stone,
        Material::ScreenPrinting,
        Material::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Wood => "wood",
            Material::Metal => "metal",
            Material::Plastic => "plastic",
            Material::Vinyl => "vinyl",
            Material::Paper => "paper",
            Material::Silicone => "silicone",
            Material::Rubber => "rubber",
            Material::Leather => "leather",
            Material::Stone => "stone",
            Material::ScreenPrinting => "screen-printing",
            Material::Other => "other",
        }
    }

    /// Parse a material key. Unknown keys fall back to wood.
    pub fn from_key(key: &str) -> Self {
        let key = key.trim();
        Material::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(key))
            .unwrap_or_default()
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Material::from_key(s))
    }
}

impl<'de> Deserialize<'de> for Material {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Material::from_key(&key))
    }
}

/// Surface tone of the material. Dark surfaces engrave light marks, so the
/// output is inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialColor {
    #[default]
    Light,
    Dark,
}

impl MaterialColor {
    pub fn is_dark(self) -> bool {
        self == MaterialColor::Dark
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MaterialColor::Light => "light",
            MaterialColor::Dark => "dark",
        }
    }
}

impl fmt::Display for MaterialColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(MaterialColor::Light),
            "dark" => Ok(MaterialColor::Dark),
            other => Err(format!("unknown material color '{}' (expected light or dark)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Laser {
    Co2,
    Blue,
    Red,
}

impl Laser {
    pub const ALL: [Laser; 3] = [Laser::Co2, Laser::Blue, Laser::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Laser::Co2 => "co2",
            Laser::Blue => "blue",
            Laser::Red => "red",
        }
    }

    /// Parse a laser key. Unknown keys mean no laser adjustment.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Laser::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for Laser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Laser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Laser::from_key(s).ok_or_else(|| format!("unknown laser '{}' (expected co2, blue or red)", s))
    }
}
