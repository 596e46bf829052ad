use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    DIM_MAX_CM, DIM_MIN_CM, REFERENCE_HEIGHT_CM, REFERENCE_LENGTH_CM, REFERENCE_WIDTH_CM,
};

/// Body material. Each variant selects one timbre recipe from the
/// [`MaterialTimbre`](super::MaterialTimbre) table.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Material {
    #[default]
    Wood,
    Metal,
    Glass,
    Plastic,
}

impl Material {
    pub const ALL: [Material; 4] = [
        Material::Wood,
        Material::Metal,
        Material::Glass,
        Material::Plastic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Material::Wood => "wood",
            Material::Metal => "metal",
            Material::Glass => "glass",
            Material::Plastic => "plastic",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when an adapter hands over a material name the table doesn't
/// know. Only the adapter boundary can fail this way; the engine itself
/// takes the enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMaterial(pub String);

impl fmt::Display for UnknownMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown material {:?} (expected wood, metal, glass or plastic)",
            self.0
        )
    }
}

impl std::error::Error for UnknownMaterial {}

impl FromStr for Material {
    type Err = UnknownMaterial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wood" => Ok(Material::Wood),
            "metal" => Ok(Material::Metal),
            "glass" => Ok(Material::Glass),
            "plastic" => Ok(Material::Plastic),
            _ => Err(UnknownMaterial(s.to_string())),
        }
    }
}

/// Body dimensions in centimetres published by the shape editor.
///
/// Construction clamps each axis into the legal 30-400 cm range; non-finite
/// input falls back to the reference value for that axis. Holding the clamp
/// here means everything downstream (coefficients, filter recipes, envelope
/// timing) can trust the numbers.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDimensions {
    length_cm: f32,
    width_cm: f32,
    height_cm: f32,
}

impl BodyDimensions {
    pub fn new(length_cm: f32, width_cm: f32, height_cm: f32) -> Self {
        Self {
            length_cm: clamp_axis(length_cm, REFERENCE_LENGTH_CM),
            width_cm: clamp_axis(width_cm, REFERENCE_WIDTH_CM),
            height_cm: clamp_axis(height_cm, REFERENCE_HEIGHT_CM),
        }
    }

    pub fn length_cm(&self) -> f32 {
        self.length_cm
    }

    pub fn width_cm(&self) -> f32 {
        self.width_cm
    }

    pub fn height_cm(&self) -> f32 {
        self.height_cm
    }

    /// Body volume relative to the reference body. 1.0 for the default
    /// instrument; drives master gain and the saturation stage.
    pub fn volume_factor(&self) -> f32 {
        (self.length_cm * self.width_cm * self.height_cm)
            / (REFERENCE_LENGTH_CM * REFERENCE_WIDTH_CM * REFERENCE_HEIGHT_CM)
    }
}

impl Default for BodyDimensions {
    fn default() -> Self {
        Self::new(REFERENCE_LENGTH_CM, REFERENCE_WIDTH_CM, REFERENCE_HEIGHT_CM)
    }
}

fn clamp_axis(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(DIM_MIN_CM, DIM_MAX_CM)
    } else {
        fallback
    }
}
