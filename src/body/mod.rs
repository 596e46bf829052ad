//! The instrument body: dimensions, material, and the mapping from both to
//! concrete synthesis coefficients.
//!
//! Nothing in here is acoustics. The mapping is a heuristic parametric
//! design: bigger boxes are louder (and eventually saturate), taller ones
//! speak slower, wider ones sustain longer, and each material picks its own
//! partial stack and filter recipe. The one hard rule is that every input is
//! clamped, never rejected - the upstream shape editor enforces ranges, but
//! the engine survives anything.

mod coefficients;
mod describe;
mod dimensions;
mod material;

pub use coefficients::{DerivedCoefficients, EnvelopeTimes, FilterSpec};
pub use describe::describe;
pub use dimensions::{BodyDimensions, Material, UnknownMaterial};
pub use material::{Affine, FilterRecipe, MaterialTimbre, PartialSpec};

/// Legal editor range for each body axis, in centimetres.
pub const DIM_MIN_CM: f32 = 30.0;
pub const DIM_MAX_CM: f32 = 400.0;

/// The nominal mid-size instrument. Its volume is the reference against
/// which every other body is scaled; the default engine starts here.
pub const REFERENCE_LENGTH_CM: f32 = 150.0;
pub const REFERENCE_WIDTH_CM: f32 = 140.0;
pub const REFERENCE_HEIGHT_CM: f32 = 100.0;

/// Master gain of the reference body; scales with the volume factor up to
/// the ceiling.
pub const BASE_GAIN: f32 = 0.35;
pub const GAIN_CEILING: f32 = 0.9;

/// Bodies whose volume factor exceeds this grow a saturation stage.
pub const SATURATION_THRESHOLD: f32 = 1.5;
pub const SATURATION_DRIVE_SLOPE: f32 = 0.75;
pub const SATURATION_DRIVE_MAX: f32 = 6.0;
