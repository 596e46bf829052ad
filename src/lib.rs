pub mod body; // Body dimensions, materials, derived synthesis coefficients
pub mod dsp;
pub mod engine; // Voice registry, control operations, shared output path
pub mod voice; // One sounding note

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
