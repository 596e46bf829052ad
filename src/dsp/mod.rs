//! Low-level DSP primitives used by the voice and output stages.
//!
//! These components are allocation-free and realtime-safe, making them safe
//! to embed directly inside voice structs. They intentionally stay focused on
//! the signal-processing math; the `voice` and `engine` layers handle
//! lifecycle and orchestration.

/// Attack/decay/sustain/release envelope generator with a fast-fade override.
pub mod envelope;
/// State-variable filter configured from the per-material recipe.
pub mod filter;
/// Audio-band oscillator waveforms.
pub mod oscillator;
/// Soft-clip waveshaper for the oversized-body saturation stage.
pub mod saturation;

pub use envelope::{Envelope, EnvelopeStage};
pub use filter::{FilterKind, SvFilter};
pub use oscillator::{Oscillator, Waveform};
pub use saturation::{soft_clip, Saturator};
