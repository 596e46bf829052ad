//! Body geometry to synthesis coefficients.
//!
//! [`DerivedCoefficients::derive`] is the whole mapping: give it clamped
//! dimensions and a material, get back everything a voice or the output
//! stage needs. Derivation is pure; the engine calls it once per build,
//! never per sample.

use super::{
    BodyDimensions, Material, MaterialTimbre, PartialSpec, BASE_GAIN, GAIN_CEILING,
    SATURATION_DRIVE_MAX, SATURATION_DRIVE_SLOPE, SATURATION_THRESHOLD,
};
use crate::dsp::FilterKind;

/// ADSR targets in seconds (sustain is a level, 0..=1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeTimes {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

/// Resolved per-voice filter settings plus its post-filter makeup gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub cutoff_hz: f32,
    pub q: f32,
    pub gain: f32,
}

/// Everything the synthesis side needs, derived from one body.
///
/// `saturation_drive` is `Some` only for oversized bodies; `None` means the
/// output stage bypasses the saturator entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedCoefficients {
    pub partials: [PartialSpec; 3],
    pub filter: FilterSpec,
    pub envelope: EnvelopeTimes,
    pub volume_factor: f32,
    pub master_gain: f32,
    pub saturation_drive: Option<f32>,
}

/*
    How geometry maps onto sound:

      height  -> envelope speed. Tall bodies breathe slowly (long attack
                 and decay), squat ones speak immediately.
      width   -> sustain level. Wide bodies hold their tone, narrow ones
                 decay toward silence while held.
      length  -> release tail and the filter recipe's length-tracking
                 terms (cutoff drift, resonance).
      volume  -> loudness. Master gain scales with relative volume up to
                 a hard ceiling; past SATURATION_THRESHOLD the excess
                 feeds a soft-clip drive instead of more gain.

    Every derived number is clamped into a range the DSP stages accept.
    The clamps are the contract: a voice built from these coefficients
    never has to validate them again.
*/

const ATTACK_PER_CM: f32 = 0.0008;
const DECAY_PER_CM: f32 = 0.003;
const RELEASE_PER_CM: f32 = 0.0015;
const SUSTAIN_FULL_WIDTH_CM: f32 = 400.0;

const CUTOFF_MIN_HZ: f32 = 80.0;
const CUTOFF_MAX_HZ: f32 = 12_000.0;
const FILTER_GAIN_MIN: f32 = 0.05;
const FILTER_GAIN_MAX: f32 = 4.0;
const Q_MIN: f32 = 0.1;
const Q_MAX: f32 = 10.0;

impl DerivedCoefficients {
    pub fn derive(dims: BodyDimensions, material: Material) -> Self {
        let timbre = MaterialTimbre::of(material);
        let length = dims.length_cm();

        let envelope = EnvelopeTimes {
            attack: (dims.height_cm() * ATTACK_PER_CM).clamp(0.005, 0.25),
            decay: (dims.height_cm() * DECAY_PER_CM).clamp(0.05, 1.0),
            sustain: (dims.width_cm() / SUSTAIN_FULL_WIDTH_CM).clamp(0.0, 1.0),
            release: (length * RELEASE_PER_CM).clamp(0.08, 0.5),
        };

        let filter = FilterSpec {
            kind: timbre.filter.kind,
            cutoff_hz: timbre.filter.cutoff_hz.eval(length).clamp(CUTOFF_MIN_HZ, CUTOFF_MAX_HZ),
            q: timbre.filter.q.eval(length).clamp(Q_MIN, Q_MAX),
            gain: timbre.filter.gain.clamp(FILTER_GAIN_MIN, FILTER_GAIN_MAX),
        };

        let volume_factor = dims.volume_factor();
        let master_gain = (BASE_GAIN * volume_factor).min(GAIN_CEILING);
        let saturation_drive = if volume_factor > SATURATION_THRESHOLD {
            let drive = 1.0 + (volume_factor - SATURATION_THRESHOLD) * SATURATION_DRIVE_SLOPE;
            Some(drive.min(SATURATION_DRIVE_MAX))
        } else {
            None
        };

        Self {
            partials: timbre.partials,
            filter,
            envelope,
            volume_factor,
            master_gain,
            saturation_drive,
        }
    }
}
