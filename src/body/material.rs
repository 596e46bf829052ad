//! Per-material timbre recipes.
//!
//! Each material owns a three-partial additive layout plus a filter recipe
//! whose cutoff and resonance track the body length. The numbers here are
//! tuned by ear, not derived from physics; treat the table as the sound
//! design surface of the crate.

use crate::dsp::{FilterKind, Waveform};

use super::Material;

/// One partial of the additive stack: a waveform at a frequency ratio of
/// the fundamental, mixed in at a fixed gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialSpec {
    pub waveform: Waveform,
    pub ratio: f32,
    pub gain: f32,
}

/// Linear map from body length to a filter parameter: `base + per_cm * L`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub base: f32,
    pub per_cm: f32,
}

impl Affine {
    pub const fn flat(base: f32) -> Self {
        Self { base, per_cm: 0.0 }
    }

    pub fn eval(&self, length_cm: f32) -> f32 {
        self.base + self.per_cm * length_cm
    }
}

/// How a material shapes its filter as the body grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterRecipe {
    pub kind: FilterKind,
    pub cutoff_hz: Affine,
    pub q: Affine,
    pub gain: f32,
}

/// Full timbre recipe for one material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialTimbre {
    pub partials: [PartialSpec; 3],
    pub filter: FilterRecipe,
}

/*
    Recipe notes, per material:

    Wood     warm and rounded. Triangle fundamental, harmonic overtones
             at 2x and 3x, low-pass that closes as the body lengthens.
    Metal    bright and clangorous. Saw/square stack with inharmonic
             overtone ratios (2.76, 5.40 are rough bell partials), a
             high-pass that opens with length and a resonant peak.
    Glass    pure and ringing. Sine-led stack with stretched ratios and
             a narrow band-pass that sweeps up with length; gain above
             unity so the ring carries.
    Plastic  dull and boxy. Square fundamental with weak even overtones
             and a low, barely-resonant low-pass.
*/

const WOOD: MaterialTimbre = MaterialTimbre {
    partials: [
        PartialSpec { waveform: Waveform::Triangle, ratio: 1.0, gain: 1.0 },
        PartialSpec { waveform: Waveform::Sine, ratio: 2.0, gain: 0.25 },
        PartialSpec { waveform: Waveform::Sine, ratio: 3.0, gain: 0.08 },
    ],
    filter: FilterRecipe {
        kind: FilterKind::LowPass,
        cutoff_hz: Affine { base: 2_600.0, per_cm: -8.0 },
        q: Affine::flat(0.7),
        gain: 1.0,
    },
};

const METAL: MaterialTimbre = MaterialTimbre {
    partials: [
        PartialSpec { waveform: Waveform::Sawtooth, ratio: 1.0, gain: 1.0 },
        PartialSpec { waveform: Waveform::Square, ratio: 2.76, gain: 0.6 },
        PartialSpec { waveform: Waveform::Sawtooth, ratio: 5.40, gain: 0.35 },
    ],
    filter: FilterRecipe {
        kind: FilterKind::HighPass,
        cutoff_hz: Affine { base: 400.0, per_cm: 2.0 },
        q: Affine { base: 1.2, per_cm: 0.004 },
        gain: 0.8,
    },
};

const GLASS: MaterialTimbre = MaterialTimbre {
    partials: [
        PartialSpec { waveform: Waveform::Sine, ratio: 1.0, gain: 1.0 },
        PartialSpec { waveform: Waveform::Triangle, ratio: 2.32, gain: 0.5 },
        PartialSpec { waveform: Waveform::Sine, ratio: 4.25, gain: 0.2 },
    ],
    filter: FilterRecipe {
        kind: FilterKind::BandPass,
        cutoff_hz: Affine { base: 1_200.0, per_cm: 4.0 },
        q: Affine { base: 2.0, per_cm: 0.008 },
        gain: 1.35,
    },
};

const PLASTIC: MaterialTimbre = MaterialTimbre {
    partials: [
        PartialSpec { waveform: Waveform::Square, ratio: 1.0, gain: 1.0 },
        PartialSpec { waveform: Waveform::Triangle, ratio: 2.0, gain: 0.3 },
        PartialSpec { waveform: Waveform::Triangle, ratio: 4.0, gain: 0.05 },
    ],
    filter: FilterRecipe {
        kind: FilterKind::LowPass,
        cutoff_hz: Affine { base: 3_000.0, per_cm: -5.0 },
        q: Affine::flat(0.3),
        gain: 0.9,
    },
};

impl MaterialTimbre {
    pub fn of(material: Material) -> &'static MaterialTimbre {
        match material {
            Material::Wood => &WOOD,
            Material::Metal => &METAL,
            Material::Glass => &GLASS,
            Material::Plastic => &PLASTIC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_material_leads_with_a_unity_fundamental() {
        for material in Material::ALL {
            let timbre = MaterialTimbre::of(material);
            assert_eq!(timbre.partials[0].ratio, 1.0, "{material}");
            assert_eq!(timbre.partials[0].gain, 1.0, "{material}");
        }
    }

    #[test]
    fn overtone_gains_never_exceed_the_fundamental() {
        for material in Material::ALL {
            let timbre = MaterialTimbre::of(material);
            for partial in &timbre.partials[1..] {
                assert!(partial.gain < 1.0, "{material}");
                assert!(partial.ratio > 1.0, "{material}");
            }
        }
    }

    #[test]
    fn wood_cutoff_falls_as_the_body_lengthens() {
        let recipe = MaterialTimbre::of(Material::Wood).filter;
        assert!(recipe.cutoff_hz.eval(300.0) < recipe.cutoff_hz.eval(50.0));
    }

    #[test]
    fn metal_cutoff_rises_as_the_body_lengthens() {
        let recipe = MaterialTimbre::of(Material::Metal).filter;
        assert!(recipe.cutoff_hz.eval(300.0) > recipe.cutoff_hz.eval(50.0));
        assert_eq!(recipe.kind, FilterKind::HighPass);
    }
}
