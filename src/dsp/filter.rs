use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
State-Variable Filter (TPT form)
================================

One filter per voice shapes the raw partial stack into the material's
character: a low-pass dulls wood and plastic, a high-pass thins metal out to
its ring, a band-pass squeezes glass down to its resonant core.

The topology-preserving-transform SVF computes low/band/high/notch responses
simultaneously from two integrator states, stays stable under realtime
coefficient updates, and costs a handful of multiplies per sample:

    g  = tan(pi * cutoff / sample_rate)     frequency warp
    k  = 1 / Q                              damping
    v1 = (s1 + g*(x - s2)) / (1 + g*(g+k))  band
    v2 = s2 + g*v1                          low
    s1 = 2*v1 - s1,  s2 = 2*v2 - s2

Q is the familiar musical resonance: 0.7 is flat-ish, above ~2 the cutoff
rings audibly.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

#[derive(Debug, Clone)]
pub struct SvFilter {
    kind: FilterKind,
    cutoff_hz: f32,
    q: f32,
    // Integrator memories.
    s1: f32,
    s2: f32,
}

impl SvFilter {
    pub fn new(kind: FilterKind, cutoff_hz: f32, q: f32) -> Self {
        Self {
            kind,
            cutoff_hz: cutoff_hz.clamp(10.0, 20_000.0),
            q: q.clamp(0.1, 10.0),
            s1: 0.0,
            s2: 0.0,
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    /// Clear the integrator memories (fresh voice, no residue from a
    /// previous note in the slot).
    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    /// Filter `buffer` in place.
    pub fn process(&mut self, buffer: &mut [f32], sample_rate: f32) {
        // Keep the warp below Nyquist even if the recipe asked for more.
        let cutoff = self.cutoff_hz.min(0.45 * sample_rate);
        let g = (PI * cutoff / sample_rate).tan();
        let k = 1.0 / self.q;
        let a1 = 1.0 / (1.0 + g * (g + k));

        for sample in buffer.iter_mut() {
            let x = *sample;
            let v1 = a1 * (self.s1 + g * (x - self.s2));
            let v2 = self.s2 + g * v1;

            self.s1 = 2.0 * v1 - self.s1;
            self.s2 = 2.0 * v2 - self.s2;

            *sample = match self.kind {
                FilterKind::LowPass => v2,
                FilterKind::BandPass => v1,
                FilterKind::HighPass => x - k * v1 - v2,
                FilterKind::Notch => x - k * v1,
            };
        }
    }
}
