use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Oscillator
==========

The raw sound source for every partial in a voice. A phase accumulator runs
through [0, 1) once per cycle; each waveform is a cheap closed-form shape of
that phase.

Waveform character (why the material table picks what it picks):

  Sine      Fundamental only. Pure, hollow. Glass-like when resonant.
  Triangle  Odd harmonics falling off as 1/n². Soft and woody.
  Sawtooth  All harmonics, 1/n. Bright and brassy - the metallic choice.
  Square    Odd harmonics, 1/n. Hollow but buzzy - reads as "cheap plastic"
            once the filter dulls it.

Rendering is additive: `render_add` scales by a per-partial gain and sums
into the caller's buffer, so a voice can stack three partials into one
scratch buffer without owning any storage of its own.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    /// Current position in the cycle, in cycles (wraps in [0, 1)).
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Restart the cycle. Voices reset their partials on start so repeated
    /// notes attack identically.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Render one block at `freq_hz`, scaled by `gain`, summed into `out`.
    ///
    /// The sample at index n is taken before the phase advances, so a fresh
    /// oscillator produces `shape(n * freq / sample_rate)` at index n.
    pub fn render_add(&mut self, out: &mut [f32], freq_hz: f32, gain: f32, sample_rate: f32) {
        let increment = freq_hz / sample_rate;

        for sample in out.iter_mut() {
            *sample += gain * shape(self.waveform, self.phase);
            self.phase = (self.phase + increment).fract();
        }
    }
}

#[inline]
fn shape(waveform: Waveform, phase: f32) -> f32 {
    match waveform {
        Waveform::Sine => (TAU * phase).sin(),
        Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        Waveform::Sawtooth => 2.0 * phase - 1.0,
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn sine_matches_closed_form() {
        let mut osc = Oscillator::new(Waveform::Sine);
        let mut buffer = vec![0.0f32; 128];
        let freq = 440.0;

        osc.render_add(&mut buffer, freq, 1.0, SAMPLE_RATE);

        let sample_index = 12;
        let expected = (TAU * freq * sample_index as f32 / SAMPLE_RATE).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn all_waveforms_stay_in_range() {
        for waveform in [
            Waveform::Sine,
            Waveform::Triangle,
            Waveform::Sawtooth,
            Waveform::Square,
        ] {
            let mut osc = Oscillator::new(waveform);
            let mut buffer = vec![0.0f32; 512];
            osc.render_add(&mut buffer, 997.0, 1.0, SAMPLE_RATE);

            assert!(
                buffer.iter().all(|s| s.abs() <= 1.0 + 1e-6),
                "{waveform:?} exceeded unit range"
            );
        }
    }

    #[test]
    fn render_add_accumulates_into_buffer() {
        let mut osc = Oscillator::new(Waveform::Square);
        let mut buffer = vec![0.25f32; 16];

        osc.render_add(&mut buffer, 440.0, 0.5, SAMPLE_RATE);

        // Square starts in its positive half: 0.25 + 0.5 * 1.0
        assert!((buffer[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn phase_continues_across_blocks() {
        let freq = 440.0;

        let mut whole = Oscillator::new(Waveform::Sine);
        let mut one_pass = vec![0.0f32; 256];
        whole.render_add(&mut one_pass, freq, 1.0, SAMPLE_RATE);

        let mut split = Oscillator::new(Waveform::Sine);
        let mut two_pass = vec![0.0f32; 256];
        let (first, second) = two_pass.split_at_mut(100);
        split.render_add(first, freq, 1.0, SAMPLE_RATE);
        split.render_add(second, freq, 1.0, SAMPLE_RATE);

        for (a, b) in one_pass.iter().zip(two_pass.iter()) {
            assert!((a - b).abs() < 1e-4, "block boundary discontinuity");
        }
    }

    #[test]
    fn triangle_spans_full_cycle() {
        // 4 samples per cycle: phases 0.0, 0.25, 0.5, 0.75
        let mut osc = Oscillator::new(Waveform::Triangle);
        let mut buffer = vec![0.0f32; 4];
        osc.render_add(&mut buffer, SAMPLE_RATE / 4.0, 1.0, SAMPLE_RATE);

        assert!((buffer[0] - -1.0).abs() < 1e-6);
        assert!((buffer[1] - 0.0).abs() < 1e-6);
        assert!((buffer[2] - 1.0).abs() < 1e-6);
        assert!((buffer[3] - 0.0).abs() < 1e-6);
    }
}
