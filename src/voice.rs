//! A single sounding note.
//!
//! A [`Voice`] owns its entire signal chain: three oscillator partials,
//! one state-variable filter and one ADSR envelope, all configured from a
//! [`DerivedCoefficients`] snapshot taken at note-on. Changing the body
//! afterwards never touches a live voice; the engine stops voices and
//! starts new ones instead.

use crate::body::DerivedCoefficients;
use crate::dsp::{Envelope, EnvelopeStage, Oscillator, SvFilter};

/// Fade applied by [`Voice::force_stop`]. Short enough to feel immediate,
/// long enough that the cut never pops.
pub const FORCE_STOP_FADE_SECS: f32 = 0.005;

/// Equal-tempered pitch to frequency, A4 (pitch 69) = 440 Hz.
pub fn note_to_freq(pitch: u8) -> f32 {
    440.0 * 2.0_f32.powf((pitch as f32 - 69.0) / 12.0)
}

/// Where a voice is in its life. `Stopped` covers the force-stop fade as
/// well as full silence; a voice whose envelope has gone idle is finished
/// and gets reaped by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Attacking,
    Sustaining,
    Releasing,
    Stopped,
}

/// One additive partial: an oscillator at a fixed multiple of the
/// fundamental, mixed at a fixed gain.
#[derive(Debug, Clone)]
struct Partial {
    osc: Oscillator,
    freq_hz: f32,
    gain: f32,
}

/*
    Signal flow per block:

      partial 0 ─┐
      partial 1 ─┼─(sum)──> filter ──> envelope × velocity × makeup ──> out
      partial 2 ─┘

    The envelope sits LAST in the chain. That ordering is what makes the
    force-stop guarantee hold: once the 5 ms fade reaches zero the output
    is zero, no matter how resonant the filter is or where the oscillator
    phases sit. Putting the envelope before the filter would let a high-Q
    filter ring past the fade.
*/
#[derive(Debug, Clone)]
pub struct Voice {
    pitch: u8,
    serial: u64,
    started_at: u64,
    released_at: Option<u64>,
    state: VoiceState,
    velocity_gain: f32,
    partials: [Partial; 3],
    filter: SvFilter,
    makeup_gain: f32,
    env: Envelope,
}

impl Voice {
    /// Builds the chain for `pitch` and starts the attack at frame `now`.
    ///
    /// The caller (the registry) guarantees no other live voice exists for
    /// this pitch. `serial` is the registry's generation tag; it only ever
    /// grows, so logs and diagnostics can tell a restarted note from the
    /// voice it replaced.
    pub fn start(
        pitch: u8,
        velocity: f32,
        coeffs: &DerivedCoefficients,
        serial: u64,
        now: u64,
    ) -> Self {
        let fundamental = note_to_freq(pitch);
        let partials = coeffs.partials.map(|spec| Partial {
            osc: Oscillator::new(spec.waveform),
            freq_hz: fundamental * spec.ratio,
            gain: spec.gain,
        });

        let mut env = Envelope::adsr(
            coeffs.envelope.attack,
            coeffs.envelope.decay,
            coeffs.envelope.sustain,
            coeffs.envelope.release,
        );
        env.trigger();

        Self {
            pitch,
            serial,
            started_at: now,
            released_at: None,
            state: VoiceState::Attacking,
            velocity_gain: velocity.clamp(0.0, 1.0),
            partials,
            filter: SvFilter::new(coeffs.filter.kind, coeffs.filter.cutoff_hz, coeffs.filter.q),
            makeup_gain: coeffs.filter.gain,
            env,
        }
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn released_at(&self) -> Option<u64> {
        self.released_at
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Begins the natural release tail. No-op once releasing or stopped.
    pub fn release(&mut self, now: u64, sample_rate: f32) {
        if matches!(self.state, VoiceState::Releasing | VoiceState::Stopped) {
            return;
        }
        self.state = VoiceState::Releasing;
        self.released_at = Some(now);
        self.env.note_off(sample_rate);
    }

    /// Silences the voice over [`FORCE_STOP_FADE_SECS`], cancelling any
    /// release ramp already in flight. Idempotent: a stopped voice stays
    /// exactly where it is.
    pub fn force_stop(&mut self, now: u64, sample_rate: f32) {
        if self.state == VoiceState::Stopped {
            return;
        }
        self.state = VoiceState::Stopped;
        self.released_at.get_or_insert(now);
        self.env.fade_out(FORCE_STOP_FADE_SECS, sample_rate);
    }

    /// True once the envelope has gone idle; the registry drops finished
    /// voices at the next block boundary.
    pub fn is_finished(&self) -> bool {
        !self.env.is_active()
    }

    /// Renders one block into `out`, overwriting it. The engine mixes
    /// voice outputs itself; rendering here never allocates.
    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        if self.is_finished() {
            out.fill(0.0);
            return;
        }

        out.fill(0.0);
        for partial in &mut self.partials {
            partial.osc.render_add(out, partial.freq_hz, partial.gain, sample_rate);
        }
        self.filter.process(out, sample_rate);

        let gain = self.velocity_gain * self.makeup_gain;
        for sample in out.iter_mut() {
            *sample *= self.env.next_sample(sample_rate) * gain;
        }

        // The attack-to-sustain hop is the only transition the envelope
        // drives on its own; release and stop come from the engine.
        if self.state == VoiceState::Attacking
            && !matches!(self.env.stage(), EnvelopeStage::Attack)
        {
            self.state = VoiceState::Sustaining;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyDimensions, Material};

    const SAMPLE_RATE: f32 = 48_000.0;
    const BLOCK: usize = 256;

    fn test_coeffs() -> DerivedCoefficients {
        DerivedCoefficients::derive(BodyDimensions::new(80.0, 280.0, 40.0), Material::Wood)
    }

    fn render_blocks(voice: &mut Voice, blocks: usize) -> Vec<f32> {
        let mut all = Vec::new();
        let mut buf = [0.0_f32; BLOCK];
        for _ in 0..blocks {
            voice.render(&mut buf, SAMPLE_RATE);
            all.extend_from_slice(&buf);
        }
        all
    }

    #[test]
    fn concert_a_is_exactly_440() {
        assert_eq!(note_to_freq(69), 440.0);
    }

    #[test]
    fn middle_c_lands_on_the_tempered_value() {
        assert!((note_to_freq(60) - 261.63).abs() < 0.01);
    }

    #[test]
    fn started_voice_produces_audio_and_reaches_sustain() {
        let coeffs = test_coeffs();
        let mut voice = Voice::start(60, 0.7, &coeffs, 1, 0);
        assert_eq!(voice.state(), VoiceState::Attacking);

        // Attack 32 ms + decay 120 ms: one second is plenty.
        let samples = render_blocks(&mut voice, SAMPLE_RATE as usize / BLOCK);
        assert!(samples.iter().any(|s| s.abs() > 1e-4));
        assert_eq!(voice.state(), VoiceState::Sustaining);
        assert!(!voice.is_finished());
    }

    #[test]
    fn released_voice_finishes_within_its_release_time() {
        let coeffs = test_coeffs();
        let mut voice = Voice::start(60, 0.7, &coeffs, 1, 0);
        render_blocks(&mut voice, 40);

        voice.release(40 * BLOCK as u64, SAMPLE_RATE);
        assert_eq!(voice.state(), VoiceState::Releasing);

        // Release is 120 ms; allow 200 ms of blocks before demanding silence.
        let blocks = (0.2 * SAMPLE_RATE) as usize / BLOCK + 1;
        render_blocks(&mut voice, blocks);
        assert!(voice.is_finished());
    }

    #[test]
    fn force_stop_silences_within_the_short_fade() {
        let coeffs = test_coeffs();
        let mut voice = Voice::start(64, 1.0, &coeffs, 2, 0);
        render_blocks(&mut voice, 40);

        voice.force_stop(40 * BLOCK as u64, SAMPLE_RATE);
        assert_eq!(voice.state(), VoiceState::Stopped);

        // 5 ms is 240 samples at 48 kHz; two blocks cover it.
        let tail = render_blocks(&mut voice, 2);
        assert!(voice.is_finished());
        assert!(tail[BLOCK..].iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn force_stop_is_idempotent() {
        let coeffs = test_coeffs();
        let mut voice = Voice::start(60, 0.7, &coeffs, 3, 0);
        voice.force_stop(0, SAMPLE_RATE);
        voice.force_stop(0, SAMPLE_RATE);
        render_blocks(&mut voice, 2);
        assert!(voice.is_finished());
        assert_eq!(voice.state(), VoiceState::Stopped);
    }

    #[test]
    fn release_after_force_stop_is_a_no_op() {
        let coeffs = test_coeffs();
        let mut voice = Voice::start(60, 0.7, &coeffs, 4, 0);
        voice.force_stop(10, SAMPLE_RATE);
        voice.release(20, SAMPLE_RATE);
        assert_eq!(voice.state(), VoiceState::Stopped);
        assert_eq!(voice.released_at(), Some(10));
    }

    #[test]
    fn finished_voice_renders_silence() {
        let coeffs = test_coeffs();
        let mut voice = Voice::start(60, 0.7, &coeffs, 5, 0);
        voice.force_stop(0, SAMPLE_RATE);
        render_blocks(&mut voice, 4);
        assert!(voice.is_finished());

        let mut buf = [1.0_f32; BLOCK];
        voice.render(&mut buf, SAMPLE_RATE);
        assert!(buf.iter().all(|s| *s == 0.0));
    }
}
