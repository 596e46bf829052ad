use crate::MIN_TIME;

/*
ADSR Envelope with a fade-out override
======================================

Linear attack/decay/sustain/release gain control, one instance per voice.

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Stage transitions:

    Idle --trigger--> Attack --level hits 1--> Decay --level hits S--> Sustain
    Attack|Decay|Sustain --note_off--> Release --level hits 0--> Idle
    any stage --fade_out--> Release (short, fixed duration) --> Idle

Attack and decay advance by a per-sample increment derived from the stage
duration:

    increment = target_change / (time_seconds * sample_rate)

Release (and fade_out, which reuses the same machinery with a caller-chosen
duration) snapshots the level at the moment it starts and interpolates
linearly down to exactly 0.0. Starting from the CURRENT level rather than the
sustain level is what keeps a note released mid-attack from clicking.

`fade_out` is the cancellation primitive the engine's force-stop relies on:
whatever ramp is pending is discarded and replaced by one short ramp to
silence. Calling it again while fading restarts the fade from the current
level, so it is idempotent in effect.
*/

/// Which phase of the envelope state machine is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    // Shape parameters, fixed at voice start.
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    // Runtime state.
    stage: EnvelopeStage,
    level: f32,

    // Release/fade bookkeeping: snapshot at ramp start, then interpolate so
    // the ramp lands on exactly 0.0.
    ramp_start_level: f32,
    ramp_total_samples: u32,
    ramp_elapsed_samples: u32,
}

impl Envelope {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_time: release.max(MIN_TIME),

            stage: EnvelopeStage::Idle,
            level: 0.0,
            ramp_start_level: 0.0,
            ramp_total_samples: 1,
            ramp_elapsed_samples: 0,
        }
    }

    /// Gate high: start the attack ramp from zero.
    pub fn trigger(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
        self.ramp_elapsed_samples = 0;
    }

    /// Gate low: ramp from the current level to zero over the release time.
    ///
    /// No-op while idle or already releasing; the voice guards against
    /// repeated releases, this guards against the envelope restarting a ramp
    /// and stretching the tail.
    pub fn note_off(&mut self, sample_rate: f32) {
        if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            return;
        }
        self.begin_ramp(self.release_time, sample_rate);
    }

    /// Cancel any pending ramp and fade to silence over `seconds`.
    ///
    /// Always takes effect (even mid-release), always from the current
    /// level. A no-op only once the envelope is already idle.
    pub fn fade_out(&mut self, seconds: f32, sample_rate: f32) {
        if matches!(self.stage, EnvelopeStage::Idle) {
            return;
        }
        self.begin_ramp(seconds, sample_rate);
    }

    fn begin_ramp(&mut self, seconds: f32, sample_rate: f32) {
        self.ramp_start_level = self.level;
        self.ramp_total_samples = if seconds <= MIN_TIME {
            1
        } else {
            (seconds * sample_rate).round().max(1.0) as u32
        };
        self.ramp_elapsed_samples = 0;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance one sample and return the new level.
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                let increment = 1.0 / (self.attack_time * sample_rate);
                self.level += increment;

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                let drop = 1.0 - self.sustain_level;
                let decrement = drop / (self.decay_time * sample_rate);
                self.level -= decrement;

                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeStage::Release => {
                let progress = self.ramp_elapsed_samples as f32 / self.ramp_total_samples as f32;
                self.level = (self.ramp_start_level * (1.0 - progress)).max(0.0);

                self.ramp_elapsed_samples = self.ramp_elapsed_samples.saturating_add(1);

                if self.ramp_elapsed_samples >= self.ramp_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// True until the final ramp lands on zero.
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeStage::Idle)
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
