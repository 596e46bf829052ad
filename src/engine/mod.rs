//! The synthesis engine: control state machine, voice registry and the
//! shared output path.
//!
//! All control operations take `&mut self`, so registry mutation is
//! serialized by construction. Cross-thread traffic reaches the engine
//! only through [`EngineMessage`] queues drained at block boundaries;
//! between those boundaries nothing else can touch a voice. Time is the
//! engine's own sample-frame clock, advanced by [`PianoEngine::render_block`],
//! never wall time.

mod message;
mod output;
mod registry;

#[cfg(feature = "rtrb")]
pub use message::control_channel;
pub use message::{EngineMessage, MessageReceiver};

use crate::body::{describe, BodyDimensions, DerivedCoefficients, Material};
use crate::voice::{Voice, VoiceState, FORCE_STOP_FADE_SECS};
use crate::MAX_BLOCK_SIZE;

use output::OutputStage;
use registry::VoiceRegistry;

/// Cadence of the diagnostic safety sweep, in engine-clock seconds.
pub const SWEEP_INTERVAL_SECS: f32 = 5.0;

/// Grace period a voice spends on the retiring list after its fade or
/// release completes, before it is dropped.
pub const RETIRE_PAD_SECS: f32 = 0.012;

const MAX_PITCH: u8 = 127;

/// What a `note_on` call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    /// A fresh voice started on a silent pitch.
    Started,
    /// A live voice on the pitch was force-stopped and replaced.
    Restarted,
    /// The instrument has not been built; nothing sounds.
    NotBuilt,
    /// Out-of-range pitch or non-positive velocity; absorbed.
    Ignored,
}

struct BuiltInstrument {
    coeffs: DerivedCoefficients,
    output: OutputStage,
}

/*
    Per-pitch state machine, driven entirely by engine calls and the
    envelope:

      (absent) --note_on----------> Attacking
      Attacking --attack ramp done--> Sustaining
      Attacking|Sustaining --stop_all(false)--> Releasing   (stays in slot)
      Releasing --envelope idle--> parked on retiring list  (leaves slot)
      any state --note_off | force_stop | restarting note_on |
                  stop_all(true) | rebuild--> Stopped, parked immediately
      retiring --fade done, grace period over--> dropped

    A pitch's slot is therefore empty or holds exactly one voice, and a
    voice leaves the slot in exactly one of two ways: it finishes its own
    release, or the engine force-stops it with the short fade. The retiring
    list exists so a parked voice keeps rendering its tail instead of being
    cut. Removal is ownership, not timers: the registry drops a voice when
    it leaves, and the periodic sweep remains only as an invariant check
    that must find nothing.
*/
pub struct PianoEngine {
    sample_rate: f32,
    dims: BodyDimensions,
    material: Material,
    built: Option<BuiltInstrument>,
    registry: VoiceRegistry,
    /// Frames rendered since creation; the engine's only clock.
    clock: u64,
    next_sweep_at: u64,
    scratch: [f32; MAX_BLOCK_SIZE],
}

impl PianoEngine {
    /// Engine with the reference body, not yet built. `note_on` stays
    /// inaudible until [`Self::build`].
    pub fn new(sample_rate: f32) -> Self {
        debug_assert!(sample_rate > 0.0);
        Self {
            sample_rate,
            dims: BodyDimensions::default(),
            material: Material::Wood,
            built: None,
            registry: VoiceRegistry::new(),
            clock: 0,
            next_sweep_at: (SWEEP_INTERVAL_SECS * sample_rate) as u64,
            scratch: [0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames_rendered(&self) -> u64 {
        self.clock
    }

    pub fn dimensions(&self) -> BodyDimensions {
        self.dims
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Stores new dimensions (clamped), and rebuilds if already built.
    pub fn set_dimensions(&mut self, length_cm: f32, width_cm: f32, height_cm: f32) {
        self.dims = BodyDimensions::new(length_cm, width_cm, height_cm);
        if self.built.is_some() {
            self.rebuild();
        }
    }

    /// Stores a new material, and rebuilds if already built.
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
        if self.built.is_some() {
            self.rebuild();
        }
    }

    /// Marks the instrument built (or rebuilds it), making `note_on`
    /// audible. Idempotent.
    pub fn build(&mut self) {
        self.rebuild();
    }

    fn rebuild(&mut self) {
        // The output path never changes topology under sustained signal;
        // any tails still fading are 5 ms from silence.
        self.stop_all_notes(true);
        let coeffs = DerivedCoefficients::derive(self.dims, self.material);
        let output = OutputStage::from_coefficients(&coeffs);
        log::info!(
            "built {} body {:.0}x{:.0}x{:.0} cm: volume factor {:.2}, master gain {:.2}{}",
            self.material,
            self.dims.length_cm(),
            self.dims.width_cm(),
            self.dims.height_cm(),
            coeffs.volume_factor,
            coeffs.master_gain,
            if coeffs.saturation_drive.is_some() { ", saturating" } else { "" },
        );
        self.built = Some(BuiltInstrument { coeffs, output });
    }

    /// Starts (or restarts) a note. Tolerates anything an input device can
    /// send: out-of-range pitches are absorbed, non-positive velocity is
    /// treated as a note-off.
    pub fn note_on(&mut self, pitch: u8, velocity: f32) -> NoteOutcome {
        if pitch > MAX_PITCH {
            log::warn!("note_on: pitch {pitch} out of range, ignoring");
            return NoteOutcome::Ignored;
        }
        // MIDI convention: note-on at zero velocity is a note-off. NaN is
        // controller garbage and gets the same treatment.
        if velocity <= 0.0 || velocity.is_nan() {
            log::debug!("note_on({pitch}): non-positive velocity, treating as note_off");
            self.note_off(pitch);
            return NoteOutcome::Ignored;
        }
        let Some(built) = &self.built else {
            log::warn!("note_on({pitch}): instrument not built yet, nothing will sound");
            return NoteOutcome::NotBuilt;
        };
        let coeffs = built.coeffs;

        let restarted = self.registry.get(pitch).is_some();
        if restarted {
            // Same-pitch retrigger: silence the old voice first so two
            // chains for one pitch never coexist in the registry.
            self.force_stop_note(pitch);
        }

        let serial = self.registry.next_serial();
        let voice = Voice::start(pitch, velocity, &coeffs, serial, self.clock);
        log::debug!(
            "voice #{serial} on pitch {pitch} at frame {} (velocity {velocity:.2}{})",
            self.clock,
            if restarted { ", restarted" } else { "" },
        );
        self.registry.insert(voice);

        if restarted {
            NoteOutcome::Restarted
        } else {
            NoteOutcome::Started
        }
    }

    /// Ends a note with the short force-stop fade and removes its registry
    /// entry. Spurious or duplicate calls are silently absorbed.
    pub fn note_off(&mut self, pitch: u8) {
        if pitch > MAX_PITCH {
            log::debug!("note_off: pitch {pitch} out of range, ignoring");
            return;
        }
        if self.registry.get(pitch).is_none() {
            log::debug!("note_off({pitch}): no live voice, ignoring");
            return;
        }
        self.force_stop_note(pitch);
    }

    /// Cleanup primitive: silences the pitch over the 5 ms fade and frees
    /// its slot immediately. Idempotent, cannot fail.
    pub fn force_stop_note(&mut self, pitch: u8) {
        let Some(mut voice) = self.registry.remove(pitch) else {
            return;
        };
        voice.force_stop(self.clock, self.sample_rate);
        log::debug!("force-stopped voice #{} on pitch {pitch}", voice.serial());
        let drop_at = self.clock + self.frames(FORCE_STOP_FADE_SECS + RETIRE_PAD_SECS);
        self.registry.park(voice, drop_at);
    }

    /// Stops every live voice: force-stop fades when `immediate`, natural
    /// release tails otherwise.
    pub fn stop_all_notes(&mut self, immediate: bool) {
        let live = self.registry.live_count();
        if live == 0 {
            return;
        }
        if immediate {
            for pitch in 0..=MAX_PITCH {
                self.force_stop_note(pitch);
            }
        } else {
            let (now, sample_rate) = (self.clock, self.sample_rate);
            for voice in self.registry.live_mut() {
                voice.release(now, sample_rate);
            }
        }
        log::debug!(
            "stopped {live} voice(s) ({})",
            if immediate { "immediate" } else { "released" },
        );
    }

    /// Applies every queued control message in arrival order. Returns how
    /// many were handled. Call this at a block boundary, before
    /// [`Self::render_block`].
    pub fn drain_messages<R: MessageReceiver>(&mut self, receiver: &mut R) -> usize {
        let mut handled = 0;
        while let Some(message) = receiver.try_recv() {
            self.dispatch(message);
            handled += 1;
        }
        handled
    }

    fn dispatch(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::NoteOn { pitch, velocity } => {
                self.note_on(pitch, velocity);
            }
            EngineMessage::NoteOff { pitch } => self.note_off(pitch),
            EngineMessage::SetDimensions { length_cm, width_cm, height_cm } => {
                self.set_dimensions(length_cm, width_cm, height_cm)
            }
            EngineMessage::SetMaterial(material) => self.set_material(material),
            EngineMessage::Build => self.build(),
            EngineMessage::StopAll { immediate } => self.stop_all_notes(immediate),
        }
    }

    /// Renders one mono block into `out`, advancing the engine clock and
    /// reaping finished voices. `out.len()` must not exceed
    /// [`MAX_BLOCK_SIZE`].
    pub fn render_block(&mut self, out: &mut [f32]) {
        let frames = out.len();
        assert!(frames <= MAX_BLOCK_SIZE, "block of {frames} frames exceeds MAX_BLOCK_SIZE");
        out.fill(0.0);

        let sample_rate = self.sample_rate;
        let scratch = &mut self.scratch[..frames];
        for voice in self.registry.live_mut() {
            voice.render(scratch, sample_rate);
            for (mixed, sample) in out.iter_mut().zip(scratch.iter()) {
                *mixed += *sample;
            }
        }
        for voice in self.registry.retiring_mut() {
            if voice.is_finished() {
                continue;
            }
            voice.render(scratch, sample_rate);
            for (mixed, sample) in out.iter_mut().zip(scratch.iter()) {
                *mixed += *sample;
            }
        }

        if let Some(built) = &self.built {
            built.output.process(out);
        }

        self.clock += frames as u64;
        let drop_at = self.clock + self.frames(RETIRE_PAD_SECS);
        self.registry.park_finished_live(drop_at);
        self.registry.drop_expired(self.clock);

        if self.clock >= self.next_sweep_at {
            self.safety_sweep();
            self.next_sweep_at = self.clock + self.frames(SWEEP_INTERVAL_SECS);
        }
    }

    /// Diagnostic backstop. Correct operation gives it nothing to do; a
    /// non-zero reclaim count means a cleanup path misbehaved and is worth
    /// a bug report. Held notes are never touched.
    fn safety_sweep(&mut self) {
        let overdue = self.registry.reclaim_overdue(self.clock);
        let wedged = self.registry.reclaim_stopped_live();
        if overdue + wedged > 0 {
            log::warn!(
                "safety sweep reclaimed {} voice(s) at frame {}: {overdue} overdue retiring, \
                 {wedged} stopped-but-registered",
                overdue + wedged,
                self.clock,
            );
        } else {
            log::trace!("safety sweep clean at frame {}", self.clock);
        }
    }

    /// Number of live (registered) voices. Retiring tails do not count.
    pub fn active_voice_count(&self) -> usize {
        self.registry.live_count()
    }

    /// Snapshot of the live pitches, ascending, for key-state displays.
    pub fn active_pitches(&self) -> Vec<u8> {
        self.registry.live_pitches()
    }

    pub fn voice_state(&self, pitch: u8) -> Option<VoiceState> {
        self.registry.get(pitch).map(|voice| voice.state())
    }

    /// Qualitative description of the current body, built or not.
    pub fn describe_timbre(&self) -> String {
        match &self.built {
            Some(built) => describe(self.material, &built.coeffs),
            None => describe(
                self.material,
                &DerivedCoefficients::derive(self.dims, self.material),
            ),
        }
    }

    /// Master gain of the built output stage; 0.0 before `build`.
    pub fn master_gain(&self) -> f32 {
        self.built.as_ref().map_or(0.0, |built| built.output.master_gain())
    }

    pub fn saturation_active(&self) -> bool {
        self.built.as_ref().is_some_and(|built| built.output.saturation_active())
    }

    fn frames(&self, secs: f32) -> u64 {
        (secs * self.sample_rate).ceil() as u64
    }
}
