//! Pitch-to-voice bookkeeping.
//!
//! The slot table makes the core invariant structural: one `Option<Voice>`
//! per pitch means at most one live voice per pitch, with nothing to check
//! at runtime. Voices taken out of their slot (force-stopped, or finished
//! with their natural release) are parked on the `retiring` list so their
//! fade tail keeps rendering for a bounded grace period before the voice
//! is dropped.

use crate::voice::{Voice, VoiceState};

pub(crate) const SLOT_COUNT: usize = 128;

/// Covers every slot force-stopped at once plus a burst of restarts.
const RETIRING_CAPACITY: usize = 192;

struct RetiringVoice {
    voice: Voice,
    /// Frame after which the voice may be dropped. Always past the end of
    /// its fade, so dropping never truncates audible signal.
    drop_at: u64,
}

pub(crate) struct VoiceRegistry {
    slots: [Option<Voice>; SLOT_COUNT],
    retiring: Vec<RetiringVoice>,
    serial: u64,
}

impl VoiceRegistry {
    pub(crate) fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            retiring: Vec::with_capacity(RETIRING_CAPACITY),
            serial: 0,
        }
    }

    /// Generation tag for the next voice. Strictly increasing, never
    /// reused, so a restarted pitch is distinguishable from the voice it
    /// replaced.
    pub(crate) fn next_serial(&mut self) -> u64 {
        self.serial += 1;
        self.serial
    }

    pub(crate) fn get(&self, pitch: u8) -> Option<&Voice> {
        self.slots.get(pitch as usize)?.as_ref()
    }

    pub(crate) fn insert(&mut self, voice: Voice) {
        let slot = &mut self.slots[voice.pitch() as usize];
        debug_assert!(slot.is_none(), "pitch {} already has a live voice", voice.pitch());
        *slot = Some(voice);
    }

    pub(crate) fn remove(&mut self, pitch: u8) -> Option<Voice> {
        self.slots.get_mut(pitch as usize)?.take()
    }

    /// Parks a voice on the retiring list until `drop_at`.
    pub(crate) fn park(&mut self, voice: Voice, drop_at: u64) {
        self.retiring.push(RetiringVoice { voice, drop_at });
    }

    pub(crate) fn live_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.slots.iter_mut().filter_map(|slot| slot.as_mut())
    }

    pub(crate) fn retiring_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.retiring.iter_mut().map(|entry| &mut entry.voice)
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn live_pitches(&self) -> Vec<u8> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(pitch, slot)| slot.as_ref().map(|_| pitch as u8))
            .collect()
    }

    pub(crate) fn retiring_len(&self) -> usize {
        self.retiring.len()
    }

    /// Moves naturally finished live voices (release ramp complete) onto
    /// the retiring list. Called once per rendered block.
    pub(crate) fn park_finished_live(&mut self, drop_at: u64) {
        for slot in self.slots.iter_mut() {
            if let Some(voice) = slot.take_if(|voice| voice.is_finished()) {
                self.retiring.push(RetiringVoice { voice, drop_at });
            }
        }
    }

    /// Drops retiring voices whose fade is done and whose grace period has
    /// passed. Returns how many were dropped.
    pub(crate) fn drop_expired(&mut self, now: u64) -> usize {
        let before = self.retiring.len();
        self.retiring
            .retain(|entry| !(entry.voice.is_finished() && now >= entry.drop_at));
        before - self.retiring.len()
    }

    /// Force-drops every retiring voice past its deadline, finished or
    /// not. Only the safety sweep calls this; after [`Self::drop_expired`]
    /// anything it removes was wedged.
    pub(crate) fn reclaim_overdue(&mut self, now: u64) -> usize {
        let before = self.retiring.len();
        self.retiring.retain(|entry| now < entry.drop_at);
        before - self.retiring.len()
    }

    /// Drops any slot voice sitting in `Stopped` state. No normal path
    /// leaves a force-stopped voice in a slot; the safety sweep uses this
    /// as an invariant check.
    pub(crate) fn reclaim_stopped_live(&mut self) -> usize {
        let mut reclaimed = 0;
        for slot in self.slots.iter_mut() {
            if slot.as_ref().is_some_and(|v| v.state() == VoiceState::Stopped) {
                *slot = None;
                reclaimed += 1;
            }
        }
        reclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyDimensions, DerivedCoefficients, Material};

    const SAMPLE_RATE: f32 = 48_000.0;

    fn voice_at(registry: &mut VoiceRegistry, pitch: u8) -> Voice {
        let coeffs = DerivedCoefficients::derive(BodyDimensions::default(), Material::Wood);
        let serial = registry.next_serial();
        Voice::start(pitch, 0.8, &coeffs, serial, 0)
    }

    #[test]
    fn serials_are_strictly_increasing() {
        let mut registry = VoiceRegistry::new();
        let a = registry.next_serial();
        let b = registry.next_serial();
        assert!(b > a);
    }

    #[test]
    fn slots_hold_one_voice_per_pitch() {
        let mut registry = VoiceRegistry::new();
        let v60 = voice_at(&mut registry, 60);
        let v64 = voice_at(&mut registry, 64);
        registry.insert(v60);
        registry.insert(v64);

        assert_eq!(registry.live_count(), 2);
        assert_eq!(registry.live_pitches(), vec![60, 64]);
        assert!(registry.get(60).is_some());
        assert!(registry.get(61).is_none());

        let removed = registry.remove(60).unwrap();
        assert_eq!(removed.pitch(), 60);
        assert_eq!(registry.live_pitches(), vec![64]);
        assert!(registry.remove(60).is_none());
    }

    #[test]
    fn out_of_table_pitch_is_harmless() {
        let mut registry = VoiceRegistry::new();
        assert!(registry.get(200).is_none());
        assert!(registry.remove(200).is_none());
    }

    #[test]
    fn expired_retiring_voices_drop_only_once_finished() {
        let mut registry = VoiceRegistry::new();
        let mut voice = voice_at(&mut registry, 60);
        voice.force_stop(0, SAMPLE_RATE);
        registry.park(voice, 100);

        // Deadline passed but the fade has not rendered to completion.
        assert_eq!(registry.drop_expired(500), 0);
        assert_eq!(registry.retiring_len(), 1);

        let mut buf = [0.0_f32; 512];
        for voice in registry.retiring_mut() {
            voice.render(&mut buf, SAMPLE_RATE);
        }
        assert_eq!(registry.drop_expired(500), 1);
        assert_eq!(registry.retiring_len(), 0);
    }

    #[test]
    fn reclaim_overdue_takes_unfinished_stragglers() {
        let mut registry = VoiceRegistry::new();
        // A sustaining voice parked by mistake never finishes on its own.
        let voice = voice_at(&mut registry, 72);
        registry.park(voice, 100);

        assert_eq!(registry.drop_expired(10_000), 0);
        assert_eq!(registry.reclaim_overdue(10_000), 1);
        assert_eq!(registry.retiring_len(), 0);
    }

    #[test]
    fn finished_live_voices_get_parked() {
        let mut registry = VoiceRegistry::new();
        let mut voice = voice_at(&mut registry, 60);
        voice.force_stop(0, SAMPLE_RATE);
        let mut buf = [0.0_f32; 512];
        voice.render(&mut buf, SAMPLE_RATE);
        assert!(voice.is_finished());

        registry.insert(voice);
        registry.park_finished_live(600);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.retiring_len(), 1);
    }
}
