//! End-to-end checks of the engine's behavioral guarantees: registry
//! uniqueness, stuck-note freedom, pop-free stops and deterministic
//! retriggers, exercised through the public API only.

use corpus_synth::engine::{NoteOutcome, PianoEngine};
use corpus_synth::voice::{note_to_freq, VoiceState};

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK: usize = 256;

fn built_engine() -> PianoEngine {
    let mut engine = PianoEngine::new(SAMPLE_RATE);
    engine.build();
    engine
}

/// Renders `ms` of audio and returns every sample produced.
fn render_ms(engine: &mut PianoEngine, ms: f32) -> Vec<f32> {
    let frames = (ms / 1_000.0 * SAMPLE_RATE) as usize;
    let mut buf = [0.0_f32; BLOCK];
    let mut all = Vec::with_capacity(frames);
    let mut rendered = 0;
    while rendered < frames {
        let n = (frames - rendered).min(BLOCK);
        engine.render_block(&mut buf[..n]);
        all.extend_from_slice(&buf[..n]);
        rendered += n;
    }
    all
}

#[test]
fn registry_never_holds_two_voices_for_one_pitch() {
    let mut engine = built_engine();

    // Deterministic splitmix-style stream drives a noisy event mix.
    let mut state = 0x2545_f491_4f6c_dd1d_u64;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as u32
    };

    for step in 0..2_000 {
        let pitch = 48 + (next() % 16) as u8;
        match next() % 10 {
            0..=4 => {
                engine.note_on(pitch, 0.2 + (next() % 80) as f32 / 100.0);
            }
            5..=6 => engine.note_off(pitch),
            7 => engine.force_stop_note(pitch),
            8 => engine.stop_all_notes(false),
            _ => engine.stop_all_notes(true),
        }

        let pitches = engine.active_pitches();
        for pair in pitches.windows(2) {
            assert!(pair[0] < pair[1], "duplicate pitch in registry: {pitches:?}");
        }
        assert_eq!(pitches.len(), engine.active_voice_count());

        if step % 7 == 0 {
            render_ms(&mut engine, 2.0);
        }
    }
}

#[test]
fn double_note_on_restarts_exactly_one_voice() {
    let mut engine = built_engine();
    assert_eq!(engine.note_on(60, 0.7), NoteOutcome::Started);
    assert_eq!(engine.note_on(60, 0.7), NoteOutcome::Restarted);

    assert_eq!(engine.active_voice_count(), 1);
    assert_eq!(engine.voice_state(60), Some(VoiceState::Attacking));

    render_ms(&mut engine, 50.0);
    assert_eq!(engine.active_voice_count(), 1);
}

#[test]
fn note_off_without_a_voice_is_a_no_op() {
    let mut engine = built_engine();
    engine.note_off(60);
    assert_eq!(engine.active_voice_count(), 0);

    engine.note_on(60, 0.7);
    engine.note_off(60);
    engine.note_off(60);
    engine.force_stop_note(60);
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn stop_all_empties_the_registry_and_silences_within_50_ms() {
    let mut engine = built_engine();
    for pitch in [48, 60, 64, 67] {
        engine.note_on(pitch, 0.9);
    }
    render_ms(&mut engine, 200.0);

    engine.stop_all_notes(true);
    assert_eq!(engine.active_voice_count(), 0);
    assert!(engine.active_pitches().is_empty());

    let tail = render_ms(&mut engine, 50.0);
    // The fade means the first millisecond still carries signal (no hard
    // cut), while the end of the window is fully silent.
    assert!(tail[..48].iter().any(|s| s.abs() > 1e-5));
    assert!(tail[tail.len() - BLOCK..].iter().all(|s| s.abs() < 1e-4));
}

#[test]
fn frequency_mapping_is_equal_tempered() {
    assert_eq!(note_to_freq(69), 440.0);
    assert!((note_to_freq(60) - 261.63).abs() < 0.01);
    assert!((note_to_freq(81) - 880.0).abs() < 0.01);
}

#[test]
fn default_body_sits_at_base_gain_with_no_saturation() {
    let mut engine = PianoEngine::new(SAMPLE_RATE);
    engine.build();
    assert!((engine.master_gain() - 0.35).abs() < 1e-6);
    assert!(!engine.saturation_active());
}

#[test]
fn material_change_while_sounding_leaves_no_orphans() {
    use corpus_synth::body::Material;

    let mut engine = built_engine();
    engine.note_on(60, 0.8);
    engine.note_on(64, 0.8);
    render_ms(&mut engine, 100.0);

    engine.set_material(Material::Glass);
    assert_eq!(engine.active_voice_count(), 0, "rebuild must stop all voices");

    // The faded tails drain without touching the new configuration.
    render_ms(&mut engine, 100.0);
    assert_eq!(engine.note_on(60, 0.8), NoteOutcome::Started);

    engine.set_dimensions(400.0, 400.0, 400.0);
    assert!(engine.saturation_active());
    engine.set_dimensions(150.0, 140.0, 100.0);
    assert!(!engine.saturation_active());
}

#[test]
fn wide_flat_wood_box_scenario() {
    let mut engine = PianoEngine::new(SAMPLE_RATE);
    engine.set_dimensions(80.0, 280.0, 40.0);
    engine.build();

    assert_eq!(engine.note_on(60, 0.7), NoteOutcome::Started);
    assert_eq!(engine.voice_state(60), Some(VoiceState::Attacking));

    // Attack for a 40 cm tall body is 32 ms.
    render_ms(&mut engine, 60.0);
    assert_eq!(engine.voice_state(60), Some(VoiceState::Sustaining));

    render_ms(&mut engine, 500.0);
    engine.note_off(60);
    assert!(engine.active_pitches().is_empty());

    // Bound from the release (120 ms) plus 0.2 s; the force-stop fade is
    // far inside it.
    let tail = render_ms(&mut engine, 320.0);
    assert!(tail[tail.len() - BLOCK..].iter().all(|s| s.abs() < 1e-4));
}

#[test]
fn immediate_retrigger_keeps_a_single_fresh_voice() {
    let mut engine = built_engine();
    engine.note_on(60, 0.7);
    assert_eq!(engine.note_on(60, 0.7), NoteOutcome::Restarted);
    assert_eq!(engine.active_pitches(), vec![60]);

    render_ms(&mut engine, 10.0);
    assert_eq!(engine.active_voice_count(), 1);
}

#[test]
fn non_positive_velocity_acts_as_note_off() {
    let mut engine = built_engine();
    engine.note_on(60, 0.7);
    assert_eq!(engine.note_on(60, 0.0), NoteOutcome::Ignored);
    assert_eq!(engine.active_voice_count(), 0);

    engine.note_on(64, 0.7);
    assert_eq!(engine.note_on(64, f32::NAN), NoteOutcome::Ignored);
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn note_on_before_build_makes_no_sound() {
    let mut engine = PianoEngine::new(SAMPLE_RATE);
    assert_eq!(engine.note_on(60, 0.7), NoteOutcome::NotBuilt);
    assert_eq!(engine.active_voice_count(), 0);

    let out = render_ms(&mut engine, 20.0);
    assert!(out.iter().all(|s| *s == 0.0));
}

#[test]
fn out_of_range_pitch_is_absorbed() {
    let mut engine = built_engine();
    assert_eq!(engine.note_on(200, 0.7), NoteOutcome::Ignored);
    engine.note_off(200);
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn out_of_range_dimensions_clamp_instead_of_failing() {
    let mut engine = PianoEngine::new(SAMPLE_RATE);
    engine.set_dimensions(5.0, 9_999.0, f32::NAN);
    engine.build();

    // 30 x 400 x 100 against the 150 x 140 x 100 reference.
    let volume_factor = (30.0 * 400.0 * 100.0) / (150.0 * 140.0 * 100.0);
    assert!((engine.master_gain() - 0.35 * volume_factor).abs() < 1e-4);
    assert!(!engine.describe_timbre().is_empty());
}

#[test]
fn note_off_fades_instead_of_cutting() {
    let mut engine = built_engine();
    engine.note_on(60, 0.9);
    render_ms(&mut engine, 150.0);

    engine.note_off(60);
    let tail = render_ms(&mut engine, 25.0);

    let first_ms = &tail[..48];
    let after_fade = &tail[(10.0 / 1_000.0 * SAMPLE_RATE) as usize..];
    assert!(first_ms.iter().any(|s| s.abs() > 1e-5), "fade tail missing");
    assert!(after_fade.iter().all(|s| s.abs() < 1e-3), "fade overran 10 ms");
}
