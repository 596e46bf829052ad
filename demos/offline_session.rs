/// Offline tour of the piano engine: build, play, survive noisy input,
/// rebuild under held notes, drain a control queue. No audio device needed.

use corpus_synth::body::Material;
use corpus_synth::engine::{control_channel, EngineMessage, PianoEngine};
use simple_logger::SimpleLogger;

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK_SIZE: usize = 256;

fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0_f32, |acc, &x| acc.max(x.abs()))
}

/// Renders roughly `ms` of audio and returns the loudest sample seen.
fn render_ms(engine: &mut PianoEngine, buffer: &mut [f32], ms: f32) -> f32 {
    let blocks = ((ms / 1_000.0 * SAMPLE_RATE) / BLOCK_SIZE as f32).ceil() as usize;
    let mut loudest = 0.0_f32;
    for _ in 0..blocks {
        engine.render_block(buffer);
        loudest = loudest.max(peak(buffer));
    }
    loudest
}

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    println!("=== Offline Session ===\n");

    let mut engine = PianoEngine::new(SAMPLE_RATE);
    let mut buffer = vec![0.0_f32; BLOCK_SIZE];

    // Nothing sounds before the first build.
    let outcome = engine.note_on(60, 0.9);
    println!("Note before build(): {:?}", outcome);

    engine.build();
    println!("Built: {}\n", engine.describe_timbre());

    // Play a C major chord (C4, E4, G4)
    println!("Playing C major chord:");
    for pitch in [60_u8, 64, 67] {
        let outcome = engine.note_on(pitch, 0.9);
        println!("  Note On {}: {:?}", pitch, outcome);
    }
    let loudest = render_ms(&mut engine, &mut buffer, 120.0);
    println!("  Active voices: {}", engine.active_voice_count());
    println!("  Held pitches: {:?}", engine.active_pitches());
    println!("  Peak amplitude: {:.3}", loudest);

    // A second strike on a held key restarts it as one fresh voice.
    println!("\nStriking C4 again while held:");
    let outcome = engine.note_on(60, 0.9);
    println!("  Outcome: {:?}", outcome);
    println!("  Active voices: {}", engine.active_voice_count());

    // Noisy controller input: duplicate note-offs and a zero-velocity
    // note-on, which MIDI treats as a note-off.
    println!("\nNoisy input:");
    engine.note_off(64);
    engine.note_off(64);
    println!("  Double Note Off 64 -> {} voices", engine.active_voice_count());
    let outcome = engine.note_on(67, 0.0);
    println!(
        "  Note On 67 at velocity 0.0 -> {:?}, {} voices",
        outcome,
        engine.active_voice_count()
    );
    render_ms(&mut engine, &mut buffer, 30.0);

    // Reshape the instrument over a lock-free queue while C4 is still
    // held. The rebuild force-stops it before the output path changes.
    println!("\nReshaping over the control queue (C4 still held):");
    let (mut tx, mut rx) = control_channel(64);
    let _ = tx.push(EngineMessage::SetMaterial(Material::Metal));
    let _ = tx.push(EngineMessage::SetDimensions {
        length_cm: 220.0,
        width_cm: 120.0,
        height_cm: 60.0,
    });
    let _ = tx.push(EngineMessage::NoteOn { pitch: 48, velocity: 0.8 });
    let handled = engine.drain_messages(&mut rx);
    println!("  Handled {} queued messages", handled);
    println!("  Now: {}", engine.describe_timbre());

    let loudest = render_ms(&mut engine, &mut buffer, 150.0);
    println!("  C2 on the metal body, peak {:.3}", loudest);

    // Let everything ring out naturally.
    println!("\nReleasing all notes:");
    let _ = tx.push(EngineMessage::StopAll { immediate: false });
    engine.drain_messages(&mut rx);
    render_ms(&mut engine, &mut buffer, 600.0);
    println!("  Active voices: {}", engine.active_voice_count());
    println!("  Final block peak: {:.6}", peak(&buffer));
    println!("  Frames rendered: {}", engine.frames_rendered());

    println!("\n=== Engine Guarantees ===");
    println!("• One voice per pitch: a restrike replaces, never doubles");
    println!("• Note-off is a 5ms fade, so keys never click or stick");
    println!("• Rebuilds stop every voice before the output path changes");
    println!("• Zero-velocity note-on is treated as note-off");
    println!("• The control queue never blocks the render thread");
    println!("\nRun the `corpus` binary for the live keyboard version.");
}
