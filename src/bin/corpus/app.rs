//! Application state, audio stream setup and the event loop.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use ratatui::DefaultTerminal;
use rtrb::{Consumer, Producer, RingBuffer};

use corpus_synth::body::{BodyDimensions, Material};
use corpus_synth::engine::{control_channel, EngineMessage, PianoEngine};
use corpus_synth::MAX_BLOCK_SIZE;

use super::keymap;
use super::ui;

const CONTROL_QUEUE_CAPACITY: usize = 256;
const SNAPSHOT_QUEUE_CAPACITY: usize = 64;
const NOTE_VELOCITY: f32 = 0.8;
const DIM_STEP_CM: f32 = 10.0;

/// How long a note key counts as held on terminals that cannot report key
/// releases (no kitty keyboard protocol). Key repeat refreshes the timer.
const AUTO_RELEASE: Duration = Duration::from_millis(250);

/// What the audio thread reports back to the UI once per callback.
#[derive(Clone, Copy)]
pub struct EngineSnapshot {
    pub held: [bool; 128],
    pub voice_count: usize,
    pub built: bool,
    pub master_gain: f32,
    pub saturation: bool,
    pub peak: f32,
}

impl EngineSnapshot {
    fn empty() -> Self {
        Self {
            held: [false; 128],
            voice_count: 0,
            built: false,
            master_gain: 0.0,
            saturation: false,
            peak: 0.0,
        }
    }

    fn capture(engine: &PianoEngine, peak: f32) -> Self {
        let mut held = [false; 128];
        for (pitch, flag) in held.iter_mut().enumerate() {
            *flag = engine.voice_state(pitch as u8).is_some();
        }
        Self {
            held,
            voice_count: engine.active_voice_count(),
            built: engine.is_built(),
            master_gain: engine.master_gain(),
            saturation: engine.saturation_active(),
            peak,
        }
    }
}

pub struct App {
    controls: Producer<EngineMessage>,
    snapshots: Consumer<EngineSnapshot>,
    pub(super) latest: EngineSnapshot,
    pub(super) dims: BodyDimensions,
    pub(super) material: Material,
    pub(super) sample_rate: f32,
    pub(super) status: String,
    /// Pitch -> time of the most recent press, for the auto-release
    /// fallback.
    held_keys: HashMap<u8, Instant>,
    release_events: bool,
    should_quit: bool,
    _stream: cpal::Stream,
}

impl App {
    /// Opens the default output device and starts the audio stream. The
    /// engine lives inside the audio callback; this thread only ever talks
    /// to it through the control queue.
    pub fn new() -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (controls, mut control_rx) = control_channel(CONTROL_QUEUE_CAPACITY);
        let (mut snapshot_tx, snapshots) =
            RingBuffer::<EngineSnapshot>::new(SNAPSHOT_QUEUE_CAPACITY);

        let mut engine = PianoEngine::new(sample_rate);
        let mut render_buf = vec![0.0_f32; MAX_BLOCK_SIZE];

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    engine.drain_messages(&mut control_rx);

                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;
                    let mut peak = 0.0_f32;

                    while frames_written < total_frames {
                        let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let block = &mut render_buf[..frames];
                        engine.render_block(block);

                        let out_off = frames_written * channels;
                        for (i, &sample) in block.iter().enumerate() {
                            peak = peak.max(sample.abs());
                            for ch in 0..channels {
                                data[out_off + i * channels + ch] = sample;
                            }
                        }
                        frames_written += frames;
                    }

                    // Dropped snapshots are fine; the UI only wants the latest.
                    let _ = snapshot_tx.push(EngineSnapshot::capture(&engine, peak));
                },
                |err| eprintln!("audio error: {err}"),
                None,
            )
            .wrap_err("failed to open output stream")?;
        stream.play().wrap_err("failed to start output stream")?;

        Ok(Self {
            controls,
            snapshots,
            latest: EngineSnapshot::empty(),
            dims: BodyDimensions::default(),
            material: Material::Wood,
            sample_rate,
            status: String::from("press Enter to build the instrument"),
            held_keys: HashMap::new(),
            release_events: false,
            should_quit: false,
            _stream: stream,
        })
    }

    /// Runs the UI event loop until quit. Enables key-release reporting
    /// where the terminal supports it; elsewhere notes auto-release
    /// shortly after the last key repeat.
    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.release_events =
            crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            crossterm::execute!(
                std::io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.event_loop(terminal);

        if self.release_events {
            crossterm::execute!(std::io::stdout(), PopKeyboardEnhancementFlags)?;
        }
        let _ = self.controls.push(EngineMessage::StopAll { immediate: true });
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_snapshots();
            self.auto_release_stale_keys();

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Keep only the newest snapshot from the audio thread.
    fn poll_snapshots(&mut self) {
        while let Ok(snapshot) = self.snapshots.pop() {
            self.latest = snapshot;
        }
    }

    fn auto_release_stale_keys(&mut self) {
        if self.release_events {
            return;
        }
        let now = Instant::now();
        let expired: Vec<u8> = self
            .held_keys
            .iter()
            .filter(|(_, pressed)| now.duration_since(**pressed) > AUTO_RELEASE)
            .map(|(pitch, _)| *pitch)
            .collect();
        for pitch in expired {
            self.held_keys.remove(&pitch);
            self.send(EngineMessage::NoteOff { pitch });
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Press => self.key_pressed(key.code, false),
            KeyEventKind::Repeat => self.key_pressed(key.code, true),
            KeyEventKind::Release => self.key_released(key.code),
        }
    }

    fn key_pressed(&mut self, code: KeyCode, repeat: bool) {
        match code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => {
                self.send(EngineMessage::Build);
                self.status = format!("built: {}", self.describe());
            }
            KeyCode::Tab => {
                let next = (Material::ALL
                    .iter()
                    .position(|m| *m == self.material)
                    .unwrap_or(0)
                    + 1)
                    % Material::ALL.len();
                self.material = Material::ALL[next];
                self.send(EngineMessage::SetMaterial(self.material));
                self.status = format!("material: {}", self.material);
            }
            KeyCode::Char(' ') => {
                self.held_keys.clear();
                self.send(EngineMessage::StopAll { immediate: true });
                self.status = String::from("all notes stopped");
            }
            KeyCode::Left => self.nudge_dims(-DIM_STEP_CM, 0.0, 0.0),
            KeyCode::Right => self.nudge_dims(DIM_STEP_CM, 0.0, 0.0),
            KeyCode::Down => self.nudge_dims(0.0, -DIM_STEP_CM, 0.0),
            KeyCode::Up => self.nudge_dims(0.0, DIM_STEP_CM, 0.0),
            KeyCode::PageDown => self.nudge_dims(0.0, 0.0, -DIM_STEP_CM),
            KeyCode::PageUp => self.nudge_dims(0.0, 0.0, DIM_STEP_CM),
            KeyCode::Char(ch) => {
                if let Some(pitch) = keymap::pitch_for(ch) {
                    self.note_key_pressed(pitch, repeat);
                }
            }
            _ => {}
        }
    }

    fn note_key_pressed(&mut self, pitch: u8, repeat: bool) {
        let already_held = self.held_keys.contains_key(&pitch);
        self.held_keys.insert(pitch, Instant::now());
        // Typematic repeat refreshes the hold timer but must not retrigger.
        if !(repeat || (already_held && !self.release_events)) {
            self.send(EngineMessage::NoteOn { pitch, velocity: NOTE_VELOCITY });
        }
    }

    fn key_released(&mut self, code: KeyCode) {
        if let KeyCode::Char(ch) = code {
            if let Some(pitch) = keymap::pitch_for(ch) {
                self.held_keys.remove(&pitch);
                self.send(EngineMessage::NoteOff { pitch });
            }
        }
    }

    fn nudge_dims(&mut self, dl: f32, dw: f32, dh: f32) {
        // BodyDimensions::new clamps to the editor's legal range.
        self.dims = BodyDimensions::new(
            self.dims.length_cm() + dl,
            self.dims.width_cm() + dw,
            self.dims.height_cm() + dh,
        );
        self.send(EngineMessage::SetDimensions {
            length_cm: self.dims.length_cm(),
            width_cm: self.dims.width_cm(),
            height_cm: self.dims.height_cm(),
        });
        self.status = format!(
            "body {:.0} x {:.0} x {:.0} cm",
            self.dims.length_cm(),
            self.dims.width_cm(),
            self.dims.height_cm()
        );
    }

    /// Timbre text recomputed locally; it matches the engine because the
    /// mapping is deterministic.
    pub(super) fn describe(&self) -> String {
        use corpus_synth::body::{describe, DerivedCoefficients};
        describe(self.material, &DerivedCoefficients::derive(self.dims, self.material))
    }

    fn send(&mut self, message: EngineMessage) {
        if self.controls.push(message).is_err() {
            self.status = String::from("control queue full, message dropped");
        }
    }
}
