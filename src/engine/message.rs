//! Control messages from input adapters.
//!
//! Adapters (keyboard UIs, controller glue) normalize whatever they see
//! into [`EngineMessage`] values and push them over a lock-free queue; the
//! audio callback drains the queue between blocks. That hand-off is the
//! only way control traffic crosses threads, which is what keeps every
//! registry mutation serialized.

use std::collections::VecDeque;

use crate::body::Material;

/// Everything an adapter can ask of the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineMessage {
    NoteOn { pitch: u8, velocity: f32 },
    NoteOff { pitch: u8 },
    SetDimensions { length_cm: f32, width_cm: f32, height_cm: f32 },
    SetMaterial(Material),
    Build,
    StopAll { immediate: bool },
}

/// Source of control messages for [`drain_messages`].
///
/// [`drain_messages`]: crate::engine::PianoEngine::drain_messages
pub trait MessageReceiver {
    /// Returns the next pending message, or `None` when the queue is
    /// empty. Must never block.
    fn try_recv(&mut self) -> Option<EngineMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for rtrb::Consumer<EngineMessage> {
    fn try_recv(&mut self) -> Option<EngineMessage> {
        self.pop().ok()
    }
}

/// Single-threaded stand-in for tests and offline demos.
impl MessageReceiver for VecDeque<EngineMessage> {
    fn try_recv(&mut self) -> Option<EngineMessage> {
        self.pop_front()
    }
}

/// Builds the SPSC control queue connecting an adapter thread to the audio
/// callback.
#[cfg(feature = "rtrb")]
pub fn control_channel(
    capacity: usize,
) -> (rtrb::Producer<EngineMessage>, rtrb::Consumer<EngineMessage>) {
    rtrb::RingBuffer::new(capacity)
}
