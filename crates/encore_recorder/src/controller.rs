//! The virtual controller driven by playback.
//!
//! Application code reads a [`VirtualController`] exactly like a live
//! controller. The replay loop is the only writer.

use std::sync::Arc;

use encore_core::{AnalogChannel, DigitalButton, SampleFrame};
use parking_lot::RwLock;

#[derive(Clone, Copy, Debug)]
struct ControllerState {
    current: SampleFrame,
    /// State as of the tick before `current` was applied.
    previous: SampleFrame,
    active: bool,
}

/// Shared handle to the controller state of one playback session.
///
/// Cheap to clone; every clone observes the same state. Once playback
/// stops the controller reads neutral and [`is_active`](Self::is_active)
/// returns `false`.
#[derive(Clone, Debug)]
pub struct VirtualController {
    state: Arc<RwLock<ControllerState>>,
}

impl VirtualController {
    /// A neutral, active controller.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ControllerState {
                current: SampleFrame::NEUTRAL,
                previous: SampleFrame::NEUTRAL,
                active: true,
            })),
        }
    }

    /// Stick position for `channel`, in -128..=127.
    pub fn analog(&self, channel: AnalogChannel) -> i32 {
        self.state.read().current.axis(channel) as i32
    }

    /// Whether `button` is held this tick.
    pub fn digital(&self, button: DigitalButton) -> bool {
        self.state.read().current.is_pressed(button)
    }

    /// Whether `button` went from released to held on this tick.
    pub fn digital_new_press(&self, button: DigitalButton) -> bool {
        let state = self.state.read();
        state.current.is_pressed(button) && !state.previous.is_pressed(button)
    }

    /// Whether the owning playback session is still running.
    pub fn is_active(&self) -> bool {
        self.state.read().active
    }

    /// The frame currently applied.
    pub fn snapshot(&self) -> SampleFrame {
        self.state.read().current
    }

    /// Apply the next tick's frame, keeping the outgoing state for edge
    /// detection. Buttons are normalized to 0 or 1.
    pub(crate) fn advance(&self, frame: SampleFrame) {
        let mut next = frame;
        for value in next.buttons.iter_mut() {
            *value = (*value != 0) as i8;
        }

        let mut state = self.state.write();
        state.previous = state.current;
        state.current = next;
    }

    /// Return every channel to neutral and detach from the session.
    pub(crate) fn release(&self) {
        let mut state = self.state.write();
        state.current = SampleFrame::NEUTRAL;
        state.previous = SampleFrame::NEUTRAL;
        state.active = false;
    }
}

impl Default for VirtualController {
    fn default() -> Self {
        Self::new()
    }
}
