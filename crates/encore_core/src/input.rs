//! Collaborators the engine samples from and reports to.

use crate::channel::{AnalogChannel, DigitalButton};
use crate::frame::{Position, SampleFrame};

/// A live controller.
///
/// Values are read with the width the device API returns them in and
/// narrowed to one byte per channel when a frame is captured.
pub trait InputSource: Send + Sync {
    fn is_connected(&self) -> bool;

    fn analog(&self, channel: AnalogChannel) -> i32;

    /// Non-zero when held.
    fn digital(&self, button: DigitalButton) -> i32;
}

/// Capture every channel of `source` into one frame.
pub fn sample_frame(source: &dyn InputSource) -> SampleFrame {
    let mut frame = SampleFrame::NEUTRAL;
    for channel in AnalogChannel::ALL {
        frame.axes[channel.index()] = source.analog(channel) as i8;
    }
    for button in DigitalButton::ALL {
        frame.buttons[button.index()] = source.digital(button) as i8;
    }
    frame
}

/// Something that knows where the robot is on the field.
pub trait PositionSource {
    fn position(&self) -> Position;
}

impl PositionSource for Position {
    fn position(&self) -> Position {
        *self
    }
}

/// Operator-facing message surface (the brain screen on a robot).
pub trait Diagnostics: Send + Sync {
    fn report(&self, message: &str);
}

/// Forwards diagnostics to the `tracing` error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl InputSource for Fixed {
        fn is_connected(&self) -> bool {
            true
        }

        fn analog(&self, channel: AnalogChannel) -> i32 {
            match channel {
                AnalogChannel::RightX => -127,
                AnalogChannel::LeftX => 64,
                _ => 0,
            }
        }

        fn digital(&self, button: DigitalButton) -> i32 {
            matches!(button, DigitalButton::B | DigitalButton::Left) as i32
        }
    }

    #[test]
    fn test_sample_frame_uses_wire_order() {
        let frame = sample_frame(&Fixed);
        assert_eq!(frame.axes, [-127, 0, 0, 64]);
        assert_eq!(frame.buttons, [0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_position_is_its_own_source() {
        let pos = Position::new(1.0, 2.0, 3.0);
        assert_eq!(pos.position(), pos);
    }
}
