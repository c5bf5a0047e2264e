//! Controller channels in wire order.
//!
//! The position of each variant in `ALL` is its byte offset inside the
//! axis or button block of a [`SampleFrame`](crate::SampleFrame).

use serde::{Deserialize, Serialize};

/// Analog stick axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalogChannel {
    RightX,
    RightY,
    LeftY,
    LeftX,
}

impl AnalogChannel {
    /// Every axis, in the order it is stored on disk.
    pub const ALL: [AnalogChannel; 4] = [
        AnalogChannel::RightX,
        AnalogChannel::RightY,
        AnalogChannel::LeftY,
        AnalogChannel::LeftX,
    ];

    /// Byte offset of this axis within a frame's axis block.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            AnalogChannel::RightX => "RightX",
            AnalogChannel::RightY => "RightY",
            AnalogChannel::LeftY => "LeftY",
            AnalogChannel::LeftX => "LeftX",
        }
    }
}

/// Digital button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigitalButton {
    A,
    B,
    X,
    Y,
    Up,
    Right,
    Down,
    Left,
    L1,
    L2,
    R1,
    R2,
}

impl DigitalButton {
    /// Every button, in the order it is stored on disk.
    pub const ALL: [DigitalButton; 12] = [
        DigitalButton::A,
        DigitalButton::B,
        DigitalButton::X,
        DigitalButton::Y,
        DigitalButton::Up,
        DigitalButton::Right,
        DigitalButton::Down,
        DigitalButton::Left,
        DigitalButton::L1,
        DigitalButton::L2,
        DigitalButton::R1,
        DigitalButton::R2,
    ];

    /// Byte offset of this button within a frame's button block.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            DigitalButton::A => "A",
            DigitalButton::B => "B",
            DigitalButton::X => "X",
            DigitalButton::Y => "Y",
            DigitalButton::Up => "Up",
            DigitalButton::Right => "Right",
            DigitalButton::Down => "Down",
            DigitalButton::Left => "Left",
            DigitalButton::L1 => "L1",
            DigitalButton::L2 => "L2",
            DigitalButton::R1 => "R1",
            DigitalButton::R2 => "R2",
        }
    }

    /// Look a button up by its name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|button| button.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for DigitalButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Display for AnalogChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
