//! Binary layout of a controller log.
//!
//! A log is a 25-byte [`SessionHeader`] followed by any number of 16-byte
//! [`SampleFrame`] records. There is no magic number and no length field;
//! frame boundaries are implied by position.
//!
//! ```text
//! offset 0      : u8   duration_seconds
//! offset 1      : f64  origin x
//! offset 9      : f64  origin y
//! offset 17     : f64  origin heading
//! offset 25..EOF: 16-byte frames (4 axis bytes, 12 button bytes)
//! ```

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::channel::{AnalogChannel, DigitalButton};
use crate::error::{EncoreError, Result};

/// Encoded size of a [`SessionHeader`].
pub const HEADER_LEN: usize = 25;

/// Encoded size of a [`SampleFrame`].
pub const FRAME_LEN: usize = 16;

/// Field position snapshot taken when a recording starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        heading: 0.0,
    };

    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }
}

/// Header written once at the start of every log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHeader {
    /// Requested recording length. Playback ignores it and runs until the
    /// frames are exhausted.
    pub duration_seconds: u8,
    pub origin: Position,
}

impl SessionHeader {
    pub fn new(duration_seconds: u8, origin: Position) -> Self {
        Self {
            duration_seconds,
            origin,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = self.duration_seconds;
        out[1..9].copy_from_slice(&self.origin.x.to_le_bytes());
        out[9..17].copy_from_slice(&self.origin.y.to_le_bytes());
        out[17..25].copy_from_slice(&self.origin.heading.to_le_bytes());
        out
    }

    /// Decode a header from the front of `bytes`. Extra bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(EncoreError::TruncatedInput {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }

        let f64_at = |offset: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[offset..offset + 8]);
            f64::from_le_bytes(raw)
        };

        Ok(Self {
            duration_seconds: bytes[0],
            origin: Position {
                x: f64_at(1),
                y: f64_at(9),
                heading: f64_at(17),
            },
        })
    }
}

/// One sample of every controller channel.
///
/// The in-memory layout is the wire layout, so encoding is a plain cast.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct SampleFrame {
    /// Stick positions in [`AnalogChannel::ALL`] order.
    pub axes: [i8; 4],
    /// Button states in [`DigitalButton::ALL`] order. Non-zero is pressed.
    pub buttons: [i8; 12],
}

impl SampleFrame {
    /// All sticks centered, no buttons pressed.
    pub const NEUTRAL: SampleFrame = SampleFrame {
        axes: [0; 4],
        buttons: [0; 12],
    };

    pub fn new(axes: [i8; 4], buttons: [i8; 12]) -> Self {
        Self { axes, buttons }
    }

    pub fn axis(&self, channel: AnalogChannel) -> i8 {
        self.axes[channel.index()]
    }

    pub fn button(&self, button: DigitalButton) -> i8 {
        self.buttons[button.index()]
    }

    pub fn is_pressed(&self, button: DigitalButton) -> bool {
        self.button(button) != 0
    }

    pub fn with_axis(mut self, channel: AnalogChannel, value: i8) -> Self {
        self.axes[channel.index()] = value;
        self
    }

    pub fn with_button(mut self, button: DigitalButton, pressed: bool) -> Self {
        self.buttons[button.index()] = pressed as i8;
        self
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        bytemuck::cast(*self)
    }

    pub fn decode(bytes: &[u8; FRAME_LEN]) -> Self {
        bytemuck::cast(*bytes)
    }
}

/// Split a log body into whole frames.
///
/// Returns the frames in file order and the number of trailing bytes that
/// did not form a complete frame.
pub fn decode_frames(body: &[u8]) -> (Vec<SampleFrame>, usize) {
    let chunks = body.chunks_exact(FRAME_LEN);
    let remainder = chunks.remainder().len();
    let frames = chunks
        .map(bytemuck::pod_read_unaligned::<SampleFrame>)
        .collect();
    (frames, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = SessionHeader::new(15, Position::new(1.5, -2.25, 90.0));
        let bytes = header.encode();

        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(bytes[0], 15);
        assert_eq!(&bytes[1..9], &1.5f64.to_le_bytes());
        assert_eq!(&bytes[9..17], &(-2.25f64).to_le_bytes());
        assert_eq!(&bytes[17..25], &90.0f64.to_le_bytes());
    }

    #[test]
    fn test_header_round_trip_is_bit_exact() {
        let cases = [
            SessionHeader::new(0, Position::ORIGIN),
            SessionHeader::new(255, Position::new(f64::MIN_POSITIVE, -0.0, f64::MAX)),
            SessionHeader::new(42, Position::new(0.1 + 0.2, 1e-300, -123.456)),
        ];

        for header in cases {
            let decoded = SessionHeader::decode(&header.encode()).unwrap();
            assert_eq!(decoded.duration_seconds, header.duration_seconds);
            assert_eq!(decoded.origin.x.to_bits(), header.origin.x.to_bits());
            assert_eq!(decoded.origin.y.to_bits(), header.origin.y.to_bits());
            assert_eq!(
                decoded.origin.heading.to_bits(),
                header.origin.heading.to_bits()
            );
        }
    }

    #[test]
    fn test_short_header_is_truncated() {
        let bytes = SessionHeader::default().encode();
        let err = SessionHeader::decode(&bytes[..24]).unwrap_err();
        assert!(matches!(
            err,
            EncoreError::TruncatedInput {
                expected: 25,
                actual: 24
            }
        ));
    }

    #[test]
    fn test_frame_layout() {
        let frame = SampleFrame::NEUTRAL
            .with_axis(AnalogChannel::RightX, -128)
            .with_axis(AnalogChannel::LeftX, 127)
            .with_button(DigitalButton::A, true)
            .with_button(DigitalButton::R2, true);
        let bytes = frame.encode();

        assert_eq!(bytes[0], 0x80);
        assert_eq!(bytes[3], 0x7f);
        assert_eq!(bytes[4], 1);
        assert_eq!(bytes[15], 1);
        assert_eq!(SampleFrame::decode(&bytes), frame);
    }

    #[test]
    fn test_frame_preserves_arbitrary_bytes() {
        let frame = SampleFrame::new(
            [-1, 0, 1, -128],
            [-5, 3, 0, 0, 0, 0, 0, 0, 127, -128, 2, 0],
        );
        assert_eq!(SampleFrame::decode(&frame.encode()), frame);
        assert!(frame.is_pressed(DigitalButton::A));
        assert!(!frame.is_pressed(DigitalButton::X));
    }

    #[test]
    fn test_decode_frames_drops_partial_tail() {
        let a = SampleFrame::NEUTRAL.with_axis(AnalogChannel::LeftY, 10);
        let b = SampleFrame::NEUTRAL.with_button(DigitalButton::L1, true);

        let mut body = Vec::new();
        body.extend_from_slice(&a.encode());
        body.extend_from_slice(&b.encode());
        body.extend_from_slice(&[9, 9, 9]);

        let (frames, dropped) = decode_frames(&body);
        assert_eq!(frames, vec![a, b]);
        assert_eq!(dropped, 3);
    }
}
