//! Capture buffer between the sampler and the log file.

use std::io::Write;

use encore_core::{SampleFrame, FRAME_LEN};

/// Frames sampled since the last flush.
///
/// The buffer itself is unbounded; the recorder keeps it small by
/// flushing on a fixed cadence.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    frames: Vec<SampleFrame>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for `ticks` frames so appends inside the loop do not
    /// reallocate.
    pub fn with_capacity(ticks: usize) -> Self {
        Self {
            frames: Vec::with_capacity(ticks),
        }
    }

    pub fn append(&mut self, frame: SampleFrame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Encode every buffered frame in insertion order and empty the buffer.
    pub fn drain_and_serialize(&mut self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.frames.len() * FRAME_LEN);
        for frame in self.frames.drain(..) {
            bytes.extend_from_slice(&frame.encode());
        }
        bytes
    }

    /// Write the buffered frames to `sink` in one batch.
    ///
    /// Returns the number of bytes written. The buffer is empty afterwards
    /// even if the write fails.
    pub fn flush_to(&mut self, sink: &mut dyn Write) -> std::io::Result<usize> {
        let bytes = self.drain_and_serialize();
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::{decode_frames, AnalogChannel, DigitalButton};

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let mut buffer = CaptureBuffer::new();
        let frames: Vec<_> = (0..5)
            .map(|i| SampleFrame::NEUTRAL.with_axis(AnalogChannel::LeftY, i * 10))
            .collect();
        for frame in &frames {
            buffer.append(*frame);
        }

        let bytes = buffer.drain_and_serialize();
        assert!(buffer.is_empty());
        assert_eq!(bytes.len(), 5 * FRAME_LEN);

        let (decoded, dropped) = decode_frames(&bytes);
        assert_eq!(decoded, frames);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_empty_drain() {
        let mut buffer = CaptureBuffer::new();
        assert!(buffer.drain_and_serialize().is_empty());
    }

    #[test]
    fn test_flush_to_appends() {
        let mut buffer = CaptureBuffer::with_capacity(4);
        let mut sink = Vec::new();

        buffer.append(SampleFrame::NEUTRAL.with_button(DigitalButton::X, true));
        assert_eq!(buffer.flush_to(&mut sink).unwrap(), FRAME_LEN);

        buffer.append(SampleFrame::NEUTRAL);
        buffer.append(SampleFrame::NEUTRAL);
        assert_eq!(buffer.flush_to(&mut sink).unwrap(), 2 * FRAME_LEN);

        assert_eq!(sink.len(), 3 * FRAME_LEN);
        assert_eq!(sink[6], 1);
    }
}
