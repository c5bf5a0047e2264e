//! Playback queue loaded from a log before replay starts.

use std::collections::VecDeque;
use std::io::{self, Read};

use encore_core::{EncoreError, Result, SampleFrame, SessionHeader, FRAME_LEN, HEADER_LEN};

/// Bytes read from the source per call while loading frames.
const SCRATCH_LEN: usize = FRAME_LEN * 256;

/// Frames waiting to be replayed, in file order.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    frames: VecDeque<SampleFrame>,
    dropped_bytes: usize,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a whole log: the header, then every complete frame.
    ///
    /// A trailing partial frame is left behind by an interrupted write and
    /// is discarded without error; its size is kept in
    /// [`dropped_bytes`](Self::dropped_bytes).
    pub fn load(source: &mut dyn Read) -> Result<(SessionHeader, Self)> {
        let header = read_header(source)?;

        let mut queue = Self::new();
        let mut scratch = vec![0u8; SCRATCH_LEN];
        let mut filled = 0;

        loop {
            let n = match source.read(&mut scratch[filled..]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(EncoreError::SourceOpenFailed(e.to_string())),
            };
            filled += n;

            let whole = filled - filled % FRAME_LEN;
            queue
                .frames
                .extend(scratch[..whole].chunks_exact(FRAME_LEN).map(frame_from_chunk));
            scratch.copy_within(whole..filled, 0);
            filled -= whole;
        }

        if filled > 0 {
            tracing::warn!("Discarding {} trailing bytes of a partial frame", filled);
        }
        queue.dropped_bytes = filled;

        Ok((header, queue))
    }

    pub fn push(&mut self, frame: SampleFrame) {
        self.frames.push_back(frame);
    }

    pub fn pop(&mut self) -> Option<SampleFrame> {
        self.frames.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Size of the partial frame discarded at load time.
    pub fn dropped_bytes(&self) -> usize {
        self.dropped_bytes
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleFrame> {
        self.frames.iter()
    }
}

impl FromIterator<SampleFrame> for PlaybackQueue {
    fn from_iter<I: IntoIterator<Item = SampleFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
            dropped_bytes: 0,
        }
    }
}

fn frame_from_chunk(chunk: &[u8]) -> SampleFrame {
    let mut raw = [0u8; FRAME_LEN];
    raw.copy_from_slice(chunk);
    SampleFrame::decode(&raw)
}

/// Read only the session header from the front of `source`.
pub fn read_header(source: &mut dyn Read) -> Result<SessionHeader> {
    let mut raw = [0u8; HEADER_LEN];
    let mut filled = 0;

    while filled < HEADER_LEN {
        match source.read(&mut raw[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(EncoreError::SourceOpenFailed(e.to_string())),
        }
    }

    SessionHeader::decode(&raw[..filled])
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::{DigitalButton, Position};
    use std::io::Cursor;

    fn log_bytes(frames: &[SampleFrame], tail: &[u8]) -> Vec<u8> {
        let mut bytes = SessionHeader::new(3, Position::new(1.0, 2.0, 3.0))
            .encode()
            .to_vec();
        for frame in frames {
            bytes.extend_from_slice(&frame.encode());
        }
        bytes.extend_from_slice(tail);
        bytes
    }

    /// Hands out at most `step` bytes per read, to exercise chunk carry-over.
    struct Trickle {
        inner: Cursor<Vec<u8>>,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.step);
            self.inner.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_load_in_file_order() {
        let frames: Vec<_> = (0..40)
            .map(|i| SampleFrame::new([i, -i, 0, 1], [0; 12]))
            .collect();
        let mut source = Cursor::new(log_bytes(&frames, &[]));

        let (header, queue) = PlaybackQueue::load(&mut source).unwrap();
        assert_eq!(header.duration_seconds, 3);
        assert_eq!(header.origin, Position::new(1.0, 2.0, 3.0));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), frames);
        assert_eq!(queue.dropped_bytes(), 0);
    }

    #[test]
    fn test_partial_tail_is_dropped() {
        let frames = vec![SampleFrame::NEUTRAL.with_button(DigitalButton::Y, true); 3];
        for r in 1..FRAME_LEN {
            let tail = vec![0x55; r];
            let mut source = Cursor::new(log_bytes(&frames, &tail));
            let (_, queue) = PlaybackQueue::load(&mut source).unwrap();
            assert_eq!(queue.len(), 3);
            assert_eq!(queue.dropped_bytes(), r);
        }
    }

    #[test]
    fn test_small_reads_reassemble_frames() {
        let frames: Vec<_> = (0..600)
            .map(|i| SampleFrame::new([(i % 100) as i8, 0, 0, 0], [1; 12]))
            .collect();
        let mut source = Trickle {
            inner: Cursor::new(log_bytes(&frames, &[7, 7])),
            step: 7,
        };

        let (_, queue) = PlaybackQueue::load(&mut source).unwrap();
        assert_eq!(queue.len(), 600);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), frames);
        assert_eq!(queue.dropped_bytes(), 2);
    }

    #[test]
    fn test_header_only_log_is_empty() {
        let mut source = Cursor::new(log_bytes(&[], &[]));
        let (_, queue) = PlaybackQueue::load(&mut source).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_short_header_fails() {
        let mut source = Cursor::new(vec![1u8; 10]);
        let err = PlaybackQueue::load(&mut source).unwrap_err();
        assert!(matches!(
            err,
            EncoreError::TruncatedInput {
                expected: HEADER_LEN,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_pop_is_fifo() {
        let mut queue: PlaybackQueue = [1i8, 2, 3]
            .iter()
            .map(|&v| SampleFrame::new([v, 0, 0, 0], [0; 12]))
            .collect();
        assert_eq!(queue.pop().map(|f| f.axes[0]), Some(1));
        assert_eq!(queue.pop().map(|f| f.axes[0]), Some(2));
        queue.clear();
        assert!(queue.pop().is_none());
    }
}
