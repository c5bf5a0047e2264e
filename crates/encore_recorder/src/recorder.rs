//! Fixed-rate capture loop.

use std::sync::Arc;

use encore_core::{
    sample_frame, Clock, EncoreConfig, EncoreError, InputSource, LogSink, Result, SessionHeader,
};

use crate::buffer::CaptureBuffer;
use crate::stop::StopToken;

/// Why a session loop exited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The recording reached its requested duration.
    Elapsed,
    /// A stop was requested from outside the loop.
    Stopped,
    /// Playback ran out of frames.
    Exhausted,
}

/// Lifecycle of a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
}

/// What a finished recording produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordingSummary {
    pub header: SessionHeader,
    /// Frames sampled and written.
    pub frames: u64,
    /// Batched writes, including the final one on exit.
    pub flushes: u32,
    /// Bytes written after the header.
    pub bytes_written: u64,
    pub reason: EndReason,
}

/// Samples an input source every tick and streams frames to a log.
///
/// Frames collect in a [`CaptureBuffer`] and are written in one batch per
/// flush interval, so the sink sees roughly one write a second instead of
/// one per tick.
pub struct Recorder {
    config: EncoreConfig,
    clock: Arc<dyn Clock>,
    input: Arc<dyn InputSource>,
    sink: LogSink,
    buffer: CaptureBuffer,
    header: SessionHeader,
    stop: StopToken,
    frames: u64,
    flushes: u32,
    bytes_written: u64,
}

impl Recorder {
    /// Write the session header to `sink` and get ready to record.
    pub fn begin(
        config: EncoreConfig,
        clock: Arc<dyn Clock>,
        input: Arc<dyn InputSource>,
        mut sink: LogSink,
        header: SessionHeader,
        stop: StopToken,
    ) -> Result<Self> {
        sink.write_all(&header.encode())
            .map_err(|e| EncoreError::SinkWriteFailed(e.to_string()))?;

        let ticks_per_flush = (config.flush_span() / config.period()) as usize;

        Ok(Self {
            config,
            clock,
            input,
            sink,
            buffer: CaptureBuffer::with_capacity(ticks_per_flush + 1),
            header,
            stop,
            frames: 0,
            flushes: 0,
            bytes_written: 0,
        })
    }

    /// Run until the duration elapses or a stop is requested, then write
    /// out whatever is buffered and close the sink.
    ///
    /// Wake times are `start + n * period`, so a slow tick delays the next
    /// one but never shifts the schedule. A failed write ends the session
    /// immediately with [`EncoreError::SinkWriteFailed`].
    pub fn run(mut self) -> Result<RecordingSummary> {
        let period = self.config.period();
        let flush_span = self.config.flush_span();

        let start = self.clock.now_millis();
        let end = start + u64::from(self.header.duration_seconds) * 1000;
        let mut wake = start;
        let mut flush_deadline = start + flush_span;

        tracing::debug!("Recording loop started at {}ms, ends at {}ms", start, end);

        let reason = loop {
            if self.stop.is_requested() {
                break EndReason::Stopped;
            }

            self.buffer.append(sample_frame(self.input.as_ref()));
            self.frames += 1;

            let now = self.clock.now_millis();
            if now >= end {
                break EndReason::Elapsed;
            }

            if now > flush_deadline {
                self.flush()?;
                flush_deadline += flush_span;
            }

            wake += period;
            self.clock.sleep_until(wake);
        };

        self.flush()?;

        tracing::info!(
            "Recording finished ({:?}): {} frames in {} writes",
            reason,
            self.frames,
            self.flushes
        );

        Ok(RecordingSummary {
            header: self.header,
            frames: self.frames,
            flushes: self.flushes,
            bytes_written: self.bytes_written,
            reason,
        })
    }

    fn flush(&mut self) -> Result<()> {
        let pending = self.buffer.len();
        match self.buffer.flush_to(&mut self.sink) {
            Ok(written) => {
                self.flushes += 1;
                self.bytes_written += written as u64;
                tracing::debug!("Flushed {} frames ({} bytes)", pending, written);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Recording aborted, write failed: {}", e);
                Err(EncoreError::SinkWriteFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::{
        decode_frames, AnalogChannel, DigitalButton, MemoryStorage, Position, Storage,
        VirtualClock, FRAME_LEN, HEADER_LEN,
    };
    use parking_lot::Mutex;
    use std::path::Path;

    /// Counts samples and can burn virtual time or request a stop.
    struct ScriptedInput {
        clock: VirtualClock,
        work_ms: u64,
        stop_after: Option<(u64, StopToken)>,
        samples: Mutex<u64>,
    }

    impl ScriptedInput {
        fn new(clock: &VirtualClock) -> Self {
            Self {
                clock: clock.clone(),
                work_ms: 0,
                stop_after: None,
                samples: Mutex::new(0),
            }
        }
    }

    impl InputSource for ScriptedInput {
        fn is_connected(&self) -> bool {
            true
        }

        fn analog(&self, channel: AnalogChannel) -> i32 {
            if channel != AnalogChannel::RightX {
                return 0;
            }
            let mut samples = self.samples.lock();
            *samples += 1;
            self.clock.advance(self.work_ms);
            if let Some((n, token)) = &self.stop_after {
                if *samples == *n {
                    token.request();
                }
            }
            (*samples % 100) as i32
        }

        fn digital(&self, button: DigitalButton) -> i32 {
            (button == DigitalButton::A) as i32
        }
    }

    fn recorder(
        clock: &VirtualClock,
        input: ScriptedInput,
        storage: &MemoryStorage,
        duration: u8,
        stop: StopToken,
    ) -> Recorder {
        let sink = storage.create(Path::new("/usd/test.vrf")).unwrap();
        Recorder::begin(
            EncoreConfig::default(),
            Arc::new(clock.clone()),
            Arc::new(input),
            sink,
            SessionHeader::new(duration, Position::new(4.0, 5.0, 6.0)),
            stop,
        )
        .unwrap()
    }

    #[test]
    fn test_two_second_recording_frame_count() {
        let clock = VirtualClock::new(1_000);
        let storage = MemoryStorage::new();
        let rec = recorder(&clock, ScriptedInput::new(&clock), &storage, 2, StopToken::new());

        let summary = rec.run().unwrap();
        assert_eq!(summary.reason, EndReason::Elapsed);
        assert!((390..=410).contains(&summary.frames), "{}", summary.frames);
        // One frame per tick from 1000ms through 3000ms inclusive
        assert_eq!(summary.frames, 401);

        let bytes = storage.contents(Path::new("/usd/test.vrf")).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + FRAME_LEN * 401);
        assert_eq!(summary.bytes_written, (FRAME_LEN * 401) as u64);
    }

    #[test]
    fn test_flush_cadence() {
        let clock = VirtualClock::new(0);
        let storage = MemoryStorage::new();
        let rec = recorder(&clock, ScriptedInput::new(&clock), &storage, 3, StopToken::new());

        let summary = rec.run().unwrap();
        // Flushes at 1005ms and 2005ms, then the final one at exit
        assert_eq!(summary.flushes, 3);
        assert_eq!(summary.frames, 601);
    }

    #[test]
    fn test_schedule_does_not_drift() {
        let clock = VirtualClock::new(0);
        let storage = MemoryStorage::new();
        let mut input = ScriptedInput::new(&clock);
        input.work_ms = 2;
        let rec = recorder(&clock, input, &storage, 1, StopToken::new());

        let summary = rec.run().unwrap();
        assert_eq!(summary.frames, 201);

        let wakes = clock.wakes();
        for (i, wake) in wakes.iter().enumerate() {
            assert_eq!(*wake, (i as u64 + 1) * 5);
        }
    }

    #[test]
    fn test_overrun_runs_late_without_skipping() {
        let clock = VirtualClock::new(0);
        let storage = MemoryStorage::new();
        let mut input = ScriptedInput::new(&clock);
        input.work_ms = 7;
        let rec = recorder(&clock, input, &storage, 1, StopToken::new());

        let summary = rec.run().unwrap();
        // Every tick costs 7ms, so the loop falls behind but keeps every tick
        assert_eq!(summary.frames, 143);
        let wakes = clock.wakes();
        assert_eq!(wakes.len() as u64, summary.frames - 1);
        assert!(wakes.windows(2).all(|w| w[1] - w[0] == 5));
    }

    #[test]
    fn test_stop_is_seen_at_next_tick() {
        let clock = VirtualClock::new(0);
        let storage = MemoryStorage::new();
        let stop = StopToken::new();
        let mut input = ScriptedInput::new(&clock);
        input.stop_after = Some((10, stop.clone()));
        let rec = recorder(&clock, input, &storage, 60, stop);

        let summary = rec.run().unwrap();
        assert_eq!(summary.reason, EndReason::Stopped);
        // The tick that saw the request still completes
        assert_eq!(summary.frames, 10);

        let bytes = storage.contents(Path::new("/usd/test.vrf")).unwrap();
        let header = SessionHeader::decode(&bytes).unwrap();
        assert_eq!(header.duration_seconds, 60);
        let (frames, dropped) = decode_frames(&bytes[HEADER_LEN..]);
        assert_eq!(frames.len(), 10);
        assert_eq!(dropped, 0);
        assert_eq!(frames[0].axis(AnalogChannel::RightX), 1);
        assert_eq!(frames[9].axis(AnalogChannel::RightX), 10);
        assert!(frames.iter().all(|f| f.is_pressed(DigitalButton::A)));
    }

    #[test]
    fn test_zero_duration_captures_one_frame() {
        let clock = VirtualClock::new(0);
        let storage = MemoryStorage::new();
        let rec = recorder(&clock, ScriptedInput::new(&clock), &storage, 0, StopToken::new());

        let summary = rec.run().unwrap();
        assert_eq!(summary.frames, 1);
        assert!(clock.wakes().is_empty());
    }

    #[test]
    fn test_write_failure_aborts() {
        let clock = VirtualClock::new(0);
        let storage = MemoryStorage::new();
        storage.fail_writes_after(HEADER_LEN + FRAME_LEN * 10);
        let rec = recorder(&clock, ScriptedInput::new(&clock), &storage, 5, StopToken::new());

        let err = rec.run().unwrap_err();
        assert!(matches!(err, EncoreError::SinkWriteFailed(_)));
        // Aborted at the first flush rather than running the full five seconds
        assert!(clock.now_millis() < 1_100);
    }

    #[test]
    fn test_header_write_failure() {
        let clock = VirtualClock::new(0);
        let storage = MemoryStorage::new();
        storage.fail_writes_after(0);
        let sink = storage.create(Path::new("/usd/test.vrf")).unwrap();

        let result = Recorder::begin(
            EncoreConfig::default(),
            Arc::new(clock.clone()),
            Arc::new(ScriptedInput::new(&clock)),
            sink,
            SessionHeader::default(),
            StopToken::new(),
        );
        assert!(matches!(result, Err(EncoreError::SinkWriteFailed(_))));
    }
}
