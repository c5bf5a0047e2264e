//! Fixed-rate playback loop.

use std::sync::Arc;

use encore_core::{Clock, EncoreConfig, SessionHeader};

use crate::controller::VirtualController;
use crate::queue::PlaybackQueue;
use crate::recorder::EndReason;
use crate::stop::StopToken;

/// Lifecycle of a playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayState {
    Idle,
    Playing,
    Stopped,
}

/// What a finished playback did.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSummary {
    pub header: SessionHeader,
    /// Frames applied to the controller.
    pub frames: u64,
    pub reason: EndReason,
}

/// Feeds one recorded frame per tick into a [`VirtualController`].
///
/// Playback length comes from the number of frames, not from the header's
/// duration.
pub struct Replayer {
    config: EncoreConfig,
    clock: Arc<dyn Clock>,
    header: SessionHeader,
    queue: PlaybackQueue,
    controller: VirtualController,
    stop: StopToken,
}

impl Replayer {
    pub fn new(
        config: EncoreConfig,
        clock: Arc<dyn Clock>,
        header: SessionHeader,
        queue: PlaybackQueue,
        controller: VirtualController,
        stop: StopToken,
    ) -> Self {
        Self {
            config,
            clock,
            header,
            queue,
            controller,
            stop,
        }
    }

    /// Replay until the queue is exhausted or a stop is requested, then
    /// return the controller to neutral and release it.
    pub fn run(mut self) -> PlaybackSummary {
        let period = self.config.period();
        let mut wake = self.clock.now_millis();
        let mut frames = 0;

        tracing::debug!("Playback loop started with {} frames", self.queue.len());

        let reason = loop {
            if self.stop.is_requested() {
                break EndReason::Stopped;
            }
            let Some(frame) = self.queue.pop() else {
                break EndReason::Exhausted;
            };

            self.controller.advance(frame);
            frames += 1;

            wake += period;
            self.clock.sleep_until(wake);
        };

        self.controller.release();
        self.queue.clear();

        tracing::info!("Playback finished ({:?}) after {} frames", reason, frames);

        PlaybackSummary {
            header: self.header,
            frames,
            reason,
        }
    }
}
