//! Session management: the entry points the rest of the robot program
//! calls.
//!
//! At most one session, recording or playback, runs at a time because both
//! stand in for the same physical controller. Each session owns its own
//! [`StopToken`], buffer, and file handle, and runs on its own thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use encore_core::{
    Clock, Diagnostics, EncoreConfig, EncoreError, InputSource, Position, PositionSource, Result,
    SessionHeader, SessionKind, Storage,
};
use parking_lot::{Condvar, Mutex};

use crate::controller::VirtualController;
use crate::queue::{read_header, PlaybackQueue};
use crate::recorder::{Recorder, RecorderState, RecordingSummary};
use crate::replay::{PlaybackSummary, ReplayState, Replayer};
use crate::stop::StopToken;

const REC_NO_STORAGE: &str = "REC FAILED: NO USD (ENXIO)";
const REC_NO_CONTROLLER: &str = "REC FAILED: NO CONTROLLER (ENXIO)";
const REC_BAD_SINK: &str = "REC FAILED: BAD OFSTREAM (EIO)";
const PLAYBACK_NO_STORAGE: &str = "PLAYBACK FAILED: NO SD (ENXIO)";
const PLAYBACK_BAD_SOURCE: &str = "PLAYBACK FAILED: BAD IFSTREAM (EIO)";

enum Progress<T> {
    Running,
    Done(T),
    Panicked,
}

/// Where a session thread leaves its result. Every caller that stops or
/// waits on the session reads the same copy.
struct Outcome<T> {
    progress: Mutex<Progress<T>>,
    cond: Condvar,
}

impl<T> Outcome<T> {
    fn new() -> Self {
        Self {
            progress: Mutex::new(Progress::Running),
            cond: Condvar::new(),
        }
    }

    fn is_finished(&self) -> bool {
        !matches!(*self.progress.lock(), Progress::Running)
    }

    fn publish(&self, value: T) {
        *self.progress.lock() = Progress::Done(value);
        self.cond.notify_all();
    }

    /// Mark a thread that never published as panicked.
    fn abandon(&self) {
        let mut progress = self.progress.lock();
        if matches!(*progress, Progress::Running) {
            *progress = Progress::Panicked;
            self.cond.notify_all();
        }
    }
}

impl<T: Clone> Outcome<T> {
    /// Block until the thread finishes. `None` if it panicked.
    fn wait(&self) -> Option<T> {
        let mut progress = self.progress.lock();
        while matches!(*progress, Progress::Running) {
            self.cond.wait(&mut progress);
        }
        match &*progress {
            Progress::Done(value) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Abandons its [`Outcome`] if the session thread unwinds.
struct OutcomeGuard<T>(Arc<Outcome<T>>);

impl<T> Drop for OutcomeGuard<T> {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

struct Task<T> {
    id: u64,
    stop: StopToken,
    outcome: Arc<Outcome<T>>,
    thread: JoinHandle<()>,
}

enum Active {
    Recording(Task<Result<RecordingSummary>>),
    Playback(Task<PlaybackSummary>),
}

impl Active {
    fn kind(&self) -> SessionKind {
        match self {
            Active::Recording(_) => SessionKind::Recording,
            Active::Playback(_) => SessionKind::Playback,
        }
    }

    fn id(&self) -> u64 {
        match self {
            Active::Recording(task) => task.id,
            Active::Playback(task) => task.id,
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            Active::Recording(task) => task.outcome.is_finished(),
            Active::Playback(task) => task.outcome.is_finished(),
        }
    }

    fn join(self) {
        let thread = match self {
            Active::Recording(task) => task.thread,
            Active::Playback(task) => task.thread,
        };
        if thread.join().is_err() {
            tracing::warn!("Session thread panicked after finishing");
        }
    }
}

/// Owns the injected devices and the single active session.
pub struct SessionManager {
    config: EncoreConfig,
    storage: Arc<dyn Storage>,
    input: Arc<dyn InputSource>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
    active: Mutex<Option<Active>>,
    next_id: AtomicU64,
    recording_state: Mutex<RecorderState>,
    replay_state: Mutex<ReplayState>,
}

impl SessionManager {
    pub fn new(
        config: EncoreConfig,
        storage: Arc<dyn Storage>,
        input: Arc<dyn InputSource>,
        clock: Arc<dyn Clock>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            config,
            storage,
            input,
            clock,
            diagnostics,
            active: Mutex::new(None),
            next_id: AtomicU64::new(0),
            recording_state: Mutex::new(RecorderState::Idle),
            replay_state: Mutex::new(ReplayState::Idle),
        }
    }

    pub fn config(&self) -> &EncoreConfig {
        &self.config
    }

    /// The session currently running, if any. A session that has ended on
    /// its own but not yet been stopped or waited on is not reported.
    pub fn active_session(&self) -> Option<SessionKind> {
        self.active
            .lock()
            .as_ref()
            .filter(|active| !active.is_finished())
            .map(Active::kind)
    }

    pub fn recording_state(&self) -> RecorderState {
        match self.active.lock().as_ref() {
            Some(Active::Recording(task)) if task.outcome.is_finished() => RecorderState::Stopped,
            Some(Active::Recording(_)) => RecorderState::Recording,
            _ => *self.recording_state.lock(),
        }
    }

    pub fn replay_state(&self) -> ReplayState {
        match self.active.lock().as_ref() {
            Some(Active::Playback(task)) if task.outcome.is_finished() => ReplayState::Stopped,
            Some(Active::Playback(_)) => ReplayState::Playing,
            _ => *self.replay_state.lock(),
        }
    }

    /// Start recording the live controller to `name` for
    /// `duration_seconds`.
    ///
    /// The header is written before this returns. `position` stamps the
    /// header's origin; without one the origin is zero. Precondition
    /// failures are reported through the diagnostics surface and no
    /// session is started.
    pub fn start_recording(
        &self,
        name: &str,
        duration_seconds: u8,
        position: Option<&dyn PositionSource>,
    ) -> Result<()> {
        let mut active = self.active.lock();
        self.reap_finished(&mut active)?;

        if !self.storage.is_present() {
            return Err(self.fail(REC_NO_STORAGE, EncoreError::StorageUnavailable));
        }
        if !self.input.is_connected() {
            return Err(self.fail(REC_NO_CONTROLLER, EncoreError::DeviceUnavailable));
        }

        let path = self.config.log_path(name);
        let sink = self.storage.create(&path).map_err(|e| {
            self.fail(
                REC_BAD_SINK,
                EncoreError::SinkOpenFailed(format!("{}: {}", path.display(), e)),
            )
        })?;

        let origin = position.map_or(Position::ORIGIN, |source| source.position());
        let header = SessionHeader::new(duration_seconds, origin);
        let stop = StopToken::new();

        let recorder = Recorder::begin(
            self.config.clone(),
            self.clock.clone(),
            self.input.clone(),
            sink,
            header,
            stop.clone(),
        )
        .map_err(|e| self.fail(REC_BAD_SINK, e))?;

        let outcome = Arc::new(Outcome::new());
        let guard = OutcomeGuard(outcome.clone());
        let diagnostics = self.diagnostics.clone();
        let thread = thread::Builder::new()
            .name("encore-recorder".to_string())
            .spawn(move || {
                let guard = guard;
                let result = recorder.run();
                if result.is_err() {
                    diagnostics.report(REC_BAD_SINK);
                }
                guard.0.publish(result);
            })
            .map_err(|e| EncoreError::Spawn(SessionKind::Recording, e.to_string()))?;

        tracing::info!(
            "Recording '{}' for {}s from ({}, {}, {})",
            name,
            duration_seconds,
            origin.x,
            origin.y,
            origin.heading
        );

        *active = Some(Active::Recording(Task {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            stop,
            outcome,
            thread,
        }));
        *self.recording_state.lock() = RecorderState::Recording;
        Ok(())
    }

    /// Stop the active recording and wait for its final write.
    ///
    /// Returns `None` when no recording is active, so repeated calls are
    /// harmless.
    pub fn stop_recording(&self) -> Option<Result<RecordingSummary>> {
        self.finish_recording(true)
    }

    /// Wait for the active recording to reach its duration.
    ///
    /// The recording stays active while this blocks: a second start is
    /// still refused and [`stop_recording`](Self::stop_recording) from
    /// another thread still reaches it. Every caller blocked on the same
    /// session receives the same result.
    pub fn wait_recording(&self) -> Option<Result<RecordingSummary>> {
        self.finish_recording(false)
    }

    /// Read the origin stored in the header of `name` without starting a
    /// session.
    pub fn get_position(&self, name: &str) -> Result<Position> {
        tracing::debug!("Reading position data from '{}'", name);

        if !self.storage.is_present() {
            return Err(self.fail(PLAYBACK_NO_STORAGE, EncoreError::StorageUnavailable));
        }

        let path = self.config.log_path(name);
        let mut source = self.storage.open(&path).map_err(|e| {
            self.fail(
                PLAYBACK_BAD_SOURCE,
                EncoreError::SourceOpenFailed(format!("{}: {}", path.display(), e)),
            )
        })?;

        let header = read_header(&mut source).map_err(|e| self.fail(PLAYBACK_BAD_SOURCE, e))?;
        Ok(header.origin)
    }

    /// Load `name` and start replaying it.
    ///
    /// The whole log is decoded before the returned controller is handed
    /// out. The controller goes neutral and inactive when playback ends.
    pub fn begin_playback(&self, name: &str) -> Result<VirtualController> {
        let mut active = self.active.lock();
        self.reap_finished(&mut active)?;

        if !self.storage.is_present() {
            return Err(self.fail(PLAYBACK_NO_STORAGE, EncoreError::StorageUnavailable));
        }

        let path = self.config.log_path(name);
        let mut source = self.storage.open(&path).map_err(|e| {
            self.fail(
                PLAYBACK_BAD_SOURCE,
                EncoreError::SourceOpenFailed(format!("{}: {}", path.display(), e)),
            )
        })?;

        let (header, queue) =
            PlaybackQueue::load(&mut source).map_err(|e| self.fail(PLAYBACK_BAD_SOURCE, e))?;
        drop(source);

        if queue.is_empty() {
            return Err(self.fail(
                PLAYBACK_BAD_SOURCE,
                EncoreError::EmptyLog(path.display().to_string()),
            ));
        }

        tracing::info!(
            "Playing '{}': {} frames recorded over {}s",
            name,
            queue.len(),
            header.duration_seconds
        );

        let controller = VirtualController::new();
        let stop = StopToken::new();
        let replayer = Replayer::new(
            self.config.clone(),
            self.clock.clone(),
            header,
            queue,
            controller.clone(),
            stop.clone(),
        );

        let outcome = Arc::new(Outcome::new());
        let guard = OutcomeGuard(outcome.clone());
        let thread = thread::Builder::new()
            .name("encore-playback".to_string())
            .spawn(move || {
                let guard = guard;
                guard.0.publish(replayer.run());
            })
            .map_err(|e| EncoreError::Spawn(SessionKind::Playback, e.to_string()))?;

        *active = Some(Active::Playback(Task {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            stop,
            outcome,
            thread,
        }));
        *self.replay_state.lock() = ReplayState::Playing;
        Ok(controller)
    }

    /// Stop the active playback and wait for the controller to be reset.
    ///
    /// Returns `None` when no playback is active.
    pub fn stop_playback(&self) -> Option<Result<PlaybackSummary>> {
        self.finish_playback(true)
    }

    /// Wait for the active playback to run out of frames. The playback
    /// stays active while this blocks.
    pub fn wait_playback(&self) -> Option<Result<PlaybackSummary>> {
        self.finish_playback(false)
    }

    fn finish_recording(&self, request_stop: bool) -> Option<Result<RecordingSummary>> {
        let (id, outcome) = {
            let active = self.active.lock();
            let Some(Active::Recording(task)) = active.as_ref() else {
                return None;
            };
            if request_stop {
                task.stop.request();
            }
            (task.id, task.outcome.clone())
        };

        // The slot keeps the session until its thread is done
        let result = outcome
            .wait()
            .unwrap_or(Err(EncoreError::Panicked(SessionKind::Recording)));
        self.retire(id);
        *self.recording_state.lock() = RecorderState::Stopped;
        Some(result)
    }

    fn finish_playback(&self, request_stop: bool) -> Option<Result<PlaybackSummary>> {
        let (id, outcome) = {
            let active = self.active.lock();
            let Some(Active::Playback(task)) = active.as_ref() else {
                return None;
            };
            if request_stop {
                task.stop.request();
            }
            (task.id, task.outcome.clone())
        };

        let result = outcome
            .wait()
            .ok_or(EncoreError::Panicked(SessionKind::Playback));
        self.retire(id);
        *self.replay_state.lock() = ReplayState::Stopped;
        Some(result)
    }

    /// Vacate the slot if it still holds session `id`. Another caller may
    /// already have cleared it.
    fn retire(&self, id: u64) {
        let finished = {
            let mut active = self.active.lock();
            if active.as_ref().map(Active::id) == Some(id) {
                active.take()
            } else {
                None
            }
        };
        if let Some(finished) = finished {
            finished.join();
        }
    }

    /// Clear a session that ended on its own, or refuse if one is running.
    fn reap_finished(&self, active: &mut Option<Active>) -> Result<()> {
        let Some(previous) = active.take() else {
            return Ok(());
        };
        if !previous.is_finished() {
            let kind = previous.kind();
            *active = Some(previous);
            tracing::warn!("Refusing to start a session while {} is active", kind);
            return Err(EncoreError::SessionActive(kind));
        }

        match &previous {
            Active::Recording(task) => {
                match task.outcome.wait() {
                    Some(Ok(_)) => {}
                    // A failed write was reported from the recording thread
                    Some(Err(e)) => {
                        tracing::warn!("Previous recording ended with an error: {}", e);
                    }
                    None => {
                        self.diagnostics.report(REC_BAD_SINK);
                        tracing::warn!("Previous recording thread panicked");
                    }
                }
                *self.recording_state.lock() = RecorderState::Stopped;
            }
            Active::Playback(task) => {
                if task.outcome.wait().is_none() {
                    tracing::warn!("Previous playback thread panicked");
                }
                *self.replay_state.lock() = ReplayState::Stopped;
            }
        }
        previous.join();
        Ok(())
    }

    fn fail(&self, message: &str, error: EncoreError) -> EncoreError {
        self.diagnostics.report(message);
        tracing::debug!("Session not started: {}", error);
        error
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop_recording();
        self.stop_playback();
    }
}
