//! Encore Recorder
//!
//! Record a driver's controller once, replay it as many times as needed.
//!
//! - [`Recorder`] samples a live controller every tick (5ms by default)
//!   and streams frames to a log in one batched write per second.
//! - [`Replayer`] feeds those frames back at the same rate into a
//!   [`VirtualController`] that the robot program reads in place of the
//!   real one, including new-press edges.
//! - [`SessionManager`] wires both to the injected storage, controller,
//!   and clock, and enforces one session at a time.
//!
//! # Example
//!
//! ```ignore
//! use encore_recorder::SessionManager;
//! use encore_core::DigitalButton;
//!
//! manager.start_recording("skills", 60, Some(&gps))?;
//! // ... driver drives ...
//! manager.stop_recording();
//!
//! let controller = manager.begin_playback("skills")?;
//! while controller.is_active() {
//!     if controller.digital_new_press(DigitalButton::A) {
//!         // toggle intake
//!     }
//! }
//! ```
//!
//! Both loops expect to run at the highest scheduling priority the target
//! offers; each tick should finish well inside one period.

pub mod buffer;
pub mod controller;
pub mod queue;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod stop;

pub use buffer::CaptureBuffer;
pub use controller::VirtualController;
pub use queue::{read_header, PlaybackQueue};
pub use recorder::{EndReason, Recorder, RecorderState, RecordingSummary};
pub use replay::{PlaybackSummary, ReplayState, Replayer};
pub use session::SessionManager;
pub use stop::StopToken;
