//! Encore Core
//!
//! Shared building blocks for recording a driver's controller inputs and
//! replaying them later:
//!
//! - **Frame codec**: the fixed 25-byte session header and 16-byte sample
//!   frame that make up a `.vrf` log
//! - **Channels**: analog axes and digital buttons in wire order
//! - **Collaborators**: traits for the live controller, position sensor,
//!   clock, storage medium, and operator diagnostics
//! - **Configuration**: tick period, flush cadence, and storage layout
//!
//! The timing engine itself lives in `encore_recorder`.

pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod input;
pub mod storage;

pub use channel::{AnalogChannel, DigitalButton};
pub use clock::{Clock, SystemClock, VirtualClock};
pub use config::EncoreConfig;
pub use error::{EncoreError, Result, SessionKind};
pub use frame::{decode_frames, Position, SampleFrame, SessionHeader, FRAME_LEN, HEADER_LEN};
pub use input::{sample_frame, Diagnostics, InputSource, PositionSource, TracingDiagnostics};
pub use storage::{FsStorage, LogSink, LogSource, MemoryStorage, Storage};
