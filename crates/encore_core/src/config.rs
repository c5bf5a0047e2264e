//! Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Timing and storage settings shared by recording and playback.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct EncoreConfig {
    /// Tick period of both loops, in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    /// How often buffered frames are written out while recording.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Directory logs are stored under.
    #[serde(default = "default_mount_point")]
    pub mount_point: PathBuf,
    /// File extension appended to every log name.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_period_ms() -> u64 {
    5
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_mount_point() -> PathBuf {
    PathBuf::from("/usd")
}

fn default_extension() -> String {
    "vrf".to_string()
}

impl Default for EncoreConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            flush_interval_ms: default_flush_interval_ms(),
            mount_point: default_mount_point(),
            extension: default_extension(),
        }
    }
}

impl EncoreConfig {
    /// Set the tick period.
    pub fn with_period_ms(mut self, period_ms: u64) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Set the flush interval.
    pub fn with_flush_interval_ms(mut self, flush_interval_ms: u64) -> Self {
        self.flush_interval_ms = flush_interval_ms;
        self
    }

    /// Set the storage mount point.
    pub fn with_mount_point(mut self, mount_point: impl Into<PathBuf>) -> Self {
        self.mount_point = mount_point.into();
        self
    }

    /// Tick period, never zero.
    pub fn period(&self) -> u64 {
        self.period_ms.max(1)
    }

    /// Flush interval rounded down to a whole number of ticks.
    pub fn flush_span(&self) -> u64 {
        let period = self.period();
        period * (self.flush_interval_ms / period).max(1)
    }

    /// Where the log called `name` lives.
    pub fn log_path(&self, name: &str) -> PathBuf {
        self.mount_point.join(format!("{}.{}", name, self.extension))
    }
}
