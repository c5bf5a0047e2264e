//! Offline inspection of log files: `encore info` and `encore dump`

use anyhow::{Context, Result};
use encore_core::{
    decode_frames, AnalogChannel, DigitalButton, SampleFrame, SessionHeader, HEADER_LEN,
};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Everything decoded from one log file.
#[derive(Debug)]
pub struct LogReport {
    pub header: SessionHeader,
    pub frames: Vec<SampleFrame>,
    /// Trailing bytes that did not make up a whole frame
    pub dropped_bytes: usize,
}

impl LogReport {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = SessionHeader::decode(bytes).context("Log is too short for a header")?;
        let (frames, dropped_bytes) = decode_frames(&bytes[HEADER_LEN..]);
        Ok(Self {
            header,
            frames,
            dropped_bytes,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_bytes(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
    }

    /// Length of the playback at `period_ms` per frame
    pub fn playback_seconds(&self, period_ms: u64) -> f64 {
        (self.frames.len() as u64 * period_ms) as f64 / 1000.0
    }
}

/// Human-readable summary for `encore info`
pub fn format_info(path: &Path, report: &LogReport, period_ms: u64) -> String {
    let origin = report.header.origin;
    let mut out = String::new();
    out.push_str(&format!("file:      {}\n", path.display()));
    out.push_str(&format!(
        "duration:  {}s requested\n",
        report.header.duration_seconds
    ));
    out.push_str(&format!(
        "origin:    x={} y={} heading={}\n",
        origin.x, origin.y, origin.heading
    ));
    out.push_str(&format!(
        "frames:    {} ({:.2}s at {}ms)\n",
        report.frames.len(),
        report.playback_seconds(period_ms),
        period_ms
    ));
    if report.dropped_bytes > 0 {
        out.push_str(&format!(
            "truncated: {} trailing bytes ignored\n",
            report.dropped_bytes
        ));
    }
    out
}

/// One line per frame: axes, then the names of held buttons
pub fn format_frame(index: usize, frame: &SampleFrame) -> String {
    let axes: Vec<String> = AnalogChannel::ALL
        .iter()
        .map(|ch| format!("{}={:>4}", ch.name(), frame.axis(*ch)))
        .collect();
    let held: Vec<&str> = DigitalButton::ALL
        .iter()
        .filter(|b| frame.is_pressed(**b))
        .map(|b| b.name())
        .collect();
    format!("{:>6}  {}  [{}]", index, axes.join(" "), held.join(" "))
}

#[derive(Serialize)]
struct DumpLine<'a> {
    index: usize,
    #[serde(flatten)]
    frame: &'a SampleFrame,
}

/// Frame listing for `encore dump`
pub fn format_dump(report: &LogReport, limit: Option<usize>, json: bool) -> Result<String> {
    let count = limit.unwrap_or(report.frames.len());
    let mut out = String::new();
    for (index, frame) in report.frames.iter().take(count).enumerate() {
        if json {
            out.push_str(&serde_json::to_string(&DumpLine { index, frame })?);
        } else {
            out.push_str(&format_frame(index, frame));
        }
        out.push('\n');
    }
    Ok(out)
}
