//! Desktop replay: `encore replay` and `encore position`
//!
//! Drives the same [`SessionManager`] the robot program uses, backed by the
//! local filesystem and the system clock. No live controller is attached,
//! so recording is never possible from here.

use anyhow::{Context, Result};
use encore_core::{
    AnalogChannel, DigitalButton, FsStorage, InputSource, Position, SampleFrame, SystemClock,
    TracingDiagnostics,
};
use encore_recorder::{PlaybackSummary, SessionManager, VirtualController};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::CliConfig;

/// A controller port with nothing plugged in.
struct Unplugged;

impl InputSource for Unplugged {
    fn is_connected(&self) -> bool {
        false
    }

    fn analog(&self, _channel: AnalogChannel) -> i32 {
        0
    }

    fn digital(&self, _button: DigitalButton) -> i32 {
        0
    }
}

pub fn manager(config: &CliConfig) -> SessionManager {
    SessionManager::new(
        config.engine.clone(),
        Arc::new(FsStorage::new(config.engine.mount_point.clone())),
        Arc::new(Unplugged),
        Arc::new(SystemClock::new()),
        Arc::new(TracingDiagnostics),
    )
}

/// Resolve the configured watch list, skipping names that are not buttons.
pub fn watched_buttons(names: &[String]) -> Vec<DigitalButton> {
    names
        .iter()
        .filter_map(|name| {
            let button = DigitalButton::from_name(name);
            if button.is_none() {
                tracing::warn!("Ignoring unknown button '{}' in watch list", name);
            }
            button
        })
        .collect()
}

/// Buttons in `watch` that are held in `now` but were not in `before`.
pub fn pressed_since(
    before: &SampleFrame,
    now: &SampleFrame,
    watch: &[DigitalButton],
) -> Vec<DigitalButton> {
    watch
        .iter()
        .copied()
        .filter(|b| now.is_pressed(*b) && !before.is_pressed(*b))
        .collect()
}

pub fn position(config: &CliConfig, name: &str) -> Result<Position> {
    manager(config)
        .get_position(name)
        .with_context(|| format!("Could not read the origin of '{}'", name))
}

/// Play `name` back in real time, logging watched presses as they happen.
pub fn replay(config: &CliConfig, name: &str) -> Result<PlaybackSummary> {
    let manager = manager(config);
    let watch = watched_buttons(&config.replay.watch);

    let controller = manager
        .begin_playback(name)
        .with_context(|| format!("Could not start playback of '{}'", name))?;

    observe(&controller, &watch, Duration::from_millis(config.engine.period()));

    manager
        .wait_playback()
        .context("Playback was not running")?
        .context("Playback failed")
}

fn observe(controller: &VirtualController, watch: &[DigitalButton], period: Duration) {
    let mut last = controller.snapshot();
    // Poll twice per tick so no frame goes unseen
    let interval = period / 2;

    while controller.is_active() {
        let now = controller.snapshot();
        for button in pressed_since(&last, &now, watch) {
            tracing::info!("{} pressed", button);
        }
        last = now;
        thread::sleep(interval);
    }
}
