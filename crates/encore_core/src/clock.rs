//! Time sources for the fixed-rate loops.
//!
//! Loops never call `Instant::now` or `thread::sleep` directly. They go
//! through a [`Clock`] so tests can drive them with a [`VirtualClock`] and
//! never wait on the wall clock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic millisecond clock with an absolute-deadline sleep.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed epoch.
    fn now_millis(&self) -> u64;

    /// Block until `now_millis() >= deadline_ms`. Returns immediately if
    /// the deadline has already passed.
    fn sleep_until(&self, deadline_ms: u64);
}

/// Wall clock backed by [`Instant`].
#[derive(Clone, Debug)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn sleep_until(&self, deadline_ms: u64) {
        let target = self.epoch + Duration::from_millis(deadline_ms);
        let now = Instant::now();
        if target > now {
            std::thread::sleep(target - now);
        }
    }
}

#[derive(Debug, Default)]
struct VirtualState {
    now: u64,
    wakes: Vec<u64>,
}

/// A manually driven clock for deterministic loop tests.
///
/// `sleep_until` jumps time forward to the deadline instead of blocking,
/// and remembers every deadline it was asked for. Clones share the same
/// timeline.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualClock {
    /// Create a clock reading `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(VirtualState {
                now: start_ms,
                wakes: Vec::new(),
            })),
        }
    }

    /// Move time forward, simulating work done inside a tick.
    pub fn advance(&self, millis: u64) {
        self.state.lock().now += millis;
    }

    /// Every deadline passed to `sleep_until`, in call order.
    pub fn wakes(&self) -> Vec<u64> {
        self.state.lock().wakes.clone()
    }
}

impl Clock for VirtualClock {
    fn now_millis(&self) -> u64 {
        self.state.lock().now
    }

    fn sleep_until(&self, deadline_ms: u64) {
        let mut state = self.state.lock();
        state.wakes.push(deadline_ms);
        // An overrun tick leaves time where it is; the next tick simply runs late
        state.now = state.now.max(deadline_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_clock_jumps_to_deadline() {
        let clock = VirtualClock::new(100);
        clock.sleep_until(105);
        assert_eq!(clock.now_millis(), 105);
        assert_eq!(clock.wakes(), vec![105]);
    }

    #[test]
    fn test_virtual_clock_never_runs_backwards() {
        let clock = VirtualClock::new(0);
        clock.advance(12);
        clock.sleep_until(10);
        assert_eq!(clock.now_millis(), 12);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = VirtualClock::new(0);
        let other = clock.clone();
        other.advance(7);
        assert_eq!(clock.now_millis(), 7);
    }

    #[test]
    fn test_system_clock_sleeps_to_deadline() {
        let clock = SystemClock::new();
        let deadline = clock.now_millis() + 3;
        clock.sleep_until(deadline);
        assert!(clock.now_millis() >= deadline);
    }
}
