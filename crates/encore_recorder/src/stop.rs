//! Cooperative cancellation for the session loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stop request shared between a running loop and whoever owns it.
///
/// The loop only looks at the token at tick boundaries, so a tick that has
/// already started always completes.
#[derive(Clone, Debug, Default)]
pub struct StopToken {
    requested: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_request() {
        let token = StopToken::new();
        let loop_side = token.clone();
        assert!(!loop_side.is_requested());

        token.request();
        token.request();
        assert!(loop_side.is_requested());
    }
}
