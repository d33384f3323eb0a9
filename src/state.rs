//! Shared application state for the mounted API handlers.
//!
//! Cheap to clone: the configuration sits behind an `Arc`, and the start
//! timestamp is `Copy`. The admission pipeline itself does not read this -
//! its only shared state is the rate limiter, which is threaded through the
//! middleware explicitly.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration, immutable after startup.
    pub config: Arc<Config>,
    /// When the process started, for uptime reporting.
    started_at: Instant,
}

impl AppState {
    /// Create application state from loaded configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Seconds since the process started.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_cheap_to_clone() {
        let state = AppState::default();
        let clone = state.clone();
        assert!(Arc::ptr_eq(&state.config, &clone.config));
    }

    #[test]
    fn test_uptime_starts_near_zero() {
        let state = AppState::default();
        assert!(state.uptime_seconds() < 5);
    }
}
