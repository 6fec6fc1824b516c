//! Engine configuration.
//!
//! Thresholds and timeouts the engine runs with. The embedding application
//! decides where these come from; `EngineConfig` deserializes from any serde
//! format and falls back to the defaults below for missing fields.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::conflict::{ConflictThresholds, MAX_FLIGHTS_PER_RUN, MIN_GAP_MINUTES_TIGHT};

/// Default timeout for optional overlay fetches (ms).
pub const DEFAULT_OVERLAY_TIMEOUT_MS: u64 = 8_000;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Flights a run may hold before it is overloaded.
    pub max_flights_per_run: usize,
    /// Gaps below this many minutes are tight connections.
    pub min_gap_minutes_tight: i64,
    /// Timeout for optional overlay fetches (ms).
    pub overlay_timeout_ms: u64,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the run capacity.
    pub fn with_max_flights_per_run(mut self, max: usize) -> Self {
        self.max_flights_per_run = max;
        self
    }

    /// Sets the tight-connection gap.
    pub fn with_min_gap_minutes(mut self, minutes: i64) -> Self {
        self.min_gap_minutes_tight = minutes;
        self
    }

    /// Sets the overlay fetch timeout.
    pub fn with_overlay_timeout(mut self, timeout: Duration) -> Self {
        self.overlay_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Overlay fetch timeout.
    pub fn overlay_timeout(&self) -> Duration {
        Duration::from_millis(self.overlay_timeout_ms)
    }

    /// Conflict thresholds for the analyzer.
    pub fn thresholds(&self) -> ConflictThresholds {
        ConflictThresholds {
            max_flights_per_run: self.max_flights_per_run,
            min_gap_minutes_tight: self.min_gap_minutes_tight,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_flights_per_run: MAX_FLIGHTS_PER_RUN,
            min_gap_minutes_tight: MIN_GAP_MINUTES_TIGHT,
            overlay_timeout_ms: DEFAULT_OVERLAY_TIMEOUT_MS,
        }
    }
}
