//! Run conflict analysis.
//!
//! Derives the conflict signals shown on each run card from the run's
//! ordered flight list. Analysis is a pure function: no I/O, no shared
//! state, and the same ordered input always yields the same output.
//!
//! # Signals
//!
//! | Signal | Definition |
//! |--------|-----------|
//! | Overloaded | `flight_count > max_flights_per_run` |
//! | Tight connection | Adjacent flights (by resolved time) less than `min_gap_minutes_tight` apart |
//! | Has conflicts | Overloaded, or at least one tight connection |
//!
//! Flights without a resolvable time are excluded from gap comparisons and
//! can never be flagged tight.

use crate::models::time::minute_of_day;
use crate::models::{FlightRun, Run};

/// Default run capacity.
pub const MAX_FLIGHTS_PER_RUN: usize = 6;

/// Default minimum turnaround gap (minutes).
pub const MIN_GAP_MINUTES_TIGHT: i64 = 15;

/// Thresholds the analyzer compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictThresholds {
    /// Flights a run may hold before it is overloaded.
    pub max_flights_per_run: usize,
    /// Gaps strictly below this are tight.
    pub min_gap_minutes_tight: i64,
}

impl Default for ConflictThresholds {
    fn default() -> Self {
        Self {
            max_flights_per_run: MAX_FLIGHTS_PER_RUN,
            min_gap_minutes_tight: MIN_GAP_MINUTES_TIGHT,
        }
    }
}

/// Two flight runs in the same run that are too close together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TightConnection {
    /// Earlier flight run id.
    pub earlier: String,
    /// Later flight run id.
    pub later: String,
    /// Gap between them (minutes).
    pub gap_minutes: i64,
}

/// Conflict summary for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictInfo {
    /// Run holds more flights than its capacity.
    pub overloaded: bool,
    /// Adjacent pairs below the minimum gap, in time order.
    pub tight_connections: Vec<TightConnection>,
    /// `overloaded || !tight_connections.is_empty()`.
    pub has_conflicts: bool,
}

impl ConflictInfo {
    /// Whether a flight run takes part in any tight connection.
    pub fn is_tight(&self, flight_run_id: &str) -> bool {
        self.tight_connections
            .iter()
            .any(|c| c.earlier == flight_run_id || c.later == flight_run_id)
    }
}

/// Analyzes a run's ordered flight list.
///
/// # Algorithm
/// 1. Resolve each flight's time; drop unresolvable entries.
/// 2. Stable-sort by minute of day (equal times keep list order).
/// 3. Compare each adjacent pair; flag gaps below the threshold.
///
/// # Complexity
/// O(n log n) for n flights.
pub fn analyze(flight_runs: &[FlightRun], thresholds: &ConflictThresholds) -> ConflictInfo {
    let overloaded = flight_runs.len() > thresholds.max_flights_per_run;

    let mut timed: Vec<(i64, &FlightRun)> = flight_runs
        .iter()
        .filter_map(|fr| {
            fr.flight
                .resolved_time()
                .map(|t| (minute_of_day(t), fr))
        })
        .collect();
    timed.sort_by_key(|(minutes, _)| *minutes);

    let tight_connections: Vec<TightConnection> = timed
        .windows(2)
        .filter_map(|pair| {
            let (a_min, a) = pair[0];
            let (b_min, b) = pair[1];
            let gap = b_min - a_min;
            (gap < thresholds.min_gap_minutes_tight).then(|| TightConnection {
                earlier: a.id.clone(),
                later: b.id.clone(),
                gap_minutes: gap,
            })
        })
        .collect();

    let has_conflicts = overloaded || !tight_connections.is_empty();
    ConflictInfo {
        overloaded,
        tight_connections,
        has_conflicts,
    }
}

/// Re-derives a run's conflict summary and per-flight tight flags in place.
///
/// Callers invoke this after every change to the run's flight list.
pub fn decorate(run: &mut Run, thresholds: &ConflictThresholds) {
    let info = analyze(&run.flight_runs, thresholds);
    for fr in &mut run.flight_runs {
        fr.is_tight_connection = info.is_tight(&fr.id);
    }
    run.conflicts = info;
}
