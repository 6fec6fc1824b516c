//! Dashboard header metrics.
//!
//! Computes the figures shown above the run board from a snapshot.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Assigned | Flight runs across all runs |
//! | Unassigned | Flights in the pool |
//! | Assignment rate | assigned / (assigned + unassigned) |
//! | Overloaded runs | Runs above capacity |
//! | Tight connections | Tight adjacent pairs, all runs |
//! | Runs with conflicts | Runs overloaded or with a tight pair |
//! | Completion rate | Flight runs with status `done` / assigned |
//! | Average load | Mean flights per run |

use std::collections::HashMap;

use serde::Serialize;

use crate::models::FlightRunStatus;
use crate::store::Board;

/// Board-level figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSummary {
    /// Number of runs.
    pub runs: usize,
    /// Flight runs across all runs.
    pub assigned: usize,
    /// Flights in the unassigned pool.
    pub unassigned: usize,
    /// Fraction of flights with a run (0.0..1.0).
    pub assignment_rate: f64,
    /// Runs above capacity.
    pub overloaded_runs: usize,
    /// Tight pairs across all runs.
    pub tight_connections: usize,
    /// Runs with any conflict.
    pub runs_with_conflicts: usize,
    /// Flight runs per status.
    pub by_status: HashMap<FlightRunStatus, usize>,
    /// Fraction of flight runs marked done (0.0..1.0).
    pub completion_rate: f64,
    /// Mean flights per run.
    pub avg_flights_per_run: f64,
}

impl BoardSummary {
    /// Computes the summary of a snapshot.
    pub fn calculate(board: &Board) -> Self {
        let mut assigned: usize = 0;
        let mut overloaded_runs: usize = 0;
        let mut tight_connections: usize = 0;
        let mut runs_with_conflicts: usize = 0;
        let mut by_status: HashMap<FlightRunStatus, usize> = HashMap::new();

        for run in &board.runs {
            assigned += run.flight_count();
            if run.conflicts.overloaded {
                overloaded_runs += 1;
            }
            if run.conflicts.has_conflicts {
                runs_with_conflicts += 1;
            }
            tight_connections += run.conflicts.tight_connections.len();

            for fr in &run.flight_runs {
                *by_status.entry(fr.status).or_default() += 1;
            }
        }

        let unassigned = board.unassigned.len();
        let total = assigned + unassigned;

        let assignment_rate = if total == 0 {
            1.0
        } else {
            assigned as f64 / total as f64
        };

        let done = by_status.get(&FlightRunStatus::Done).copied().unwrap_or(0);
        let completion_rate = if assigned == 0 {
            0.0
        } else {
            done as f64 / assigned as f64
        };

        let avg_flights_per_run = if board.runs.is_empty() {
            0.0
        } else {
            assigned as f64 / board.runs.len() as f64
        };

        Self {
            runs: board.runs.len(),
            assigned,
            unassigned,
            assignment_rate,
            overloaded_runs,
            tight_connections,
            runs_with_conflicts,
            by_status,
            completion_rate,
            avg_flights_per_run,
        }
    }

    /// Whether nothing on the board needs attention.
    pub fn is_clear(&self) -> bool {
        self.unassigned == 0 && self.runs_with_conflicts == 0
    }
}
