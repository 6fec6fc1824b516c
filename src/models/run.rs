//! Run model.
//!
//! A run is a truck/staff work unit for a shift. It owns an ordered list of
//! flight runs; order is significant and positions are kept contiguous.

use serde::{Deserialize, Serialize};

use super::FlightRun;
use crate::conflict::ConflictInfo;

/// Shift window a run operates in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftWindow {
    /// Shift start time string.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Shift end time string.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Operator code the shift belongs to.
    #[serde(default)]
    pub operator: String,
}

/// A truck run for the planning day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Unique run identifier.
    pub id: String,
    /// Display label (e.g., `"Run 3"`).
    #[serde(default)]
    pub label: String,
    /// Shift window.
    #[serde(default)]
    pub shift: ShiftWindow,
    /// Truck identifier.
    #[serde(default)]
    pub truck: Option<String>,
    /// Ordered flight assignments.
    #[serde(default)]
    pub flight_runs: Vec<FlightRun>,
    /// Derived conflict summary. Never sent to or read from the backend.
    #[serde(skip)]
    pub conflicts: ConflictInfo,
}

impl Run {
    /// Creates an empty run.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shift: ShiftWindow::default(),
            truck: None,
            flight_runs: Vec::new(),
            conflicts: ConflictInfo::default(),
        }
    }

    /// Sets the shift window times.
    pub fn with_shift(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.shift.start_time = Some(start.into());
        self.shift.end_time = Some(end.into());
        self
    }

    /// Sets the shift operator.
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.shift.operator = operator.into();
        self
    }

    /// Sets the truck.
    pub fn with_truck(mut self, truck: impl Into<String>) -> Self {
        self.truck = Some(truck.into());
        self
    }

    /// Appends a flight run, taking ownership of its position and run id.
    pub fn with_flight_run(mut self, mut flight_run: FlightRun) -> Self {
        flight_run.run_id = self.id.clone();
        flight_run.sequence_index = self.flight_runs.len();
        self.flight_runs.push(flight_run);
        self
    }

    /// Number of flights in the run.
    #[inline]
    pub fn flight_count(&self) -> usize {
        self.flight_runs.len()
    }

    /// Position of a flight run in this run.
    pub fn position_of(&self, flight_run_id: &str) -> Option<usize> {
        self.flight_runs.iter().position(|fr| fr.id == flight_run_id)
    }

    /// Whether the run holds the given flight.
    pub fn contains_flight(&self, flight_id: &str) -> bool {
        self.flight_runs.iter().any(|fr| fr.flight_id() == flight_id)
    }

    /// Confirmed flight-run ids in order. Provisional entries are skipped.
    pub fn ordered_flight_run_ids(&self) -> Vec<String> {
        self.flight_runs
            .iter()
            .filter(|fr| !fr.provisional)
            .map(|fr| fr.id.clone())
            .collect()
    }

    /// Rewrites every entry's position to `0..N-1` and its run id to this run.
    pub fn renumber(&mut self) {
        for (i, fr) in self.flight_runs.iter_mut().enumerate() {
            fr.sequence_index = i;
            fr.run_id.clone_from(&self.id);
        }
    }
}
