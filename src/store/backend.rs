//! Planning backend seam.
//!
//! The store never persists anything itself. Every read and write goes
//! through a [`PlanningBackend`], which the embedding application implements
//! on top of its HTTP client (or a fake, in tests).
//!
//! # Endpoints
//!
//! | Method | Endpoint |
//! |--------|----------|
//! | `flights` | `GET flights(date, airport, operator)` |
//! | `runs` | `GET runs(date, airport, operator, shift)` |
//! | `employee_assignments` | `GET/POST employee_assignments(date, airport, operator, shift)` |
//! | `roster` | `GET roster(...)` |
//! | `staff_runs` | `GET staff_runs(...)` |
//! | `assign` | `POST flight_runs/assign` |
//! | `unassign` | `POST flight_runs/unassign` |
//! | `update_flight_run` | `PUT flight_runs/:id` |
//! | `update_layout` | `POST runs/update_layout` (whole-layout replace) |
//! | `auto_assign` | `POST runs/auto_assign` |

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::models::{
    DayQuery, Flight, FlightRun, FlightRunPatch, RosterEntry, Run, StaffAssignment, StaffRun,
};

/// `runs` and `auto_assign` response: the full runs/unassigned split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunsPayload {
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub unassigned: Vec<Flight>,
}

impl RunsPayload {
    pub fn new(runs: Vec<Run>, unassigned: Vec<Flight>) -> Self {
        Self { runs, unassigned }
    }
}

/// `flight_runs/assign` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub run_id: String,
    pub flight_id: String,
}

/// One run's order in a `runs/update_layout` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLayout {
    pub run_id: String,
    pub ordered_flight_run_ids: Vec<String>,
}

/// `runs/auto_assign` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAssignRequest {
    pub date: NaiveDate,
    pub operator: String,
}

/// Collaborator that owns persistence of flights, runs and assignments.
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    /// Flights for the day.
    async fn flights(&self, query: &DayQuery) -> Result<Vec<Flight>, BackendError>;

    /// Runs with their flight runs, plus the unassigned flights.
    async fn runs(&self, query: &DayQuery) -> Result<RunsPayload, BackendError>;

    /// Staff assignment overlay. [`BackendError::Unavailable`] is the
    /// endpoint's explicit "not available" marker.
    async fn employee_assignments(
        &self,
        query: &DayQuery,
    ) -> Result<Vec<StaffAssignment>, BackendError>;

    /// Staff on shift.
    async fn roster(&self, query: &DayQuery) -> Result<Vec<RosterEntry>, BackendError>;

    /// Staff crewed on each run.
    async fn staff_runs(&self, query: &DayQuery) -> Result<Vec<StaffRun>, BackendError>;

    /// Creates a flight run. Returns the confirmed record.
    async fn assign(&self, request: &AssignRequest) -> Result<FlightRun, BackendError>;

    /// Deletes a flight run.
    async fn unassign(&self, flight_run_id: &str) -> Result<(), BackendError>;

    /// Updates operational fields. Returns the stored record.
    async fn update_flight_run(
        &self,
        flight_run_id: &str,
        patch: &FlightRunPatch,
    ) -> Result<FlightRun, BackendError>;

    /// Replaces the whole layout.
    async fn update_layout(&self, layout: &[RunLayout]) -> Result<(), BackendError>;

    /// Server-side auto assignment. Returns the new runs/unassigned split.
    async fn auto_assign(&self, request: &AutoAssignRequest) -> Result<RunsPayload, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let body = serde_json::to_value(AssignRequest {
            run_id: "R1".into(),
            flight_id: "F1".into(),
        })
        .unwrap();
        assert_eq!(body["runId"], "R1");
        assert_eq!(body["flightId"], "F1");

        let layout = serde_json::to_value(RunLayout {
            run_id: "R1".into(),
            ordered_flight_run_ids: vec!["FR2".into(), "FR1".into()],
        })
        .unwrap();
        assert_eq!(layout["orderedFlightRunIds"][0], "FR2");
    }

    #[test]
    fn test_runs_payload_defaults() {
        let payload: RunsPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.runs.is_empty());
        assert!(payload.unassigned.is_empty());
    }
}
