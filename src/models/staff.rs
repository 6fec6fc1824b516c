//! Staff overlay models.
//!
//! Read-only records supplied by the staffing system. The engine joins them
//! onto flights and runs for display but never mutates them.

use serde::{Deserialize, Serialize};

/// A staff member assigned to a flight.
///
/// The staffing system does not share a primary key with the flight
/// backend. A record identifies its flight by any of: flight id, explicit
/// flight key, or flight number plus a time token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffAssignment {
    /// Staff code.
    pub staff_code: String,
    /// Staff display name.
    #[serde(default)]
    pub staff_name: String,
    /// Role on the flight (e.g., `"refueller"`).
    #[serde(default)]
    pub role: Option<String>,
    /// Flight id, when known.
    #[serde(default)]
    pub flight_id: Option<String>,
    /// Explicit flight key, when known.
    #[serde(default)]
    pub flight_key: Option<String>,
    /// Flight number for composite matching.
    #[serde(default)]
    pub flight_number: Option<String>,
    /// Time token for composite matching.
    #[serde(default)]
    pub time_token: Option<String>,
}

impl StaffAssignment {
    /// Creates an assignment with no flight reference yet.
    pub fn new(staff_code: impl Into<String>, staff_name: impl Into<String>) -> Self {
        Self {
            staff_code: staff_code.into(),
            staff_name: staff_name.into(),
            role: None,
            flight_id: None,
            flight_key: None,
            flight_number: None,
            time_token: None,
        }
    }

    /// Sets the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// References the flight by id.
    pub fn for_flight_id(mut self, flight_id: impl Into<String>) -> Self {
        self.flight_id = Some(flight_id.into());
        self
    }

    /// References the flight by explicit key.
    pub fn for_flight_key(mut self, flight_key: impl Into<String>) -> Self {
        self.flight_key = Some(flight_key.into());
        self
    }

    /// References the flight by number and time token.
    pub fn for_flight_number(
        mut self,
        flight_number: impl Into<String>,
        time_token: impl Into<String>,
    ) -> Self {
        self.flight_number = Some(flight_number.into());
        self.time_token = Some(time_token.into());
        self
    }
}

/// A staff member rostered on for the shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Staff code.
    pub staff_code: String,
    /// Staff display name.
    #[serde(default)]
    pub staff_name: String,
    /// Rostered role.
    #[serde(default)]
    pub role: Option<String>,
    /// Roster start time.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Roster end time.
    #[serde(default)]
    pub end_time: Option<String>,
}

impl RosterEntry {
    /// Creates a roster entry.
    pub fn new(staff_code: impl Into<String>, staff_name: impl Into<String>) -> Self {
        Self {
            staff_code: staff_code.into(),
            staff_name: staff_name.into(),
            role: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// A staff member crewed on a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffRun {
    /// Run identifier.
    pub run_id: String,
    /// Staff code.
    pub staff_code: String,
    /// Role on the run.
    #[serde(default)]
    pub role: Option<String>,
}

impl StaffRun {
    /// Creates a crew record.
    pub fn new(run_id: impl Into<String>, staff_code: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            staff_code: staff_code.into(),
            role: None,
        }
    }
}
