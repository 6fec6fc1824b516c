//! Flight model.
//!
//! A flight is the unit of work being planned: one departure that needs a
//! truck run to service it. Flights are owned by the backend and are
//! immutable from the engine's point of view.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::time::{normalize_time_token, parse_time};

/// A flight to be serviced on the planning day.
///
/// # Time Fields
/// The backend may supply up to three time strings. They are free-form and
/// may be unparsable; see [`Flight::resolved_time`] for how one is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    /// Unique flight identifier.
    pub id: String,
    /// Flight number (e.g., `"JQ402"`).
    pub flight_number: String,
    /// Explicit backend join key, when the backend supplies one.
    #[serde(default)]
    pub key: Option<String>,
    /// Local display time.
    #[serde(default)]
    pub local_time: Option<String>,
    /// Scheduled departure time.
    #[serde(default)]
    pub scheduled_time: Option<String>,
    /// Estimated departure time.
    #[serde(default)]
    pub estimated_time: Option<String>,
    /// Destination port.
    #[serde(default)]
    pub destination: String,
    /// Operator (airline) code.
    #[serde(default)]
    pub operator: String,
}

impl Flight {
    /// Creates a new flight.
    pub fn new(id: impl Into<String>, flight_number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            flight_number: flight_number.into(),
            key: None,
            local_time: None,
            scheduled_time: None,
            estimated_time: None,
            destination: String::new(),
            operator: String::new(),
        }
    }

    /// Sets the explicit join key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the local display time.
    pub fn with_local_time(mut self, time: impl Into<String>) -> Self {
        self.local_time = Some(time.into());
        self
    }

    /// Sets the scheduled time.
    pub fn with_scheduled_time(mut self, time: impl Into<String>) -> Self {
        self.scheduled_time = Some(time.into());
        self
    }

    /// Sets the estimated time.
    pub fn with_estimated_time(mut self, time: impl Into<String>) -> Self {
        self.estimated_time = Some(time.into());
        self
    }

    /// Sets the destination.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Sets the operator code.
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    /// The key this flight is joined on: the explicit key, or the id.
    pub fn flight_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.id)
    }

    /// Time strings in preference order: estimated, scheduled, local.
    fn time_candidates(&self) -> impl Iterator<Item = &str> {
        [&self.estimated_time, &self.scheduled_time, &self.local_time]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    /// The first parsable time in preference order.
    ///
    /// Returns `None` when no field parses; such flights take no part in
    /// gap comparisons.
    pub fn resolved_time(&self) -> Option<NaiveTime> {
        self.time_candidates().find_map(parse_time)
    }

    /// The best-available time token for key matching.
    ///
    /// The first parsable field wins (estimated over scheduled over local).
    /// When none parse, the first non-empty raw field is used as-is.
    pub fn best_time_token(&self) -> Option<String> {
        self.resolved_time()
            .map(|t| t.format("%H:%M").to_string())
            .or_else(|| self.time_candidates().next().and_then(normalize_time_token))
    }
}
