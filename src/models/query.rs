//! Day query.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which planning day is on screen: date, airport, operator and shift.
///
/// Also the cache key for optional overlay fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayQuery {
    /// Planning date.
    pub date: NaiveDate,
    /// Airport code.
    pub airport: String,
    /// Operator code.
    pub operator: String,
    /// Shift filter. `None` = whole day.
    #[serde(default)]
    pub shift: Option<String>,
}

impl DayQuery {
    /// Creates a whole-day query.
    pub fn new(date: NaiveDate, airport: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            date,
            airport: airport.into(),
            operator: operator.into(),
            shift: None,
        }
    }

    /// Restricts the query to one shift.
    pub fn with_shift(mut self, shift: impl Into<String>) -> Self {
        self.shift = Some(shift.into());
        self
    }
}

impl fmt::Display for DayQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.date, self.airport, self.operator)?;
        if let Some(shift) = &self.shift {
            write!(f, "/{shift}")?;
        }
        Ok(())
    }
}
