//! Staff-assignment overlay resolution.
//!
//! Joins staff assignments from the staffing system onto flights. The two
//! systems share no primary key, so each assignment is matched by the first
//! key that hits:
//!
//! 1. Flight id.
//! 2. Explicit flight key.
//! 3. Flight number + best-available time token
//!    (estimated over scheduled over local).
//!
//! Reverse indices are built once per batch, so resolution is linear in
//! flights + assignments.
//!
//! # Display States
//!
//! | State | Meaning |
//! |-------|---------|
//! | Loading | Overlay fetch not finished |
//! | Unavailable | Overlay fetch failed or endpoint not available |
//! | Unassigned | Overlay loaded; no staff matched this flight |
//! | Assigned | Overlay loaded; first match shown, rest counted |

use std::collections::{HashMap, HashSet};

use crate::cache::OptionalFailure;
use crate::models::time::{composite_key, normalize_time_token};
use crate::models::{Flight, StaffAssignment};

/// Reverse indices from assignment keys to flight keys.
#[derive(Debug, Clone, Default)]
pub struct OverlayIndex {
    by_id: HashMap<String, String>,
    by_composite: HashMap<String, String>,
    keys: HashSet<String>,
}

impl OverlayIndex {
    /// Builds the indices for a batch of flights.
    ///
    /// When two flights share a composite key, the first one wins.
    pub fn build<'a>(flights: impl IntoIterator<Item = &'a Flight>) -> Self {
        let mut index = Self::default();
        for flight in flights {
            let key = flight.flight_key().to_string();
            index
                .by_id
                .entry(flight.id.clone())
                .or_insert_with(|| key.clone());
            if let Some(token) = flight.best_time_token() {
                index
                    .by_composite
                    .entry(composite_key(&flight.flight_number, &token))
                    .or_insert_with(|| key.clone());
            }
            index.keys.insert(key);
        }
        index
    }

    /// Resolves an assignment to a flight key, in priority order.
    pub fn resolve(&self, assignment: &StaffAssignment) -> Option<&str> {
        if let Some(key) = assignment
            .flight_id
            .as_deref()
            .and_then(|id| self.by_id.get(id))
        {
            return Some(key.as_str());
        }

        if let Some(key) = assignment
            .flight_key
            .as_deref()
            .and_then(|k| self.keys.get(k))
        {
            return Some(key.as_str());
        }

        let number = assignment.flight_number.as_deref()?;
        let token = assignment
            .time_token
            .as_deref()
            .and_then(normalize_time_token)?;
        self.by_composite
            .get(&composite_key(number, &token))
            .map(String::as_str)
    }
}

/// Assignments grouped by the flight they resolved to.
#[derive(Debug, Clone, Default)]
pub struct OverlayMatches {
    by_flight: HashMap<String, Vec<StaffAssignment>>,
    unmatched: Vec<StaffAssignment>,
}

impl OverlayMatches {
    /// Assignments for a flight, in arrival order.
    pub fn for_flight(&self, flight: &Flight) -> &[StaffAssignment] {
        self.by_flight
            .get(flight.flight_key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Assignments that matched no flight.
    pub fn unmatched(&self) -> &[StaffAssignment] {
        &self.unmatched
    }

    /// Number of flights with at least one assignment.
    pub fn matched_flight_count(&self) -> usize {
        self.by_flight.len()
    }
}

/// Resolves a batch of assignments against a batch of flights.
///
/// # Complexity
/// O(f + a) for f flights and a assignments.
pub fn resolve<'a>(
    flights: impl IntoIterator<Item = &'a Flight>,
    assignments: &[StaffAssignment],
) -> OverlayMatches {
    let index = OverlayIndex::build(flights);
    let mut matches = OverlayMatches::default();

    for assignment in assignments {
        match index.resolve(assignment) {
            Some(key) => matches
                .by_flight
                .entry(key.to_string())
                .or_default()
                .push(assignment.clone()),
            None => matches.unmatched.push(assignment.clone()),
        }
    }

    matches
}

/// Load state of the staff overlay for the current day.
#[derive(Debug, Clone, Default)]
pub enum OverlayState {
    /// Fetch in progress.
    #[default]
    Loading,
    /// Fetch failed; the primary view is unaffected.
    Unavailable(OptionalFailure),
    /// Fetch succeeded.
    Loaded(OverlayMatches),
}

/// What the staff column shows for one flight.
#[derive(Debug, Clone, PartialEq)]
pub enum StaffView<'a> {
    /// Overlay still loading.
    Loading,
    /// Overlay endpoint unavailable.
    Unavailable,
    /// Overlay loaded, nobody assigned.
    Unassigned,
    /// First assignment plus a count of the rest.
    Assigned {
        primary: &'a StaffAssignment,
        additional: usize,
    },
}

impl OverlayState {
    /// Display state for a flight.
    pub fn view(&self, flight: &Flight) -> StaffView<'_> {
        match self {
            Self::Loading => StaffView::Loading,
            Self::Unavailable(_) => StaffView::Unavailable,
            Self::Loaded(matches) => match matches.for_flight(flight) {
                [] => StaffView::Unassigned,
                [primary, rest @ ..] => StaffView::Assigned {
                    primary,
                    additional: rest.len(),
                },
            },
        }
    }

    /// Whether the overlay finished loading successfully.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}
