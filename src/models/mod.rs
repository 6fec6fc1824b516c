//! Planning domain models.
//!
//! Provides the data types shared with the flight backend and the
//! staffing system. Everything here is owned by a collaborator; the
//! engine holds copies and mutates them optimistically between reloads.
//!
//! # Ownership
//!
//! | Type | Owner | Engine role |
//! |------|-------|-------------|
//! | Flight | Flight backend | Read-only |
//! | Run | Flight backend | Reordered locally |
//! | FlightRun | Flight backend | Created/moved/patched optimistically |
//! | StaffAssignment | Staffing system | Read-only overlay |
//! | RosterEntry / StaffRun | Staffing system | Read-only |

mod flight;
mod flight_run;
mod query;
mod run;
mod staff;
pub mod time;

pub use flight::Flight;
pub use flight_run::{FlightRun, FlightRunPatch, FlightRunStatus};
pub use query::DayQuery;
pub use run::{Run, ShiftWindow};
pub use staff::{RosterEntry, StaffAssignment, StaffRun};
