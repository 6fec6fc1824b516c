//! Error types.
//!
//! Nothing here is fatal: every error is local to one resource or one
//! mutation and can be retried by the operator.

use thiserror::Error;

/// A collaborator call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The endpoint explicitly reported that the data is not available.
    #[error("endpoint unavailable")]
    Unavailable,
    /// The backend answered with an error status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// The request never reached the backend or the response was unreadable.
    #[error("transport error: {0}")]
    Transport(String),
}

/// A store mutation was rejected or failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The flight is not in the unassigned pool.
    #[error("flight {0} is not unassigned")]
    FlightNotUnassigned(String),
    /// No run with this id.
    #[error("unknown run {0}")]
    UnknownRun(String),
    /// No flight run with this id.
    #[error("unknown flight run {0}")]
    UnknownFlightRun(String),
    /// A position outside the run's list.
    #[error("index {index} out of range for run {run_id} ({len} flights)")]
    IndexOutOfRange {
        run_id: String,
        index: usize,
        len: usize,
    },
    /// A previous mutation on this flight has not resolved yet.
    #[error("flight {0} has a pending change")]
    Busy(String),
    /// The entry is still awaiting backend confirmation.
    #[error("flight run {0} is not confirmed yet")]
    Provisional(String),
    /// The collaborator call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A drag payload is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    /// A run-flight drag lacks its source run or flight run.
    #[error("run-flight drag requires {0}")]
    MissingField(&'static str),
    /// The payload carries no flight id.
    #[error("drag payload has no flight id")]
    MissingFlight,
}
