//! Integrity checks for board snapshots.
//!
//! Checks the structural invariants every snapshot must hold. The store
//! runs these over each freshly loaded day and logs what it finds, since
//! collaborator data is not guaranteed to be consistent. Detects:
//! - Duplicate run or flight-run IDs
//! - A flight held in more than one place (two runs, or a run and the pool)
//! - Sequence indices that are not `0..n`
//! - Flight runs whose run reference disagrees with their run
//! - Conflict decoration that no longer matches the run's list

use crate::conflict::analyze;
use crate::store::Board;
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two runs or two flight runs share the same ID.
    DuplicateId,
    /// A flight is held in more than one place.
    ExclusivityViolation,
    /// A run's sequence indices are not contiguous from zero.
    SequenceGap,
    /// A flight run's run reference disagrees with the run holding it.
    RunMismatch,
    /// A run's conflict decoration is out of date.
    StaleConflicts,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a board snapshot.
///
/// Checks:
/// 1. No duplicate run IDs
/// 2. No duplicate flight-run IDs (across all runs)
/// 3. Every flight is in exactly one run or the unassigned pool
/// 4. Every run's sequence indices are `0..n` in list order
/// 5. Every flight run points at the run holding it
/// 6. Every run's conflict decoration matches a fresh analysis
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_board(board: &Board) -> ValidationResult {
    let mut errors = Vec::new();

    let mut run_ids = HashSet::new();
    let mut flight_run_ids = HashSet::new();
    // flight id -> where it was first seen
    let mut holders: HashMap<&str, &str> = HashMap::new();

    for run in &board.runs {
        if !run_ids.insert(run.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate run ID: {}", run.id),
            ));
        }

        for (i, fr) in run.flight_runs.iter().enumerate() {
            if !flight_run_ids.insert(fr.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate flight run ID: {}", fr.id),
                ));
            }

            if let Some(previous) = holders.insert(fr.flight_id(), run.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ExclusivityViolation,
                    format!(
                        "Flight '{}' is in run '{}' and in '{}'",
                        fr.flight_id(),
                        run.id,
                        previous
                    ),
                ));
            }

            if fr.sequence_index != i {
                errors.push(ValidationError::new(
                    ValidationErrorKind::SequenceGap,
                    format!(
                        "Run '{}' position {} has sequence index {}",
                        run.id, i, fr.sequence_index
                    ),
                ));
            }

            if fr.run_id != run.id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::RunMismatch,
                    format!(
                        "Flight run '{}' in run '{}' references run '{}'",
                        fr.id, run.id, fr.run_id
                    ),
                ));
            }
        }

        let fresh = analyze(&run.flight_runs, &board.thresholds);
        let flags_match = run
            .flight_runs
            .iter()
            .all(|fr| fr.is_tight_connection == fresh.is_tight(&fr.id));
        if fresh != run.conflicts || !flags_match {
            errors.push(ValidationError::new(
                ValidationErrorKind::StaleConflicts,
                format!("Run '{}' has stale conflict info", run.id),
            ));
        }
    }

    for flight in &board.unassigned {
        if let Some(previous) = holders.insert(flight.id.as_str(), "unassigned pool") {
            errors.push(ValidationError::new(
                ValidationErrorKind::ExclusivityViolation,
                format!(
                    "Flight '{}' is unassigned and in '{}'",
                    flight.id, previous
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
