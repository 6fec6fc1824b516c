//! Drag-and-drop transfer protocol.
//!
//! Turns pointer gestures into validated mutation intents, independent of
//! any platform drag API. The protocol never touches the store itself: a
//! valid drop yields a [`TransferIntent`] the caller hands to
//! [`AssignmentStateStore::apply_transfer`](crate::store::AssignmentStateStore::apply_transfer).
//!
//! # States
//!
//! ```text
//! Idle ──start_drag──▶ Dragging(payload, armed)
//!   ▲                        │ hover / leave: re-arm only
//!   └──── drop / cancel ─────┘
//! ```
//!
//! # Valid Drops
//!
//! | Payload | Target | Intent |
//! |---------|--------|--------|
//! | RunFlight | Unassigned panel | Unassign |
//! | UnassignedFlight | Run card | Assign |
//! | anything else | | none |
//!
//! Row reordering within or across runs is a separate gesture; see
//! [`DragDropTransferProtocol::reorder`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DragError;

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DragKind {
    /// A flight row inside a run card.
    RunFlight,
    /// A flight from the unassigned panel.
    UnassignedFlight,
}

/// Transient description of the dragged item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPayload {
    /// Payload type.
    pub kind: DragKind,
    /// Run the row was dragged out of (run-flight drags only).
    #[serde(default)]
    pub source_run_id: Option<String>,
    /// Dragged flight run (run-flight drags only).
    #[serde(default)]
    pub flight_run_id: Option<String>,
    /// Dragged flight.
    pub flight_id: String,
}

impl DragPayload {
    /// Payload for a row dragged out of a run.
    pub fn run_flight(
        source_run_id: impl Into<String>,
        flight_run_id: impl Into<String>,
        flight_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: DragKind::RunFlight,
            source_run_id: Some(source_run_id.into()),
            flight_run_id: Some(flight_run_id.into()),
            flight_id: flight_id.into(),
        }
    }

    /// Payload for a flight dragged out of the unassigned panel.
    pub fn unassigned_flight(flight_id: impl Into<String>) -> Self {
        Self {
            kind: DragKind::UnassignedFlight,
            source_run_id: None,
            flight_run_id: None,
            flight_id: flight_id.into(),
        }
    }

    /// Checks that the fields required by the payload type are present.
    pub fn validate(&self) -> Result<(), DragError> {
        if self.flight_id.is_empty() {
            return Err(DragError::MissingFlight);
        }
        if self.kind == DragKind::RunFlight {
            if self.source_run_id.is_none() {
                return Err(DragError::MissingField("source_run_id"));
            }
            if self.flight_run_id.is_none() {
                return Err(DragError::MissingField("flight_run_id"));
            }
        }
        Ok(())
    }
}

/// Where a drag can be released.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropTarget {
    /// The unassigned flights panel.
    UnassignedPanel,
    /// A run card.
    RunCard(String),
}

/// Protocol state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A gesture is in progress.
    Dragging {
        /// What is being dragged.
        payload: DragPayload,
        /// Highlighted drop target, if the pointer is over a valid one.
        armed: Option<DropTarget>,
    },
}

/// A mutation requested by a valid drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferIntent {
    /// Assign an unassigned flight to a run.
    Assign { flight_id: String, run_id: String },
    /// Return a flight run to the unassigned pool.
    Unassign { flight_run_id: String },
}

/// A row position within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowPosition {
    /// Run identifier.
    pub run_id: String,
    /// Index within the run's list.
    pub index: usize,
}

impl RowPosition {
    /// Creates a row position.
    pub fn new(run_id: impl Into<String>, index: usize) -> Self {
        Self {
            run_id: run_id.into(),
            index,
        }
    }
}

/// A row move requested by a reorder gesture.
///
/// `target.index` is the drop slot in the target run, counted before the
/// row is lifted out (`0..=len`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderIntent {
    /// Where the row was picked up.
    pub source: RowPosition,
    /// Where the row was released.
    pub target: RowPosition,
}

/// Drag-and-drop state machine.
#[derive(Debug, Clone, Default)]
pub struct DragDropTransferProtocol {
    state: DragState,
}

impl DragDropTransferProtocol {
    /// Creates an idle protocol.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Whether a gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Begins a gesture. A gesture already in progress is replaced.
    pub fn start_drag(&mut self, payload: DragPayload) -> Result<(), DragError> {
        payload.validate()?;
        debug!(kind = ?payload.kind, flight_id = %payload.flight_id, "drag started");
        self.state = DragState::Dragging {
            payload,
            armed: None,
        };
        Ok(())
    }

    /// Pointer entered a drop target. Arms it when it would accept the drop.
    pub fn hover(&mut self, target: DropTarget) {
        if let DragState::Dragging { payload, armed } = &mut self.state {
            *armed = accepts(payload, &target).then_some(target);
        }
    }

    /// Pointer left a drop target.
    pub fn leave(&mut self, target: &DropTarget) {
        if let DragState::Dragging { armed, .. } = &mut self.state {
            if armed.as_ref() == Some(target) {
                *armed = None;
            }
        }
    }

    /// Whether a target is currently highlighted.
    pub fn is_armed(&self, target: &DropTarget) -> bool {
        match &self.state {
            DragState::Dragging { armed, .. } => armed.as_ref() == Some(target),
            DragState::Idle => false,
        }
    }

    /// Abandons the gesture.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Releases the drag over a target.
    ///
    /// Always returns to idle. Yields an intent only for a valid
    /// payload/target combination.
    pub fn drop(&mut self, target: &DropTarget) -> Option<TransferIntent> {
        let DragState::Dragging { payload, .. } = std::mem::take(&mut self.state) else {
            return None;
        };

        let intent = match (payload.kind, target) {
            (DragKind::RunFlight, DropTarget::UnassignedPanel) => payload
                .flight_run_id
                .map(|flight_run_id| TransferIntent::Unassign { flight_run_id }),
            (DragKind::UnassignedFlight, DropTarget::RunCard(run_id)) => {
                Some(TransferIntent::Assign {
                    flight_id: payload.flight_id,
                    run_id: run_id.clone(),
                })
            }
            _ => None,
        };

        debug!(?target, ?intent, "drag released");
        intent
    }

    /// Row reorder gesture. Always valid; yields nothing when the row is
    /// released on the slot directly above or below itself.
    pub fn reorder(&self, source: RowPosition, target: RowPosition) -> Option<ReorderIntent> {
        let unmoved = source.run_id == target.run_id
            && (target.index == source.index || target.index == source.index + 1);
        (!unmoved).then_some(ReorderIntent { source, target })
    }
}

fn accepts(payload: &DragPayload, target: &DropTarget) -> bool {
    matches!(
        (payload.kind, target),
        (DragKind::RunFlight, DropTarget::UnassignedPanel)
            | (DragKind::UnassignedFlight, DropTarget::RunCard(_))
    )
}
