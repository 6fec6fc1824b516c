//! Failure reporting.
//!
//! The store reports every load and mutation failure to an injected
//! [`FailureObserver`]. The default observer writes them to `tracing`.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::board::Resource;

/// Mutation kinds, for failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Assign,
    Unassign,
    Reorder,
    UpdateFields,
    AutoAssign,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assign => "assign",
            Self::Unassign => "unassign",
            Self::Reorder => "reorder",
            Self::UpdateFields => "update_fields",
            Self::AutoAssign => "auto_assign",
        };
        f.write_str(name)
    }
}

/// A failure the operator should see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureEvent {
    /// One resource of a day load failed.
    Load { resource: Resource, message: String },
    /// A mutation's collaborator call failed.
    Mutation {
        operation: Operation,
        entity_id: String,
        message: String,
        /// Whether the optimistic change was undone.
        rolled_back: bool,
    },
}

/// Receives failure events from the store.
pub trait FailureObserver: Send + Sync {
    fn on_failure(&self, event: &FailureEvent);
}

/// Writes failure events to `tracing` at WARN.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FailureObserver for TracingObserver {
    fn on_failure(&self, event: &FailureEvent) {
        match event {
            FailureEvent::Load { resource, message } => {
                warn!(?resource, %message, "load failed");
            }
            FailureEvent::Mutation {
                operation,
                entity_id,
                message,
                rolled_back,
            } => {
                warn!(%operation, %entity_id, %message, rolled_back, "mutation failed");
            }
        }
    }
}
