//! Run-assignment and conflict-detection engine for ground-handling
//! operations planning.
//!
//! Tracks which flight belongs to which truck/staff run for a planning day,
//! lets an operator reassign flights by direct manipulation, keeps ordering
//! and capacity invariants consistent under optimistic, partially failing
//! backend mutations, and derives the conflict signals shown on each run.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Flight`, `Run`, `FlightRun`,
//!   `StaffAssignment`, `RosterEntry`, `StaffRun`, `DayQuery`
//! - **`conflict`**: Overloaded runs and tight turnarounds (pure analysis)
//! - **`overlay`**: Joins staff assignments onto flights by fallback keys
//! - **`cache`**: Deduplicating, cancellable cache for optional fetches
//! - **`dragdrop`**: Drag-and-drop gesture state machine
//! - **`store`**: The assignment state store and its backend seam
//! - **`validation`**: Snapshot integrity checks
//! - **`summary`**: Dashboard header metrics
//!
//! # Data Flow
//!
//! ```text
//! load_day ──▶ PlanningBackend (5 independent fetches) ──▶ Board
//!                                                           │ decorate
//! gesture ──▶ DragDropTransferProtocol ──▶ intent ──▶ store mutation
//!             optimistic Board ──▶ backend call ──▶ confirm / roll back
//! ```
//!
//! The backend, the UI and configuration sources are external; this crate
//! only defines the seams it calls.

pub mod cache;
pub mod config;
pub mod conflict;
pub mod dragdrop;
pub mod error;
pub mod models;
pub mod overlay;
pub mod store;
pub mod summary;
pub mod validation;

pub use config::EngineConfig;
pub use error::{BackendError, DragError, MutationError};
pub use store::{AssignmentStateStore, Board, PlanningBackend};
