//! Assignment state store.
//!
//! [`AssignmentStateStore`] is the single owner of the planning day. It
//! loads the day from a [`PlanningBackend`], applies operator mutations
//! optimistically, and reconciles them against the backend's answer.
//!
//! # Mutation Protocol
//!
//! | Mutation | Optimistic change | On failure |
//! |----------|-------------------|-----------|
//! | Assign | Flight leaves the pool, provisional row appended | Row removed, flight back in the pool |
//! | Unassign | Row removed, flight back in the pool | Row reinserted at its old position |
//! | Reorder | Row moved, both runs renumbered | Row moved back |
//! | Field patch | Patch merged | Kept until the next load |
//! | Auto assign | None | None |
//!
//! Each change is a pure [`Board`] transition applied to the latest
//! snapshot under the writer lock, then published on a `watch` channel.
//! Conflicts are re-derived inside every transition.
//!
//! A flight with an unresolved mutation is busy: a second mutation touching
//! it is rejected with [`MutationError::Busy`] before anything changes.
//!
//! # Failure Reporting
//!
//! Load and mutation failures go to the injected [`FailureObserver`]
//! ([`TracingObserver`] by default) as well as to the caller.

mod backend;
mod board;
mod observer;

pub use backend::{AssignRequest, AutoAssignRequest, PlanningBackend, RunLayout, RunsPayload};
pub use board::{Board, Resource, ResourceStatus};
pub use observer::{FailureEvent, FailureObserver, Operation, TracingObserver};

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::OptionalRequestCache;
use crate::config::EngineConfig;
use crate::dragdrop::{ReorderIntent, TransferIntent};
use crate::error::MutationError;
use crate::models::{DayQuery, FlightRun, FlightRunPatch, StaffAssignment};
use crate::validation::validate_board;
use board::DayLoad;

/// Outcome of a day load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Day that was loaded.
    pub query: DayQuery,
    /// Load ticket.
    pub generation: u64,
    /// `false` when a newer load landed first and this one was discarded.
    pub applied: bool,
    /// Resources that failed, with their messages.
    pub failures: Vec<(Resource, String)>,
}

impl LoadReport {
    /// Whether every resource loaded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Releases a busy flight when the mutation resolves or is dropped.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashSet<String>>,
    flight_id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.flight_id);
    }
}

/// Owner of the runs/unassigned snapshot.
pub struct AssignmentStateStore {
    backend: Arc<dyn PlanningBackend>,
    config: EngineConfig,
    board: Mutex<Arc<Board>>,
    changes: watch::Sender<Arc<Board>>,
    overlay_cache: OptionalRequestCache<Arc<Vec<StaffAssignment>>>,
    observer: Arc<dyn FailureObserver>,
    pending: Mutex<HashSet<String>>,
    next_provisional: AtomicU64,
    next_load: AtomicU64,
}

impl AssignmentStateStore {
    /// Creates a store with the default configuration.
    pub fn new(backend: Arc<dyn PlanningBackend>) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    /// Creates a store with the given configuration.
    pub fn with_config(backend: Arc<dyn PlanningBackend>, config: EngineConfig) -> Self {
        let initial = Arc::new(Board::new(config.thresholds()));
        let (changes, _) = watch::channel(Arc::clone(&initial));
        Self {
            backend,
            overlay_cache: OptionalRequestCache::new(config.overlay_timeout()),
            config,
            board: Mutex::new(initial),
            changes,
            observer: Arc::new(TracingObserver),
            pending: Mutex::new(HashSet::new()),
            next_provisional: AtomicU64::new(1),
            next_load: AtomicU64::new(0),
        }
    }

    /// Replaces the failure observer.
    pub fn with_observer(mut self, observer: Arc<dyn FailureObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Board> {
        Arc::clone(&self.board.lock())
    }

    /// Receiver notified with every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Board>> {
        self.changes.subscribe()
    }

    /// Whether a flight has an unresolved mutation.
    pub fn is_pending(&self, flight_id: &str) -> bool {
        self.pending.lock().contains(flight_id)
    }

    // ======================== Loading ========================

    /// Loads a planning day.
    pub async fn load_day(&self, query: &DayQuery) -> LoadReport {
        self.load_day_cancellable(query, &CancellationToken::new())
            .await
    }

    /// Loads a planning day; `cancel` aborts the staff overlay fetch.
    ///
    /// All five resources are fetched concurrently and land together. Each
    /// one succeeds or fails on its own; see [`Board`] for what a failed
    /// resource keeps.
    pub async fn load_day_cancellable(
        &self,
        query: &DayQuery,
        cancel: &CancellationToken,
    ) -> LoadReport {
        let generation = self.next_load.fetch_add(1, Ordering::Relaxed) + 1;
        info!(%query, generation, "loading day");
        self.publish(|b| b.begin_load(query));

        let backend = &self.backend;
        let overlay_backend = Arc::clone(&self.backend);
        let overlay_query = query.clone();
        let overlay = self.overlay_cache.fetch(query, cancel, move || async move {
            overlay_backend
                .employee_assignments(&overlay_query)
                .await
                .map(Arc::new)
        });

        let (flights, runs, staff_assignments, roster, staff_runs) = tokio::join!(
            backend.flights(query),
            backend.runs(query),
            overlay,
            backend.roster(query),
            backend.staff_runs(query),
        );

        let mut failures = Vec::new();
        if let Err(err) = &flights {
            failures.push((Resource::Flights, err.to_string()));
        }
        if let Err(err) = &runs {
            failures.push((Resource::Runs, err.to_string()));
        }
        if let Err(failure) = &staff_assignments {
            failures.push((Resource::StaffAssignments, failure.to_string()));
        }
        if let Err(err) = &roster {
            failures.push((Resource::Roster, err.to_string()));
        }
        if let Err(err) = &staff_runs {
            failures.push((Resource::StaffRuns, err.to_string()));
        }
        for (resource, message) in &failures {
            self.report(FailureEvent::Load {
                resource: *resource,
                message: message.clone(),
            });
        }

        let load = DayLoad {
            query: query.clone(),
            generation,
            flights,
            runs,
            staff_assignments,
            roster,
            staff_runs,
        };
        let applied = self.publish_if(|b| b.apply_load(load));

        if applied {
            if let Err(errors) = validate_board(&self.snapshot()) {
                for error in &errors {
                    warn!(%query, kind = ?error.kind, message = %error.message, "inconsistent day data");
                }
            }
            info!(%query, generation, failed = failures.len(), "day loaded");
        } else {
            debug!(%query, generation, "discarding superseded load");
        }

        LoadReport {
            query: query.clone(),
            generation,
            applied,
            failures,
        }
    }

    /// Reloads a day, refetching the staff overlay.
    pub async fn reload_day(&self, query: &DayQuery) -> LoadReport {
        self.overlay_cache.invalidate(query);
        self.load_day(query).await
    }

    // ======================== Mutations ========================

    /// Assigns an unassigned flight to a run.
    ///
    /// Returns the confirmed flight run.
    pub async fn assign_flight_to_run(
        &self,
        flight_id: &str,
        run_id: &str,
    ) -> Result<FlightRun, MutationError> {
        let provisional_id = format!(
            "provisional-{}",
            self.next_provisional.fetch_add(1, Ordering::Relaxed)
        );

        let (_guard, placement) = {
            let mut board = self.board.lock();
            let guard = self.claim(flight_id)?;
            let (next, placement) = board.place_provisional(flight_id, run_id, &provisional_id)?;
            self.install(&mut board, next);
            (guard, placement)
        };
        debug!(flight_id, run_id, %provisional_id, "assigning flight");

        let request = AssignRequest {
            run_id: run_id.to_string(),
            flight_id: flight_id.to_string(),
        };
        match self.backend.assign(&request).await {
            Ok(confirmed) => {
                info!(flight_id, run_id, flight_run_id = %confirmed.id, "assignment confirmed");
                self.publish(|b| b.confirm_provisional(&provisional_id, confirmed.clone()));
                Ok(confirmed)
            }
            Err(err) => {
                self.publish(|b| b.revert_provisional(&provisional_id, &placement));
                self.report(FailureEvent::Mutation {
                    operation: Operation::Assign,
                    entity_id: flight_id.to_string(),
                    message: err.to_string(),
                    rolled_back: true,
                });
                Err(err.into())
            }
        }
    }

    /// Returns a flight run's flight to the unassigned pool.
    pub async fn unassign_flight_run(&self, flight_run_id: &str) -> Result<(), MutationError> {
        let (_guard, detachment) = {
            let mut board = self.board.lock();
            let flight_id = board
                .flight_run(flight_run_id)
                .map(|fr| fr.flight_id().to_string())
                .ok_or_else(|| MutationError::UnknownFlightRun(flight_run_id.to_string()))?;
            let guard = self.claim(&flight_id)?;
            let (next, detachment) = board.detach_flight_run(flight_run_id)?;
            self.install(&mut board, next);
            (guard, detachment)
        };
        debug!(flight_run_id, run_id = %detachment.run_id, index = detachment.index, "unassigning flight run");

        match self.backend.unassign(flight_run_id).await {
            Ok(()) => {
                info!(flight_run_id, "unassignment confirmed");
                Ok(())
            }
            Err(err) => {
                self.publish(|b| b.restore_flight_run(&detachment));
                self.report(FailureEvent::Mutation {
                    operation: Operation::Unassign,
                    entity_id: flight_run_id.to_string(),
                    message: err.to_string(),
                    rolled_back: true,
                });
                Err(err.into())
            }
        }
    }

    /// Moves the row at `source_index` of one run to `target_index` of
    /// another (or the same) run, then persists the whole layout.
    ///
    /// `target_index` is a drop slot counted before the row is lifted out,
    /// so `len` drops after the last row. Releasing a row just above or below
    /// itself changes nothing and calls nothing.
    pub async fn reorder_within_or_across_runs(
        &self,
        source_run_id: &str,
        source_index: usize,
        target_run_id: &str,
        target_index: usize,
    ) -> Result<(), MutationError> {
        let (_guard, record, layout) = {
            let mut board = self.board.lock();
            let flight_id = board
                .run(source_run_id)
                .and_then(|r| r.flight_runs.get(source_index))
                .map(|fr| fr.flight_id().to_string());
            let guard = flight_id.as_deref().map(|id| self.claim(id)).transpose()?;
            let Some((next, record)) =
                board.move_flight_run(source_run_id, source_index, target_run_id, target_index)?
            else {
                return Ok(());
            };
            let layout = next.layout();
            self.install(&mut board, next);
            (guard, record, layout)
        };
        debug!(
            flight_run_id = %record.flight_run_id,
            source_run_id,
            source_index,
            target_run_id,
            target_index,
            "reordering"
        );

        match self.backend.update_layout(&layout).await {
            Ok(()) => {
                info!(flight_run_id = %record.flight_run_id, runs = layout.len(), "layout saved");
                Ok(())
            }
            Err(err) => {
                self.publish(|b| b.undo_move(&record));
                self.report(FailureEvent::Mutation {
                    operation: Operation::Reorder,
                    entity_id: record.flight_run_id.clone(),
                    message: err.to_string(),
                    rolled_back: true,
                });
                Err(err.into())
            }
        }
    }

    /// Updates a flight run's operational fields.
    ///
    /// On failure the patched values stay in place until the next load.
    pub async fn update_flight_run_fields(
        &self,
        flight_run_id: &str,
        patch: &FlightRunPatch,
    ) -> Result<FlightRun, MutationError> {
        let _guard = {
            let mut board = self.board.lock();
            let current = board
                .flight_run(flight_run_id)
                .ok_or_else(|| MutationError::UnknownFlightRun(flight_run_id.to_string()))?;
            if patch.is_empty() {
                return Ok(current.clone());
            }
            let flight_id = current.flight_id().to_string();
            let guard = self.claim(&flight_id)?;
            let next = board.patch_flight_run(flight_run_id, patch)?;
            self.install(&mut board, next);
            guard
        };
        debug!(flight_run_id, ?patch, "updating flight run");

        match self.backend.update_flight_run(flight_run_id, patch).await {
            Ok(stored) => {
                self.publish(|b| b.refresh_flight_run(&stored));
                info!(flight_run_id, "flight run updated");
                Ok(stored)
            }
            Err(err) => {
                self.report(FailureEvent::Mutation {
                    operation: Operation::UpdateFields,
                    entity_id: flight_run_id.to_string(),
                    message: err.to_string(),
                    rolled_back: false,
                });
                Err(err.into())
            }
        }
    }

    /// Runs server-side auto assignment and adopts its result.
    pub async fn auto_assign(&self, date: NaiveDate, operator: &str) -> Result<(), MutationError> {
        let request = AutoAssignRequest {
            date,
            operator: operator.to_string(),
        };
        debug!(%date, operator, "auto assigning");

        match self.backend.auto_assign(&request).await {
            Ok(payload) => {
                let runs = payload.runs.len();
                let unassigned = payload.unassigned.len();
                self.publish(|b| b.replace_runs(payload));
                info!(%date, operator, runs, unassigned, "auto assignment applied");
                Ok(())
            }
            Err(err) => {
                self.report(FailureEvent::Mutation {
                    operation: Operation::AutoAssign,
                    entity_id: format!("{date}/{operator}"),
                    message: err.to_string(),
                    rolled_back: false,
                });
                Err(err.into())
            }
        }
    }

    /// Carries out a drop produced by the drag-and-drop protocol.
    pub async fn apply_transfer(&self, intent: TransferIntent) -> Result<(), MutationError> {
        match intent {
            TransferIntent::Assign { flight_id, run_id } => self
                .assign_flight_to_run(&flight_id, &run_id)
                .await
                .map(|_| ()),
            TransferIntent::Unassign { flight_run_id } => {
                self.unassign_flight_run(&flight_run_id).await
            }
        }
    }

    /// Carries out a row reorder gesture.
    pub async fn apply_reorder(&self, intent: &ReorderIntent) -> Result<(), MutationError> {
        self.reorder_within_or_across_runs(
            &intent.source.run_id,
            intent.source.index,
            &intent.target.run_id,
            intent.target.index,
        )
        .await
    }

    // ======================== Internal helpers ========================

    /// Marks a flight busy for the lifetime of the returned guard.
    fn claim(&self, flight_id: &str) -> Result<PendingGuard<'_>, MutationError> {
        if !self.pending.lock().insert(flight_id.to_string()) {
            debug!(flight_id, "flight busy");
            return Err(MutationError::Busy(flight_id.to_string()));
        }
        Ok(PendingGuard {
            pending: &self.pending,
            flight_id: flight_id.to_string(),
        })
    }

    /// Replaces the held snapshot and notifies subscribers.
    fn install(&self, slot: &mut Arc<Board>, next: Board) {
        let next = Arc::new(next);
        *slot = Arc::clone(&next);
        self.changes.send_replace(next);
    }

    fn publish(&self, transition: impl FnOnce(&Board) -> Board) {
        self.publish_if(|b| Some(transition(b)));
    }

    fn publish_if(&self, transition: impl FnOnce(&Board) -> Option<Board>) -> bool {
        let mut board = self.board.lock();
        match transition(&board) {
            Some(next) => {
                self.install(&mut board, next);
                true
            }
            None => false,
        }
    }

    fn report(&self, event: FailureEvent) {
        self.observer.on_failure(&event);
    }
}
