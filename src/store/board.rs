//! Board snapshot and its transitions.
//!
//! A [`Board`] is one immutable view of the planning day: runs with their
//! ordered flight runs, the unassigned pool, the staff overlay and the load
//! status of each resource. The store never edits a published board. Every
//! change is a transition `&Board -> Board` applied to the latest snapshot,
//! so two completions racing each other each build on the other's result.
//!
//! # Invariants (after every transition)
//!
//! - Each flight sits in exactly one run's list or in the unassigned pool.
//! - Each run's `sequence_index` values are `0..n`.
//! - Each run's conflict decoration matches its current list.
//!
//! Rollback transitions check the current board before restoring anything;
//! when a reload already replaced the entity they leave the board as is.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::backend::{RunLayout, RunsPayload};
use crate::cache::OptionalResult;
use crate::conflict::{decorate, ConflictThresholds};
use crate::error::{BackendError, MutationError};
use crate::models::{
    DayQuery, Flight, FlightRun, FlightRunPatch, RosterEntry, Run, StaffAssignment, StaffRun,
};
use crate::overlay::{self, OverlayState, StaffView};

/// Independently loaded resources of a planning day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Flights,
    Runs,
    StaffAssignments,
    Roster,
    StaffRuns,
}

impl Resource {
    /// Every resource, in load order.
    pub const ALL: [Resource; 5] = [
        Resource::Flights,
        Resource::Runs,
        Resource::StaffAssignments,
        Resource::Roster,
        Resource::StaffRuns,
    ];
}

/// Load status of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Never requested.
    #[default]
    Idle,
    /// Request in flight.
    Loading,
    /// Last request succeeded.
    Loaded,
    /// Last request failed with this message.
    Failed(String),
}

impl ResourceStatus {
    /// Failure message, if the last request failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Immutable snapshot of the planning day.
#[derive(Debug, Clone)]
pub struct Board {
    /// Thresholds every run is decorated with.
    pub thresholds: ConflictThresholds,
    /// Day the data belongs to. `None` until the first load lands.
    pub query: Option<DayQuery>,
    /// Flights for the day, as listed by the flights resource.
    pub flights: Vec<Flight>,
    /// Runs, each with its ordered flight runs and conflict decoration.
    pub runs: Vec<Run>,
    /// Flights with no flight run.
    pub unassigned: Vec<Flight>,
    /// Staff on shift.
    pub roster: Vec<RosterEntry>,
    /// Staff crewed on each run.
    pub staff_runs: Vec<StaffRun>,
    /// Staff assignment overlay.
    pub overlay: OverlayState,
    /// Per-resource load status.
    pub status: BTreeMap<Resource, ResourceStatus>,
    /// Ticket of the load this board was built from.
    pub load_generation: u64,
}

/// Everything one `load_day` fetched, success or not.
#[derive(Debug)]
pub(crate) struct DayLoad {
    pub query: DayQuery,
    pub generation: u64,
    pub flights: Result<Vec<Flight>, BackendError>,
    pub runs: Result<RunsPayload, BackendError>,
    pub staff_assignments: OptionalResult<Arc<Vec<StaffAssignment>>>,
    pub roster: Result<Vec<RosterEntry>, BackendError>,
    pub staff_runs: Result<Vec<StaffRun>, BackendError>,
}

/// Where an optimistically assigned flight came from.
#[derive(Debug, Clone)]
pub(crate) struct Placement {
    pub flight: Flight,
    pub unassigned_index: usize,
}

/// Where an optimistically unassigned flight run came from.
#[derive(Debug, Clone)]
pub(crate) struct Detachment {
    pub run_id: String,
    pub index: usize,
    pub flight_run: FlightRun,
}

/// An optimistic row move.
#[derive(Debug, Clone)]
pub(crate) struct Move {
    pub flight_run_id: String,
    pub source_run_id: String,
    pub source_index: usize,
    pub target_run_id: String,
}

impl Board {
    /// Creates an empty board.
    pub fn new(thresholds: ConflictThresholds) -> Self {
        Self {
            thresholds,
            query: None,
            flights: Vec::new(),
            runs: Vec::new(),
            unassigned: Vec::new(),
            roster: Vec::new(),
            staff_runs: Vec::new(),
            overlay: OverlayState::default(),
            status: Resource::ALL
                .iter()
                .map(|r| (*r, ResourceStatus::Idle))
                .collect(),
            load_generation: 0,
        }
    }

    /// Sets runs and the unassigned pool.
    pub fn with_runs(mut self, runs: Vec<Run>, unassigned: Vec<Flight>) -> Self {
        self.set_runs(runs, unassigned);
        self
    }

    // ======================== Queries ========================

    /// Finds a run by id.
    pub fn run(&self, run_id: &str) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == run_id)
    }

    /// Finds a flight run by id.
    pub fn flight_run(&self, flight_run_id: &str) -> Option<&FlightRun> {
        self.locate(flight_run_id)
            .map(|(ri, pos)| &self.runs[ri].flight_runs[pos])
    }

    /// Whether a flight is in the unassigned pool.
    pub fn is_unassigned(&self, flight_id: &str) -> bool {
        self.unassigned.iter().any(|f| f.id == flight_id)
    }

    /// Run currently holding a flight.
    pub fn run_of_flight(&self, flight_id: &str) -> Option<&Run> {
        self.runs.iter().find(|r| r.contains_flight(flight_id))
    }

    /// Number of flight runs across all runs.
    pub fn assigned_count(&self) -> usize {
        self.runs.iter().map(Run::flight_count).sum()
    }

    /// Load status of a resource.
    pub fn status(&self, resource: Resource) -> &ResourceStatus {
        static IDLE: ResourceStatus = ResourceStatus::Idle;
        self.status.get(&resource).unwrap_or(&IDLE)
    }

    /// What the staff column shows for a flight.
    pub fn staff_view(&self, flight: &Flight) -> StaffView<'_> {
        self.overlay.view(flight)
    }

    /// Staff crewed on a run, joined with the roster where possible.
    pub fn crew(&self, run_id: &str) -> Vec<(&StaffRun, Option<&RosterEntry>)> {
        self.staff_runs
            .iter()
            .filter(|s| s.run_id == run_id)
            .map(|s| {
                let entry = self.roster.iter().find(|r| r.staff_code == s.staff_code);
                (s, entry)
            })
            .collect()
    }

    /// Every run's confirmed order, as sent to `runs/update_layout`.
    pub fn layout(&self) -> Vec<RunLayout> {
        self.runs
            .iter()
            .map(|r| RunLayout {
                run_id: r.id.clone(),
                ordered_flight_run_ids: r.ordered_flight_run_ids(),
            })
            .collect()
    }

    fn run_index(&self, run_id: &str) -> Option<usize> {
        self.runs.iter().position(|r| r.id == run_id)
    }

    fn locate(&self, flight_run_id: &str) -> Option<(usize, usize)> {
        self.runs
            .iter()
            .enumerate()
            .find_map(|(ri, run)| run.position_of(flight_run_id).map(|pos| (ri, pos)))
    }

    fn holds_flight(&self, flight_id: &str) -> bool {
        self.is_unassigned(flight_id) || self.run_of_flight(flight_id).is_some()
    }

    // ======================== Internal helpers ========================

    /// Renumbers and re-decorates one run.
    fn refresh(&mut self, run_index: usize) {
        let thresholds = self.thresholds;
        if let Some(run) = self.runs.get_mut(run_index) {
            run.renumber();
            decorate(run, &thresholds);
        }
    }

    /// Replaces runs and the unassigned pool with collaborator data.
    ///
    /// Rows are ordered by their reported sequence, and a flight reported
    /// both in a run and as unassigned is kept in the run.
    fn set_runs(&mut self, runs: Vec<Run>, unassigned: Vec<Flight>) {
        self.runs = runs;
        for run in &mut self.runs {
            run.flight_runs.sort_by_key(|fr| fr.sequence_index);
            for fr in &mut run.flight_runs {
                fr.provisional = false;
            }
        }
        for i in 0..self.runs.len() {
            self.refresh(i);
        }
        self.unassigned = unassigned;
        let runs = &self.runs;
        self.unassigned
            .retain(|f| !runs.iter().any(|r| r.contains_flight(&f.id)));
    }

    fn set_status(&mut self, resource: Resource, status: ResourceStatus) {
        self.status.insert(resource, status);
    }

    /// Flights known to the board, for overlay matching.
    fn known_flights(&self) -> impl Iterator<Item = &Flight> {
        self.runs
            .iter()
            .flat_map(|r| r.flight_runs.iter().map(|fr| &fr.flight))
            .chain(self.unassigned.iter())
            .chain(self.flights.iter())
    }

    // ======================== Loading ========================

    /// Marks every resource as loading.
    ///
    /// The overlay goes back to loading only when the day changes; a reload
    /// of the same day keeps showing the previous overlay until it lands.
    pub(crate) fn begin_load(&self, query: &DayQuery) -> Board {
        let mut next = self.clone();
        for resource in Resource::ALL {
            next.set_status(resource, ResourceStatus::Loading);
        }
        if next.query.as_ref() != Some(query) {
            next.overlay = OverlayState::Loading;
        }
        next
    }

    /// Applies a finished load. Returns `None` when a newer load already
    /// landed.
    ///
    /// A failed resource keeps its previous data when the load is for the
    /// same day, and is emptied otherwise.
    pub(crate) fn apply_load(&self, load: DayLoad) -> Option<Board> {
        if load.generation <= self.load_generation {
            return None;
        }

        let same_day = self.query.as_ref() == Some(&load.query);
        let mut next = self.clone();
        next.load_generation = load.generation;
        next.query = Some(load.query);

        match load.flights {
            Ok(flights) => {
                next.flights = flights;
                next.set_status(Resource::Flights, ResourceStatus::Loaded);
            }
            Err(err) => {
                if !same_day {
                    next.flights.clear();
                }
                next.set_status(Resource::Flights, ResourceStatus::Failed(err.to_string()));
            }
        }

        match load.runs {
            Ok(payload) => {
                next.set_runs(payload.runs, payload.unassigned);
                next.set_status(Resource::Runs, ResourceStatus::Loaded);
            }
            Err(err) => {
                if !same_day {
                    next.runs.clear();
                    next.unassigned.clear();
                }
                next.set_status(Resource::Runs, ResourceStatus::Failed(err.to_string()));
            }
        }

        match load.roster {
            Ok(roster) => {
                next.roster = roster;
                next.set_status(Resource::Roster, ResourceStatus::Loaded);
            }
            Err(err) => {
                if !same_day {
                    next.roster.clear();
                }
                next.set_status(Resource::Roster, ResourceStatus::Failed(err.to_string()));
            }
        }

        match load.staff_runs {
            Ok(staff_runs) => {
                next.staff_runs = staff_runs;
                next.set_status(Resource::StaffRuns, ResourceStatus::Loaded);
            }
            Err(err) => {
                if !same_day {
                    next.staff_runs.clear();
                }
                next.set_status(Resource::StaffRuns, ResourceStatus::Failed(err.to_string()));
            }
        }

        match load.staff_assignments {
            Ok(assignments) => {
                let matches = overlay::resolve(next.known_flights(), &assignments);
                next.overlay = OverlayState::Loaded(matches);
                next.set_status(Resource::StaffAssignments, ResourceStatus::Loaded);
            }
            Err(failure) => {
                next.overlay = OverlayState::Unavailable(failure);
                next.set_status(
                    Resource::StaffAssignments,
                    ResourceStatus::Failed(failure.to_string()),
                );
            }
        }

        Some(next)
    }

    /// Replaces runs and the unassigned pool wholesale (auto assignment).
    pub(crate) fn replace_runs(&self, payload: RunsPayload) -> Board {
        let mut next = self.clone();
        next.set_runs(payload.runs, payload.unassigned);
        next
    }

    // ======================== Assign ========================

    /// Moves an unassigned flight into a run as a provisional entry.
    pub(crate) fn place_provisional(
        &self,
        flight_id: &str,
        run_id: &str,
        provisional_id: &str,
    ) -> Result<(Board, Placement), MutationError> {
        let unassigned_index = self
            .unassigned
            .iter()
            .position(|f| f.id == flight_id)
            .ok_or_else(|| MutationError::FlightNotUnassigned(flight_id.to_string()))?;
        let ri = self
            .run_index(run_id)
            .ok_or_else(|| MutationError::UnknownRun(run_id.to_string()))?;

        let mut next = self.clone();
        let flight = next.unassigned.remove(unassigned_index);
        next.runs[ri]
            .flight_runs
            .push(FlightRun::provisional(provisional_id, flight.clone(), run_id));
        next.refresh(ri);

        Ok((
            next,
            Placement {
                flight,
                unassigned_index,
            },
        ))
    }

    /// Swaps a provisional entry for the confirmed flight run, at the
    /// confirmed position.
    pub(crate) fn confirm_provisional(&self, provisional_id: &str, mut confirmed: FlightRun) -> Board {
        let mut next = self.clone();
        let Some((ri, pos)) = next.locate(provisional_id) else {
            return next;
        };

        let run = &mut next.runs[ri];
        run.flight_runs.remove(pos);
        confirmed.provisional = false;
        let at = confirmed.sequence_index.min(run.flight_runs.len());
        run.flight_runs.insert(at, confirmed);
        next.refresh(ri);
        next
    }

    /// Drops a provisional entry and returns its flight to the pool.
    pub(crate) fn revert_provisional(&self, provisional_id: &str, placement: &Placement) -> Board {
        let mut next = self.clone();
        if let Some((ri, pos)) = next.locate(provisional_id) {
            next.runs[ri].flight_runs.remove(pos);
            next.refresh(ri);
        }
        if !next.holds_flight(&placement.flight.id) {
            let at = placement.unassigned_index.min(next.unassigned.len());
            next.unassigned.insert(at, placement.flight.clone());
        }
        next
    }

    // ======================== Unassign ========================

    /// Removes a flight run from its run and returns its flight to the pool.
    pub(crate) fn detach_flight_run(
        &self,
        flight_run_id: &str,
    ) -> Result<(Board, Detachment), MutationError> {
        let (ri, pos) = self
            .locate(flight_run_id)
            .ok_or_else(|| MutationError::UnknownFlightRun(flight_run_id.to_string()))?;
        if self.runs[ri].flight_runs[pos].provisional {
            return Err(MutationError::Provisional(flight_run_id.to_string()));
        }

        let mut next = self.clone();
        let flight_run = next.runs[ri].flight_runs.remove(pos);
        next.refresh(ri);
        next.unassigned.push(flight_run.flight.clone());

        let detachment = Detachment {
            run_id: next.runs[ri].id.clone(),
            index: pos,
            flight_run,
        };
        Ok((next, detachment))
    }

    /// Puts a detached flight run back where it was.
    pub(crate) fn restore_flight_run(&self, detachment: &Detachment) -> Board {
        let mut next = self.clone();
        let flight_id = detachment.flight_run.flight_id();
        let Some(ri) = next.run_index(&detachment.run_id) else {
            return next;
        };
        let Some(upos) = next.unassigned.iter().position(|f| f.id == flight_id) else {
            return next;
        };
        if next.locate(&detachment.flight_run.id).is_some() {
            return next;
        }

        next.unassigned.remove(upos);
        let run = &mut next.runs[ri];
        let at = detachment.index.min(run.flight_runs.len());
        run.flight_runs.insert(at, detachment.flight_run.clone());
        next.refresh(ri);
        next
    }

    // ======================== Reorder ========================

    /// Moves the row at `source_index` into the drop slot `target_index`
    /// of the target run.
    ///
    /// Slots are counted before the row is lifted out (`0..=len`), so within
    /// one run a forward drop shifts down by one. Returns `Ok(None)` when the
    /// row would land where it already is.
    pub(crate) fn move_flight_run(
        &self,
        source_run_id: &str,
        source_index: usize,
        target_run_id: &str,
        target_index: usize,
    ) -> Result<Option<(Board, Move)>, MutationError> {
        let si = self
            .run_index(source_run_id)
            .ok_or_else(|| MutationError::UnknownRun(source_run_id.to_string()))?;
        let ti = self
            .run_index(target_run_id)
            .ok_or_else(|| MutationError::UnknownRun(target_run_id.to_string()))?;

        let source = &self.runs[si];
        let entry = source
            .flight_runs
            .get(source_index)
            .ok_or_else(|| MutationError::IndexOutOfRange {
                run_id: source_run_id.to_string(),
                index: source_index,
                len: source.flight_count(),
            })?;
        if entry.provisional {
            return Err(MutationError::Provisional(entry.id.clone()));
        }

        let target_len = self.runs[ti].flight_count();
        if target_index > target_len {
            return Err(MutationError::IndexOutOfRange {
                run_id: target_run_id.to_string(),
                index: target_index,
                len: target_len,
            });
        }
        if si == ti && (target_index == source_index || target_index == source_index + 1) {
            return Ok(None);
        }
        let at = if si == ti && source_index < target_index {
            target_index - 1
        } else {
            target_index
        };

        let mut next = self.clone();
        let moved = next.runs[si].flight_runs.remove(source_index);
        let flight_run_id = moved.id.clone();
        next.runs[ti].flight_runs.insert(at, moved);
        next.refresh(si);
        if ti != si {
            next.refresh(ti);
        }

        let record = Move {
            flight_run_id,
            source_run_id: source_run_id.to_string(),
            source_index,
            target_run_id: target_run_id.to_string(),
        };
        Ok(Some((next, record)))
    }

    /// Moves a row back to where a [`Move`] took it from.
    pub(crate) fn undo_move(&self, record: &Move) -> Board {
        let mut next = self.clone();
        let Some((ri, pos)) = next.locate(&record.flight_run_id) else {
            return next;
        };
        if next.runs[ri].id != record.target_run_id {
            return next;
        }
        let Some(si) = next.run_index(&record.source_run_id) else {
            return next;
        };

        let entry = next.runs[ri].flight_runs.remove(pos);
        let at = record.source_index.min(next.runs[si].flight_runs.len());
        next.runs[si].flight_runs.insert(at, entry);
        next.refresh(ri);
        if si != ri {
            next.refresh(si);
        }
        next
    }

    // ======================== Field patch ========================

    /// Merges a patch into a flight run.
    pub(crate) fn patch_flight_run(
        &self,
        flight_run_id: &str,
        patch: &FlightRunPatch,
    ) -> Result<Board, MutationError> {
        let (ri, pos) = self
            .locate(flight_run_id)
            .ok_or_else(|| MutationError::UnknownFlightRun(flight_run_id.to_string()))?;
        if self.runs[ri].flight_runs[pos].provisional {
            return Err(MutationError::Provisional(flight_run_id.to_string()));
        }

        let mut next = self.clone();
        patch.apply(&mut next.runs[ri].flight_runs[pos]);
        Ok(next)
    }

    /// Adopts the operational fields the backend stored.
    pub(crate) fn refresh_flight_run(&self, stored: &FlightRun) -> Board {
        let mut next = self.clone();
        if let Some((ri, pos)) = next.locate(&stored.id) {
            next.runs[ri].flight_runs[pos].adopt_fields(stored);
        }
        next
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(ConflictThresholds::default())
    }
}
