//! Shared fixtures: an in-memory planning backend with scripted failures.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::Notify;

use u_runboard::error::BackendError;
use u_runboard::models::{
    DayQuery, Flight, FlightRun, FlightRunPatch, RosterEntry, Run, StaffAssignment, StaffRun,
};
use u_runboard::store::{
    AssignRequest, AutoAssignRequest, FailureEvent, FailureObserver, PlanningBackend, RunLayout,
    RunsPayload,
};

/// Endpoints the fake can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Flights,
    Runs,
    EmployeeAssignments,
    Roster,
    StaffRuns,
    Assign,
    Unassign,
    UpdateFlightRun,
    UpdateLayout,
    AutoAssign,
}

#[derive(Default)]
struct ServerState {
    runs: Vec<Run>,
    unassigned: Vec<Flight>,
    assignments: Vec<StaffAssignment>,
    assignments_unavailable: bool,
    roster: Vec<RosterEntry>,
    staff_runs: Vec<StaffRun>,
    failing: HashSet<Endpoint>,
    layouts: Vec<Vec<RunLayout>>,
    next_id: usize,
}

/// In-memory backend. Mutations update its own copy of the day so later
/// loads see them.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<ServerState>,
    calls: Mutex<HashMap<Endpoint, usize>>,
    gate: Mutex<Option<Arc<Notify>>>,
    overlay_delay_ms: AtomicUsize,
}

impl FakeBackend {
    pub fn new(runs: Vec<Run>, unassigned: Vec<Flight>) -> Arc<Self> {
        let backend = Self::default();
        {
            let mut state = backend.state.lock();
            state.runs = runs;
            state.unassigned = unassigned;
            state.next_id = 100;
        }
        Arc::new(backend)
    }

    pub fn with_assignments(self: Arc<Self>, assignments: Vec<StaffAssignment>) -> Arc<Self> {
        self.state.lock().assignments = assignments;
        self
    }

    pub fn with_roster(self: Arc<Self>, roster: Vec<RosterEntry>, staff_runs: Vec<StaffRun>) -> Arc<Self> {
        {
            let mut state = self.state.lock();
            state.roster = roster;
            state.staff_runs = staff_runs;
        }
        self
    }

    pub fn set_failing(&self, endpoint: Endpoint, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing.insert(endpoint);
        } else {
            state.failing.remove(&endpoint);
        }
    }

    pub fn set_assignments_unavailable(&self, unavailable: bool) {
        self.state.lock().assignments_unavailable = unavailable;
    }

    pub fn set_overlay_delay_ms(&self, ms: usize) {
        self.overlay_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Holds every mutation until the returned notifier fires.
    pub fn hold_mutations(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&notify));
        notify
    }

    pub fn release_mutations(&self) {
        *self.gate.lock() = None;
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls.lock().get(&endpoint).copied().unwrap_or(0)
    }

    pub fn layouts(&self) -> Vec<Vec<RunLayout>> {
        self.state.lock().layouts.clone()
    }

    pub fn server_run_ids(&self, run_id: &str) -> Vec<String> {
        self.state
            .lock()
            .runs
            .iter()
            .find(|r| r.id == run_id)
            .map(|r| r.flight_runs.iter().map(|fr| fr.id.clone()).collect())
            .unwrap_or_default()
    }

    fn enter(&self, endpoint: Endpoint) -> Result<(), BackendError> {
        *self.calls.lock().entry(endpoint).or_default() += 1;
        if self.state.lock().failing.contains(&endpoint) {
            return Err(BackendError::Http {
                status: 500,
                message: format!("{endpoint:?} failed"),
            });
        }
        Ok(())
    }

    /// Every mutation yields once, so concurrent callers interleave.
    async fn gate(&self) {
        tokio::task::yield_now().await;
        let gate = self.gate.lock().clone();
        if let Some(notify) = gate {
            notify.notified().await;
        }
    }
}

#[async_trait]
impl PlanningBackend for FakeBackend {
    async fn flights(&self, _query: &DayQuery) -> Result<Vec<Flight>, BackendError> {
        self.enter(Endpoint::Flights)?;
        let state = self.state.lock();
        let flights = state
            .runs
            .iter()
            .flat_map(|r| r.flight_runs.iter().map(|fr| fr.flight.clone()))
            .chain(state.unassigned.iter().cloned())
            .collect();
        Ok(flights)
    }

    async fn runs(&self, _query: &DayQuery) -> Result<RunsPayload, BackendError> {
        self.enter(Endpoint::Runs)?;
        let state = self.state.lock();
        Ok(RunsPayload::new(state.runs.clone(), state.unassigned.clone()))
    }

    async fn employee_assignments(
        &self,
        _query: &DayQuery,
    ) -> Result<Vec<StaffAssignment>, BackendError> {
        self.enter(Endpoint::EmployeeAssignments)?;
        let delay = self.overlay_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay as u64)).await;
        }
        let state = self.state.lock();
        if state.assignments_unavailable {
            return Err(BackendError::Unavailable);
        }
        Ok(state.assignments.clone())
    }

    async fn roster(&self, _query: &DayQuery) -> Result<Vec<RosterEntry>, BackendError> {
        self.enter(Endpoint::Roster)?;
        Ok(self.state.lock().roster.clone())
    }

    async fn staff_runs(&self, _query: &DayQuery) -> Result<Vec<StaffRun>, BackendError> {
        self.enter(Endpoint::StaffRuns)?;
        Ok(self.state.lock().staff_runs.clone())
    }

    async fn assign(&self, request: &AssignRequest) -> Result<FlightRun, BackendError> {
        self.gate().await;
        self.enter(Endpoint::Assign)?;
        let mut state = self.state.lock();
        let pos = state
            .unassigned
            .iter()
            .position(|f| f.id == request.flight_id)
            .ok_or_else(|| BackendError::NotFound(request.flight_id.clone()))?;
        if !state.runs.iter().any(|r| r.id == request.run_id) {
            return Err(BackendError::NotFound(request.run_id.clone()));
        }
        let flight = state.unassigned.remove(pos);
        state.next_id += 1;
        let id = format!("FR{}", state.next_id);
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == request.run_id)
            .ok_or_else(|| BackendError::NotFound(request.run_id.clone()))?;
        let confirmed = FlightRun::new(id, flight, &request.run_id).with_sequence(run.flight_count());
        run.flight_runs.push(confirmed.clone());
        Ok(confirmed)
    }

    async fn unassign(&self, flight_run_id: &str) -> Result<(), BackendError> {
        self.gate().await;
        self.enter(Endpoint::Unassign)?;
        let mut state = self.state.lock();
        let mut removed = None;
        for run in &mut state.runs {
            if let Some(pos) = run.position_of(flight_run_id) {
                removed = Some(run.flight_runs.remove(pos));
                run.renumber();
            }
        }
        let removed = removed.ok_or_else(|| BackendError::NotFound(flight_run_id.to_string()))?;
        state.unassigned.push(removed.flight);
        Ok(())
    }

    async fn update_flight_run(
        &self,
        flight_run_id: &str,
        patch: &FlightRunPatch,
    ) -> Result<FlightRun, BackendError> {
        self.gate().await;
        self.enter(Endpoint::UpdateFlightRun)?;
        let mut state = self.state.lock();
        let entry = state
            .runs
            .iter_mut()
            .flat_map(|r| r.flight_runs.iter_mut())
            .find(|fr| fr.id == flight_run_id)
            .ok_or_else(|| BackendError::NotFound(flight_run_id.to_string()))?;
        patch.apply(entry);
        Ok(entry.clone())
    }

    async fn update_layout(&self, layout: &[RunLayout]) -> Result<(), BackendError> {
        self.gate().await;
        self.enter(Endpoint::UpdateLayout)?;
        let mut state = self.state.lock();
        state.layouts.push(layout.to_vec());

        let mut pool: HashMap<String, FlightRun> = HashMap::new();
        for run in &mut state.runs {
            for fr in run.flight_runs.drain(..) {
                pool.insert(fr.id.clone(), fr);
            }
        }
        let mut leftovers: HashMap<String, Vec<FlightRun>> = HashMap::new();
        let order: HashMap<&str, &RunLayout> =
            layout.iter().map(|l| (l.run_id.as_str(), l)).collect();
        for run in &mut state.runs {
            if let Some(l) = order.get(run.id.as_str()) {
                for id in &l.ordered_flight_run_ids {
                    if let Some(fr) = pool.remove(id) {
                        run.flight_runs.push(fr);
                    }
                }
            }
        }
        for (_, fr) in pool {
            leftovers.entry(fr.run_id.clone()).or_default().push(fr);
        }
        for run in &mut state.runs {
            if let Some(rest) = leftovers.remove(&run.id) {
                run.flight_runs.extend(rest);
            }
            run.renumber();
        }
        Ok(())
    }

    async fn auto_assign(&self, _request: &AutoAssignRequest) -> Result<RunsPayload, BackendError> {
        self.enter(Endpoint::AutoAssign)?;
        let mut state = self.state.lock();
        let run_count = state.runs.len();
        if run_count > 0 {
            let flights: Vec<Flight> = state.unassigned.drain(..).collect();
            for (i, flight) in flights.into_iter().enumerate() {
                state.next_id += 1;
                let id = format!("FR{}", state.next_id);
                let run = &mut state.runs[i % run_count];
                let fr = FlightRun::new(id, flight, run.id.clone()).with_sequence(run.flight_count());
                run.flight_runs.push(fr);
            }
        }
        Ok(RunsPayload::new(state.runs.clone(), state.unassigned.clone()))
    }
}

/// Observer that keeps every event.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<FailureEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<FailureEvent> {
        self.events.lock().clone()
    }
}

impl FailureObserver for RecordingObserver {
    fn on_failure(&self, event: &FailureEvent) {
        self.events.lock().push(event.clone());
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn day() -> DayQuery {
    DayQuery::new(
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"),
        "SYD",
        "JQ",
    )
}

pub fn flight(id: &str, number: &str, time: &str) -> Flight {
    Flight::new(id, number).with_scheduled_time(time)
}

pub fn flight_run(id: &str, flight: Flight) -> FlightRun {
    FlightRun::new(id, flight, "")
}

/// Two runs and two unassigned flights:
///
/// - R1: FR1 (F1 06:00), FR2 (F2 07:00), FR3 (F3 08:00)
/// - R2: FR4 (F4 09:00)
/// - pool: F5 (09:05), F6 (12:00)
pub fn sample_backend() -> Arc<FakeBackend> {
    let r1 = Run::new("R1", "Run 1")
        .with_operator("JQ")
        .with_flight_run(flight_run("FR1", flight("F1", "JQ401", "06:00")))
        .with_flight_run(flight_run("FR2", flight("F2", "JQ402", "07:00")))
        .with_flight_run(flight_run("FR3", flight("F3", "JQ403", "08:00")));
    let r2 = Run::new("R2", "Run 2")
        .with_operator("JQ")
        .with_flight_run(flight_run("FR4", flight("F4", "JQ404", "09:00")));
    FakeBackend::new(
        vec![r1, r2],
        vec![flight("F5", "JQ405", "09:05"), flight("F6", "JQ406", "12:00")],
    )
}

pub fn ids(run: &Run) -> Vec<&str> {
    run.flight_runs.iter().map(|fr| fr.id.as_str()).collect()
}

pub fn sequences(run: &Run) -> Vec<usize> {
    run.flight_runs.iter().map(|fr| fr.sequence_index).collect()
}
