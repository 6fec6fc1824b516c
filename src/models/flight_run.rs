//! Flight-run model.
//!
//! A flight run is the assignment record linking one [`Flight`] to one
//! [`Run`](super::Run). It carries its position within the run and the
//! operational fields the ground crew fill in during the shift.

use serde::{Deserialize, Serialize};

use super::Flight;

/// Operational status of a flight run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightRunStatus {
    /// Not started.
    #[default]
    Planned,
    /// Crew is servicing the flight.
    InProgress,
    /// Servicing complete.
    Done,
}

/// Assignment of one flight to one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRun {
    /// Unique flight-run identifier.
    pub id: String,
    /// The assigned flight.
    pub flight: Flight,
    /// Owning run identifier.
    pub run_id: String,
    /// Position within the run (0-indexed, contiguous).
    #[serde(default)]
    pub sequence_index: usize,
    /// Parking bay.
    #[serde(default)]
    pub bay: Option<String>,
    /// Vehicle registration.
    #[serde(default)]
    pub vehicle_rego: Option<String>,
    /// Whether the service was on time.
    #[serde(default)]
    pub on_time: Option<bool>,
    /// Operational status.
    #[serde(default)]
    pub status: FlightRunStatus,
    /// Meter start figure.
    #[serde(default)]
    pub start_figure: Option<f64>,
    /// Uplift quantity.
    #[serde(default)]
    pub uplift_quantity: Option<f64>,
    /// Local placeholder awaiting backend confirmation.
    #[serde(skip)]
    pub provisional: bool,
    /// Derived: part of a tight connection in its run.
    #[serde(skip)]
    pub is_tight_connection: bool,
}

/// A partial update to a flight run's operational fields.
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightRunPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_rego: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FlightRunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_figure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplift_quantity: Option<f64>,
}

impl FlightRun {
    /// Creates a planned flight run at position 0.
    pub fn new(id: impl Into<String>, flight: Flight, run_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            flight,
            run_id: run_id.into(),
            sequence_index: 0,
            bay: None,
            vehicle_rego: None,
            on_time: None,
            status: FlightRunStatus::Planned,
            start_figure: None,
            uplift_quantity: None,
            provisional: false,
            is_tight_connection: false,
        }
    }

    /// Creates a provisional flight run shown while an assignment is pending.
    pub fn provisional(id: impl Into<String>, flight: Flight, run_id: impl Into<String>) -> Self {
        Self {
            provisional: true,
            ..Self::new(id, flight, run_id)
        }
    }

    /// Sets the sequence index.
    pub fn with_sequence(mut self, sequence_index: usize) -> Self {
        self.sequence_index = sequence_index;
        self
    }

    /// Sets the bay.
    pub fn with_bay(mut self, bay: impl Into<String>) -> Self {
        self.bay = Some(bay.into());
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: FlightRunStatus) -> Self {
        self.status = status;
        self
    }

    /// Identifier of the assigned flight.
    #[inline]
    pub fn flight_id(&self) -> &str {
        &self.flight.id
    }

    /// Copies the operational fields from a backend copy of this record.
    ///
    /// Identity, position and derived flags are left alone.
    pub fn adopt_fields(&mut self, other: &FlightRun) {
        self.bay = other.bay.clone();
        self.vehicle_rego = other.vehicle_rego.clone();
        self.on_time = other.on_time;
        self.status = other.status;
        self.start_figure = other.start_figure;
        self.uplift_quantity = other.uplift_quantity;
    }
}

impl FlightRunPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bay.
    pub fn with_bay(mut self, bay: impl Into<String>) -> Self {
        self.bay = Some(bay.into());
        self
    }

    /// Sets the vehicle registration.
    pub fn with_vehicle_rego(mut self, rego: impl Into<String>) -> Self {
        self.vehicle_rego = Some(rego.into());
        self
    }

    /// Sets the on-time flag.
    pub fn with_on_time(mut self, on_time: bool) -> Self {
        self.on_time = Some(on_time);
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: FlightRunStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the start figure.
    pub fn with_start_figure(mut self, figure: f64) -> Self {
        self.start_figure = Some(figure);
        self
    }

    /// Sets the uplift quantity.
    pub fn with_uplift_quantity(mut self, quantity: f64) -> Self {
        self.uplift_quantity = Some(quantity);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merges the patch into a flight run.
    pub fn apply(&self, target: &mut FlightRun) {
        if let Some(bay) = &self.bay {
            target.bay = Some(bay.clone());
        }
        if let Some(rego) = &self.vehicle_rego {
            target.vehicle_rego = Some(rego.clone());
        }
        if let Some(on_time) = self.on_time {
            target.on_time = Some(on_time);
        }
        if let Some(status) = self.status {
            target.status = status;
        }
        if let Some(figure) = self.start_figure {
            target.start_figure = Some(figure);
        }
        if let Some(quantity) = self.uplift_quantity {
            target.uplift_quantity = Some(quantity);
        }
    }
}
