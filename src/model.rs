//! Boundary types for one optimization run.
//!
//! Nested route/assignment fields serialize in camelCase to match the
//! scheduling service wire format; the top-level summary stays snake_case.
//! Inputs are supplied by the caller and only read during a solve.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Depot used for workers without a home location (central Copenhagen).
pub const DEFAULT_DEPOT: LatLng = LatLng {
    lat: 55.6761,
    lng: 12.5683,
};

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A mobile worker: one vehicle in the routing problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub home_location: Option<LatLng>,
    /// Work window start, minutes since midnight.
    #[serde(default = "default_work_start")]
    pub work_start_minutes: i32,
    /// Work window end, minutes since midnight.
    #[serde(default = "default_work_end")]
    pub work_end_minutes: i32,
    /// Contractual daily maximum. Carried as data; the route constraint
    /// binds the work window, not this field.
    #[serde(default = "default_max_work")]
    pub max_work_minutes: i32,
}

impl Worker {
    /// Route start/end coordinate for this worker.
    pub fn depot(&self) -> LatLng {
        self.home_location.unwrap_or(DEFAULT_DEPOT)
    }

    /// Length of the work window in minutes.
    pub fn work_minutes(&self) -> i32 {
        self.work_end_minutes - self.work_start_minutes
    }
}

/// A field-service task at one client's location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub client_id: String,
    pub duration_minutes: i32,
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// Advisory window start ("HH:MM"). Accepted and carried but not yet
    /// bound as a constraint.
    #[serde(default)]
    pub window_start: Option<String>,
    /// Advisory window end ("HH:MM"). See `window_start`.
    #[serde(default)]
    pub window_end: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
}

/// A client location lookup entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub location: LatLng,
}

/// Per-request solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveConfig {
    /// Wall-clock budget for the search phase.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub include_traffic: bool,
    /// Divides the assumed average speed when traffic is enabled.
    #[serde(default = "default_traffic_multiplier")]
    pub traffic_multiplier: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            include_traffic: false,
            traffic_multiplier: default_traffic_multiplier(),
        }
    }
}

/// One scheduled task within a worker's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub task_id: String,
    pub client_id: String,
    /// Zero-based, contiguous position within the route.
    pub order: usize,
    /// ISO timestamp of service start.
    pub start_time: String,
    /// ISO timestamp of service end.
    pub end_time: String,
    /// Travel immediately preceding this task, in minutes.
    pub travel_minutes: i32,
}

/// One worker's ordered day plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub worker_id: String,
    pub worker_name: String,
    pub assignments: Vec<Assignment>,
    pub total_distance_km: f64,
    /// Travel plus service over the whole route.
    pub total_duration_minutes: i32,
    /// Route duration over available work duration, 2 decimals.
    pub efficiency: f64,
}

/// Result envelope for one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveSummary {
    pub success: bool,
    pub routes: Vec<Route>,
    pub computation_time_ms: u64,
    pub tasks_assigned: usize,
    pub tasks_unassigned: usize,
}

/// Faults that abort a run. Infeasibility and unroutable tasks are not
/// errors; they fall back or surface as unassigned counts.
#[derive(Debug, Error)]
pub enum SolveError {
    /// A numeric input field was malformed (non-finite or out of range).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Timestamp arithmetic failed while laying out a route.
    #[error("timestamp arithmetic failed: {0}")]
    Timestamp(#[from] jiff::Error),
}

fn default_work_start() -> i32 {
    480 // 08:00
}

fn default_work_end() -> i32 {
    960 // 16:00
}

fn default_max_work() -> i32 {
    444 // 7.4 hours
}

fn default_timeout() -> u64 {
    30
}

fn default_traffic_multiplier() -> f64 {
    1.2
}

fn default_priority() -> String {
    "normal".to_string()
}
