//! Top-level optimization entry point.

use std::time::{Duration, Instant};

use jiff::Zoned;
use tracing::{info, warn};

use crate::extract::extract_routes;
use crate::fallback::fallback_routes;
use crate::matrix::{CostMatrix, Haversine};
use crate::model::{Client, Route, SolveConfig, SolveError, SolveSummary, Task, Worker};
use crate::problem::Problem;
use crate::search::search;

/// Largest accepted search budget, in seconds.
const MAX_TIMEOUT_SECONDS: u64 = 3600;

/// Run one optimization: encode the problem, search under the configured
/// budget, and extract a schedule. Falls back to greedy assignment when no
/// feasible plan exists; empty worker or task lists short-circuit to an
/// empty route list.
pub fn solve(
    workers: &[Worker],
    tasks: &[Task],
    clients: &[Client],
    config: &SolveConfig,
) -> Result<SolveSummary, SolveError> {
    let started = Instant::now();
    validate(workers, tasks, clients, config)?;

    if workers.is_empty() || tasks.is_empty() {
        return Ok(summarize(Vec::new(), tasks.len(), started));
    }

    let day = Zoned::now().date();
    let problem = Problem::encode(workers, tasks, clients);
    info!(
        workers = workers.len(),
        tasks = tasks.len(),
        nodes = problem.locations.len(),
        dropped = problem.dropped_count(),
        "encoded routing problem"
    );

    let matrix = CostMatrix::build(&problem.locations, &Haversine, config);
    let budget = Duration::from_secs(config.timeout_seconds);

    let routes = match search(&problem, &matrix, budget) {
        Some(plan) => extract_routes(&problem, &matrix, &plan, day)?,
        None => {
            warn!("no feasible plan found, using greedy fallback");
            fallback_routes(workers, tasks, day)?
        }
    };

    let summary = summarize(routes, tasks.len(), started);
    info!(
        assigned = summary.tasks_assigned,
        unassigned = summary.tasks_unassigned,
        elapsed_ms = summary.computation_time_ms,
        "optimization finished"
    );
    Ok(summary)
}

fn summarize(routes: Vec<Route>, total_tasks: usize, started: Instant) -> SolveSummary {
    let tasks_assigned: usize = routes.iter().map(|r| r.assignments.len()).sum();
    SolveSummary {
        success: true,
        routes,
        computation_time_ms: started.elapsed().as_millis() as u64,
        tasks_assigned,
        tasks_unassigned: total_tasks - tasks_assigned,
    }
}

/// Reject malformed numeric input up front rather than corrupting a run.
fn validate(
    workers: &[Worker],
    tasks: &[Task],
    clients: &[Client],
    config: &SolveConfig,
) -> Result<(), SolveError> {
    for worker in workers {
        if let Some(home) = worker.home_location {
            check_coordinate(home.lat, home.lng, &format!("worker {}", worker.id))?;
        }
        if worker.work_start_minutes < 0 || worker.work_end_minutes < 0 {
            return Err(SolveError::InvalidInput(format!(
                "worker {} has a negative work window bound",
                worker.id
            )));
        }
    }

    for task in tasks {
        if task.duration_minutes < 0 {
            return Err(SolveError::InvalidInput(format!(
                "task {} has a negative duration",
                task.id
            )));
        }
    }

    for client in clients {
        check_coordinate(
            client.location.lat,
            client.location.lng,
            &format!("client {}", client.id),
        )?;
    }

    if !config.traffic_multiplier.is_finite() || config.traffic_multiplier <= 0.0 {
        return Err(SolveError::InvalidInput(
            "traffic multiplier must be a positive finite number".to_string(),
        ));
    }
    if config.timeout_seconds > MAX_TIMEOUT_SECONDS {
        return Err(SolveError::InvalidInput(format!(
            "timeout of {}s exceeds the {}s limit",
            config.timeout_seconds, MAX_TIMEOUT_SECONDS
        )));
    }

    Ok(())
}

fn check_coordinate(lat: f64, lng: f64, owner: &str) -> Result<(), SolveError> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err(SolveError::InvalidInput(format!(
            "{} has a non-finite coordinate",
            owner
        )));
    }
    Ok(())
}
