//! Greedy fallback scheduling for when the search finds no feasible plan.
//!
//! Deterministic and non-optimizing: the point is that a structurally valid
//! response can always be produced. The constants here are part of the
//! service contract; do not tune them.

use jiff::civil::Date;

use crate::extract::timestamp;
use crate::model::{Assignment, Route, SolveError, Task, Worker};
use crate::problem::can_serve;

/// Most tasks a single worker claims in one fallback pass.
const MAX_TASKS_PER_WORKER: usize = 5;
/// Flat buffer between consecutive fallback tasks.
const TASK_BUFFER_MINUTES: i32 = 15;
/// Placeholder travel estimate; the fallback never consults the matrix.
const PLACEHOLDER_TRAVEL_MINUTES: i32 = 10;

/// Assign up to five still-unclaimed eligible tasks per worker, back-to-back
/// from the worker's work start, stopping before the work window ends. Tasks
/// nobody claims stay unassigned.
pub fn fallback_routes(
    workers: &[Worker],
    tasks: &[Task],
    day: Date,
) -> Result<Vec<Route>, SolveError> {
    let mut remaining: Vec<&Task> = tasks.iter().collect();
    let mut routes = Vec::with_capacity(workers.len());

    for worker in workers {
        let mut assignments = Vec::new();
        let mut clock = worker.work_start_minutes;
        let mut order = 0;

        let picks: Vec<usize> = remaining
            .iter()
            .enumerate()
            .filter(|(_, task)| can_serve(worker, task))
            .map(|(slot, _)| slot)
            .take(MAX_TASKS_PER_WORKER)
            .collect();

        let mut claimed = Vec::new();
        for &slot in &picks {
            let task = remaining[slot];
            if clock + task.duration_minutes > worker.work_end_minutes {
                break;
            }

            let end_minute = clock + task.duration_minutes;
            assignments.push(Assignment {
                task_id: task.id.clone(),
                client_id: task.client_id.clone(),
                order,
                start_time: timestamp(day, clock)?,
                end_time: timestamp(day, end_minute)?,
                travel_minutes: PLACEHOLDER_TRAVEL_MINUTES,
            });

            clock = end_minute + TASK_BUFFER_MINUTES;
            order += 1;
            claimed.push(slot);
        }

        for &slot in claimed.iter().rev() {
            remaining.remove(slot);
        }

        let total_travel: i32 = assignments.iter().map(|a| a.travel_minutes).sum();
        routes.push(Route {
            worker_id: worker.id.clone(),
            worker_name: worker.name.clone(),
            assignments,
            total_distance_km: 0.0,
            total_duration_minutes: total_travel,
            efficiency: 0.5,
        });
    }

    Ok(routes)
}
