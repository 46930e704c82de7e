//! Turns a finished plan into timestamped assignments and route totals.

use jiff::{Span, civil::Date};

use crate::matrix::CostMatrix;
use crate::model::{Assignment, Route, SolveError};
use crate::problem::Problem;
use crate::search::Plan;

/// Render minutes-since-midnight as an ISO timestamp on `day`.
pub(crate) fn timestamp(day: Date, minutes: i32) -> Result<String, SolveError> {
    let instant = day
        .at(0, 0, 0, 0)
        .checked_add(Span::new().minutes(i64::from(minutes)))?;
    Ok(instant.to_string())
}

/// Walk each vehicle's route in visit order, advancing a running clock from
/// the worker's work start. Depot nodes carry no assignment; route totals
/// count only the arcs into task nodes.
pub fn extract_routes(
    problem: &Problem,
    matrix: &CostMatrix,
    plan: &Plan,
    day: Date,
) -> Result<Vec<Route>, SolveError> {
    let mut routes = Vec::with_capacity(problem.workers.len());

    for (vehicle, worker) in problem.workers.iter().enumerate() {
        let mut assignments = Vec::new();
        let mut clock = worker.work_start_minutes;
        let mut prev = problem.depot(vehicle);
        let mut total_distance_m: i64 = 0;
        let mut total_minutes: i32 = 0;
        let mut order = 0;

        for &node in &plan.routes[vehicle] {
            let Some(task) = problem.node_task[node] else {
                continue;
            };

            let travel = matrix.travel_min(prev, node);
            clock += travel;
            let end_minute = clock + task.duration_minutes;

            assignments.push(Assignment {
                task_id: task.id.clone(),
                client_id: task.client_id.clone(),
                order,
                start_time: timestamp(day, clock)?,
                end_time: timestamp(day, end_minute)?,
                travel_minutes: travel,
            });

            clock = end_minute;
            total_distance_m += i64::from(matrix.distance_m(prev, node));
            total_minutes += travel + task.duration_minutes;
            order += 1;
            prev = node;
        }

        let work_minutes = worker.work_minutes();
        let efficiency = if work_minutes > 0 {
            round2(f64::from(total_minutes) / f64::from(work_minutes))
        } else {
            0.0
        };

        routes.push(Route {
            worker_id: worker.id.clone(),
            worker_name: worker.name.clone(),
            assignments,
            total_distance_km: round2(total_distance_m as f64 / 1000.0),
            total_duration_minutes: total_minutes,
            efficiency,
        });
    }

    Ok(routes)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
