//! Routing graph encoding: node arena, service times, skill eligibility.

use std::collections::HashMap;
use std::ops::Range;

use tracing::debug;

use crate::model::{Client, LatLng, Task, Worker};

/// Penalty charged for leaving a droppable node unvisited.
pub const DROP_PENALTY: i64 = 100_000;

/// Upper bound on any route's cumulative minutes, independent of the work
/// window.
pub const MAX_ROUTE_MINUTES: i32 = 600;

/// The routing graph for one solve call.
///
/// Depot nodes come first, one per worker in input order (route start and
/// end are the same node). Then one node per task whose client id resolves;
/// tasks pointing at unknown clients get no node at all.
#[derive(Debug)]
pub struct Problem<'a> {
    pub workers: &'a [Worker],
    /// Node coordinates, depots first.
    pub locations: Vec<LatLng>,
    /// Task behind each node; `None` at depots.
    pub node_task: Vec<Option<&'a Task>>,
    /// Service minutes per node; zero at depots.
    pub service_min: Vec<i32>,
    /// Vehicles qualified to serve each node, in worker input order.
    pub eligible: Vec<Vec<usize>>,
    /// Task nodes no worker is qualified for; never routed, charged
    /// `DROP_PENALTY` apiece in plan scoring.
    pub droppable: Vec<bool>,
}

impl<'a> Problem<'a> {
    pub fn encode(workers: &'a [Worker], tasks: &'a [Task], clients: &'a [Client]) -> Self {
        let client_map: HashMap<&str, &Client> =
            clients.iter().map(|c| (c.id.as_str(), c)).collect();

        let mut locations: Vec<LatLng> = workers.iter().map(Worker::depot).collect();
        let mut node_task: Vec<Option<&Task>> = vec![None; workers.len()];
        let mut service_min = vec![0; workers.len()];
        let mut eligible: Vec<Vec<usize>> = vec![Vec::new(); workers.len()];
        let mut droppable = vec![false; workers.len()];

        for task in tasks {
            let Some(client) = client_map.get(task.client_id.as_str()) else {
                debug!(task = %task.id, client = %task.client_id, "dropping task with unknown client");
                continue;
            };

            let vehicles: Vec<usize> = workers
                .iter()
                .enumerate()
                .filter(|(_, w)| can_serve(w, task))
                .map(|(v, _)| v)
                .collect();

            locations.push(client.location);
            node_task.push(Some(task));
            service_min.push(task.duration_minutes);
            droppable.push(vehicles.is_empty());
            eligible.push(vehicles);
        }

        Self {
            workers,
            locations,
            node_task,
            service_min,
            eligible,
            droppable,
        }
    }

    pub fn num_vehicles(&self) -> usize {
        self.workers.len()
    }

    /// Depot node index for a vehicle (start = end).
    pub fn depot(&self, vehicle: usize) -> usize {
        vehicle
    }

    /// Indices of all task nodes.
    pub fn task_nodes(&self) -> Range<usize> {
        self.workers.len()..self.locations.len()
    }

    /// Cumulative-minutes bound for a vehicle's route, return arc included.
    pub fn vehicle_cap(&self, vehicle: usize) -> i32 {
        self.workers[vehicle]
            .work_minutes()
            .max(0)
            .min(MAX_ROUTE_MINUTES)
    }

    /// Number of task nodes nobody can serve.
    pub fn dropped_count(&self) -> usize {
        self.droppable.iter().filter(|d| **d).count()
    }
}

/// True when the worker's skill set covers every skill the task requires.
pub fn can_serve(worker: &Worker, task: &Task) -> bool {
    task.required_skills
        .iter()
        .all(|skill| worker.skills.contains(skill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_DEPOT;

    fn worker(id: &str, skills: &[&str]) -> Worker {
        Worker {
            id: id.to_string(),
            name: id.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            home_location: Some(LatLng {
                lat: 55.70,
                lng: 12.50,
            }),
            work_start_minutes: 480,
            work_end_minutes: 960,
            max_work_minutes: 444,
        }
    }

    fn task(id: &str, client_id: &str, skills: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            client_id: client_id.to_string(),
            duration_minutes: 45,
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            window_start: None,
            window_end: None,
            priority: "normal".to_string(),
        }
    }

    fn client(id: &str) -> Client {
        Client {
            id: id.to_string(),
            location: LatLng {
                lat: 55.68,
                lng: 12.57,
            },
        }
    }

    #[test]
    fn test_node_count_is_workers_plus_resolvable_tasks() {
        let workers = vec![worker("w1", &[]), worker("w2", &[])];
        let tasks = vec![task("t1", "c1", &[]), task("t2", "c1", &[])];
        let clients = vec![client("c1")];

        let problem = Problem::encode(&workers, &tasks, &clients);

        assert_eq!(problem.locations.len(), 4);
        assert_eq!(problem.task_nodes(), 2..4);
        assert_eq!(problem.service_min[2], 45);
    }

    #[test]
    fn test_unknown_client_excludes_task() {
        let workers = vec![worker("w1", &[])];
        let tasks = vec![task("t1", "missing", &[]), task("t2", "c1", &[])];
        let clients = vec![client("c1")];

        let problem = Problem::encode(&workers, &tasks, &clients);

        assert_eq!(problem.task_nodes().len(), 1, "only t2 should get a node");
        assert_eq!(problem.node_task[1].map(|t| t.id.as_str()), Some("t2"));
    }

    #[test]
    fn test_eligibility_requires_skill_superset() {
        let workers = vec![
            worker("plumber", &["plumbing"]),
            worker("both", &["plumbing", "electrical"]),
        ];
        let tasks = vec![task("t1", "c1", &["plumbing", "electrical"])];
        let clients = vec![client("c1")];

        let problem = Problem::encode(&workers, &tasks, &clients);

        assert_eq!(problem.eligible[2], vec![1], "only the superset worker qualifies");
        assert!(!problem.droppable[2]);
    }

    #[test]
    fn test_unservable_task_marked_droppable() {
        let workers = vec![worker("w1", &["clean"])];
        let tasks = vec![task("t1", "c1", &["cook"])];
        let clients = vec![client("c1")];

        let problem = Problem::encode(&workers, &tasks, &clients);

        assert!(problem.droppable[1]);
        assert!(problem.eligible[1].is_empty());
        assert_eq!(problem.dropped_count(), 1);
    }

    #[test]
    fn test_missing_home_defaults_to_fixed_depot() {
        let mut w = worker("w1", &[]);
        w.home_location = None;
        let workers = [w];
        let problem = Problem::encode(&workers, &[], &[]);

        assert_eq!(problem.locations[0], DEFAULT_DEPOT);
    }

    #[test]
    fn test_vehicle_cap_clamps_to_horizon() {
        let mut w = worker("w1", &[]);
        w.work_start_minutes = 300;
        w.work_end_minutes = 1200; // 900-minute window
        let workers = [w];
        let problem = Problem::encode(&workers, &[], &[]);

        assert_eq!(problem.vehicle_cap(0), MAX_ROUTE_MINUTES);
    }
}
