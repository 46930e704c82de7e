use field_planner::model::{Client, LatLng, SolveConfig, Task, Worker};
use field_planner::solver::solve;

fn worker(id: &str, skill: &str) -> Worker {
    Worker {
        id: id.to_string(),
        name: id.to_string(),
        skills: vec![skill.to_string()],
        home_location: Some(LatLng {
            lat: 55.6761,
            lng: 12.5683,
        }),
        work_start_minutes: 480,
        work_end_minutes: 960,
        max_work_minutes: 444,
    }
}

fn task(id: &str, client_id: &str, skill: &str) -> Task {
    Task {
        id: id.to_string(),
        client_id: client_id.to_string(),
        duration_minutes: 45,
        required_skills: vec![skill.to_string()],
        window_start: None,
        window_end: None,
        priority: "normal".to_string(),
    }
}

fn client(id: &str, lat: f64, lng: f64) -> Client {
    Client {
        id: id.to_string(),
        location: LatLng { lat, lng },
    }
}

#[test]
fn smoke_two_workers_three_tasks() {
    let workers = vec![worker("anna", "clean"), worker("bo", "repair")];
    let clients = vec![
        client("c1", 55.70, 12.55),
        client("c2", 55.65, 12.60),
        client("c3", 55.68, 12.52),
    ];
    let tasks = vec![
        task("t1", "c1", "clean"),
        task("t2", "c2", "repair"),
        task("t3", "c3", "clean"),
    ];

    let config = SolveConfig {
        timeout_seconds: 0,
        ..SolveConfig::default()
    };
    let summary = solve(&workers, &tasks, &clients, &config).expect("solve succeeds");

    assert!(summary.success);
    assert_eq!(summary.routes.len(), 2);
    assert_eq!(summary.tasks_assigned + summary.tasks_unassigned, 3);
    assert_eq!(summary.tasks_assigned, 3);

    for route in &summary.routes {
        for (expected, assignment) in route.assignments.iter().enumerate() {
            assert_eq!(assignment.order, expected);
        }
    }
}
