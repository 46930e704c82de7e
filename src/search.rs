//! Two-phase route search: cheapest insertion, then guided local search.
//!
//! Both phases are deterministic (no RNG; ties break in input order). The
//! improvement phase runs against a wall-clock deadline and always returns
//! the best feasible plan seen so far, so a zero budget yields exactly the
//! constructed plan.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::matrix::CostMatrix;
use crate::problem::{DROP_PENALTY, Problem};

/// One route per vehicle, as task-node indices in visit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub routes: Vec<Vec<usize>>,
}

/// Undirected arc penalties for guided local search.
struct Penalties {
    arcs: HashMap<(usize, usize), i64>,
    /// Weight of one penalty unit in the augmented objective.
    lambda: i64,
}

impl Penalties {
    fn new(lambda: i64) -> Self {
        Self {
            arcs: HashMap::new(),
            lambda,
        }
    }

    fn key(from: usize, to: usize) -> (usize, usize) {
        (from.min(to), from.max(to))
    }

    fn get(&self, from: usize, to: usize) -> i64 {
        *self.arcs.get(&Self::key(from, to)).unwrap_or(&0)
    }

    fn bump(&mut self, from: usize, to: usize) {
        *self.arcs.entry(Self::key(from, to)).or_insert(0) += 1;
    }
}

enum StepOutcome {
    Moved,
    LocalOptimum,
    Deadline,
}

/// Build an initial plan and improve it until the budget runs out.
///
/// Returns `None` when some eligible task has no feasible slot at all; the
/// caller falls back to greedy assignment in that case.
pub fn search(problem: &Problem, matrix: &CostMatrix, budget: Duration) -> Option<Plan> {
    let started = Instant::now();
    let constructed = construct(problem, matrix)?;

    let mut best = constructed.clone();
    let mut best_cost = plan_cost(problem, matrix, &best);
    debug!(cost = best_cost, "constructed initial plan");

    let Some(deadline) = started.checked_add(budget) else {
        return Some(best);
    };

    let arcs: i64 = best.routes.iter().map(|r| r.len() as i64 + 1).sum();
    let base_cost: i64 = (0..problem.num_vehicles())
        .map(|v| route_minutes(problem, matrix, v, &best.routes[v]))
        .sum();
    let lambda = (base_cost / (10 * arcs.max(1))).max(1);

    let mut current = constructed;
    let mut penalties = Penalties::new(lambda);

    while Instant::now() < deadline {
        match step(problem, matrix, &mut current, &penalties, deadline) {
            StepOutcome::Moved => {
                let cost = plan_cost(problem, matrix, &current);
                if cost < best_cost {
                    best_cost = cost;
                    best = current.clone();
                }
            }
            StepOutcome::LocalOptimum => penalize(problem, matrix, &current, &mut penalties),
            StepOutcome::Deadline => break,
        }
    }

    debug!(cost = best_cost, elapsed_ms = started.elapsed().as_millis() as u64, "search finished");
    Some(best)
}

/// True objective: travel + service over every route (return arcs included)
/// plus the fixed penalty for each unvisited droppable node.
pub fn plan_cost(problem: &Problem, matrix: &CostMatrix, plan: &Plan) -> i64 {
    let routed: i64 = plan
        .routes
        .iter()
        .enumerate()
        .map(|(v, route)| route_minutes(problem, matrix, v, route))
        .sum();
    routed + DROP_PENALTY * problem.dropped_count() as i64
}

/// Arc evaluator: travel time plus service at the destination node.
fn transit(problem: &Problem, matrix: &CostMatrix, from: usize, to: usize) -> i64 {
    matrix.travel_min(from, to) as i64 + problem.service_min[to] as i64
}

/// Cumulative minutes for one vehicle's route, start depot to end depot.
fn route_minutes(problem: &Problem, matrix: &CostMatrix, vehicle: usize, route: &[usize]) -> i64 {
    let depot = problem.depot(vehicle);
    let mut total = 0;
    let mut prev = depot;
    for &node in route {
        total += transit(problem, matrix, prev, node);
        prev = node;
    }
    total + transit(problem, matrix, prev, depot)
}

fn route_fits(problem: &Problem, matrix: &CostMatrix, vehicle: usize, route: &[usize]) -> bool {
    route_minutes(problem, matrix, vehicle, route) <= problem.vehicle_cap(vehicle) as i64
}

/// Route cost under the penalty-augmented objective.
fn route_aug_cost(
    problem: &Problem,
    matrix: &CostMatrix,
    penalties: &Penalties,
    vehicle: usize,
    route: &[usize],
) -> i64 {
    let depot = problem.depot(vehicle);
    let mut total = 0;
    let mut prev = depot;
    for &node in route {
        total += transit(problem, matrix, prev, node) + penalties.lambda * penalties.get(prev, node);
        prev = node;
    }
    total + transit(problem, matrix, prev, depot) + penalties.lambda * penalties.get(prev, depot)
}

/// Incremental cost of inserting `node` at `pos` in a vehicle's route.
fn insertion_delta(
    problem: &Problem,
    matrix: &CostMatrix,
    vehicle: usize,
    route: &[usize],
    pos: usize,
    node: usize,
) -> i64 {
    let depot = problem.depot(vehicle);
    let prev = if pos == 0 { depot } else { route[pos - 1] };
    let next = if pos == route.len() { depot } else { route[pos] };
    transit(problem, matrix, prev, node) + transit(problem, matrix, node, next)
        - transit(problem, matrix, prev, next)
}

/// Cheapest-insertion construction: repeatedly insert the pending node with
/// the globally lowest feasible incremental cost.
fn construct(problem: &Problem, matrix: &CostMatrix) -> Option<Plan> {
    let num_vehicles = problem.num_vehicles();
    let mut routes: Vec<Vec<usize>> = vec![Vec::new(); num_vehicles];
    let mut minutes: Vec<i64> = vec![0; num_vehicles];

    let mut pending: Vec<usize> = problem
        .task_nodes()
        .filter(|&n| !problem.droppable[n])
        .collect();

    while !pending.is_empty() {
        let mut best: Option<(i64, usize, usize, usize)> = None;

        for (slot, &node) in pending.iter().enumerate() {
            for &vehicle in &problem.eligible[node] {
                let route = &routes[vehicle];
                for pos in 0..=route.len() {
                    let delta = insertion_delta(problem, matrix, vehicle, route, pos, node);
                    if minutes[vehicle] + delta > problem.vehicle_cap(vehicle) as i64 {
                        continue;
                    }
                    if best.is_none_or(|(cost, _, _, _)| delta < cost) {
                        best = Some((delta, slot, vehicle, pos));
                    }
                }
            }
        }

        // Some eligible node has no feasible slot anywhere: no solution.
        let (delta, slot, vehicle, pos) = best?;
        let node = pending.remove(slot);
        routes[vehicle].insert(pos, node);
        minutes[vehicle] += delta;
    }

    Some(Plan { routes })
}

/// Apply at most one improving move under the augmented objective.
fn step(
    problem: &Problem,
    matrix: &CostMatrix,
    plan: &mut Plan,
    penalties: &Penalties,
    deadline: Instant,
) -> StepOutcome {
    if let Some(outcome) = two_opt_step(problem, matrix, plan, penalties, deadline) {
        return outcome;
    }
    if let Some(outcome) = relocate_step(problem, matrix, plan, penalties, deadline) {
        return outcome;
    }
    if let Some(outcome) = swap_step(problem, matrix, plan, penalties, deadline) {
        return outcome;
    }
    StepOutcome::LocalOptimum
}

/// Reverse a segment within one route (2-opt).
fn two_opt_step(
    problem: &Problem,
    matrix: &CostMatrix,
    plan: &mut Plan,
    penalties: &Penalties,
    deadline: Instant,
) -> Option<StepOutcome> {
    for vehicle in 0..problem.num_vehicles() {
        if Instant::now() >= deadline {
            return Some(StepOutcome::Deadline);
        }
        let len = plan.routes[vehicle].len();
        if len < 2 {
            continue;
        }
        let current = route_aug_cost(problem, matrix, penalties, vehicle, &plan.routes[vehicle]);

        for start in 0..len - 1 {
            for end in start + 1..len {
                let mut candidate = plan.routes[vehicle].clone();
                candidate[start..=end].reverse();

                if !route_fits(problem, matrix, vehicle, &candidate) {
                    continue;
                }
                if route_aug_cost(problem, matrix, penalties, vehicle, &candidate) < current {
                    plan.routes[vehicle] = candidate;
                    return Some(StepOutcome::Moved);
                }
            }
        }
    }
    None
}

/// Move one task node to another position, possibly on another vehicle.
fn relocate_step(
    problem: &Problem,
    matrix: &CostMatrix,
    plan: &mut Plan,
    penalties: &Penalties,
    deadline: Instant,
) -> Option<StepOutcome> {
    let num_vehicles = problem.num_vehicles();

    for from_v in 0..num_vehicles {
        if Instant::now() >= deadline {
            return Some(StepOutcome::Deadline);
        }
        for idx in 0..plan.routes[from_v].len() {
            let node = plan.routes[from_v][idx];

            for &to_v in &problem.eligible[node] {
                let same = from_v == to_v;
                let to_len = plan.routes[to_v].len();

                for pos in 0..=(if same { to_len - 1 } else { to_len }) {
                    if same && (pos == idx || pos == idx + 1) {
                        continue;
                    }

                    let mut from_candidate = plan.routes[from_v].clone();
                    from_candidate.remove(idx);

                    if same {
                        let insert_at = if pos > idx { pos - 1 } else { pos };
                        from_candidate.insert(insert_at, node);

                        if !route_fits(problem, matrix, from_v, &from_candidate) {
                            continue;
                        }
                        let before = route_aug_cost(
                            problem, matrix, penalties, from_v, &plan.routes[from_v],
                        );
                        let after =
                            route_aug_cost(problem, matrix, penalties, from_v, &from_candidate);
                        if after < before {
                            plan.routes[from_v] = from_candidate;
                            return Some(StepOutcome::Moved);
                        }
                    } else {
                        let mut to_candidate = plan.routes[to_v].clone();
                        to_candidate.insert(pos, node);

                        if !route_fits(problem, matrix, from_v, &from_candidate)
                            || !route_fits(problem, matrix, to_v, &to_candidate)
                        {
                            continue;
                        }
                        let before = route_aug_cost(
                            problem, matrix, penalties, from_v, &plan.routes[from_v],
                        ) + route_aug_cost(
                            problem, matrix, penalties, to_v, &plan.routes[to_v],
                        );
                        let after =
                            route_aug_cost(problem, matrix, penalties, from_v, &from_candidate)
                                + route_aug_cost(
                                    problem, matrix, penalties, to_v, &to_candidate,
                                );
                        if after < before {
                            plan.routes[from_v] = from_candidate;
                            plan.routes[to_v] = to_candidate;
                            return Some(StepOutcome::Moved);
                        }
                    }
                }
            }
        }
    }
    None
}

/// Exchange two task nodes between two vehicles.
fn swap_step(
    problem: &Problem,
    matrix: &CostMatrix,
    plan: &mut Plan,
    penalties: &Penalties,
    deadline: Instant,
) -> Option<StepOutcome> {
    let num_vehicles = problem.num_vehicles();

    for v_a in 0..num_vehicles {
        if Instant::now() >= deadline {
            return Some(StepOutcome::Deadline);
        }
        for v_b in v_a + 1..num_vehicles {
            for i in 0..plan.routes[v_a].len() {
                for j in 0..plan.routes[v_b].len() {
                    let node_a = plan.routes[v_a][i];
                    let node_b = plan.routes[v_b][j];

                    if !problem.eligible[node_a].contains(&v_b)
                        || !problem.eligible[node_b].contains(&v_a)
                    {
                        continue;
                    }

                    let mut cand_a = plan.routes[v_a].clone();
                    let mut cand_b = plan.routes[v_b].clone();
                    cand_a[i] = node_b;
                    cand_b[j] = node_a;

                    if !route_fits(problem, matrix, v_a, &cand_a)
                        || !route_fits(problem, matrix, v_b, &cand_b)
                    {
                        continue;
                    }

                    let before =
                        route_aug_cost(problem, matrix, penalties, v_a, &plan.routes[v_a])
                            + route_aug_cost(problem, matrix, penalties, v_b, &plan.routes[v_b]);
                    let after = route_aug_cost(problem, matrix, penalties, v_a, &cand_a)
                        + route_aug_cost(problem, matrix, penalties, v_b, &cand_b);
                    if after < before {
                        plan.routes[v_a] = cand_a;
                        plan.routes[v_b] = cand_b;
                        return Some(StepOutcome::Moved);
                    }
                }
            }
        }
    }
    None
}

/// At a local optimum, penalize the arcs with the highest utility
/// (travel / (1 + penalty)) so the next scan can escape it.
fn penalize(problem: &Problem, matrix: &CostMatrix, plan: &Plan, penalties: &mut Penalties) {
    let mut arcs: Vec<(usize, usize, f64)> = Vec::new();

    for (vehicle, route) in plan.routes.iter().enumerate() {
        let depot = problem.depot(vehicle);
        let mut prev = depot;
        for &node in route.iter().chain(std::iter::once(&depot)) {
            let travel = matrix.travel_min(prev, node) as f64;
            let utility = travel / (1.0 + penalties.get(prev, node) as f64);
            arcs.push((prev, node, utility));
            prev = node;
        }
    }

    let max_utility = arcs
        .iter()
        .map(|&(_, _, u)| u)
        .fold(0.0_f64, f64::max);
    if max_utility <= 0.0 {
        return;
    }

    for (from, to, utility) in arcs {
        if utility == max_utility {
            penalties.bump(from, to);
        }
    }
}
