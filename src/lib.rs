//! field-planner: field-service routing engine.
//!
//! Assigns skill-restricted tasks to mobile workers and sequences each
//! worker's day into a time-feasible route under a wall-clock search budget.

pub mod model;
pub mod haversine;
pub mod matrix;
pub mod problem;
pub mod search;
pub mod extract;
pub mod fallback;
pub mod solver;
