//! Travel cost matrices between routing nodes.

use rayon::prelude::*;

use crate::model::{LatLng, SolveConfig};

/// Assumed average driving speed.
const BASE_SPEED_KMH: f64 = 30.0;

/// Geometric collaborator: great-circle distance in kilometers.
pub trait DistanceFn: Sync {
    fn distance_km(&self, from: LatLng, to: LatLng) -> f64;
}

/// Haversine-backed distance function (the production collaborator).
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceFn for Haversine {
    fn distance_km(&self, from: LatLng, to: LatLng) -> f64 {
        crate::haversine::haversine_km(from, to)
    }
}

/// Square matrices of distances (meters) and travel times (minutes) between
/// every pair of routing nodes. Symmetric by construction, zero diagonal.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    distance_m: Vec<Vec<i32>>,
    travel_min: Vec<Vec<i32>>,
}

impl CostMatrix {
    /// Build both matrices for the given node coordinates.
    ///
    /// Travel time assumes 30 km/h, slowed by the traffic multiplier when
    /// traffic is enabled. Every hop between distinct nodes costs at least
    /// one minute so zero-cost arcs cannot destabilize the search.
    pub fn build(locations: &[LatLng], distance: &impl DistanceFn, config: &SolveConfig) -> Self {
        let distance_m: Vec<Vec<i32>> = locations
            .par_iter()
            .enumerate()
            .map(|(i, from)| {
                locations
                    .iter()
                    .enumerate()
                    .map(|(j, to)| {
                        if i == j {
                            0
                        } else {
                            (distance.distance_km(*from, *to) * 1000.0) as i32
                        }
                    })
                    .collect()
            })
            .collect();

        let mut speed_kmh = BASE_SPEED_KMH;
        if config.include_traffic {
            speed_kmh /= config.traffic_multiplier;
        }
        let meters_per_min = speed_kmh * 1000.0 / 60.0;

        let travel_min = distance_m
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, &meters)| {
                        if i == j {
                            0
                        } else {
                            ((meters as f64 / meters_per_min) as i32).max(1)
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            distance_m,
            travel_min,
        }
    }

    /// Number of nodes covered by the matrix.
    pub fn len(&self) -> usize {
        self.distance_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance_m.is_empty()
    }

    /// Distance between two nodes in meters.
    pub fn distance_m(&self, from: usize, to: usize) -> i32 {
        self.distance_m[from][to]
    }

    /// Travel time between two nodes in minutes.
    pub fn travel_min(&self, from: usize, to: usize) -> i32 {
        self.travel_min[from][to]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat-grid distance function: 1 unit of latitude = 1 km.
    struct FlatKm;

    impl DistanceFn for FlatKm {
        fn distance_km(&self, from: LatLng, to: LatLng) -> f64 {
            (from.lat - to.lat).abs() + (from.lng - to.lng).abs()
        }
    }

    fn at(lat: f64, lng: f64) -> LatLng {
        LatLng { lat, lng }
    }

    #[test]
    fn test_diagonal_zero_and_symmetric() {
        let locations = vec![at(0.0, 0.0), at(3.0, 0.0), at(0.0, 7.0)];
        let matrix = CostMatrix::build(&locations, &FlatKm, &SolveConfig::default());

        for i in 0..matrix.len() {
            assert_eq!(matrix.distance_m(i, i), 0);
            assert_eq!(matrix.travel_min(i, i), 0);
            for j in 0..matrix.len() {
                assert_eq!(matrix.distance_m(i, j), matrix.distance_m(j, i));
                assert_eq!(matrix.travel_min(i, j), matrix.travel_min(j, i));
            }
        }
    }

    #[test]
    fn test_travel_time_at_base_speed() {
        // 5 km at 30 km/h = 500 m/min -> 10 minutes
        let locations = vec![at(0.0, 0.0), at(5.0, 0.0)];
        let matrix = CostMatrix::build(&locations, &FlatKm, &SolveConfig::default());

        assert_eq!(matrix.distance_m(0, 1), 5000);
        assert_eq!(matrix.travel_min(0, 1), 10);
    }

    #[test]
    fn test_hop_costs_at_least_one_minute() {
        // 100 m would truncate to 0 minutes without the floor
        let locations = vec![at(0.0, 0.0), at(0.1, 0.0)];
        let matrix = CostMatrix::build(&locations, &FlatKm, &SolveConfig::default());

        assert_eq!(matrix.travel_min(0, 1), 1);
    }

    #[test]
    fn test_traffic_multiplier_slows_travel() {
        let locations = vec![at(0.0, 0.0), at(6.0, 0.0)];
        let clear = CostMatrix::build(&locations, &FlatKm, &SolveConfig::default());
        let congested = CostMatrix::build(
            &locations,
            &FlatKm,
            &SolveConfig {
                include_traffic: true,
                traffic_multiplier: 1.5,
                ..SolveConfig::default()
            },
        );

        // 6 km: 12 min clear, 18 min at 30/1.5 = 20 km/h
        assert_eq!(clear.travel_min(0, 1), 12);
        assert_eq!(congested.travel_min(0, 1), 18);
    }
}
