//! Great-circle distance utilities.
//!
//! Pure geometry: the engine consumes this through the `DistanceFn`
//! collaborator and is responsible only for discretization and assembly.

use crate::model::LatLng;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(from: LatLng, to: LatLng) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Pairwise great-circle distances in meters, truncated to integers.
///
/// Backs the raw distance endpoint: diagonal is zero, matrix is symmetric.
pub fn pairwise_meters(locations: &[LatLng]) -> Vec<Vec<i32>> {
    let n = locations.len();
    let mut matrix = vec![vec![0; n]; n];

    for (i, from) in locations.iter().enumerate() {
        for (j, to) in locations.iter().enumerate() {
            if i != j {
                matrix[i][j] = (haversine_km(*from, *to) * 1000.0) as i32;
            }
        }
    }

    matrix
}
