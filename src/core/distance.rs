use geo::{point, HaversineDistance};

use crate::models::BoundingBox;

/// Mean Earth radius in kilometers, the same radius `geo` uses for haversine
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let from = point!(x: lon1, y: lat1);
    let to = point!(x: lon2, y: lat2);

    from.haversine_distance(&to) / 1000.0
}

/// Check if a point is within a bounding box (edges inclusive)
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat
        && lat <= bbox.max_lat
        && lon >= bbox.min_lon
        && lon <= bbox.max_lon
}
