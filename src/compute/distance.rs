//! Great-circle distances between lng/lat positions.

use geo::{Distance, Haversine, Point};

/// Haversine distance between two lng/lat points, in kilometers.
///
/// # Examples
///
/// ```rust
/// use geocluster::compute::distance::distance_km;
/// use geo::Point;
///
/// let nyc = Point::new(-74.0060, 40.7128);
/// let la = Point::new(-118.2437, 34.0522);
/// let d = distance_km(&nyc, &la);
/// assert!(d > 3_900.0 && d < 4_000.0);
/// ```
pub fn distance_km(a: &Point, b: &Point) -> f64 {
    Haversine.distance(*a, *b) / 1000.0
}
