//! Validation for geographic coordinates and viewport inputs.

use crate::error::{ClusterError, Result};
use geo::Point;
use geocluster_types::LatLngBounds;

/// Validates a 2D point has valid longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geocluster::compute::validation::validate_geographic_point;
/// use geo::Point;
///
/// let nyc = Point::new(-74.0060, 40.7128);
/// assert!(validate_geographic_point(&nyc).is_ok());
///
/// let invalid = Point::new(200.0, 40.0);
/// assert!(validate_geographic_point(&invalid).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    let (lng, lat) = (point.x(), point.y());

    if !lng.is_finite() || !lat.is_finite() {
        return Err(ClusterError::InvalidInput(format!(
            "Coordinates must be finite, got: ({}, {})",
            lng, lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(ClusterError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(ClusterError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    Ok(())
}

/// Validates every position of a point set, reporting the first bad index.
pub fn validate_points<'a, I>(points: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Point>,
{
    for (idx, point) in points.into_iter().enumerate() {
        validate_geographic_point(point)
            .map_err(|e| ClusterError::InvalidInput(format!("Point at index {}: {}", idx, e)))?;
    }
    Ok(())
}

/// Validates a query box.
///
/// Longitudes may lie outside `[-180, 180]` (viewports that span or wrap the
/// world are normalized by the query layer); latitudes must be ordered.
pub fn validate_bounds(bounds: &LatLngBounds) -> Result<()> {
    if bounds.to_array().iter().any(|v| !v.is_finite()) {
        return Err(ClusterError::InvalidInput(format!(
            "Bounding box must be finite, got: {:?}",
            bounds.to_array()
        )));
    }

    if bounds.south() > bounds.north() {
        return Err(ClusterError::InvalidInput(format!(
            "south ({}) must be <= north ({})",
            bounds.south(),
            bounds.north()
        )));
    }

    Ok(())
}
