use geo::Point;
use serde::{Deserialize, Serialize};

/// A geographic bounding box in longitude/latitude degrees.
///
/// Unlike `geo::Rect`, the corners are not normalized: a box whose `west` edge is
/// greater than its `east` edge crosses the antimeridian (180°), which is how map
/// viewports over the Pacific are reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl LatLngBounds {
    /// Create a new bounding box from its edges.
    ///
    /// # Arguments
    ///
    /// * `west` - Western longitude edge
    /// * `south` - Southern latitude edge
    /// * `east` - Eastern longitude edge (may be less than `west`)
    /// * `north` - Northern latitude edge
    ///
    /// # Examples
    ///
    /// ```
    /// use geocluster_types::bounds::LatLngBounds;
    ///
    /// let bbox = LatLngBounds::new(-74.0, 40.7, -73.9, 40.8);
    /// assert_eq!(bbox.to_array(), [-74.0, 40.7, -73.9, 40.8]);
    /// ```
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world, `[-180, -90, 180, 90]`.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// A zero-area box at a single position.
    pub fn from_point(point: &Point) -> Self {
        Self::new(point.x(), point.y(), point.x(), point.y())
    }

    /// Create from a `[west, south, east, north]` array.
    pub fn from_array(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    /// The smallest non-crossing box containing all `points`, or `None` if empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let mut bounds = Self::from_point(iter.next()?);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    /// South-west corner as a lng/lat point.
    pub fn south_west(&self) -> Point {
        Point::new(self.west, self.south)
    }

    /// North-east corner as a lng/lat point.
    pub fn north_east(&self) -> Point {
        Point::new(self.east, self.north)
    }

    /// `[west, south, east, north]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Whether the box wraps across the 180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Longitudinal extent in degrees, accounting for antimeridian wrap.
    pub fn lng_span(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.east + 360.0 - self.west
        } else {
            self.east - self.west
        }
    }

    /// Latitudinal extent in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Get the center point of the bounding box.
    pub fn center(&self) -> Point {
        let mut lng = self.west + self.lng_span() / 2.0;
        if lng > 180.0 {
            lng -= 360.0;
        }
        Point::new(lng, (self.south + self.north) / 2.0)
    }

    fn contains_lng(&self, lng: f64) -> bool {
        if self.crosses_antimeridian() {
            lng >= self.west || lng <= self.east
        } else {
            lng >= self.west && lng <= self.east
        }
    }

    /// Check if a point is contained within this bounding box (edges inclusive).
    pub fn contains_point(&self, point: &Point) -> bool {
        point.y() >= self.south && point.y() <= self.north && self.contains_lng(point.x())
    }

    /// Check if this bounding box intersects with another.
    pub fn intersects(&self, other: &LatLngBounds) -> bool {
        if self.north < other.south || self.south > other.north {
            return false;
        }
        self.contains_lng(other.west)
            || self.contains_lng(other.east)
            || other.contains_lng(self.west)
            || other.contains_lng(self.east)
    }

    /// Grow the box to include `point`.
    ///
    /// When the longitude is outside the box, the side that grows the box the
    /// least is extended, so boxes near the antimeridian stay tight.
    pub fn extend(&mut self, point: &Point) {
        let (lng, lat) = (point.x(), point.y());
        self.south = self.south.min(lat);
        self.north = self.north.max(lat);

        if self.contains_lng(lng) {
            return;
        }

        let grow_west = (self.west - lng).rem_euclid(360.0);
        let grow_east = (lng - self.east).rem_euclid(360.0);
        if grow_west < grow_east {
            self.west = lng;
        } else {
            self.east = lng;
        }
    }

    /// Expand the bounding box by a given amount of degrees in all directions.
    pub fn expand(&self, amount: f64) -> Self {
        Self::new(
            self.west - amount,
            (self.south - amount).max(-90.0),
            self.east + amount,
            (self.north + amount).min(90.0),
        )
    }
}

impl Default for LatLngBounds {
    fn default() -> Self {
        Self::world()
    }
}

impl From<[f64; 4]> for LatLngBounds {
    fn from(bbox: [f64; 4]) -> Self {
        Self::from_array(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_point() {
        let bbox = LatLngBounds::new(-74.0, 40.7, -73.9, 40.8);

        assert!(bbox.contains_point(&Point::new(-73.95, 40.75)));
        assert!(bbox.contains_point(&Point::new(-74.0, 40.7)));
        assert!(!bbox.contains_point(&Point::new(-73.85, 40.75)));
        assert!(!bbox.contains_point(&Point::new(-73.95, 40.9)));
    }

    #[test]
    fn test_antimeridian_box() {
        let bbox = LatLngBounds::new(170.0, -10.0, -170.0, 10.0);

        assert!(bbox.crosses_antimeridian());
        assert_eq!(bbox.lng_span(), 20.0);
        assert!(bbox.contains_point(&Point::new(175.0, 0.0)));
        assert!(bbox.contains_point(&Point::new(-175.0, 0.0)));
        assert!(!bbox.contains_point(&Point::new(0.0, 0.0)));

        let center = bbox.center();
        assert!((center.x() - 180.0).abs() < 1e-9 || (center.x() + 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_extend_and_from_points() {
        let points = vec![
            Point::new(-74.0, 40.7),
            Point::new(-73.9, 40.8),
            Point::new(-73.95, 40.65),
        ];

        let bounds = LatLngBounds::from_points(&points).unwrap();
        assert_eq!(bounds.to_array(), [-74.0, 40.65, -73.9, 40.8]);

        assert!(LatLngBounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_extend_prefers_shorter_side() {
        let mut bounds = LatLngBounds::from_point(&Point::new(179.0, 0.0));
        bounds.extend(&Point::new(-179.0, 1.0));

        assert!(bounds.crosses_antimeridian());
        assert_eq!(bounds.lng_span(), 2.0);
    }

    #[test]
    fn test_intersects() {
        let a = LatLngBounds::new(-74.0, 40.7, -73.9, 40.8);
        let b = LatLngBounds::new(-73.95, 40.75, -73.85, 40.85);
        let c = LatLngBounds::new(-73.0, 40.0, -72.9, 40.1);
        let d = LatLngBounds::new(170.0, -10.0, -170.0, 10.0);
        let e = LatLngBounds::new(-175.0, -5.0, -160.0, 5.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(d.intersects(&e));
        assert!(!d.intersects(&a));
    }
}
