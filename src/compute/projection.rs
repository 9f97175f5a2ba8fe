//! Spherical Mercator projection.
//!
//! The cluster engine works in normalized Mercator space: `x` and `y` both in
//! `[0, 1]`, with `(0, 0)` at the north-west corner of the world. Host maps work
//! in pixels; [`WebMercator`] scales the normalized plane by `tile_size * 2^zoom`.

use geo::{Coord, Point};
use geocluster_types::{LatLngBounds, PixelBounds};
use std::f64::consts::PI;

/// Normalized Mercator x for a longitude.
#[inline]
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Normalized Mercator y for a latitude, clamped to `[0, 1]`.
#[inline]
pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// Longitude for a normalized Mercator x.
#[inline]
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Latitude for a normalized Mercator y.
#[inline]
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Project a lng/lat point, rounding each coordinate to `f32` precision.
///
/// Indexed positions are kept at `f32` precision so merge decisions at
/// boundary distances match the tile pipeline the cluster ids are shared with.
#[inline]
pub fn project_f32(point: &Point) -> (f64, f64) {
    (
        f64::from(lng_x(point.x()) as f32),
        f64::from(lat_y(point.y()) as f32),
    )
}

/// Conversion between lng/lat positions and the host map's pixel plane.
pub trait Projection {
    /// Pixel position of a lng/lat point.
    fn to_pixel(&self, position: &Point) -> Coord;

    /// Lng/lat point at a pixel position.
    fn from_pixel(&self, pixel: Coord) -> Point;

    /// Width of the whole world in pixels, if the projection wraps horizontally.
    fn world_width(&self) -> Option<f64> {
        None
    }
}

/// Web Mercator world-pixel projection at a fixed zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    tile_size: f64,
    zoom: f64,
}

impl WebMercator {
    /// Standard 256 px tiles.
    pub fn new(zoom: f64) -> Self {
        Self::with_tile_size(256.0, zoom)
    }

    pub fn with_tile_size(tile_size: f64, zoom: f64) -> Self {
        Self { tile_size, zoom }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    fn scale(&self) -> f64 {
        self.tile_size * 2f64.powf(self.zoom)
    }
}

impl Projection for WebMercator {
    fn to_pixel(&self, position: &Point) -> Coord {
        let scale = self.scale();
        Coord {
            x: lng_x(position.x()) * scale,
            y: lat_y(position.y()) * scale,
        }
    }

    fn from_pixel(&self, pixel: Coord) -> Point {
        let scale = self.scale();
        Point::new(x_lng(pixel.x / scale), y_lat(pixel.y / scale))
    }

    fn world_width(&self) -> Option<f64> {
        Some(self.scale())
    }
}

/// Pixel box of a geographic box.
///
/// For boxes crossing the antimeridian the eastern edge is shifted by one world
/// width so the pixel box stays contiguous.
pub fn to_pixel_bounds(bounds: &LatLngBounds, projection: &dyn Projection) -> PixelBounds {
    let mut north_east = projection.to_pixel(&bounds.north_east());
    let south_west = projection.to_pixel(&bounds.south_west());
    if bounds.crosses_antimeridian()
        && let Some(width) = projection.world_width()
    {
        north_east.x += width;
    }
    PixelBounds::new(north_east, south_west)
}

/// Geographic box of a pixel box, with longitudes wrapped back into `[-180, 180]`.
pub fn from_pixel_bounds(bounds: &PixelBounds, projection: &dyn Projection) -> LatLngBounds {
    let south_west = projection.from_pixel(bounds.south_west);
    let north_east = projection.from_pixel(bounds.north_east);

    let spans_world = projection
        .world_width()
        .is_some_and(|width| bounds.width() >= width);
    let (west, east) = if spans_world {
        (-180.0, 180.0)
    } else {
        (wrap_lng(south_west.x()), wrap_lng(north_east.x()))
    };

    LatLngBounds::new(
        west,
        south_west.y().max(-90.0),
        east,
        north_east.y().min(90.0),
    )
}

/// Grow a geographic box by `pixels` on every side, as seen on the map.
pub fn extend_bounds_to_padded_viewport(
    bounds: &LatLngBounds,
    projection: &dyn Projection,
    pixels: f64,
) -> LatLngBounds {
    let padded = to_pixel_bounds(bounds, projection).expand(pixels);
    from_pixel_bounds(&padded, projection)
}

fn wrap_lng(lng: f64) -> f64 {
    if lng > 180.0 {
        lng - 360.0
    } else if lng < -180.0 {
        lng + 360.0
    } else {
        lng
    }
}
