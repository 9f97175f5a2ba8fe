use geo::Coord;
use serde::{Deserialize, Serialize};

/// An axis-aligned box in screen/world pixel space.
///
/// Pixel `y` grows downwards, so the north-east corner has the smaller `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBounds {
    pub north_east: Coord,
    pub south_west: Coord,
}

impl PixelBounds {
    pub fn new(north_east: Coord, south_west: Coord) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    /// Grow the box outwards by `pixels` on every side.
    pub fn expand(&self, pixels: f64) -> Self {
        Self {
            north_east: Coord {
                x: self.north_east.x + pixels,
                y: self.north_east.y - pixels,
            },
            south_west: Coord {
                x: self.south_west.x - pixels,
                y: self.south_west.y + pixels,
            },
        }
    }

    pub fn width(&self) -> f64 {
        self.north_east.x - self.south_west.x
    }

    pub fn height(&self) -> f64 {
        self.south_west.y - self.north_east.y
    }
}
