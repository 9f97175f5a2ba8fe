//! # geocluster-types
//!
//! Geographic value types shared by the `geocluster` engine and its host integrations.
//!
//! - **Bounds types**: `LatLngBounds` (antimeridian-aware geographic box), `PixelBounds`
//! - **Positions**: `geo::Point` re-exported as the longitude/latitude position type
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geocluster_types::bounds::LatLngBounds;
//! use geocluster_types::Point;
//!
//! let manhattan = LatLngBounds::new(-74.0479, 40.6829, -73.9067, 40.8820);
//! assert!(manhattan.contains_point(&Point::new(-74.0060, 40.7128)));
//!
//! // A box crossing the antimeridian has west > east.
//! let pacific = LatLngBounds::new(170.0, -10.0, -170.0, 10.0);
//! assert!(pacific.crosses_antimeridian());
//! assert!(pacific.contains_point(&Point::new(179.5, 0.0)));
//! ```

pub mod bounds;
pub mod pixel;

pub use bounds::LatLngBounds;
pub use geo::Point;
pub use pixel::PixelBounds;
