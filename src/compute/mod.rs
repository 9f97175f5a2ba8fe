//! Geometry helpers shared by the index, the cluster engine and the strategies.
//!
//! - [`projection`]: normalized Mercator math and pixel projections
//! - [`distance`]: great-circle distance
//! - [`validation`]: coordinate and bounds checks applied at the API boundary
//! - `geojson`: conversion to and from GeoJSON features (feature `geojson`)

pub mod distance;
#[cfg(feature = "geojson")]
pub mod geojson;
pub mod projection;
pub mod validation;
