//! Multi-resolution point clustering for interactive maps.
//!
//! ```rust
//! use geocluster::{ClusterOptions, LatLngBounds, Point, PointFeature, Supercluster};
//!
//! let mut index = Supercluster::new(ClusterOptions::default())?;
//! index.load(vec![
//!     PointFeature::new(Point::new(-74.0060, 40.7128), "nyc"),
//!     PointFeature::new(Point::new(-73.9855, 40.7580), "times square"),
//!     PointFeature::new(Point::new(2.3522, 48.8566), "paris"),
//! ])?;
//!
//! let clusters = index.get_clusters(&LatLngBounds::world(), 2.0)?;
//! assert_eq!(clusters.len(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod cluster;
pub mod compute;
pub mod config;
pub mod error;
pub mod index;
pub mod render;
pub mod strategy;

pub use cluster::{
    ClusterId, ClusterNode, ClusterSummary, Leaf, PointFeature, Supercluster, Tile, TileFeature,
};
pub use config::{ClusterOptions, GridOptions, SuperclusterStrategyOptions};
pub use error::{ClusterError, Result};
pub use index::{IndexBuilder, KdIndex};

pub use geo::Point;
pub use geocluster_types::{LatLngBounds, PixelBounds};

pub use compute::projection::{Projection, WebMercator};

pub use strategy::{
    Calculation, Cluster, GridStrategy, MapView, Marker, NoopStrategy, Strategy,
    SuperclusterStrategy,
};

pub use render::{
    ClusterDriver, ClusterEvent, ClusterIcon, ClusterStats, DefaultRenderer, MapHost, Renderer,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterError, ClusterOptions, Result, Supercluster};

    pub use crate::{ClusterId, ClusterNode, PointFeature};

    pub use geo::Point;
    pub use geocluster_types::LatLngBounds;

    pub use crate::{Cluster, MapView, Marker, Strategy};

    pub use crate::{ClusterDriver, MapHost, Renderer};

    pub use crate::{Projection, WebMercator};
}
