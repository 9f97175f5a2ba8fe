//! Drawing clusters on a host map.
//!
//! [`ClusterDriver`] owns the marker list, runs the active strategy whenever the
//! map settles or markers change, and tells the [`MapHost`] which markers and
//! cluster icons to show. Cluster icons come from a pluggable [`Renderer`].

mod driver;

pub use driver::{ClusterDriver, ClusterEvent, MapHost};

use crate::strategy::{Cluster, Marker};
use geo::Point;

/// Marker and cluster counts across one set of clusters, given to renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterStats {
    /// Markers managed by the driver
    pub marker_count: usize,
    /// Clusters in the current set, singletons included
    pub cluster_count: usize,
    /// Sum of per-cluster visible marker counts
    pub sum: usize,
    pub mean: f64,
    pub min: usize,
    pub max: usize,
}

impl ClusterStats {
    pub fn new<M: Marker>(markers: &[M], clusters: &[Cluster<M>]) -> Self {
        let counts: Vec<usize> = clusters.iter().map(Cluster::count).collect();
        let sum = counts.iter().sum();
        let mean = if counts.is_empty() {
            0.0
        } else {
            sum as f64 / counts.len() as f64
        };

        Self {
            marker_count: markers.len(),
            cluster_count: clusters.len(),
            sum,
            mean,
            min: counts.iter().copied().min().unwrap_or(0),
            max: counts.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Produces the visual for a multi-marker cluster.
pub trait Renderer<M> {
    type Icon;

    fn render(&self, cluster: &Cluster<M>, stats: &ClusterStats) -> Self::Icon;
}

/// Everything a host needs to draw a cluster icon.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterIcon {
    pub position: Point,
    pub count: usize,
    pub label: String,
    /// CSS color
    pub color: &'static str,
    pub z_index: i64,
    pub title: String,
}

/// Blue icons, red for clusters larger than both 10 and the mean cluster size.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderer;

impl DefaultRenderer {
    /// Cluster icons stack above regular markers, larger clusters on top.
    pub const BASE_Z_INDEX: i64 = 1_000_000;

    pub const HOT_COLOR: &'static str = "#ff0000";
    pub const COLD_COLOR: &'static str = "#0000ff";
}

impl<M: Marker> Renderer<M> for DefaultRenderer {
    type Icon = ClusterIcon;

    fn render(&self, cluster: &Cluster<M>, stats: &ClusterStats) -> ClusterIcon {
        let count = cluster.count();
        let color = if count as f64 > stats.mean.max(10.0) {
            Self::HOT_COLOR
        } else {
            Self::COLD_COLOR
        };

        ClusterIcon {
            position: cluster.position().unwrap_or(Point::new(0.0, 0.0)),
            count,
            label: count.to_string(),
            color,
            z_index: Self::BASE_Z_INDEX.saturating_add(i64::try_from(count).unwrap_or(i64::MAX)),
            title: format!("Cluster of {} markers", count),
        }
    }
}
