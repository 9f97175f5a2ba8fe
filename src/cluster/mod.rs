//! Multi-resolution point clustering.
//!
//! [`Supercluster`] indexes a point set once per integer zoom level. The finest
//! level (`max_zoom + 1`) holds every input point; each coarser level is built
//! by greedily merging the entries of the level below that fall within the
//! zoom's merge radius into weighted-centroid clusters. Viewport and drill-down
//! queries then read the prebuilt level for the requested zoom.
//!
//! ## Cluster ids
//!
//! A cluster created from entry `i` of the level at zoom `z + 1` gets the id
//! `(i << 5) + (z + 1) + n`, where `n` is the number of loaded points. Ids of
//! raw points are their input indices (`< n`), so the two never collide, and a
//! cluster id alone locates the level and entry it was created from.
//!
//! ## Example
//!
//! ```rust
//! use geocluster::{ClusterOptions, LatLngBounds, PointFeature, Supercluster};
//! use geo::Point;
//!
//! let mut index = Supercluster::new(ClusterOptions::default())?;
//! index.load(vec![
//!     PointFeature::new(Point::new(0.0, 0.0), "a"),
//!     PointFeature::new(Point::new(0.0001, 0.0001), "b"),
//!     PointFeature::new(Point::new(50.0, 50.0), "c"),
//! ])?;
//!
//! let clusters = index.get_clusters(&LatLngBounds::world(), 16.0)?;
//! assert_eq!(clusters.len(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

mod aggregate;
mod query;

pub use query::{Tile, TileFeature};

use crate::config::ClusterOptions;
use crate::error::{ClusterError, Result};
use crate::index::KdIndex;
use aggregate::Level;
use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An input point: a lng/lat position with caller-defined properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFeature<T> {
    /// Optional caller id, reported on tile features unless `generate_id` is set
    pub id: Option<u64>,
    pub position: Point,
    pub properties: T,
}

impl<T> PointFeature<T> {
    pub fn new(position: Point, properties: T) -> Self {
        Self {
            id: None,
            position,
            properties,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Synthetic id of a cluster, usable for drill-down queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u64);

impl ClusterId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClusterId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A loaded input point returned by a query.
#[derive(Debug, PartialEq)]
pub struct Leaf<'a, T> {
    /// Position of the point in the array passed to `load`
    pub index: usize,
    pub feature: &'a PointFeature<T>,
}

/// A synthesized cluster returned by a query.
#[derive(Debug, PartialEq)]
pub struct ClusterSummary<'a, A> {
    pub id: ClusterId,
    /// Point-count-weighted centroid, in lng/lat
    pub position: Point,
    pub point_count: usize,
    /// Aggregated properties, when an aggregator is configured
    pub properties: Option<&'a A>,
}

impl<A> ClusterSummary<'_, A> {
    /// Short label for the point count: `"999"`, `"1.2k"`, `"15k"`.
    pub fn abbreviated_count(&self) -> String {
        abbreviate_count(self.point_count)
    }
}

/// One entry of a query result: either a raw input point or a cluster.
#[derive(Debug, PartialEq)]
pub enum ClusterNode<'a, T, A> {
    Leaf(Leaf<'a, T>),
    Cluster(ClusterSummary<'a, A>),
}

impl<'a, T, A> ClusterNode<'a, T, A> {
    pub fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster(_))
    }

    pub fn position(&self) -> Point {
        match self {
            Self::Leaf(leaf) => leaf.feature.position,
            Self::Cluster(cluster) => cluster.position,
        }
    }

    /// Number of input points represented (1 for a leaf).
    pub fn point_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Cluster(cluster) => cluster.point_count,
        }
    }

    pub fn cluster_id(&self) -> Option<ClusterId> {
        match self {
            Self::Leaf(_) => None,
            Self::Cluster(cluster) => Some(cluster.id),
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf<'a, T>> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Cluster(_) => None,
        }
    }
}

// Query results only hold references, so they are `Copy` whatever `T` and `A` are.
impl<T> Clone for Leaf<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Leaf<'_, T> {}

impl<A> Clone for ClusterSummary<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for ClusterSummary<'_, A> {}

impl<T, A> Clone for ClusterNode<'_, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A> Copy for ClusterNode<'_, T, A> {}

pub(crate) fn abbreviate_count(count: usize) -> String {
    if count >= 10_000 {
        format!("{}k", (count as f64 / 1000.0).round())
    } else if count >= 1_000 {
        format!("{}k", (count as f64 / 100.0).round() / 10.0)
    } else {
        count.to_string()
    }
}

type MapFn<T, A> = Box<dyn Fn(&T) -> A>;
type ReduceFn<A> = Box<dyn Fn(&mut A, &A)>;

/// Custom per-cluster property aggregation.
struct Aggregator<T, A> {
    map: MapFn<T, A>,
    reduce: ReduceFn<A>,
}

/// Point clustering engine over per-zoom spatial indices.
///
/// `T` is the per-point property type; `A` is the aggregated cluster property
/// type produced by an optional map/reduce pair.
pub struct Supercluster<T, A = ()> {
    options: ClusterOptions,
    aggregator: Option<Aggregator<T, A>>,
    points: Vec<PointFeature<T>>,
    /// Indexed by zoom; `None` below `min_zoom` and before `load`.
    levels: Vec<Option<Level>>,
    cluster_props: Vec<A>,
}

impl<T> Supercluster<T, ()> {
    /// Create an engine without property aggregation.
    pub fn new(options: ClusterOptions) -> Result<Self> {
        options.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(Self {
            options,
            aggregator: None,
            points: Vec::new(),
            levels: Vec::new(),
            cluster_props: Vec::new(),
        })
    }
}

impl<T, A: Clone> Supercluster<T, A> {
    /// Create an engine that aggregates cluster properties.
    ///
    /// `map` converts a point's properties into the aggregate type; `reduce`
    /// folds a merged constituent's aggregate into the accumulator, which is
    /// seeded from the origin constituent.
    ///
    /// ```rust
    /// use geocluster::{ClusterNode, ClusterOptions, LatLngBounds, PointFeature, Supercluster};
    /// use geo::Point;
    ///
    /// let mut index = Supercluster::with_aggregator(
    ///     ClusterOptions::default(),
    ///     |population: &u32| u64::from(*population),
    ///     |sum: &mut u64, other: &u64| *sum += *other,
    /// )?;
    /// index.load(vec![
    ///     PointFeature::new(Point::new(10.0, 10.0), 100),
    ///     PointFeature::new(Point::new(10.0001, 10.0), 250),
    /// ])?;
    ///
    /// let clusters = index.get_clusters(&LatLngBounds::world(), 0.0)?;
    /// match &clusters[0] {
    ///     ClusterNode::Cluster(cluster) => assert_eq!(cluster.properties, Some(&350)),
    ///     ClusterNode::Leaf(_) => panic!("expected a cluster"),
    /// }
    /// # Ok::<(), geocluster::ClusterError>(())
    /// ```
    pub fn with_aggregator<M, R>(options: ClusterOptions, map: M, reduce: R) -> Result<Self>
    where
        M: Fn(&T) -> A + 'static,
        R: Fn(&mut A, &A) + 'static,
    {
        options.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(Self {
            options,
            aggregator: Some(Aggregator {
                map: Box::new(map),
                reduce: Box::new(reduce),
            }),
            points: Vec::new(),
            levels: Vec::new(),
            cluster_props: Vec::new(),
        })
    }
}

impl<T, A> Supercluster<T, A> {
    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// The points passed to the last `load`.
    pub fn points(&self) -> &[PointFeature<T>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The spatial index of the level at `zoom`, if that level was built.
    pub fn index_at(&self, zoom: u8) -> Option<&KdIndex> {
        self.level(usize::from(zoom)).map(|level| &level.index)
    }

    fn level(&self, zoom: usize) -> Option<&Level> {
        self.levels.get(zoom).and_then(Option::as_ref)
    }
}

impl<T, A> fmt::Debug for Supercluster<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supercluster")
            .field("options", &self.options)
            .field("points", &self.points.len())
            .field("levels", &self.levels.iter().flatten().count())
            .field("aggregated", &self.aggregator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate_count() {
        assert_eq!(abbreviate_count(2), "2");
        assert_eq!(abbreviate_count(999), "999");
        assert_eq!(abbreviate_count(1_000), "1k");
        assert_eq!(abbreviate_count(1_250), "1.3k");
        assert_eq!(abbreviate_count(9_949), "9.9k");
        assert_eq!(abbreviate_count(10_000), "10k");
        assert_eq!(abbreviate_count(15_600), "16k");
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        let options = ClusterOptions::default().with_zoom_range(0, 31);
        assert!(matches!(
            Supercluster::<()>::new(options),
            Err(ClusterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_debug_output() {
        let index = Supercluster::<()>::new(ClusterOptions::default()).unwrap();
        let debug = format!("{:?}", index);
        assert!(debug.contains("Supercluster"));
        assert!(debug.contains("points: 0"));
    }
}
