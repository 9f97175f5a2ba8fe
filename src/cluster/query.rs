//! Viewport, tile and drill-down queries over the built levels.

use super::aggregate::{Entry, Level};
use super::{ClusterId, ClusterNode, ClusterSummary, Leaf, Supercluster};
use crate::compute::projection::{lat_y, lng_x, x_lng, y_lat};
use crate::compute::validation::validate_bounds;
use crate::error::{ClusterError, Result};
use geo::Point;
use geocluster_types::LatLngBounds;

/// Features of one map tile.
#[derive(Debug, Clone)]
pub struct Tile<'a, T, A> {
    pub features: Vec<TileFeature<'a, T, A>>,
}

/// A point or cluster positioned in tile-local integer coordinates.
///
/// Coordinates range over `[0, extent)` inside the tile and extend slightly
/// past it for features in the radius buffer.
#[derive(Debug, Clone)]
pub struct TileFeature<'a, T, A> {
    /// Cluster id, the input index with `generate_id`, or the point's own id
    pub id: Option<u64>,
    pub x: i64,
    pub y: i64,
    pub node: ClusterNode<'a, T, A>,
}

impl<T, A> Supercluster<T, A> {
    /// Clusters and points inside `bbox` at `zoom`.
    ///
    /// `zoom` is floored and clamped to `[min_zoom, max_zoom + 1]`. Boxes that
    /// cross the antimeridian are split in two; boxes spanning 360° or more of
    /// longitude cover the whole world. Before `load` the result is empty.
    pub fn get_clusters(&self, bbox: &LatLngBounds, zoom: f64) -> Result<Vec<ClusterNode<'_, T, A>>> {
        validate_bounds(bbox)?;
        let [west, south, east, north] = bbox.to_array();

        let mut min_lng = (west + 180.0).rem_euclid(360.0) - 180.0;
        let min_lat = south.clamp(-90.0, 90.0);
        let mut max_lng = if east == 180.0 {
            180.0
        } else {
            (east + 180.0).rem_euclid(360.0) - 180.0
        };
        let max_lat = north.clamp(-90.0, 90.0);

        if east - west >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut clusters =
                self.get_clusters(&LatLngBounds::new(min_lng, min_lat, 180.0, max_lat), zoom)?;
            clusters.extend(
                self.get_clusters(&LatLngBounds::new(-180.0, min_lat, max_lng, max_lat), zoom)?,
            );
            return Ok(clusters);
        }

        let Some(level) = self.level(self.limit_zoom(zoom)) else {
            return Ok(Vec::new());
        };

        let ids = level.index.range(
            lng_x(min_lng),
            lat_y(max_lat),
            lng_x(max_lng),
            lat_y(min_lat),
        );
        Ok(ids
            .into_iter()
            .map(|i| self.node(&level.entries[i as usize]))
            .collect())
    }

    /// Direct children of a cluster one zoom level below where it was formed.
    ///
    /// # Errors
    ///
    /// [`ClusterError::NoSuchCluster`] if the id does not decode to an entry of
    /// a built level, or no entry of that level names it as parent.
    pub fn get_children(&self, cluster_id: ClusterId) -> Result<Vec<ClusterNode<'_, T, A>>> {
        let no_such_cluster = || ClusterError::NoSuchCluster(cluster_id.get());

        let (origin_index, origin_zoom) = self.decode(cluster_id).ok_or_else(no_such_cluster)?;
        let level = self
            .level(usize::from(origin_zoom))
            .ok_or_else(no_such_cluster)?;
        let origin = level
            .entries
            .get(origin_index)
            .ok_or_else(no_such_cluster)?;

        let r = self.options.radius_at(i32::from(origin_zoom) - 1);
        let children: Vec<_> = level
            .index
            .within(origin.x, origin.y, r)
            .into_iter()
            .map(|i| &level.entries[i as usize])
            .filter(|entry| entry.parent == Some(cluster_id.get()))
            .map(|entry| self.node(entry))
            .collect();

        if children.is_empty() {
            return Err(no_such_cluster());
        }
        Ok(children)
    }

    /// Input points under a cluster, skipping `offset` and returning at most `limit`.
    ///
    /// Pass `usize::MAX` as `limit` for all of them.
    pub fn get_leaves(
        &self,
        cluster_id: ClusterId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Leaf<'_, T>>> {
        let mut leaves = Vec::new();
        if limit > 0 {
            self.append_leaves(&mut leaves, cluster_id, limit, offset, 0)?;
        }
        Ok(leaves)
    }

    fn append_leaves<'a>(
        &'a self,
        result: &mut Vec<Leaf<'a, T>>,
        cluster_id: ClusterId,
        limit: usize,
        offset: usize,
        mut skipped: usize,
    ) -> Result<usize> {
        for child in self.get_children(cluster_id)? {
            match child {
                ClusterNode::Cluster(cluster) => {
                    if skipped + cluster.point_count <= offset {
                        skipped += cluster.point_count;
                    } else {
                        skipped = self.append_leaves(result, cluster.id, limit, offset, skipped)?;
                    }
                }
                ClusterNode::Leaf(leaf) => {
                    if skipped < offset {
                        skipped += 1;
                    } else {
                        result.push(leaf);
                    }
                }
            }

            if result.len() == limit {
                break;
            }
        }
        Ok(skipped)
    }

    /// Zoom at which a cluster splits into more than one child.
    pub fn get_cluster_expansion_zoom(&self, cluster_id: ClusterId) -> Result<u8> {
        let (_, origin_zoom) = self
            .decode(cluster_id)
            .ok_or(ClusterError::NoSuchCluster(cluster_id.get()))?;

        let mut expansion_zoom = i32::from(origin_zoom) - 1;
        let mut cluster_id = cluster_id;
        while expansion_zoom <= i32::from(self.options.max_zoom) {
            let children = self.get_children(cluster_id)?;
            expansion_zoom += 1;
            if children.len() != 1 {
                break;
            }
            match children[0] {
                ClusterNode::Cluster(child) => cluster_id = child.id,
                ClusterNode::Leaf(_) => break,
            }
        }

        // Bounded by max_zoom + 1, which validation keeps within u8.
        Ok(expansion_zoom.clamp(0, i32::from(u8::MAX)) as u8)
    }

    /// Features of tile `(z, x, y)` in the standard XYZ scheme, or `None` if empty.
    pub fn get_tile(&self, z: u8, x: u32, y: u32) -> Option<Tile<'_, T, A>> {
        let level = self.level(self.limit_zoom(f64::from(z)))?;
        let z2 = 2f64.powi(i32::from(z));
        let p = self.options.radius / self.options.extent;
        let (tx, ty) = (f64::from(x), f64::from(y));
        let top = (ty - p) / z2;
        let bottom = (ty + 1.0 + p) / z2;

        let mut features = Vec::new();
        self.add_tile_features(
            &mut features,
            level,
            level.index.range((tx - p) / z2, top, (tx + 1.0 + p) / z2, bottom),
            tx,
            ty,
            z2,
        );

        // Buffer copies wrapped around the world's western and eastern edges.
        if x == 0 {
            self.add_tile_features(
                &mut features,
                level,
                level.index.range(1.0 - p / z2, top, 1.0, bottom),
                z2,
                ty,
                z2,
            );
        }
        if tx == z2 - 1.0 {
            self.add_tile_features(
                &mut features,
                level,
                level.index.range(0.0, top, p / z2, bottom),
                -1.0,
                ty,
                z2,
            );
        }

        if features.is_empty() {
            None
        } else {
            Some(Tile { features })
        }
    }

    fn add_tile_features<'a>(
        &'a self,
        features: &mut Vec<TileFeature<'a, T, A>>,
        level: &'a Level,
        ids: Vec<u32>,
        x: f64,
        y: f64,
        z2: f64,
    ) {
        let extent = self.options.extent;
        for i in ids {
            let entry = &level.entries[i as usize];
            let node = self.node(entry);

            let (px, py, id) = match &node {
                ClusterNode::Cluster(cluster) => (entry.x, entry.y, Some(cluster.id.get())),
                ClusterNode::Leaf(leaf) => {
                    let id = if self.options.generate_id {
                        Some(leaf.index as u64)
                    } else {
                        leaf.feature.id
                    };
                    let position = leaf.feature.position;
                    (lng_x(position.x()), lat_y(position.y()), id)
                }
            };

            features.push(TileFeature {
                id,
                x: (extent * (px * z2 - x)).round() as i64,
                y: (extent * (py * z2 - y)).round() as i64,
                node,
            });
        }
    }

    /// Level index for a requested zoom, floored and clamped to the built range.
    fn limit_zoom(&self, zoom: f64) -> usize {
        let min = f64::from(self.options.min_zoom);
        let max = f64::from(self.options.max_zoom) + 1.0;
        let zoom = zoom.floor();
        if zoom.is_nan() {
            return usize::from(self.options.min_zoom);
        }
        zoom.clamp(min, max) as usize
    }

    /// Origin entry index and origin zoom encoded in a cluster id.
    fn decode(&self, cluster_id: ClusterId) -> Option<(usize, u8)> {
        let relative = cluster_id.get().checked_sub(self.points.len() as u64)?;
        let index = usize::try_from(relative >> 5).ok()?;
        Some((index, (relative % 32) as u8))
    }

    /// Index of the entry a cluster was created from, within its origin level.
    pub fn origin_index(&self, cluster_id: ClusterId) -> Result<usize> {
        self.decode(cluster_id)
            .map(|(index, _)| index)
            .ok_or(ClusterError::NoSuchCluster(cluster_id.get()))
    }

    /// Zoom of the level a cluster was created from (one above where it first appears).
    pub fn origin_zoom(&self, cluster_id: ClusterId) -> Result<u8> {
        self.decode(cluster_id)
            .map(|(_, zoom)| zoom)
            .ok_or(ClusterError::NoSuchCluster(cluster_id.get()))
    }

    fn node(&self, entry: &Entry) -> ClusterNode<'_, T, A> {
        if entry.is_cluster() {
            ClusterNode::Cluster(ClusterSummary {
                id: ClusterId(entry.id),
                position: Point::new(x_lng(entry.x), y_lat(entry.y)),
                point_count: entry.num_points,
                properties: entry.props.map(|slot| &self.cluster_props[slot]),
            })
        } else {
            let index = entry.id as usize;
            ClusterNode::Leaf(Leaf {
                index,
                feature: &self.points[index],
            })
        }
    }
}
