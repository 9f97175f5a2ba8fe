//! Level-by-level construction of the per-zoom indices.

use super::{Aggregator, PointFeature, Supercluster};
use crate::compute::projection::project_f32;
use crate::compute::validation::validate_points;
use crate::error::Result;
use crate::index::{IndexBuilder, KdIndex};
use std::time::Instant;

/// One indexed entry of a zoom level: a raw point or a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Entry {
    /// Projected x
    pub x: f64,
    /// Projected y
    pub y: f64,
    /// Last zoom this entry was processed at; `None` until then.
    pub zoom: Option<u8>,
    /// Input index for raw points, synthetic cluster id otherwise
    pub id: u64,
    /// Id of the cluster this entry was merged into one level up
    pub parent: Option<u64>,
    pub num_points: usize,
    /// Slot in the aggregated properties table
    pub props: Option<usize>,
}

impl Entry {
    fn point(x: f64, y: f64, index: usize) -> Self {
        Self {
            x,
            y,
            zoom: None,
            id: index as u64,
            parent: None,
            num_points: 1,
            props: None,
        }
    }

    pub fn is_cluster(&self) -> bool {
        self.num_points > 1
    }

    /// Not yet consumed while building the level at `zoom`.
    fn is_live(&self, zoom: u8) -> bool {
        self.zoom.is_none_or(|processed| processed > zoom)
    }
}

/// Entries of one zoom level and the spatial index over their positions.
///
/// Index ids are positions in `entries`.
#[derive(Debug)]
pub(super) struct Level {
    pub index: KdIndex,
    pub entries: Vec<Entry>,
}

impl Level {
    fn build(entries: Vec<Entry>, node_size: usize) -> Result<Self> {
        let mut builder = IndexBuilder::with_node_size(entries.len(), node_size);
        for entry in &entries {
            builder.add(entry.x, entry.y)?;
        }
        Ok(Self {
            index: builder.finish()?,
            entries,
        })
    }
}

impl<T, A: Clone> Supercluster<T, A> {
    /// Index a point set, replacing anything loaded before.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClusterError::InvalidInput`] if any position is not a
    /// finite longitude/latitude in range; the previous state is kept in that case.
    pub fn load(&mut self, points: Vec<PointFeature<T>>) -> Result<()> {
        validate_points(points.iter().map(|p| &p.position))?;
        if points.is_empty() {
            log::warn!("Loading an empty point set; every query will be empty");
        }

        let start = Instant::now();
        let min_zoom = self.options.min_zoom;
        let max_zoom = self.options.max_zoom;

        self.points = points;
        self.cluster_props.clear();
        self.levels = (0..=usize::from(max_zoom) + 1).map(|_| None).collect();

        let entries = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let (x, y) = project_f32(&p.position);
                Entry::point(x, y, i)
            })
            .collect();

        let mut level = Level::build(entries, self.options.node_size)?;
        for zoom in (min_zoom..=max_zoom).rev() {
            let next = Level::build(self.cluster_level(&mut level, zoom), self.options.node_size)?;
            log::trace!(
                "zoom {}: {} entries clustered into {}",
                zoom,
                level.entries.len(),
                next.entries.len()
            );
            self.levels[usize::from(zoom) + 1] = Some(level);
            level = next;
        }
        self.levels[usize::from(min_zoom)] = Some(level);

        log::debug!(
            "Indexed {} points over zoom levels {}..={} in {:?}",
            self.points.len(),
            min_zoom,
            max_zoom + 1,
            start.elapsed()
        );
        Ok(())
    }

    /// Merge the entries of `level` (one zoom finer) into the entries of `zoom`.
    ///
    /// Marks consumed entries of `level` with `zoom` and, when merged, with their
    /// parent cluster id.
    fn cluster_level(&mut self, level: &mut Level, zoom: u8) -> Vec<Entry> {
        let r = self.options.radius_at(i32::from(zoom));
        let num_input = self.points.len() as u64;
        let aggregator = self.aggregator.as_ref();
        let mut next = Vec::new();

        for i in 0..level.entries.len() {
            if !level.entries[i].is_live(zoom) {
                continue;
            }
            level.entries[i].zoom = Some(zoom);

            let origin = level.entries[i];
            let neighbors = level.index.within(origin.x, origin.y, r);

            let num_points = origin.num_points
                + neighbors
                    .iter()
                    .map(|&k| &level.entries[k as usize])
                    .filter(|e| e.is_live(zoom))
                    .map(|e| e.num_points)
                    .sum::<usize>();

            if num_points > origin.num_points && num_points >= self.options.min_points {
                let id = ((i as u64) << 5) + u64::from(zoom) + 1 + num_input;
                let mut wx = origin.x * origin.num_points as f64;
                let mut wy = origin.y * origin.num_points as f64;
                let mut acc: Option<A> = None;

                for &k in &neighbors {
                    let neighbor = &mut level.entries[k as usize];
                    if !neighbor.is_live(zoom) {
                        continue;
                    }
                    neighbor.zoom = Some(zoom);
                    neighbor.parent = Some(id);
                    let neighbor = *neighbor;

                    wx += neighbor.x * neighbor.num_points as f64;
                    wy += neighbor.y * neighbor.num_points as f64;

                    if let Some(agg) = aggregator {
                        let acc = acc.get_or_insert_with(|| {
                            mapped_owned(agg, &self.points, &self.cluster_props, &origin)
                        });
                        match neighbor.props {
                            Some(slot) if neighbor.is_cluster() => {
                                (agg.reduce)(acc, &self.cluster_props[slot]);
                            }
                            _ => {
                                let props = &self.points[neighbor.id as usize].properties;
                                (agg.reduce)(acc, &(agg.map)(props));
                            }
                        }
                    }
                }

                level.entries[i].parent = Some(id);
                let props = acc.map(|acc| {
                    self.cluster_props.push(acc);
                    self.cluster_props.len() - 1
                });

                next.push(Entry {
                    x: wx / num_points as f64,
                    y: wy / num_points as f64,
                    zoom: None,
                    id,
                    parent: None,
                    num_points,
                    props,
                });
            } else {
                next.push(origin);

                if num_points > 1 {
                    for &k in &neighbors {
                        let neighbor = &mut level.entries[k as usize];
                        if !neighbor.is_live(zoom) {
                            continue;
                        }
                        neighbor.zoom = Some(zoom);
                        next.push(*neighbor);
                    }
                }
            }
        }

        next
    }
}

/// Owned aggregate for an entry: a copy of a cluster's aggregate, or a point's mapped properties.
fn mapped_owned<T, A: Clone>(
    agg: &Aggregator<T, A>,
    points: &[PointFeature<T>],
    cluster_props: &[A],
    entry: &Entry,
) -> A {
    match entry.props {
        Some(slot) if entry.is_cluster() => cluster_props[slot].clone(),
        _ => (agg.map)(&points[entry.id as usize].properties),
    }
}
