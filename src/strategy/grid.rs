use super::{
    Calculation, Cluster, MapView, Marker, NoopStrategy, SeenState, Strategy,
    filter_markers_to_padded_viewport,
};
use crate::compute::distance::distance_km;
use crate::compute::projection::{Projection, extend_bounds_to_padded_viewport};
use crate::config::GridOptions;
use crate::error::{ClusterError, Result};

/// Greedy grid clustering.
///
/// Each marker in the padded viewport joins the nearest existing cluster whose
/// center is within `max_distance_km` and whose bounds, grown by `grid_size`
/// pixels, contain it; otherwise it starts a new cluster. The result depends on
/// marker order and costs O(markers × clusters), so it suits modest marker counts.
#[derive(Debug, Clone)]
pub struct GridStrategy<M> {
    options: GridOptions,
    seen: SeenState<M>,
}

impl<M: Marker + Clone + PartialEq> GridStrategy<M> {
    pub fn new(options: GridOptions) -> Result<Self> {
        options.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(Self {
            options,
            seen: SeenState::new(),
        })
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    fn cluster(&self, markers: Vec<&M>, projection: &dyn Projection) -> Vec<Cluster<M>> {
        let mut clusters = Vec::new();
        for marker in markers {
            self.add_to_closest_cluster(&mut clusters, marker.clone(), projection);
        }
        clusters
    }

    fn add_to_closest_cluster(
        &self,
        clusters: &mut Vec<Cluster<M>>,
        marker: M,
        projection: &dyn Projection,
    ) {
        let position = marker.position();
        let mut max_distance = self.options.max_distance_km;
        let mut closest = None;

        for (i, cluster) in clusters.iter().enumerate() {
            let Some(center) = cluster.position() else {
                continue;
            };
            let distance = distance_km(&center, &position);
            if distance < max_distance {
                max_distance = distance;
                closest = Some(i);
            }
        }

        if let Some(i) = closest
            && let Some(bounds) = clusters[i].bounds()
            && extend_bounds_to_padded_viewport(&bounds, projection, self.options.grid_size)
                .contains_point(&position)
        {
            clusters[i].push(marker);
        } else {
            clusters.push(Cluster::new(vec![marker], None));
        }
    }
}

impl<M: Marker + Clone + PartialEq> Default for GridStrategy<M> {
    fn default() -> Self {
        Self {
            options: GridOptions::default(),
            seen: SeenState::new(),
        }
    }
}

impl<M: Marker + Clone + PartialEq> Strategy<M> for GridStrategy<M> {
    fn calculate(
        &mut self,
        markers: &[M],
        view: &MapView,
        projection: &dyn Projection,
    ) -> Result<Calculation<M>> {
        let changed = self.seen.update(markers, view.zoom, self.options.max_zoom);
        if view.zoom >= self.options.max_zoom {
            return Ok(Calculation {
                clusters: NoopStrategy::singletons(markers),
                changed: Some(changed),
            });
        }

        let visible =
            filter_markers_to_padded_viewport(markers, view, projection, self.options.viewport_padding);
        Ok(Calculation {
            clusters: self.cluster(visible, projection),
            changed: None,
        })
    }
}
