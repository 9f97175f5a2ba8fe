use super::{Calculation, Cluster, MapView, Marker, NoopStrategy, Strategy};
use crate::cluster::{ClusterNode, PointFeature, Supercluster};
use crate::compute::projection::{Projection, extend_bounds_to_padded_viewport};
use crate::config::SuperclusterStrategyOptions;
use crate::error::{ClusterError, Result};
use geocluster_types::LatLngBounds;

/// What a calculation depends on besides the markers.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewportState {
    /// View zoom rounded to the nearest level
    zoom: f64,
    /// View bounds grown by the viewport padding
    view: LatLngBounds,
    unclustered: bool,
}

/// Clustering backed by a [`Supercluster`] index over all markers.
///
/// The index is rebuilt only when the marker list differs from the previous
/// call; otherwise clusters are re-queried for the padded viewport at the
/// rounded zoom, and only when the viewport state changed. `changed` is always
/// reported.
pub struct SuperclusterStrategy<M> {
    options: SuperclusterStrategyOptions,
    /// Point properties are indices into `markers`.
    engine: Supercluster<usize>,
    markers: Vec<M>,
    loaded: bool,
    state: Option<ViewportState>,
    clusters: Vec<Cluster<M>>,
}

impl<M: Marker + Clone + PartialEq> SuperclusterStrategy<M> {
    pub fn new(options: SuperclusterStrategyOptions) -> Result<Self> {
        options.validate().map_err(ClusterError::InvalidConfig)?;
        let engine = Supercluster::new(options.engine_options())?;
        Ok(Self {
            options,
            engine,
            markers: Vec::new(),
            loaded: false,
            state: None,
            clusters: Vec::new(),
        })
    }

    pub fn options(&self) -> &SuperclusterStrategyOptions {
        &self.options
    }

    /// The index built from the last marker list.
    pub fn engine(&self) -> &Supercluster<usize> {
        &self.engine
    }

    fn viewport_state(&self, view: &MapView, projection: &dyn Projection) -> ViewportState {
        ViewportState {
            zoom: view.zoom.round(),
            view: extend_bounds_to_padded_viewport(
                &view.bounds,
                projection,
                self.options.viewport_padding,
            ),
            unclustered: view.zoom >= f64::from(self.options.max_zoom),
        }
    }

    fn load(&mut self, markers: &[M]) -> Result<()> {
        let points = markers
            .iter()
            .enumerate()
            .map(|(i, marker)| PointFeature::new(marker.position(), i))
            .collect();
        self.engine.load(points)?;
        self.markers = markers.to_vec();
        self.loaded = true;
        Ok(())
    }

    fn cluster(&self, state: &ViewportState) -> Result<Vec<Cluster<M>>> {
        self.engine
            .get_clusters(&state.view, state.zoom)?
            .into_iter()
            .map(|node| self.transform(node))
            .collect()
    }

    /// Resolve a query result back to the markers it stands for.
    fn transform(&self, node: ClusterNode<'_, usize, ()>) -> Result<Cluster<M>> {
        match node {
            ClusterNode::Leaf(leaf) => Ok(Cluster::new(
                vec![self.markers[leaf.feature.properties].clone()],
                Some(leaf.feature.position),
            )),
            ClusterNode::Cluster(cluster) => {
                let markers = self
                    .engine
                    .get_leaves(cluster.id, usize::MAX, 0)?
                    .into_iter()
                    .map(|leaf| self.markers[leaf.feature.properties].clone())
                    .collect();
                Ok(Cluster::new(markers, Some(cluster.position)))
            }
        }
    }
}

impl<M: Marker + Clone + PartialEq> Strategy<M> for SuperclusterStrategy<M> {
    fn calculate(
        &mut self,
        markers: &[M],
        view: &MapView,
        projection: &dyn Projection,
    ) -> Result<Calculation<M>> {
        let state = self.viewport_state(view, projection);

        let mut changed = false;
        if !self.loaded || self.markers.as_slice() != markers {
            self.load(markers)?;
            changed = true;
        }
        if !changed {
            changed = match &self.state {
                Some(previous) if previous.unclustered && state.unclustered => false,
                Some(previous) => *previous != state,
                None => true,
            };
        }

        if changed {
            self.clusters = if state.unclustered {
                NoopStrategy::singletons(&self.markers)
            } else {
                self.cluster(&state)?
            };
            log::trace!(
                "Recomputed {} clusters at zoom {}",
                self.clusters.len(),
                state.zoom
            );
        }
        self.state = Some(state);

        Ok(Calculation {
            clusters: self.clusters.clone(),
            changed: Some(changed),
        })
    }
}
