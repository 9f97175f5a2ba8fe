use super::{Calculation, Cluster, MapView, Marker, Strategy};
use crate::compute::projection::Projection;
use crate::error::Result;

/// Shows every marker on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStrategy;

impl NoopStrategy {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn singletons<M: Marker + Clone>(markers: &[M]) -> Vec<Cluster<M>> {
        markers.iter().cloned().map(Cluster::singleton).collect()
    }
}

impl<M: Marker + Clone> Strategy<M> for NoopStrategy {
    fn calculate(
        &mut self,
        markers: &[M],
        _view: &MapView,
        _projection: &dyn Projection,
    ) -> Result<Calculation<M>> {
        Ok(Calculation {
            clusters: Self::singletons(markers),
            changed: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::projection::WebMercator;
    use geo::Point;
    use geocluster_types::LatLngBounds;

    #[test]
    fn test_every_marker_is_a_singleton() {
        let markers = vec![Point::new(0.0, 0.0), Point::new(0.0, 0.0), Point::new(5.0, 5.0)];
        let view = MapView::new(LatLngBounds::world(), 2.0);

        let result = NoopStrategy::new()
            .calculate(&markers, &view, &WebMercator::new(2.0))
            .unwrap();

        assert_eq!(result.clusters.len(), 3);
        assert!(result.clusters.iter().all(|c| c.len() == 1));
        assert_eq!(result.clusters[2].position(), Some(Point::new(5.0, 5.0)));
        assert_eq!(result.changed, None);
    }
}
