//! Viewport clustering strategies.
//!
//! A [`Strategy`] turns the host map's markers and current view into a list of
//! [`Cluster`]s for the render driver. Three policies are provided:
//!
//! - [`NoopStrategy`]: every marker is its own cluster
//! - [`GridStrategy`]: greedy nearest-cluster assignment in screen space
//! - [`SuperclusterStrategy`]: viewport queries against a [`Supercluster`] index
//!
//! Every strategy stops clustering once the view zoom reaches its `max_zoom`.
//!
//! [`Supercluster`]: crate::Supercluster

mod grid;
mod noop;
mod supercluster;

pub use grid::GridStrategy;
pub use noop::NoopStrategy;
pub use supercluster::SuperclusterStrategy;

use crate::compute::projection::{Projection, extend_bounds_to_padded_viewport};
use crate::error::Result;
use geo::Point;
use geocluster_types::LatLngBounds;

/// A marker placed on the host map.
pub trait Marker {
    fn position(&self) -> Point;

    /// Hidden markers still take part in clustering but are not counted.
    fn is_visible(&self) -> bool {
        true
    }
}

impl Marker for Point {
    fn position(&self) -> Point {
        *self
    }
}

/// A group of markers shown as one unit on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster<M> {
    markers: Vec<M>,
    position: Option<Point>,
}

impl<M: Marker> Cluster<M> {
    /// Create a cluster; without an explicit position it sits at the center of its bounds.
    pub fn new(markers: Vec<M>, position: Option<Point>) -> Self {
        Self { markers, position }
    }

    /// A single-marker cluster at the marker's position.
    pub fn singleton(marker: M) -> Self {
        let position = marker.position();
        Self::new(vec![marker], Some(position))
    }

    pub fn markers(&self) -> &[M] {
        &self.markers
    }

    pub fn into_markers(self) -> Vec<M> {
        self.markers
    }

    pub fn push(&mut self, marker: M) {
        self.markers.push(marker);
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Number of visible markers.
    pub fn count(&self) -> usize {
        self.markers.iter().filter(|m| m.is_visible()).count()
    }

    /// Extent of the marker positions, or `None` for an empty cluster.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let positions: Vec<Point> = self.markers.iter().map(Marker::position).collect();
        LatLngBounds::from_points(&positions)
    }

    pub fn position(&self) -> Option<Point> {
        self.position
            .or_else(|| self.bounds().map(|bounds| bounds.center()))
    }
}

/// The host map's current view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub bounds: LatLngBounds,
    pub zoom: f64,
}

impl MapView {
    pub fn new(bounds: LatLngBounds, zoom: f64) -> Self {
        Self { bounds, zoom }
    }
}

/// Output of one [`Strategy::calculate`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation<M> {
    pub clusters: Vec<Cluster<M>>,
    /// Whether the clusters differ from the previous call; `None` when unknown.
    pub changed: Option<bool>,
}

impl<M> Calculation<M> {
    /// Whether the driver should redraw: changed, or not known to be unchanged.
    pub fn needs_redraw(&self) -> bool {
        self.changed != Some(false)
    }
}

/// A clustering policy.
pub trait Strategy<M> {
    fn calculate(
        &mut self,
        markers: &[M],
        view: &MapView,
        projection: &dyn Projection,
    ) -> Result<Calculation<M>>;
}

impl<M, S: Strategy<M> + ?Sized> Strategy<M> for Box<S> {
    fn calculate(
        &mut self,
        markers: &[M],
        view: &MapView,
        projection: &dyn Projection,
    ) -> Result<Calculation<M>> {
        (**self).calculate(markers, view, projection)
    }
}

/// Markers inside the view grown by `padding` pixels on every side.
pub fn filter_markers_to_padded_viewport<'a, M: Marker>(
    markers: &'a [M],
    view: &MapView,
    projection: &dyn Projection,
    padding: f64,
) -> Vec<&'a M> {
    let padded = extend_bounds_to_padded_viewport(&view.bounds, projection, padding);
    markers
        .iter()
        .filter(|marker| padded.contains_point(&marker.position()))
        .collect()
}

/// Tracks the zoom and marker set of the previous call to report `changed`.
#[derive(Debug, Clone)]
struct SeenState<M> {
    zoom: Option<f64>,
    markers: Vec<M>,
}

impl<M: Clone + PartialEq> SeenState<M> {
    fn new() -> Self {
        Self {
            zoom: None,
            markers: Vec::new(),
        }
    }

    /// Record this call's inputs and report whether anything differs.
    ///
    /// Zoom changes that stay at or above `max_zoom` on both sides do not count.
    fn update(&mut self, markers: &[M], zoom: f64, max_zoom: f64) -> bool {
        let zoom_changed = match self.zoom {
            Some(previous) if previous >= max_zoom && zoom >= max_zoom => false,
            Some(previous) => previous != zoom,
            None => true,
        };
        let markers_changed = self.markers.as_slice() != markers;
        if markers_changed {
            self.markers = markers.to_vec();
        }
        self.zoom = Some(zoom);
        zoom_changed || markers_changed
    }
}
