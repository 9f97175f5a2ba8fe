use super::{ClusterStats, DefaultRenderer, Renderer};
use crate::compute::projection::Projection;
use crate::config::SuperclusterStrategyOptions;
use crate::error::Result;
use crate::strategy::{Cluster, MapView, Marker, Strategy, SuperclusterStrategy};
use geocluster_types::LatLngBounds;
use std::fmt;

/// The host map as seen by the driver.
///
/// `I` is the icon type the renderer produces for multi-marker clusters.
pub trait MapHost<M, I> {
    /// Current view, or `None` while the map is not ready to be clustered.
    fn view(&self) -> Option<MapView>;

    /// Projection for the current view.
    fn projection(&self) -> &dyn Projection;

    fn show_marker(&mut self, marker: &M);
    fn hide_marker(&mut self, marker: &M);
    fn show_icon(&mut self, icon: &I);
    fn hide_icon(&mut self, icon: &I);

    /// Move the viewport so `bounds` is fully visible.
    fn fit_bounds(&mut self, bounds: &LatLngBounds);
}

/// Notifications emitted by [`ClusterDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterEvent {
    ClusteringBegin,
    /// Emitted after every `ClusteringBegin`, even when the strategy fails.
    ClusteringEnd,
    ClusterClick {
        /// Position in [`ClusterDriver::clusters`]
        index: usize,
        bounds: Option<LatLngBounds>,
    },
}

type Listener = Box<dyn FnMut(&ClusterEvent)>;

/// A cluster currently on the map; multi-marker clusters carry their icon.
struct Rendered<M, I> {
    cluster: Cluster<M>,
    icon: Option<I>,
}

/// Keeps a host map's cluster display in sync with its markers and view.
///
/// Call [`on_idle`](Self::on_idle) whenever the map settles after a pan or
/// zoom, and [`flush_deferred`](Self::flush_deferred) on the next frame after
/// a render. Icons of replaced clusters stay visible until then so the map
/// never shows a gap between the old and new cluster sets.
pub struct ClusterDriver<M, S, R, H>
where
    R: Renderer<M>,
{
    host: H,
    strategy: S,
    renderer: R,
    markers: Vec<M>,
    rendered: Vec<Rendered<M, R::Icon>>,
    deferred: Vec<R::Icon>,
    listeners: Vec<Listener>,
    zoom_on_click: bool,
}

impl<M, H> ClusterDriver<M, SuperclusterStrategy<M>, DefaultRenderer, H>
where
    M: Marker + Clone + PartialEq,
    H: MapHost<M, super::ClusterIcon>,
{
    /// A driver using the index-backed strategy and the default renderer.
    pub fn with_defaults(host: H) -> Result<Self> {
        let strategy = SuperclusterStrategy::new(SuperclusterStrategyOptions::default())?;
        Ok(Self::new(host, strategy, DefaultRenderer))
    }
}

impl<M, S, R, H> ClusterDriver<M, S, R, H>
where
    M: Marker + Clone + PartialEq,
    S: Strategy<M>,
    R: Renderer<M>,
    H: MapHost<M, R::Icon>,
{
    pub fn new(host: H, strategy: S, renderer: R) -> Self {
        Self {
            host,
            strategy,
            renderer,
            markers: Vec::new(),
            rendered: Vec::new(),
            deferred: Vec::new(),
            listeners: Vec::new(),
            zoom_on_click: true,
        }
    }

    /// Whether clicking a cluster fits the viewport to it (default `true`).
    pub fn set_zoom_on_click(&mut self, zoom_on_click: bool) {
        self.zoom_on_click = zoom_on_click;
    }

    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&ClusterEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn markers(&self) -> &[M] {
        &self.markers
    }

    /// Clusters currently on the map.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster<M>> {
        self.rendered.iter().map(|rendered| &rendered.cluster)
    }

    /// Icons waiting for [`flush_deferred`](Self::flush_deferred).
    pub fn pending_removals(&self) -> usize {
        self.deferred.len()
    }

    pub fn add_marker(&mut self, marker: M, no_draw: bool) -> Result<()> {
        if self.markers.contains(&marker) {
            return Ok(());
        }
        self.markers.push(marker);
        if !no_draw {
            self.render()?;
        }
        Ok(())
    }

    pub fn add_markers<I>(&mut self, markers: I, no_draw: bool) -> Result<()>
    where
        I: IntoIterator<Item = M>,
    {
        for marker in markers {
            if !self.markers.contains(&marker) {
                self.markers.push(marker);
            }
        }
        if !no_draw {
            self.render()?;
        }
        Ok(())
    }

    /// Remove a marker from clustering and from the map.
    ///
    /// Returns `false` if the marker was not managed by this driver.
    pub fn remove_marker(&mut self, marker: &M, no_draw: bool) -> Result<bool> {
        let Some(index) = self.markers.iter().position(|m| m == marker) else {
            return Ok(false);
        };
        self.host.hide_marker(marker);
        self.markers.remove(index);
        if !no_draw {
            self.render()?;
        }
        Ok(true)
    }

    /// Remove several markers; redraws only if at least one was removed.
    pub fn remove_markers(&mut self, markers: &[M], no_draw: bool) -> Result<bool> {
        let mut removed = false;
        for marker in markers {
            removed |= self.remove_marker(marker, true)?;
        }
        if removed && !no_draw {
            self.render()?;
        }
        Ok(removed)
    }

    pub fn clear_markers(&mut self, no_draw: bool) -> Result<()> {
        for marker in &self.markers {
            self.host.hide_marker(marker);
        }
        self.markers.clear();
        if !no_draw {
            self.render()?;
        }
        Ok(())
    }

    /// Take every rendered cluster off the map, including icons waiting for
    /// [`flush_deferred`](Self::flush_deferred).
    pub fn reset(&mut self) {
        self.flush_deferred();
        for rendered in self.rendered.drain(..) {
            match &rendered.icon {
                Some(icon) => self.host.hide_icon(icon),
                None => {
                    for marker in rendered.cluster.markers() {
                        self.host.hide_marker(marker);
                    }
                }
            }
        }
    }

    /// Entry point for the host's "map settled" event.
    pub fn on_idle(&mut self) -> Result<()> {
        self.render()
    }

    /// Recompute clusters and update the map.
    ///
    /// Does nothing while the host has no view. Strategy errors propagate after
    /// `ClusteringEnd` has been emitted; the map is left as it was.
    pub fn render(&mut self) -> Result<()> {
        let Some(view) = self.host.view() else {
            log::debug!("Map view not ready, skipping render");
            return Ok(());
        };

        self.emit(&ClusterEvent::ClusteringBegin);
        let result = self
            .strategy
            .calculate(&self.markers, &view, self.host.projection());
        let calculation = match result {
            Ok(calculation) => calculation,
            Err(e) => {
                self.emit(&ClusterEvent::ClusteringEnd);
                return Err(e);
            }
        };

        if calculation.needs_redraw() {
            self.redraw(calculation.clusters);
            log::debug!(
                "Rendered {} clusters for {} markers at zoom {}",
                self.rendered.len(),
                self.markers.len(),
                view.zoom
            );
        }

        self.emit(&ClusterEvent::ClusteringEnd);
        Ok(())
    }

    /// Update the map from `clusters`, touching only clusters whose
    /// membership differs from the previous render.
    fn redraw(&mut self, clusters: Vec<Cluster<M>>) {
        let stats = ClusterStats::new(&self.markers, &clusters);
        let mut previous: Vec<Option<Rendered<M, R::Icon>>> = std::mem::take(&mut self.rendered)
            .into_iter()
            .map(Some)
            .collect();

        for cluster in clusters {
            if cluster.is_empty() {
                continue;
            }

            let unchanged = previous
                .iter_mut()
                .find(|slot| {
                    slot.as_ref()
                        .is_some_and(|old| same_members(&old.cluster, &cluster))
                })
                .and_then(Option::take);
            if let Some(old) = unchanged {
                self.rendered.push(Rendered {
                    cluster,
                    icon: old.icon,
                });
                continue;
            }

            if cluster.len() == 1 {
                self.host.show_marker(&cluster.markers()[0]);
                self.rendered.push(Rendered {
                    cluster,
                    icon: None,
                });
            } else {
                let icon = self.renderer.render(&cluster, &stats);
                for marker in cluster.markers() {
                    self.host.hide_marker(marker);
                }
                self.host.show_icon(&icon);
                self.rendered.push(Rendered {
                    cluster,
                    icon: Some(icon),
                });
            }
        }

        for old in previous.into_iter().flatten() {
            match old.icon {
                Some(icon) => self.deferred.push(icon),
                None => {
                    if let [marker] = old.cluster.markers()
                        && !self.is_single(marker)
                    {
                        self.host.hide_marker(marker);
                    }
                }
            }
        }
    }

    fn is_single(&self, marker: &M) -> bool {
        self.rendered.iter().any(|rendered| {
            rendered.icon.is_none() && rendered.cluster.markers().first() == Some(marker)
        })
    }

    /// Remove icons of clusters replaced by the last render.
    pub fn flush_deferred(&mut self) {
        for icon in self.deferred.drain(..) {
            self.host.hide_icon(&icon);
        }
    }

    /// Handle a click on the icon of the cluster at `index`.
    ///
    /// Returns `false` if there is no multi-marker cluster at that position.
    pub fn click_cluster(&mut self, index: usize) -> bool {
        let Some(rendered) = self.rendered.get(index) else {
            return false;
        };
        if rendered.icon.is_none() {
            return false;
        }

        let bounds = rendered.cluster.bounds();
        self.emit(&ClusterEvent::ClusterClick { index, bounds });
        if self.zoom_on_click
            && let Some(bounds) = bounds
        {
            self.host.fit_bounds(&bounds);
        }
        true
    }

    fn emit(&mut self, event: &ClusterEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

/// Membership equality; the driver keeps its markers free of duplicates.
fn same_members<M: Marker + PartialEq>(a: &Cluster<M>, b: &Cluster<M>) -> bool {
    a.len() == b.len() && a.markers().iter().all(|marker| b.markers().contains(marker))
}

impl<M, S, R, H> fmt::Debug for ClusterDriver<M, S, R, H>
where
    R: Renderer<M>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterDriver")
            .field("markers", &self.markers.len())
            .field("clusters", &self.rendered.len())
            .field("deferred", &self.deferred.len())
            .field("listeners", &self.listeners.len())
            .field("zoom_on_click", &self.zoom_on_click)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::projection::WebMercator;
    use crate::render::ClusterIcon;
    use crate::strategy::{GridStrategy, NoopStrategy};
    use geo::Point;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct TestHost {
        view: Option<MapView>,
        projection: WebMercator,
        markers: Vec<Point>,
        icons: Vec<ClusterIcon>,
        icons_shown: usize,
        icons_hidden: usize,
        fitted: Vec<LatLngBounds>,
    }

    impl TestHost {
        fn detached() -> Self {
            Self {
                view: None,
                projection: WebMercator::new(0.0),
                markers: Vec::new(),
                icons: Vec::new(),
                icons_shown: 0,
                icons_hidden: 0,
                fitted: Vec::new(),
            }
        }

        fn at(bounds: LatLngBounds, zoom: f64) -> Self {
            Self {
                view: Some(MapView::new(bounds, zoom)),
                projection: WebMercator::new(zoom),
                ..Self::detached()
            }
        }
    }

    impl MapHost<Point, ClusterIcon> for TestHost {
        fn view(&self) -> Option<MapView> {
            self.view
        }

        fn projection(&self) -> &dyn Projection {
            &self.projection
        }

        fn show_marker(&mut self, marker: &Point) {
            if !self.markers.contains(marker) {
                self.markers.push(*marker);
            }
        }

        fn hide_marker(&mut self, marker: &Point) {
            self.markers.retain(|m| m != marker);
        }

        fn show_icon(&mut self, icon: &ClusterIcon) {
            self.icons_shown += 1;
            self.icons.push(icon.clone());
        }

        fn hide_icon(&mut self, icon: &ClusterIcon) {
            self.icons_hidden += 1;
            if let Some(i) = self.icons.iter().position(|shown| shown == icon) {
                self.icons.remove(i);
            }
        }

        fn fit_bounds(&mut self, bounds: &LatLngBounds) {
            self.fitted.push(*bounds);
        }
    }

    fn markers() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
            Point::new(30.0, 30.0),
        ]
    }

    #[test]
    fn test_render_shows_icons_and_singletons() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, GridStrategy::default(), DefaultRenderer);
        driver.add_markers(markers(), false).unwrap();

        assert_eq!(driver.clusters().count(), 2);
        assert_eq!(driver.host().icons.len(), 1);
        assert_eq!(driver.host().icons[0].count, 3);
        assert_eq!(driver.host().markers, vec![Point::new(30.0, 30.0)]);
    }

    #[test]
    fn test_events_bracket_every_render() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, NoopStrategy::new(), DefaultRenderer);
        driver.add_listener(move |event| sink.borrow_mut().push(event.clone()));

        driver.add_marker(Point::new(0.0, 0.0), false).unwrap();
        driver.on_idle().unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                ClusterEvent::ClusteringBegin,
                ClusterEvent::ClusteringEnd,
                ClusterEvent::ClusteringBegin,
                ClusterEvent::ClusteringEnd,
            ]
        );
    }

    #[test]
    fn test_replaced_icons_are_removed_on_flush() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, GridStrategy::default(), DefaultRenderer);
        driver.add_markers(markers(), false).unwrap();

        driver.add_marker(Point::new(1.5, 0.5), false).unwrap();
        assert_eq!(driver.pending_removals(), 1);
        assert_eq!(driver.host().icons.len(), 2);

        driver.flush_deferred();
        assert_eq!(driver.pending_removals(), 0);
        assert_eq!(driver.host().icons.len(), 1);
        assert_eq!(driver.host().icons[0].count, 4);
    }

    fn two_groups() -> Vec<Point> {
        let mut markers = markers();
        markers.push(Point::new(31.0, 31.0));
        markers
    }

    #[test]
    fn test_redraw_keeps_icons_of_unchanged_clusters() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, GridStrategy::default(), DefaultRenderer);
        driver.add_markers(two_groups(), false).unwrap();
        assert_eq!(driver.host().icons_shown, 2);

        driver.on_idle().unwrap();
        driver.flush_deferred();

        assert_eq!(driver.host().icons_shown, 2);
        assert_eq!(driver.host().icons_hidden, 0);
        assert_eq!(driver.host().icons.len(), 2);
        assert_eq!(driver.clusters().count(), 2);
    }

    #[test]
    fn test_redraw_replaces_only_the_changed_cluster() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, GridStrategy::default(), DefaultRenderer);
        driver.add_markers(two_groups(), false).unwrap();

        driver.add_marker(Point::new(1.5, 0.5), false).unwrap();
        assert_eq!(driver.pending_removals(), 1);
        driver.flush_deferred();

        assert_eq!(driver.host().icons_shown, 3);
        assert_eq!(driver.host().icons_hidden, 1);
        let mut counts: Vec<usize> = driver.host().icons.iter().map(|icon| icon.count).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![2, 4]);
    }

    #[test]
    fn test_unchanged_calculation_skips_redraw() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::with_defaults(host).unwrap();
        driver.add_markers(markers(), false).unwrap();
        let icons = driver.host().icons.len();

        driver.on_idle().unwrap();
        assert_eq!(driver.pending_removals(), 0);
        assert_eq!(driver.host().icons.len(), icons);
    }

    #[test]
    fn test_no_render_without_view() {
        let mut driver = ClusterDriver::new(TestHost::detached(), NoopStrategy::new(), DefaultRenderer);
        driver.add_markers(markers(), false).unwrap();
        assert_eq!(driver.clusters().count(), 0);
        assert!(driver.host().markers.is_empty());
    }

    #[test]
    fn test_remove_marker() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, NoopStrategy::new(), DefaultRenderer);
        driver.add_markers(markers(), false).unwrap();

        assert!(!driver.remove_marker(&Point::new(9.0, 9.0), false).unwrap());
        assert!(driver.remove_marker(&Point::new(30.0, 30.0), false).unwrap());
        assert_eq!(driver.markers().len(), 3);
        assert!(!driver.host().markers.contains(&Point::new(30.0, 30.0)));

        driver.clear_markers(false).unwrap();
        assert!(driver.host().markers.is_empty());
        assert_eq!(driver.clusters().count(), 0);
    }

    #[test]
    fn test_click_cluster_fits_bounds() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, GridStrategy::default(), DefaultRenderer);
        driver.add_markers(markers(), false).unwrap();

        let group = driver.clusters().position(|c| c.len() == 3).unwrap();
        let single = driver.clusters().position(|c| c.len() == 1).unwrap();

        assert!(!driver.click_cluster(single));
        assert!(driver.click_cluster(group));
        assert_eq!(
            driver.host().fitted,
            vec![LatLngBounds::new(0.0, 0.0, 2.0, 1.0)]
        );

        driver.set_zoom_on_click(false);
        assert!(driver.click_cluster(group));
        assert_eq!(driver.host().fitted.len(), 1);
    }

    #[test]
    fn test_reset_clears_the_map() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, GridStrategy::default(), DefaultRenderer);
        driver.add_markers(markers(), false).unwrap();

        driver.reset();
        assert_eq!(driver.clusters().count(), 0);
        assert!(driver.host().icons.is_empty());
        assert!(driver.host().markers.is_empty());
        assert_eq!(driver.markers().len(), 4);
    }

    #[test]
    fn test_reset_removes_deferred_icons() {
        let host = TestHost::at(LatLngBounds::world(), 3.0);
        let mut driver = ClusterDriver::new(host, GridStrategy::default(), DefaultRenderer);
        driver.add_markers(markers(), false).unwrap();
        driver.add_marker(Point::new(1.5, 0.5), false).unwrap();
        assert_eq!(driver.pending_removals(), 1);

        driver.reset();
        assert_eq!(driver.pending_removals(), 0);
        assert!(driver.host().icons.is_empty());
    }
}
