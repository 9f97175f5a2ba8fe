//! Configuration for the cluster engine and the viewport strategies.
//!
//! All option structs are serializable so they can be loaded from JSON (or TOML
//! with the `toml` feature). Closures for property aggregation are not part of
//! the serialized configuration; see [`crate::cluster::Supercluster::with_aggregator`].
use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};

/// Highest `max_zoom` whose cluster ids can encode `zoom + 1` in five bits.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Options for [`crate::cluster::Supercluster`].
///
/// # Example
///
/// ```rust
/// use geocluster::ClusterOptions;
///
/// let options = ClusterOptions::from_json(r#"{ "radius": 60, "max_zoom": 14 }"#)?;
/// assert_eq!(options.radius, 60.0);
/// assert_eq!(options.extent, 512.0);
/// # Ok::<(), geocluster::ClusterError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterOptions {
    /// Lowest zoom level at which clusters are generated
    #[serde(default)]
    pub min_zoom: u8,

    /// Highest zoom level at which clusters are generated
    #[serde(default = "ClusterOptions::default_max_zoom")]
    pub max_zoom: u8,

    /// Minimum number of points to form a cluster
    #[serde(default = "ClusterOptions::default_min_points")]
    pub min_points: usize,

    /// Cluster radius in pixels
    #[serde(default = "ClusterOptions::default_radius")]
    pub radius: f64,

    /// Tile extent in pixels; the radius is calculated relative to it
    #[serde(default = "ClusterOptions::default_extent")]
    pub extent: f64,

    /// Size of the index leaf node, affects performance
    #[serde(default = "ClusterOptions::default_node_size")]
    pub node_size: usize,

    /// Use the point's input index as the tile feature id for unclustered points
    #[serde(default)]
    pub generate_id: bool,
}

impl ClusterOptions {
    const fn default_max_zoom() -> u8 {
        16
    }

    const fn default_min_points() -> usize {
        2
    }

    const fn default_radius() -> f64 {
        40.0
    }

    const fn default_extent() -> f64 {
        512.0
    }

    const fn default_node_size() -> usize {
        64
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn with_node_size(mut self, node_size: usize) -> Self {
        self.node_size = node_size;
        self
    }

    pub fn with_generate_id(mut self, generate_id: bool) -> Self {
        self.generate_id = generate_id;
        self
    }

    /// Merge radius in projected units at `zoom`.
    pub(crate) fn radius_at(&self, zoom: i32) -> f64 {
        self.radius / (self.extent * 2f64.powi(zoom))
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(format!(
                "max_zoom must be at most {}, got {}",
                MAX_SUPPORTED_ZOOM, self.max_zoom
            ));
        }
        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min_zoom ({}) must be <= max_zoom ({})",
                self.min_zoom, self.max_zoom
            ));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(format!("radius must be finite and positive, got {}", self.radius));
        }
        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err(format!("extent must be finite and positive, got {}", self.extent));
        }
        if self.min_points == 0 {
            return Err("min_points must be at least 1".to_string());
        }
        if !(2..=65_535).contains(&self.node_size) {
            return Err(format!(
                "node_size must be between 2 and 65535, got {}",
                self.node_size
            ));
        }
        Ok(())
    }

    /// Load options from a JSON string, validating them.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(options)
    }

    /// Save options as a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load options from a TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let options: Self = toml::from_str(toml_str)?;
        options.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(options)
    }

    /// Save options as a TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            min_points: Self::default_min_points(),
            radius: Self::default_radius(),
            extent: Self::default_extent(),
            node_size: Self::default_node_size(),
            generate_id: false,
        }
    }
}

/// Options for [`crate::strategy::GridStrategy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridOptions {
    /// At or above this zoom markers are never clustered
    #[serde(default = "GridOptions::default_max_zoom")]
    pub max_zoom: f64,

    /// Pixels added around the viewport before filtering markers
    #[serde(default = "GridOptions::default_viewport_padding")]
    pub viewport_padding: f64,

    /// Pixels added around a cluster's bounds when testing membership
    #[serde(default = "GridOptions::default_grid_size")]
    pub grid_size: f64,

    /// Upper bound on marker-to-cluster distance in kilometers
    #[serde(default = "GridOptions::default_max_distance_km")]
    pub max_distance_km: f64,
}

impl GridOptions {
    const fn default_max_zoom() -> f64 {
        16.0
    }

    const fn default_viewport_padding() -> f64 {
        60.0
    }

    const fn default_grid_size() -> f64 {
        40.0
    }

    const fn default_max_distance_km() -> f64 {
        40_000.0
    }

    pub fn with_max_zoom(mut self, max_zoom: f64) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_max_distance_km(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = max_distance_km;
        self
    }

    pub fn with_viewport_padding(mut self, viewport_padding: f64) -> Self {
        self.viewport_padding = viewport_padding;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.grid_size.is_finite() || self.grid_size < 0.0 {
            return Err(format!("grid_size must be finite and >= 0, got {}", self.grid_size));
        }
        if !self.viewport_padding.is_finite() || self.viewport_padding < 0.0 {
            return Err(format!(
                "viewport_padding must be finite and >= 0, got {}",
                self.viewport_padding
            ));
        }
        if self.max_distance_km.is_nan() || self.max_distance_km <= 0.0 {
            return Err(format!(
                "max_distance_km must be positive, got {}",
                self.max_distance_km
            ));
        }
        if self.max_zoom.is_nan() {
            return Err("max_zoom must not be NaN".to_string());
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(options)
    }
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            max_zoom: Self::default_max_zoom(),
            viewport_padding: Self::default_viewport_padding(),
            grid_size: Self::default_grid_size(),
            max_distance_km: Self::default_max_distance_km(),
        }
    }
}

/// Options for [`crate::strategy::SuperclusterStrategy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuperclusterStrategyOptions {
    /// At or above this zoom markers are never clustered; also the engine's `max_zoom`
    #[serde(default = "SuperclusterStrategyOptions::default_max_zoom")]
    pub max_zoom: u8,

    /// Pixels added around the viewport before querying clusters
    #[serde(default = "SuperclusterStrategyOptions::default_viewport_padding")]
    pub viewport_padding: f64,

    /// Engine options; `max_zoom` is overridden by the field above
    #[serde(default = "SuperclusterStrategyOptions::default_cluster")]
    pub cluster: ClusterOptions,
}

impl SuperclusterStrategyOptions {
    const fn default_max_zoom() -> u8 {
        16
    }

    const fn default_viewport_padding() -> f64 {
        60.0
    }

    fn default_cluster() -> ClusterOptions {
        ClusterOptions::default().with_radius(60.0)
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_viewport_padding(mut self, viewport_padding: f64) -> Self {
        self.viewport_padding = viewport_padding;
        self
    }

    pub fn with_cluster_options(mut self, cluster: ClusterOptions) -> Self {
        self.cluster = cluster;
        self
    }

    /// Engine options with `max_zoom` taken from the strategy.
    pub fn engine_options(&self) -> ClusterOptions {
        let mut options = self.cluster.clone();
        options.max_zoom = self.max_zoom;
        options.min_zoom = options.min_zoom.min(self.max_zoom);
        options
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.viewport_padding.is_finite() || self.viewport_padding < 0.0 {
            return Err(format!(
                "viewport_padding must be finite and >= 0, got {}",
                self.viewport_padding
            ));
        }
        self.engine_options().validate()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(options)
    }
}

impl Default for SuperclusterStrategyOptions {
    fn default() -> Self {
        Self {
            max_zoom: Self::default_max_zoom(),
            viewport_padding: Self::default_viewport_padding(),
            cluster: Self::default_cluster(),
        }
    }
}
