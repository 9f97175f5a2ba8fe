//! Error types for the clustering engine.

use thiserror::Error;

/// Errors produced by the spatial index, the cluster engine and its configuration.
///
/// Every variant signals a usage or input error; all operations are deterministic
/// computations over in-memory data, so nothing here is worth retrying.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// `finish()` was called before every declared point was added.
    #[error("Added {added} items when expected {expected}")]
    ItemCountMismatch { added: usize, expected: usize },

    /// `add()` was called after the declared capacity was reached.
    #[error("Index is full: all {0} declared items were already added")]
    IndexFull(usize),

    /// A serialized index buffer could not be decoded.
    #[error("Invalid index data: {0}")]
    InvalidFormat(String),

    /// Drill-down on an id that does not name a cluster of the loaded point set.
    #[error("No cluster with the specified id: {0}")]
    NoSuchCluster(u64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
