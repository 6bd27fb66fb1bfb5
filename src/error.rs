// src/error.rs

use thiserror::Error;

use crate::clustering::{ClusterId, EntityId};

/// Result alias used across the library.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors raised by the cluster index and its loaders.
///
/// Every variant is recoverable and a deterministic function of the current
/// state and the arguments, so callers can retry after correcting input.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// The entity is not indexed.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The cluster id was never allocated or has been retired.
    #[error("Cluster not found: {0}")]
    ClusterNotFound(ClusterId),

    /// The entity already belongs to a cluster. Use `add_link` to merge instead.
    #[error("Entity {entity} already belongs to cluster {cluster_id}")]
    AlreadyLinked { entity: EntityId, cluster_id: ClusterId },

    /// The entities exist but are not in the same cluster.
    #[error("Entities {0} and {1} are not linked")]
    NotLinked(EntityId, EntityId),

    /// Sampling asked for more units than the source holds.
    #[error("Insufficient data: requested {requested}, available {available}")]
    InsufficientData { requested: usize, available: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ClusterError {
    /// True for both flavours of missing-id errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClusterError::EntityNotFound(_) | ClusterError::ClusterNotFound(_)
        )
    }
}
