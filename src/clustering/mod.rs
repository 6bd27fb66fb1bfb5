// src/clustering/mod.rs

pub mod cluster_index;
pub mod components;
pub mod entity;
pub mod query;

use std::sync::{Arc, RwLock};

pub use cluster_index::{ClusterIndex, Pairs};
pub use components::connected_components;
pub use entity::{ClusterId, EntityId};
pub use query::{ClusterQuery, LinkOutcome, Links};

/// A cluster index shared between threads: many readers or one writer.
pub type SharedClusterIndex = Arc<RwLock<ClusterIndex>>;

/// Wrap an index for shared access.
pub fn create_shared_index(index: ClusterIndex) -> SharedClusterIndex {
    Arc::new(RwLock::new(index))
}
