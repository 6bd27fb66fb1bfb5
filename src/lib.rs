// src/lib.rs
pub mod clustering;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod task;
pub mod utils;

// Re-export common types for easier access
pub use clustering::{
    ClusterId, ClusterIndex, ClusterQuery, EntityId, LinkOutcome, Links, SharedClusterIndex,
};
pub use error::{ClusterError, ClusterResult};
pub use task::{EntityCollection, ErTask};
