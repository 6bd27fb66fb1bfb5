// src/io/json.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::clustering::{ClusterId, ClusterIndex, EntityId};
use crate::error::ClusterResult;

/// On-disk shape: `{"0": ["a1", 1], ...}` with members sorted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
struct ClusterFile(BTreeMap<ClusterId, Vec<EntityId>>);

impl From<&ClusterIndex> for ClusterFile {
    fn from(index: &ClusterIndex) -> Self {
        ClusterFile(
            index
                .clusters()
                .map(|(id, members)| {
                    let mut sorted: Vec<EntityId> = members.iter().cloned().collect();
                    sorted.sort();
                    (id, sorted)
                })
                .collect(),
        )
    }
}

pub fn to_json(index: &ClusterIndex) -> ClusterResult<String> {
    Ok(serde_json::to_string_pretty(&ClusterFile::from(index))?)
}

/// Parse an index. Cluster ids are kept; allocation resumes after the largest.
pub fn from_json(raw: &str) -> ClusterResult<ClusterIndex> {
    let file: ClusterFile = serde_json::from_str(raw)?;
    let clusters: BTreeMap<ClusterId, HashSet<EntityId>> = file
        .0
        .into_iter()
        .map(|(id, members)| (id, members.into_iter().collect()))
        .collect();
    ClusterIndex::from_clusters(clusters)
}

pub fn save_json<P: AsRef<Path>>(index: &ClusterIndex, path: P) -> ClusterResult<()> {
    fs::write(path, to_json(index)?)?;
    Ok(())
}

pub fn load_json<P: AsRef<Path>>(path: P) -> ClusterResult<ClusterIndex> {
    from_json(&fs::read_to_string(path)?)
}
