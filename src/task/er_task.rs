// src/task/er_task.rs - Entity collections paired with their known matches

use log::{debug, info};
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};

use super::collection::EntityCollection;
use crate::clustering::{ClusterIndex, EntityId};
use crate::error::{ClusterError, ClusterResult};
use crate::utils::random::seeded_rng;

/// An entity resolution task: two or more collections plus the clusters
/// known to link their entities.
#[derive(Debug, Clone)]
pub struct ErTask {
    collections: Vec<EntityCollection>,
    clusters: ClusterIndex,
}

impl ErTask {
    /// Collections without a name are named after their position.
    ///
    /// Fails if fewer than two collections are given, if names repeat, or if
    /// an entity id occurs in more than one collection.
    pub fn new(mut collections: Vec<EntityCollection>, clusters: ClusterIndex) -> ClusterResult<Self> {
        if collections.len() < 2 {
            return Err(ClusterError::InvalidInput(format!(
                "A task needs at least two collections, got {}",
                collections.len()
            )));
        }

        for (position, collection) in collections.iter_mut().enumerate() {
            if collection.name.is_empty() {
                collection.name = position.to_string();
            }
        }

        let mut names = HashSet::new();
        let mut owner: HashMap<&EntityId, usize> = HashMap::new();
        for (position, collection) in collections.iter().enumerate() {
            if !names.insert(collection.name.as_str()) {
                return Err(ClusterError::InvalidInput(format!(
                    "Duplicate collection name: {}",
                    collection.name
                )));
            }
            for id in collection.ids() {
                if let Some(previous) = owner.insert(id, position) {
                    return Err(ClusterError::InvalidInput(format!(
                        "Entity {} occurs in collections {} and {}",
                        id, collections[previous].name, collection.name
                    )));
                }
            }
        }

        Ok(Self {
            collections,
            clusters,
        })
    }

    pub fn clusters(&self) -> &ClusterIndex {
        &self.clusters
    }

    pub fn clusters_mut(&mut self) -> &mut ClusterIndex {
        &mut self.clusters
    }

    pub fn collections(&self) -> &[EntityCollection] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&EntityCollection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Total number of entities over all collections.
    pub fn len(&self) -> usize {
        self.collections.iter().map(EntityCollection::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the entity has no known match: it is not indexed, or it is
    /// alone in its cluster.
    pub fn is_unmatched(&self, id: &EntityId) -> bool {
        match self.clusters.cluster_of(id) {
            Ok(cluster_id) => self.clusters.get(cluster_id).map_or(true, |m| m.len() < 2),
            Err(_) => true,
        }
    }

    /// Entities without a known match, collection by collection in id order.
    ///
    /// Entities sitting alone in a singleton cluster are included, not only
    /// those missing from the index.
    pub fn without_match(&self) -> Vec<&EntityId> {
        self.collections
            .iter()
            .flat_map(|c| c.ids())
            .filter(|id| self.is_unmatched(id))
            .collect()
    }

    /// Sample `matched` clusters plus `unmatched` unmatched entities from
    /// every collection.
    ///
    /// The returned task keeps only the sampled entities. One generator drives
    /// both steps, so the same seed gives the same task.
    pub fn sample(&self, matched: usize, unmatched: usize, seed: Option<u64>) -> ClusterResult<ErTask> {
        let mut rng = seeded_rng(seed);
        let sampled_clusters = self.clusters.sample_with_rng(matched, 0, &mut rng)?;
        let mut keep: HashSet<EntityId> = sampled_clusters.entities().cloned().collect();
        debug!(
            "Sampled {} matched entities in {} clusters",
            keep.len(),
            sampled_clusters.len()
        );

        if unmatched > 0 {
            for collection in &self.collections {
                let candidates: Vec<&EntityId> = collection
                    .ids()
                    .filter(|id| !keep.contains(*id) && self.is_unmatched(id))
                    .collect();
                if unmatched > candidates.len() {
                    return Err(ClusterError::InsufficientData {
                        requested: unmatched,
                        available: candidates.len(),
                    });
                }
                let picked: Vec<EntityId> = candidates
                    .choose_multiple(&mut rng, unmatched)
                    .map(|id| (*id).clone())
                    .collect();
                keep.extend(picked);
            }
        }

        let collections = self.collections.iter().map(|c| c.subset(&keep)).collect();
        let task = ErTask {
            collections,
            clusters: sampled_clusters,
        };
        info!("Sampled task {}", task.info());
        Ok(task)
    }

    pub fn info(&self) -> String {
        let collections: Vec<String> = self.collections.iter().map(EntityCollection::info).collect();
        format!("ErTask({{{}}}, {})", collections.join(","), self.clusters.info())
    }
}
