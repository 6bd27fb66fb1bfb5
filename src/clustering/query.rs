// src/clustering/query.rs

use std::collections::HashSet;

use super::entity::{ClusterId, EntityId};

/// The shapes a containment check can take.
#[derive(Debug, Clone, Copy)]
pub enum ClusterQuery<'a> {
    /// Is the entity indexed at all.
    ByEntity(&'a EntityId),
    /// Is there a live cluster with this id.
    ByClusterId(ClusterId),
    /// Does some cluster have exactly these members. Subsets do not count.
    ByExactCluster(&'a HashSet<EntityId>),
    /// Are both entities indexed and in the same cluster.
    ByPair(&'a EntityId, &'a EntityId),
}

/// Co-members of an entity, as returned by `ClusterIndex::links`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Links {
    /// The cluster is a pair; this is the counterpart.
    Single(EntityId),
    /// Every other member. Empty for a singleton cluster.
    Many(HashSet<EntityId>),
}

impl Links {
    pub fn len(&self) -> usize {
        match self {
            Links::Single(_) => 1,
            Links::Many(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, entity: &EntityId) -> bool {
        match self {
            Links::Single(other) => other == entity,
            Links::Many(set) => set.contains(entity),
        }
    }

    pub fn into_set(self) -> HashSet<EntityId> {
        match self {
            Links::Single(other) => HashSet::from([other]),
            Links::Many(set) => set,
        }
    }
}

/// What `add_link` did to the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Neither entity was indexed; a new two-member cluster was created.
    Created(ClusterId),
    /// One entity joined the other's cluster.
    Extended(ClusterId),
    /// Both were already in this cluster.
    Unchanged(ClusterId),
    /// Two clusters were unioned. `retired` is never allocated again.
    Merged {
        survivor: ClusterId,
        retired: ClusterId,
    },
}

impl LinkOutcome {
    /// Id of the cluster that holds both entities afterwards.
    pub fn cluster_id(&self) -> ClusterId {
        match *self {
            LinkOutcome::Created(id) | LinkOutcome::Extended(id) | LinkOutcome::Unchanged(id) => id,
            LinkOutcome::Merged { survivor, .. } => survivor,
        }
    }
}
