// src/clustering/cluster_index.rs - Partition of entities into match clusters

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use super::components::connected_components;
use super::entity::{ClusterId, EntityId};
use super::query::{ClusterQuery, LinkOutcome, Links};
use crate::error::{ClusterError, ClusterResult};
use crate::utils::random::seeded_rng;

/// Tracks which entities are believed to refer to the same real-world object.
///
/// Holds a forward map (entity -> cluster id) and an inverse map
/// (cluster id -> members) that are kept in sync by every mutation.
/// Cluster ids come from a strictly increasing counter and are never reused,
/// even after the cluster they named was retired.
///
/// ```
/// use dedupe_lib::clustering::{ClusterIndex, EntityId};
///
/// let mut index = ClusterIndex::from_seeds(vec![
///     vec![EntityId::from("a1"), EntityId::from("b1")],
///     vec![EntityId::from("a2"), EntityId::from("b2")],
/// ]);
/// index.add_link("b1", "b2").unwrap();
/// assert_eq!(index.len(), 1);
/// assert!(index.contains_pair(&EntityId::from("a1"), &EntityId::from("a2")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClusterIndex {
    entities: HashMap<EntityId, ClusterId>,
    clusters: BTreeMap<ClusterId, HashSet<EntityId>>,
    next_id: ClusterId,
}

impl ClusterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from seed clusters.
    ///
    /// Seeds that share an entity are merged transitively, so the result is
    /// the connected components over all seeds. Ids are handed out from 0 in
    /// the order components are first discovered; disjoint seeds therefore
    /// keep their input order.
    pub fn from_seeds<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = EntityId>,
    {
        let mut index = Self::new();
        for component in connected_components(seeds) {
            let id = index.allocate_id();
            index.register(id, component.into_iter().collect());
        }
        debug!("Built cluster index from seeds: {}", index.info());
        index
    }

    /// Build an index from link pairs. Pairs sharing an entity end up in one cluster.
    pub fn from_links<I, A, B>(links: I) -> ClusterResult<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<EntityId>,
        B: Into<EntityId>,
    {
        let mut seeds = Vec::new();
        for (left, right) in links {
            let (left, right) = (left.into(), right.into());
            if left == right {
                return Err(ClusterError::InvalidInput(format!(
                    "No self links allowed: {} -> {}",
                    left, right
                )));
            }
            seeds.push(vec![left, right]);
        }
        Ok(Self::from_seeds(seeds))
    }

    /// Build an index with explicit cluster ids.
    ///
    /// Unlike `from_seeds`, overlapping clusters are rejected because there is
    /// no way to honour both ids. The allocation counter starts past the
    /// largest given id.
    pub fn from_clusters(clusters: BTreeMap<ClusterId, HashSet<EntityId>>) -> ClusterResult<Self> {
        let mut index = Self::new();
        for (id, members) in clusters {
            if members.is_empty() {
                return Err(ClusterError::InvalidInput(format!(
                    "Cluster {} has no members",
                    id
                )));
            }
            if let Some(shared) = members.iter().find(|e| index.entities.contains_key(*e)) {
                return Err(ClusterError::InvalidInput(format!(
                    "Entity {} belongs to clusters {} and {}; multiple memberships are not \
                     allowed when cluster ids are given explicitly",
                    shared, index.entities[shared], id
                )));
            }
            let after = id.checked_add(1).ok_or_else(|| {
                ClusterError::InvalidInput(format!(
                    "Cluster id {} leaves no room to allocate further ids",
                    id
                ))
            })?;
            index.register(id, members);
            index.next_id = index.next_id.max(after);
        }
        Ok(index)
    }

    fn allocate_id(&mut self) -> ClusterId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn register(&mut self, id: ClusterId, members: HashSet<EntityId>) {
        for entity in &members {
            self.entities.insert(entity.clone(), id);
        }
        self.clusters.insert(id, members);
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn cluster_of(&self, entity: &EntityId) -> ClusterResult<ClusterId> {
        self.entities
            .get(entity)
            .copied()
            .ok_or_else(|| ClusterError::EntityNotFound(entity.clone()))
    }

    pub fn members_of(&self, cluster_id: ClusterId) -> ClusterResult<&HashSet<EntityId>> {
        self.clusters
            .get(&cluster_id)
            .ok_or(ClusterError::ClusterNotFound(cluster_id))
    }

    /// Members of a cluster, or `None` if the id is not live.
    pub fn get(&self, cluster_id: ClusterId) -> Option<&HashSet<EntityId>> {
        self.clusters.get(&cluster_id)
    }

    /// Entities linked to `entity`.
    ///
    /// Returns the counterpart directly when the cluster is a pair, otherwise
    /// the set of co-members (empty for a singleton).
    pub fn links(&self, entity: &EntityId) -> ClusterResult<Links> {
        let mut others = self.linked_set(entity)?;
        if others.len() == 1 {
            if let Some(other) = others.drain().next() {
                return Ok(Links::Single(other));
            }
        }
        Ok(Links::Many(others))
    }

    /// Like `links`, but always a set.
    pub fn linked_set(&self, entity: &EntityId) -> ClusterResult<HashSet<EntityId>> {
        let cluster_id = self.cluster_of(entity)?;
        Ok(self.clusters[&cluster_id]
            .iter()
            .filter(|member| *member != entity)
            .cloned()
            .collect())
    }

    pub fn contains(&self, query: ClusterQuery<'_>) -> bool {
        match query {
            ClusterQuery::ByEntity(entity) => self.entities.contains_key(entity),
            ClusterQuery::ByClusterId(cluster_id) => self.clusters.contains_key(&cluster_id),
            ClusterQuery::ByExactCluster(candidate) => {
                // Any member pins down the only cluster that could match
                let Some(first) = candidate.iter().next() else {
                    return false;
                };
                match self.entities.get(first) {
                    Some(cluster_id) => &self.clusters[cluster_id] == candidate,
                    None => false,
                }
            }
            ClusterQuery::ByPair(left, right) => {
                match (self.entities.get(left), self.entities.get(right)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
        }
    }

    pub fn contains_entity(&self, entity: &EntityId) -> bool {
        self.contains(ClusterQuery::ByEntity(entity))
    }

    pub fn contains_cluster_id(&self, cluster_id: ClusterId) -> bool {
        self.contains(ClusterQuery::ByClusterId(cluster_id))
    }

    pub fn contains_cluster(&self, members: &HashSet<EntityId>) -> bool {
        self.contains(ClusterQuery::ByExactCluster(members))
    }

    pub fn contains_pair(&self, left: &EntityId, right: &EntityId) -> bool {
        self.contains(ClusterQuery::ByPair(left, right))
    }

    /// Unordered intra-cluster pairs.
    ///
    /// With `None` every cluster contributes its pairs; with an entity only
    /// that entity's cluster does. Singletons contribute nothing. The
    /// enumeration order is unspecified; call again to restart.
    pub fn all_pairs(&self, entity: Option<&EntityId>) -> ClusterResult<Pairs<'_>> {
        match entity {
            Some(entity) => self.cluster_pairs(self.cluster_of(entity)?),
            None => Ok(self.pairs()),
        }
    }

    /// Pairs across the whole partition.
    pub fn pairs(&self) -> Pairs<'_> {
        Pairs::new(self.clusters.values().collect())
    }

    /// Pairs of a single cluster.
    pub fn cluster_pairs(&self, cluster_id: ClusterId) -> ClusterResult<Pairs<'_>> {
        let members = self.members_of(cluster_id)?;
        Ok(Pairs::new(vec![members]))
    }

    /// Total number of unordered intra-cluster pairs.
    pub fn number_of_links(&self) -> usize {
        self.clusters
            .values()
            .map(|members| {
                let n = members.len();
                n * n.saturating_sub(1) / 2
            })
            .sum()
    }

    /// Number of live clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn number_of_entities(&self) -> usize {
        self.entities.len()
    }

    /// Live clusters in id order.
    pub fn clusters(&self) -> impl Iterator<Item = (ClusterId, &HashSet<EntityId>)> {
        self.clusters.iter().map(|(id, members)| (*id, members))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    /// The id the next created cluster will receive.
    pub fn next_cluster_id(&self) -> ClusterId {
        self.next_id
    }

    pub fn info(&self) -> String {
        format!(
            "ClusterIndex(# entities: {}, # clusters: {})",
            self.entities.len(),
            self.clusters.len()
        )
    }

    /// Check that the forward and inverse maps agree and no cluster is empty.
    pub fn validate(&self) -> ClusterResult<()> {
        let mut seen = 0;
        for (id, members) in &self.clusters {
            if members.is_empty() {
                return Err(ClusterError::InvalidInput(format!("Cluster {} is empty", id)));
            }
            if *id >= self.next_id {
                return Err(ClusterError::InvalidInput(format!(
                    "Cluster {} was never allocated (next id {})",
                    id, self.next_id
                )));
            }
            for entity in members {
                if self.entities.get(entity) != Some(id) {
                    return Err(ClusterError::InvalidInput(format!(
                        "Entity {} is in cluster {} but indexed as {:?}",
                        entity,
                        id,
                        self.entities.get(entity)
                    )));
                }
            }
            seen += members.len();
        }
        if seen != self.entities.len() {
            return Err(ClusterError::InvalidInput(format!(
                "{} entities indexed but {} cluster members",
                self.entities.len(),
                seen
            )));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Add an unindexed entity to a live cluster.
    pub fn add_to_cluster(
        &mut self,
        cluster_id: ClusterId,
        entity: impl Into<EntityId>,
    ) -> ClusterResult<()> {
        let entity = entity.into();
        if !self.clusters.contains_key(&cluster_id) {
            return Err(ClusterError::ClusterNotFound(cluster_id));
        }
        if let Some(existing) = self.entities.get(&entity) {
            return Err(ClusterError::AlreadyLinked {
                cluster_id: *existing,
                entity,
            });
        }
        debug!("Adding {} to cluster {}", entity, cluster_id);
        self.entities.insert(entity.clone(), cluster_id);
        if let Some(members) = self.clusters.get_mut(&cluster_id) {
            members.insert(entity);
        }
        Ok(())
    }

    /// Register a new cluster of unindexed entities under a fresh id.
    pub fn add<I, E>(&mut self, members: I) -> ClusterResult<ClusterId>
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityId>,
    {
        let members: HashSet<EntityId> = members.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return Err(ClusterError::InvalidInput(
                "Cannot add an empty cluster".to_string(),
            ));
        }
        if let Some(entity) = members.iter().find(|e| self.entities.contains_key(*e)) {
            return Err(ClusterError::AlreadyLinked {
                entity: entity.clone(),
                cluster_id: self.entities[entity],
            });
        }
        let id = self.allocate_id();
        debug!("Adding cluster {} with {} members", id, members.len());
        self.register(id, members);
        Ok(id)
    }

    /// Assert that two entities match.
    ///
    /// Linking entities from two different clusters unions both clusters
    /// entirely; the lower id survives and the other is retired.
    pub fn add_link(
        &mut self,
        left: impl Into<EntityId>,
        right: impl Into<EntityId>,
    ) -> ClusterResult<LinkOutcome> {
        let (left, right) = (left.into(), right.into());
        let left_cluster = self.entities.get(&left).copied();
        let right_cluster = self.entities.get(&right).copied();

        match (left_cluster, right_cluster) {
            (None, None) => {
                if left == right {
                    return Err(ClusterError::InvalidInput(format!(
                        "No self links allowed: {} -> {}",
                        left, right
                    )));
                }
                Ok(LinkOutcome::Created(self.add([left, right])?))
            }
            (Some(cluster_id), None) => {
                self.add_to_cluster(cluster_id, right)?;
                Ok(LinkOutcome::Extended(cluster_id))
            }
            (None, Some(cluster_id)) => {
                self.add_to_cluster(cluster_id, left)?;
                Ok(LinkOutcome::Extended(cluster_id))
            }
            (Some(a), Some(b)) if a == b => Ok(LinkOutcome::Unchanged(a)),
            (Some(a), Some(b)) => {
                let survivor = self.merge(a, b)?;
                Ok(LinkOutcome::Merged {
                    survivor,
                    retired: a.max(b),
                })
            }
        }
    }

    /// Union two live clusters. The lower id survives; the other is retired.
    pub fn merge(&mut self, first: ClusterId, second: ClusterId) -> ClusterResult<ClusterId> {
        for id in [first, second] {
            if !self.clusters.contains_key(&id) {
                return Err(ClusterError::ClusterNotFound(id));
            }
        }
        if first == second {
            return Ok(first);
        }
        let (survivor, retired) = (first.min(second), first.max(second));
        let moved = self
            .clusters
            .remove(&retired)
            .ok_or(ClusterError::ClusterNotFound(retired))?;
        info!(
            "Merging cluster {} ({} members) into cluster {}",
            retired,
            moved.len(),
            survivor
        );
        for entity in &moved {
            self.entities.insert(entity.clone(), survivor);
        }
        self.clusters
            .get_mut(&survivor)
            .ok_or(ClusterError::ClusterNotFound(survivor))?
            .extend(moved);
        Ok(survivor)
    }

    /// Remove an entity. A cluster left empty is retired.
    ///
    /// Returns the id of the cluster the entity belonged to.
    pub fn remove(&mut self, entity: &EntityId) -> ClusterResult<ClusterId> {
        let cluster_id = self
            .entities
            .remove(entity)
            .ok_or_else(|| ClusterError::EntityNotFound(entity.clone()))?;
        let now_empty = match self.clusters.get_mut(&cluster_id) {
            Some(members) => {
                members.remove(entity);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.clusters.remove(&cluster_id);
            debug!("Cluster {} retired after removing {}", cluster_id, entity);
        }
        Ok(cluster_id)
    }

    /// Remove a cluster with all of its members and retire its id.
    pub fn remove_cluster(&mut self, cluster_id: ClusterId) -> ClusterResult<HashSet<EntityId>> {
        let members = self
            .clusters
            .remove(&cluster_id)
            .ok_or(ClusterError::ClusterNotFound(cluster_id))?;
        for entity in &members {
            self.entities.remove(entity);
        }
        debug!("Removed cluster {} with {} members", cluster_id, members.len());
        Ok(members)
    }

    /// Split `right` away from `left`.
    ///
    /// For a pair this is `remove(right)`: `right` leaves the index, `left`
    /// stays as a singleton and `None` is returned. In a larger cluster,
    /// which stores flat membership rather than edges, `right` is detached
    /// into a fresh singleton cluster whose id is returned; `left` keeps its
    /// cluster and id along with every other co-member.
    pub fn remove_link(
        &mut self,
        left: &EntityId,
        right: &EntityId,
    ) -> ClusterResult<Option<ClusterId>> {
        if left == right {
            return Err(ClusterError::InvalidInput(format!(
                "Cannot unlink {} from itself",
                left
            )));
        }
        let left_cluster = self.cluster_of(left)?;
        let right_cluster = self.cluster_of(right)?;
        if left_cluster != right_cluster {
            return Err(ClusterError::NotLinked(left.clone(), right.clone()));
        }
        let size = self.clusters[&left_cluster].len();
        if size == 2 {
            self.remove(right)?;
            debug!("Unlinked pair {} and {}; {} removed", left, right, right);
            return Ok(None);
        }
        // Co-members other than `right` stay with `left`
        warn!(
            "Unlinking {} from {}: {} stays linked to the other {} members of cluster {}",
            right,
            left,
            left,
            size - 2,
            left_cluster
        );
        self.remove(right)?;
        let id = self.allocate_id();
        self.register(id, HashSet::from([right.clone()]));
        Ok(Some(id))
    }

    // ---------------------------------------------------------------------
    // Sampling
    // ---------------------------------------------------------------------

    /// Sample `matched` clusters with two or more members and `unmatched`
    /// singleton clusters.
    ///
    /// The same seed on the same index always yields the same sample. Without
    /// a seed the generator is seeded from the OS.
    pub fn sample(
        &self,
        matched: usize,
        unmatched: usize,
        seed: Option<u64>,
    ) -> ClusterResult<ClusterIndex> {
        let mut rng = seeded_rng(seed);
        self.sample_with_rng(matched, unmatched, &mut rng)
    }

    /// `sample` with a caller-provided generator.
    ///
    /// Sampled clusters keep their ids, and the sample continues allocating
    /// after this index's counter.
    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        matched: usize,
        unmatched: usize,
        rng: &mut R,
    ) -> ClusterResult<ClusterIndex> {
        let matched_ids: Vec<ClusterId> = self
            .clusters
            .iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(id, _)| *id)
            .collect();
        if matched > matched_ids.len() {
            return Err(ClusterError::InsufficientData {
                requested: matched,
                available: matched_ids.len(),
            });
        }
        let singleton_ids: Vec<ClusterId> = self
            .clusters
            .iter()
            .filter(|(_, members)| members.len() == 1)
            .map(|(id, _)| *id)
            .collect();
        if unmatched > singleton_ids.len() {
            return Err(ClusterError::InsufficientData {
                requested: unmatched,
                available: singleton_ids.len(),
            });
        }

        let mut picked: Vec<ClusterId> = matched_ids.choose_multiple(rng, matched).copied().collect();
        picked.extend(singleton_ids.choose_multiple(rng, unmatched).copied());

        let mut sample = ClusterIndex {
            next_id: self.next_id,
            ..ClusterIndex::default()
        };
        for id in picked {
            sample.register(id, self.clusters[&id].clone());
        }
        debug!("Sampled {} from {}", sample.info(), self.info());
        Ok(sample)
    }
}

impl PartialEq for ClusterIndex {
    /// Two indices are equal when they hold the same clusters under the same
    /// ids. The allocation counter is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.clusters == other.clusters && self.entities == other.entities
    }
}

impl Eq for ClusterIndex {}

impl fmt::Display for ClusterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (position, (id, members)) in self.clusters.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            let mut sorted: Vec<&EntityId> = members.iter().collect();
            sorted.sort();
            let rendered: Vec<String> = sorted.iter().map(|e| e.to_string()).collect();
            write!(f, "{}: {{{}}}", id, rendered.join(", "))?;
        }
        write!(f, "}}")
    }
}

/// Lazy iterator over unordered intra-cluster pairs.
pub struct Pairs<'a> {
    clusters: std::vec::IntoIter<&'a HashSet<EntityId>>,
    current: Vec<&'a EntityId>,
    i: usize,
    j: usize,
}

impl<'a> Pairs<'a> {
    fn new(clusters: Vec<&'a HashSet<EntityId>>) -> Self {
        Self {
            clusters: clusters.into_iter(),
            current: Vec::new(),
            i: 0,
            j: 1,
        }
    }
}

impl<'a> Iterator for Pairs<'a> {
    type Item = (&'a EntityId, &'a EntityId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.j < self.current.len() {
                let pair = (self.current[self.i], self.current[self.j]);
                self.j += 1;
                return Some(pair);
            }
            if self.i + 2 < self.current.len() {
                self.i += 1;
                self.j = self.i + 1;
                continue;
            }
            self.current = self.clusters.next()?.iter().collect();
            self.i = 0;
            self.j = 1;
        }
    }
}
