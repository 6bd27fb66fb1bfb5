use dedupe_lib::clustering::{ClusterIndex, ClusterQuery, EntityId, LinkOutcome, Links};
use dedupe_lib::error::ClusterError;
use std::collections::{BTreeMap, HashSet};

fn id<T: Into<EntityId>>(value: T) -> EntityId {
    value.into()
}

fn set(values: &[&str]) -> HashSet<EntityId> {
    values.iter().map(|v| id(*v)).collect()
}

fn partition(index: &ClusterIndex) -> HashSet<Vec<EntityId>> {
    index
        .clusters()
        .map(|(_, members)| {
            let mut sorted: Vec<EntityId> = members.iter().cloned().collect();
            sorted.sort();
            sorted
        })
        .collect()
}

fn sorted_pair(pair: (&EntityId, &EntityId)) -> (EntityId, EntityId) {
    let (a, b) = pair;
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[test]
fn test_construction_merges_overlaps_regardless_of_order() {
    let seeds = vec![set(&["a", "b"]), set(&["b", "c"]), set(&["d"])];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let expected: HashSet<Vec<EntityId>> = [
        vec![id("a"), id("b"), id("c")],
        vec![id("d")],
    ]
    .into_iter()
    .collect();

    for order in orders {
        let index = ClusterIndex::from_seeds(order.iter().map(|i| seeds[*i].clone()));
        assert_eq!(index.len(), 2);
        assert_eq!(partition(&index), expected);
        assert_eq!(index.next_cluster_id(), 2);
        index.validate().unwrap();
    }
}

#[test]
fn test_construction_merges_chained_overlaps() {
    let index = ClusterIndex::from_seeds(vec![
        set(&["1", "b3", "a1"]),
        set(&["1", "b1"]),
        set(&["b3", "a1", "b1"]),
        set(&["a1", "b1"]),
        set(&["c1", "e1"]),
        set(&["c1", "d1"]),
        set(&["e1", "d1"]),
        set(&["a2", "2"]),
    ]);
    assert_eq!(index.members_of(0).unwrap(), &set(&["a1", "1", "b1", "b3"]));
    assert_eq!(index.members_of(1).unwrap(), &set(&["c1", "d1", "e1"]));
    assert_eq!(index.members_of(2).unwrap(), &set(&["a2", "2"]));
}

#[test]
fn test_from_links_and_from_clusters_agree() {
    let from_seeds = ClusterIndex::from_seeds(vec![set(&["a1", "1"]), set(&["a2", "2"])]);
    let from_links = ClusterIndex::from_links([("a1", "1"), ("a2", "2")]).unwrap();
    let from_clusters = ClusterIndex::from_clusters(BTreeMap::from([
        (0, set(&["a1", "1"])),
        (1, set(&["a2", "2"])),
    ]))
    .unwrap();
    assert_eq!(from_seeds, from_links);
    assert_eq!(from_seeds, from_clusters);

    assert!(matches!(
        ClusterIndex::from_links([("1", "1")]),
        Err(ClusterError::InvalidInput(_))
    ));
    assert!(matches!(
        ClusterIndex::from_clusters(BTreeMap::from([(0, set(&["1", "2"])), (1, set(&["1", "3"]))])),
        Err(ClusterError::InvalidInput(_))
    ));
}

#[test]
fn test_integer_entities() {
    let index = ClusterIndex::from_seeds(vec![
        vec![id(1), id(4)],
        vec![id(2), id(5)],
        vec![id(3), id(6)],
    ]);
    assert_eq!(index.links(&id(1)).unwrap(), Links::Single(id(4)));
    assert_eq!(index.links(&id(4)).unwrap(), Links::Single(id(1)));
    assert_eq!(index.linked_set(&id(1)).unwrap(), HashSet::from([id(4)]));
    assert!(!index.contains_entity(&id("1")));
}

#[test]
fn test_queries_fail_on_unknown_ids() {
    let index = ClusterIndex::from_seeds(vec![set(&["a1", "1"])]);
    assert!(matches!(
        index.cluster_of(&id("wrong")),
        Err(ClusterError::EntityNotFound(_))
    ));
    assert!(matches!(index.members_of(5), Err(ClusterError::ClusterNotFound(5))));
    assert!(index.links(&id("wrong")).unwrap_err().is_not_found());
    assert!(index.all_pairs(Some(&id("wrong"))).is_err());
    assert_eq!(index.get(5), None);
}

#[test]
fn test_links_shapes() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a1", "b1", "b5"]), set(&["a2", "b2"])]);
    assert_eq!(index.links(&id("a1")).unwrap(), Links::Many(set(&["b1", "b5"])));
    assert_eq!(index.links(&id("a2")).unwrap(), Links::Single(id("b2")));

    index.add(["lonely"]).unwrap();
    let links = index.links(&id("lonely")).unwrap();
    assert!(links.is_empty());
    assert_eq!(links, Links::Many(HashSet::new()));
}

#[test]
fn test_transitive_link_keeps_lower_id() {
    let mut index = ClusterIndex::from_seeds(vec![
        vec![id(1), id("b"), id("a")],
        vec![id(2), id("a2")],
    ]);
    let outcome = index.add_link("a", "a2").unwrap();
    assert_eq!(outcome, LinkOutcome::Merged { survivor: 0, retired: 1 });

    assert_eq!(index.len(), 1);
    let expected: HashSet<EntityId> = [id(1), id("b"), id("a"), id("a2"), id(2)].into_iter().collect();
    assert_eq!(index.members_of(0).unwrap(), &expected);
    assert!(!index.contains_cluster_id(1));
    assert!(matches!(index.members_of(1), Err(ClusterError::ClusterNotFound(1))));

    // The retired id is never handed out again
    assert_eq!(index.add(["x", "y"]).unwrap(), 2);
    index.validate().unwrap();
}

#[test]
fn test_merge_keeps_lower_id_in_either_argument_order() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["p", "q"]), set(&["r", "s"])]);
    let outcome = index.add_link("s", "p").unwrap();
    assert_eq!(outcome.cluster_id(), 0);
    assert_eq!(index.cluster_of(&id("r")).unwrap(), 0);
}

#[test]
fn test_add_link_is_idempotent() {
    let mut once = ClusterIndex::from_seeds(vec![set(&["a", "b"]), set(&["c", "d"])]);
    once.add_link("b", "c").unwrap();

    let mut twice = ClusterIndex::from_seeds(vec![set(&["a", "b"]), set(&["c", "d"])]);
    twice.add_link("b", "c").unwrap();
    assert_eq!(twice.add_link("b", "c").unwrap(), LinkOutcome::Unchanged(0));

    assert_eq!(once, twice);
    assert_eq!(once.next_cluster_id(), twice.next_cluster_id());
}

#[test]
fn test_add_link_extends_and_creates() {
    let mut index = ClusterIndex::from_clusters(BTreeMap::from([(0, HashSet::from([id(1), id(2)]))])).unwrap();

    index.add_link(3, 4).unwrap();
    assert_eq!(index.cluster_of(&id(3)).unwrap(), index.cluster_of(&id(4)).unwrap());
    assert_eq!(index.members_of(1).unwrap(), &HashSet::from([id(3), id(4)]));

    index.add_link(3, 5).unwrap();
    assert_eq!(index.members_of(1).unwrap(), &HashSet::from([id(3), id(4), id(5)]));

    index.add_link(1, 3).unwrap();
    let expected = ClusterIndex::from_clusters(BTreeMap::from([(
        0,
        HashSet::from([id(1), id(2), id(3), id(4), id(5)]),
    )]))
    .unwrap();
    assert_eq!(index, expected);
}

#[test]
fn test_add_and_add_to_cluster_reject_linked_entities() {
    let mut index = ClusterIndex::from_seeds(vec![
        vec![id(1), id(4)],
        vec![id(2), id(5)],
        vec![id(3), id(6)],
    ]);
    let cluster_of_one = index.cluster_of(&id(1)).unwrap();
    index.add_to_cluster(cluster_of_one, "d").unwrap();
    assert_eq!(index.links(&id(1)).unwrap(), Links::Many(HashSet::from([id(4), id("d")])));

    match index.add_to_cluster(index.cluster_of(&id(2)).unwrap(), 1) {
        Err(ClusterError::AlreadyLinked { entity, cluster_id }) => {
            assert_eq!(entity, id(1));
            assert_eq!(cluster_id, cluster_of_one);
        }
        other => panic!("expected AlreadyLinked, got {:?}", other),
    }
    assert!(matches!(index.add_to_cluster(99, "new"), Err(ClusterError::ClusterNotFound(99))));
    assert!(matches!(index.add([id(7), id(4)]), Err(ClusterError::AlreadyLinked { .. })));
    assert!(matches!(
        index.add(Vec::<EntityId>::new()),
        Err(ClusterError::InvalidInput(_))
    ));
    // A failed add must not consume an id
    assert_eq!(index.add([7, 8]).unwrap(), 3);
    index.validate().unwrap();
}

#[test]
fn test_remove_then_add_back_restores_membership() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a1", "1", "5"]), set(&["a2", "2"])]);
    let original = index.clone();

    let cluster_id = index.remove(&id("a1")).unwrap();
    assert!(!index.contains_entity(&id("a1")));
    assert_eq!(index.links(&id("1")).unwrap(), Links::Single(id("5")));
    index.add_to_cluster(cluster_id, "a1").unwrap();
    assert_eq!(index, original);

    // A pair survives as a singleton and can be restored the same way
    let cluster_id = index.remove(&id("a2")).unwrap();
    assert_eq!(index.members_of(cluster_id).unwrap(), &set(&["2"]));
    index.add_to_cluster(cluster_id, "a2").unwrap();
    assert_eq!(index, original);
}

#[test]
fn test_removing_last_member_retires_id_for_good() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a1", "1"]), set(&["solo"])]);
    let cluster_id = index.remove(&id("solo")).unwrap();
    assert_eq!(cluster_id, 1);
    assert!(!index.contains_cluster_id(1));

    assert!(matches!(
        index.add_to_cluster(cluster_id, "solo"),
        Err(ClusterError::ClusterNotFound(1))
    ));
    assert_eq!(index.add(["solo"]).unwrap(), 2);
    assert!(matches!(index.remove(&id("missing")), Err(ClusterError::EntityNotFound(_))));
}

#[test]
fn test_remove_cluster() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a1", "b1", "b5"]), set(&["a2", "b2"])]);
    let cluster_id = index.cluster_of(&id("a1")).unwrap();
    let removed = index.remove_cluster(cluster_id).unwrap();
    assert_eq!(removed, set(&["a1", "b1", "b5"]));
    for entity in ["a1", "b1", "b5"] {
        assert!(!index.contains_entity(&id(entity)));
    }
    assert!(matches!(index.remove_cluster(cluster_id), Err(ClusterError::ClusterNotFound(_))));
    assert_eq!(index.add(["z"]).unwrap(), 2);
    index.validate().unwrap();
}

#[test]
fn test_remove_link_on_pair_removes_second_entity() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a", "b"])]);
    let next = index.next_cluster_id();
    let detached = index.remove_link(&id("a"), &id("b")).unwrap();

    assert_eq!(detached, None);
    assert!(!index.contains_entity(&id("b")));
    assert_eq!(index.members_of(0).unwrap(), &set(&["a"]));
    assert_eq!(index.next_cluster_id(), next);
    assert_eq!(index.len(), 1);
    assert_eq!(index.number_of_links(), 0);
    index.validate().unwrap();
}

#[test]
fn test_remove_link_detaches_second_argument_from_larger_cluster() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a", "b", "c", "d"])]);
    let detached = index.remove_link(&id("a"), &id("c")).unwrap();

    // Only the second argument leaves; the rest stays with the first
    assert_eq!(detached, Some(1));
    assert_eq!(index.members_of(0).unwrap(), &set(&["a", "b", "d"]));
    assert_eq!(index.members_of(1).unwrap(), &set(&["c"]));
    assert_eq!(index.next_cluster_id(), 2);
    assert!(!index.contains_pair(&id("a"), &id("c")));
    assert!(!index.contains_pair(&id("b"), &id("c")));
    assert!(index.contains_pair(&id("a"), &id("b")));
    index.validate().unwrap();
}

#[test]
fn test_remove_link_errors() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a", "b"]), set(&["c", "d"])]);
    assert!(matches!(
        index.remove_link(&id("a"), &id("c")),
        Err(ClusterError::NotLinked(_, _))
    ));
    assert!(matches!(
        index.remove_link(&id("a"), &id("zzz")),
        Err(ClusterError::EntityNotFound(_))
    ));
    assert!(matches!(
        index.remove_link(&id("a"), &id("a")),
        Err(ClusterError::InvalidInput(_))
    ));
}

#[test]
fn test_pair_counts() {
    let index = ClusterIndex::from_seeds(vec![
        set(&["a1", "1", "b1", "b3"]),
        set(&["a2", "2"]),
        set(&["a3", "3"]),
        set(&["single"]),
    ]);

    let all: Vec<_> = index.all_pairs(None).unwrap().map(sorted_pair).collect();
    let unique: HashSet<_> = all.iter().cloned().collect();
    assert_eq!(all.len(), 6 + 1 + 1);
    assert_eq!(unique.len(), all.len());
    assert!(unique.contains(&sorted_pair((&id("1"), &id("b3")))));
    assert_eq!(index.number_of_links(), all.len());

    for (cluster_id, members) in index.clusters() {
        let n = members.len();
        let pairs: Vec<_> = index.cluster_pairs(cluster_id).unwrap().collect();
        assert_eq!(pairs.len(), n * (n - 1) / 2);
        for (left, right) in pairs {
            assert_ne!(left, right);
            assert!(members.contains(left) && members.contains(right));
        }
    }

    let of_entity: HashSet<_> = index.all_pairs(Some(&id("a2"))).unwrap().map(sorted_pair).collect();
    assert_eq!(of_entity, HashSet::from([sorted_pair((&id("a2"), &id("2")))]));

    // Restartable: a second enumeration yields the same pairs
    let again: HashSet<_> = index.all_pairs(None).unwrap().map(sorted_pair).collect();
    assert_eq!(again, unique);
}

#[test]
fn test_number_of_links_tracks_mutations() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a1", "1"]), set(&["a2", "2"]), set(&["a3", "3"])]);
    assert_eq!(index.number_of_links(), 3);
    index.add(["a4", "4"]).unwrap();
    assert_eq!(index.number_of_links(), 4);
    index.add_to_cluster(0, "a5").unwrap();
    index.add_to_cluster(0, "a6").unwrap();
    assert_eq!(index.number_of_links(), 9);
}

#[test]
fn test_contains_dispatches_on_query_shape() {
    let index = ClusterIndex::from_clusters(BTreeMap::from([
        (0, HashSet::from([id("a1"), id(1), id("b1")])),
        (1, HashSet::from([id("a2"), id(2)])),
    ]))
    .unwrap();

    assert!(index.contains(ClusterQuery::ByEntity(&id("a1"))));
    assert!(index.contains(ClusterQuery::ByClusterId(1)));
    assert!(!index.contains(ClusterQuery::ByClusterId(2)));
    assert!(index.contains(ClusterQuery::ByExactCluster(&HashSet::from([id("a2"), id(2)]))));
    assert!(!index.contains(ClusterQuery::ByExactCluster(&HashSet::from([id("a2")]))));
    assert!(!index.contains(ClusterQuery::ByExactCluster(&HashSet::new())));
    assert!(index.contains(ClusterQuery::ByPair(&id(1), &id("b1"))));
    assert!(!index.contains(ClusterQuery::ByPair(&id(1), &id(2))));
    assert!(!index.contains(ClusterQuery::ByPair(&id(1), &id("unknown"))));

    // The integer 1 is both an entity and a cluster id; the query decides
    assert!(index.contains_entity(&id(1)));
    assert!(index.contains_cluster_id(1));
    assert!(!index.contains_entity(&id("1")));
}

#[test]
fn test_partition_invariant_holds_through_mixed_operations() {
    let mut index = ClusterIndex::from_seeds(vec![set(&["a", "b"]), set(&["c"]), set(&["d", "e", "f"])]);
    index.validate().unwrap();

    index.add_link("b", "c").unwrap();
    index.validate().unwrap();
    index.add_link("f", "g").unwrap();
    index.validate().unwrap();
    index.add_link("a", "e").unwrap();
    index.validate().unwrap();
    index.remove_link(&id("a"), &id("d")).unwrap();
    index.validate().unwrap();
    index.remove(&id("b")).unwrap();
    index.validate().unwrap();
    index.add(["h", "i"]).unwrap();
    index.validate().unwrap();
    let cluster_id = index.cluster_of(&id("h")).unwrap();
    index.remove_cluster(cluster_id).unwrap();
    index.validate().unwrap();

    let mut seen = HashSet::new();
    let mut total = 0;
    for (_, members) in index.clusters() {
        assert!(!members.is_empty());
        for entity in members {
            assert!(seen.insert(entity.clone()), "{} is in two clusters", entity);
        }
        total += members.len();
    }
    assert_eq!(total, index.number_of_entities());
}

#[test]
fn test_sampling_is_deterministic() {
    let seeds: Vec<HashSet<EntityId>> = (0..50)
        .map(|i| {
            if i % 5 == 0 {
                HashSet::from([id(format!("single{}", i))])
            } else {
                HashSet::from([id(format!("a{}", i)), id(format!("b{}", i))])
            }
        })
        .collect();
    let index = ClusterIndex::from_seeds(seeds);

    let first = index.sample(10, 3, Some(1234)).unwrap();
    let second = index.sample(10, 3, Some(1234)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 13);
    assert_eq!(first.clusters().filter(|(_, m)| m.len() == 1).count(), 3);
    for (cluster_id, members) in first.clusters() {
        assert_eq!(index.members_of(cluster_id).unwrap(), members);
    }
}

#[test]
fn test_sampling_reports_insufficient_data() {
    let index = ClusterIndex::from_seeds(vec![set(&["a", "b"]), set(&["c"])]);
    match index.sample(2, 0, Some(1)) {
        Err(ClusterError::InsufficientData { requested, available }) => {
            assert_eq!(requested, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
    assert!(matches!(
        index.sample(1, 2, Some(1)),
        Err(ClusterError::InsufficientData { requested: 2, available: 1 })
    ));
    assert_eq!(index.sample(1, 1, None).unwrap().len(), 2);
}
