// src/clustering/components.rs

use log::debug;
use std::collections::HashMap;

// petgraph imports
use petgraph::unionfind::UnionFind;

use super::entity::EntityId;

/// Connected components over a sequence of seed sets.
///
/// Each seed acts as a hyperedge joining all of its members. Components are
/// returned in order of discovery: a component comes before another if its
/// earliest seed comes first in the input. Empty seeds contribute nothing.
pub fn connected_components<I, S>(seeds: I) -> Vec<Vec<EntityId>>
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = EntityId>,
{
    let mut node_of: HashMap<EntityId, usize> = HashMap::new();
    let mut nodes: Vec<EntityId> = Vec::new();
    let mut edges: Vec<(usize, usize)> = Vec::new();

    for seed in seeds {
        let mut previous: Option<usize> = None;
        for entity in seed {
            let node = *node_of.entry(entity.clone()).or_insert_with(|| {
                nodes.push(entity);
                nodes.len() - 1
            });
            // Chaining consecutive members is enough to connect the whole seed
            if let Some(prev) = previous {
                edges.push((prev, node));
            }
            previous = Some(node);
        }
    }

    let mut union_find = UnionFind::<usize>::new(nodes.len());
    for (a, b) in &edges {
        union_find.union(*a, *b);
    }

    let mut component_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<EntityId>> = Vec::new();
    for (node, entity) in nodes.into_iter().enumerate() {
        let root = union_find.find(node);
        let component = *component_of_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[component].push(entity);
    }

    debug!(
        "Computed {} components from {} edges",
        components.len(),
        edges.len()
    );
    components
}
