// src/task/collection.rs

use std::collections::{BTreeMap, HashSet};

use crate::clustering::EntityId;

/// Attribute name -> value for one entity.
pub type Attributes = BTreeMap<String, String>;

/// One source collection of entities taking part in a matching task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCollection {
    pub name: String,
    entities: BTreeMap<EntityId, Attributes>,
}

impl EntityCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: BTreeMap::new(),
        }
    }

    /// Build a collection from `(id, attributes)` entries.
    pub fn from_entities<I, E>(name: impl Into<String>, entities: I) -> Self
    where
        I: IntoIterator<Item = (E, Attributes)>,
        E: Into<EntityId>,
    {
        Self {
            name: name.into(),
            entities: entities.into_iter().map(|(id, attrs)| (id.into(), attrs)).collect(),
        }
    }

    /// Insert or replace an entity, returning its previous attributes.
    pub fn insert(&mut self, id: impl Into<EntityId>, attributes: Attributes) -> Option<Attributes> {
        self.entities.insert(id.into(), attributes)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Attributes> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Entity ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The same collection restricted to `keep`.
    pub fn subset(&self, keep: &HashSet<EntityId>) -> Self {
        Self {
            name: self.name.clone(),
            entities: self
                .entities
                .iter()
                .filter(|(id, _)| keep.contains(*id))
                .map(|(id, attrs)| (id.clone(), attrs.clone()))
                .collect(),
        }
    }

    pub fn info(&self) -> String {
        format!("{}(# entities: {})", self.name, self.entities.len())
    }
}
