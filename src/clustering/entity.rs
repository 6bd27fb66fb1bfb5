// src/clustering/entity.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cluster identifiers are allocated from a strictly increasing counter.
pub type ClusterId = u64;

/// Identifier of one entity from some source collection.
///
/// Strings and integers are distinct ids: `EntityId::from("1") != EntityId::from(1)`.
/// Integers order before strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntityId::Str(s) => Some(s),
            EntityId::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            EntityId::Int(i) => Some(*i),
            EntityId::Str(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(i) => write!(f, "{}", i),
            EntityId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Str(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Str(value)
    }
}

impl From<&String> for EntityId {
    fn from(value: &String) -> Self {
        EntityId::Str(value.clone())
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId::Int(value as i64)
    }
}

impl From<&EntityId> for EntityId {
    fn from(value: &EntityId) -> Self {
        value.clone()
    }
}
