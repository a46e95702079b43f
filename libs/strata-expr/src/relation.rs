//! Relation resolution for graph-navigation nodes
//!
//! The building graph lives outside this crate. The evaluator asks a
//! [`RelationResolver`] to follow a named relation from a source value to
//! the related entity (or a value attached to it).

use rustc_hash::FxHashMap;

use crate::value::Value;

/// Resolver trait for relation nodes
///
/// Implementations can walk an in-memory twin graph, a cached ontology or
/// any other lookup. Returning `None` means the relation does not exist
/// for this source.
pub trait RelationResolver: Send + Sync {
    /// Follow `relation` from `source`
    fn resolve(&self, relation: &str, source: &Value) -> Option<Value>;
}

/// In-memory resolver keyed by relation name and source entity id
#[derive(Debug, Default, Clone)]
pub struct MemoryRelations {
    edges: FxHashMap<(String, String), Value>,
}

impl MemoryRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source --relation--> target`
    pub fn insert(
        &mut self,
        relation: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<Value>,
    ) {
        self.edges
            .insert((relation.into(), source.into()), target.into());
    }

    pub fn with(
        mut self,
        relation: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<Value>,
    ) -> Self {
        self.insert(relation, source, target);
        self
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl RelationResolver for MemoryRelations {
    fn resolve(&self, relation: &str, source: &Value) -> Option<Value> {
        let Value::Entity(id) = source else {
            return None;
        };
        self.edges
            .get(&(relation.to_string(), id.clone()))
            .cloned()
    }
}

/// Null resolver - every relation is unresolved
pub struct NoRelations;

impl RelationResolver for NoRelations {
    fn resolve(&self, _relation: &str, _source: &Value) -> Option<Value> {
        None
    }
}
