//! Node in the property graph.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{PropertyMap, Value};

/// Label set of a node. Almost every node carries a namespace label
/// (`Sim` or `Ast`) plus one kind label.
pub type Labels = SmallVec<[String; 2]>;

/// Opaque node identifier, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the property graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub labels: Labels,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            labels: Labels::new(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// True when the node carries every label in `labels`.
    pub fn has_labels<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        labels.iter().all(|l| self.has_label(l.as_ref()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// String property, `None` when absent or not text.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// MERGE matching: every match property must be present with an equal value.
    pub fn matches(&self, match_props: &PropertyMap) -> bool {
        match_props.iter().all(|(k, v)| self.properties.get(k) == Some(v))
    }
}
