//! In-memory graph store.
//!
//! This is the reference implementation of `GraphStore`.
//! The whole graph lives behind one `RwLock`, so every write primitive is
//! atomic with respect to every other call.
//!
//! ## Limitations
//!
//! - **No query language**: `run_scalar_write()` returns `Error::Unsupported`.
//!   Everything the importer needs goes through the typed primitives.
//! - **No property indexes**: matching scans the nodes under the first
//!   requested label.
//!
//! Use this store for:
//! - Testing mappers and inference without a database
//! - Embedding simgraph in tools that only need the graph in memory

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;

use super::{DropScope, GraphStore};
use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory property graph store. Cloning shares the same graph.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    state: RwLock<GraphState>,
    next_node_id: AtomicU64,
    next_rel_id: AtomicU64,
}

#[derive(Default)]
struct GraphState {
    nodes: HashMap<NodeId, Node>,
    relationships: HashMap<RelId, Relationship>,
    /// node_id → relationship IDs touching it (either end)
    adjacency: HashMap<NodeId, Vec<RelId>>,
    /// label → node IDs, ordered so the oldest match wins
    label_index: HashMap<String, BTreeSet<NodeId>>,
    /// (start, end, type) → the single edge with that identity
    edge_index: HashMap<(NodeId, NodeId, String), RelId>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                state: RwLock::new(GraphState::default()),
                next_node_id: AtomicU64::new(1),
                next_rel_id: AtomicU64::new(1),
            }),
        }
    }
}

/// Overwrite per key; `Null` deletes the key.
fn apply_props(target: &mut PropertyMap, props: PropertyMap) {
    for (key, value) in props {
        if value.is_null() {
            target.remove(&key);
        } else {
            target.insert(key, value);
        }
    }
}

impl GraphState {
    fn find_node(&self, labels: &[&str], match_props: &PropertyMap) -> Option<NodeId> {
        let candidates: Box<dyn Iterator<Item = NodeId> + '_> = match labels.first() {
            Some(first) => match self.label_index.get(*first) {
                Some(ids) => Box::new(ids.iter().copied()),
                None => return None,
            },
            None => {
                let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
                ids.sort_unstable();
                Box::new(ids.into_iter())
            }
        };

        candidates
            .filter_map(|id| self.nodes.get(&id))
            .find(|n| n.has_labels(labels) && n.matches(match_props))
            .map(|n| n.id)
    }

    fn remove_node(&mut self, id: NodeId) {
        if let Some(rel_ids) = self.adjacency.remove(&id) {
            for rel_id in rel_ids {
                self.remove_relationship(rel_id);
            }
        }
        if let Some(node) = self.nodes.remove(&id) {
            for label in &node.labels {
                if let Some(ids) = self.label_index.get_mut(label) {
                    ids.remove(&id);
                }
            }
        }
    }

    fn remove_relationship(&mut self, id: RelId) {
        let Some(rel) = self.relationships.remove(&id) else { return };
        for end in [rel.src, rel.dst] {
            if let Some(list) = self.adjacency.get_mut(&end) {
                list.retain(|r| *r != id);
            }
        }
        self.edge_index.remove(&(rel.src, rel.dst, rel.rel_type));
    }
}

// ============================================================================
// GraphStore impl
// ============================================================================

#[async_trait]
impl GraphStore for MemoryStore {
    async fn ping(&self) -> Result<()> { Ok(()) }

    // ========================================================================
    // Writes
    // ========================================================================

    async fn upsert_node(
        &self,
        labels: &[&str],
        match_props: PropertyMap,
        props: PropertyMap,
    ) -> Result<NodeId> {
        if let Some((key, _)) = match_props.iter().find(|(_, v)| v.is_null()) {
            return Err(Error::StorageError(format!(
                "cannot merge {labels:?} on null property '{key}'"
            )));
        }

        let mut state = self.inner.state.write();

        if let Some(id) = state.find_node(labels, &match_props) {
            if let Some(node) = state.nodes.get_mut(&id) {
                apply_props(&mut node.properties, props);
            }
            return Ok(id);
        }

        let id = NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed));
        let mut node = Node::new(id).with_labels(labels.iter().copied());
        node.properties = match_props;
        apply_props(&mut node.properties, props);

        for label in &node.labels {
            state.label_index.entry(label.clone()).or_default().insert(id);
        }
        state.adjacency.insert(id, Vec::new());
        state.nodes.insert(id, node);

        Ok(id)
    }

    async fn upsert_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        rel_type: &str,
        props: Option<PropertyMap>,
    ) -> Result<RelId> {
        let mut state = self.inner.state.write();

        // Verify both nodes exist
        if !state.nodes.contains_key(&start) {
            return Err(Error::NotFound(format!("Node {start}")));
        }
        if !state.nodes.contains_key(&end) {
            return Err(Error::NotFound(format!("Node {end}")));
        }

        let key = (start, end, rel_type.to_string());
        if let Some(&id) = state.edge_index.get(&key) {
            if let (Some(props), Some(rel)) = (props, state.relationships.get_mut(&id)) {
                apply_props(&mut rel.properties, props);
            }
            return Ok(id);
        }

        let id = RelId(self.inner.next_rel_id.fetch_add(1, Ordering::Relaxed));
        let mut rel = Relationship::new(id, start, end, rel_type);
        if let Some(props) = props {
            apply_props(&mut rel.properties, props);
        }

        state.relationships.insert(id, rel);
        state.edge_index.insert(key, id);
        state.adjacency.entry(start).or_default().push(id);
        if start != end {
            state.adjacency.entry(end).or_default().push(id);
        }

        Ok(id)
    }

    async fn run_scalar_write(&self, query: &str, _params: PropertyMap) -> Result<Option<u64>> {
        Err(Error::Unsupported(format!(
            "MemoryStore does not execute query text: {query}"
        )))
    }

    async fn drop_by_label(&self, scope: DropScope) -> Result<u64> {
        let mut state = self.inner.state.write();

        let victims: Vec<NodeId> = match scope.label() {
            Some(label) => state.label_index.get(label)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default(),
            None => state.nodes.keys().copied().collect(),
        };

        for id in &victims {
            state.remove_node(*id);
        }
        Ok(victims.len() as u64)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    async fn all_nodes(&self) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self.inner.state.read().nodes.values().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }

    async fn nodes_by_label(&self, label: &str) -> Result<Vec<Node>> {
        let state = self.inner.state.read();
        Ok(state.label_index.get(label)
            .map(|ids| ids.iter().filter_map(|id| state.nodes.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn all_relationships(&self) -> Result<Vec<Relationship>> {
        let mut rels: Vec<Relationship> =
            self.inner.state.read().relationships.values().cloned().collect();
        rels.sort_by_key(|r| r.id);
        Ok(rels)
    }

    async fn node_count(&self) -> Result<u64> {
        Ok(self.inner.state.read().nodes.len() as u64)
    }

    async fn relationship_count(&self) -> Result<u64> {
        Ok(self.inner.state.read().relationships.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> PropertyMap {
        props([("name", n)])
    }

    #[tokio::test]
    async fn test_upsert_node_is_idempotent() {
        let store = MemoryStore::new();
        let a = store.upsert_node(&["Sim", "Channel"], name("physical"), PropertyMap::new()).await.unwrap();
        let b = store.upsert_node(&["Sim", "Channel"], name("physical"), PropertyMap::new()).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.node_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_node_overwrites_replacement_props() {
        let store = MemoryStore::new();
        let id = store.upsert_node(&["Sim", "Model"], name("input"), props([("version", "1")])).await.unwrap();
        store.upsert_node(&["Sim", "Model"], name("input"), props([("version", "2")])).await.unwrap();

        let node = &store.nodes_by_label("Model").await.unwrap()[0];
        assert_eq!(node.id, id);
        assert_eq!(node.get_str("version"), Some("2"));
        assert_eq!(node.get_str("name"), Some("input"));
    }

    #[tokio::test]
    async fn test_null_replacement_removes_key() {
        let store = MemoryStore::new();
        store.upsert_node(&["Sim"], name("a"), props([("alias", "x")])).await.unwrap();
        store.upsert_node(&["Sim"], name("a"), props([("alias", Value::Null)])).await.unwrap();
        let node = &store.all_nodes().await.unwrap()[0];
        assert!(node.get("alias").is_none());
    }

    #[tokio::test]
    async fn test_label_superset_matches() {
        let store = MemoryStore::new();
        let id = store.upsert_node(&["Sim", "Channel"], name("c"), PropertyMap::new()).await.unwrap();
        let again = store.upsert_node(&["Channel"], name("c"), PropertyMap::new()).await.unwrap();
        assert_eq!(id, again);

        // Distinct label set does not match
        let other = store.upsert_node(&["Ast", "Channel"], name("c"), PropertyMap::new()).await.unwrap();
        assert_ne!(id, other);
    }

    #[tokio::test]
    async fn test_null_match_prop_rejected() {
        let store = MemoryStore::new();
        let err = store.upsert_node(&["Sim"], props([("name", Value::Null)]), PropertyMap::new()).await;
        assert!(matches!(err, Err(Error::StorageError(_))));
    }

    #[tokio::test]
    async fn test_upsert_relationship_identity() {
        let store = MemoryStore::new();
        let a = store.upsert_node(&["File"], name("a.yaml"), PropertyMap::new()).await.unwrap();
        let b = store.upsert_node(&["Sim"], name("b"), PropertyMap::new()).await.unwrap();

        let r1 = store.upsert_relationship(a, b, "Contains", Some(props([("index", 1)]))).await.unwrap();
        let r2 = store.upsert_relationship(a, b, "Contains", Some(props([("index", 2)]))).await.unwrap();
        assert_eq!(r1, r2);

        // None keeps existing props
        store.upsert_relationship(a, b, "Contains", None).await.unwrap();
        let rels = store.relationships_by_type("Contains").await.unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].properties.get("index"), Some(&Value::Int(2)));

        // Reverse direction is a different edge
        let r3 = store.upsert_relationship(b, a, "Contains", None).await.unwrap();
        assert_ne!(r1, r3);
        assert_eq!(store.relationship_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_relationship_dangling_endpoint() {
        let store = MemoryStore::new();
        let a = store.upsert_node(&["Sim"], name("a"), PropertyMap::new()).await.unwrap();
        let err = store.upsert_relationship(a, NodeId(999), "Has", None).await;
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_drop_by_label_detaches() {
        let store = MemoryStore::new();
        let ast = store.upsert_node(&["Ast", "Simulation"], name("s"), PropertyMap::new()).await.unwrap();
        let sim = store.upsert_node(&["Sim", "Stack"], name("s"), PropertyMap::new()).await.unwrap();
        store.upsert_relationship(sim, ast, "Represents", None).await.unwrap();

        assert_eq!(store.drop_by_label(DropScope::Ast).await.unwrap(), 1);
        assert_eq!(store.node_count().await.unwrap(), 1);
        assert_eq!(store.relationship_count().await.unwrap(), 0);

        // Re-creating the edge endpoint yields a fresh edge
        let ast = store.upsert_node(&["Ast", "Simulation"], name("s"), PropertyMap::new()).await.unwrap();
        store.upsert_relationship(sim, ast, "Represents", None).await.unwrap();
        assert_eq!(store.relationship_count().await.unwrap(), 1);

        assert_eq!(store.drop_by_label(DropScope::All).await.unwrap(), 2);
        assert_eq!(store.node_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_scalar_write_unsupported() {
        let store = MemoryStore::new();
        let err = store.run_scalar_write("RETURN 1 AS id", PropertyMap::new()).await;
        assert!(matches!(err, Err(Error::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_clone_shares_graph() {
        let store = MemoryStore::new();
        let view = store.clone();
        store.upsert_node(&["Sim"], name("x"), PropertyMap::new()).await.unwrap();
        assert_eq!(view.node_count().await.unwrap(), 1);
    }
}
