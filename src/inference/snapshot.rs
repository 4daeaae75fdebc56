//! Plain in-memory view of the graph that inference rules run over.

use std::collections::BTreeMap;

use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

/// Nodes and edges with adjacency by relationship type.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: BTreeMap<NodeId, Node>,
    relationships: Vec<Relationship>,
    /// node → (type, other end) for edges leaving the node
    outgoing: BTreeMap<NodeId, Vec<(String, NodeId)>>,
    /// node → (type, other end) for edges entering the node
    incoming: BTreeMap<NodeId, Vec<(String, NodeId)>>,
    next_rel: u64,
}

impl GraphSnapshot {
    pub fn new(nodes: impl IntoIterator<Item = Node>, relationships: impl IntoIterator<Item = Relationship>) -> Self {
        let mut snapshot = Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
            ..Self::default()
        };
        for rel in relationships {
            snapshot.insert(rel);
        }
        snapshot
    }

    /// Read the whole store.
    pub async fn capture<S: GraphStore + ?Sized>(store: &S) -> Result<Self> {
        let nodes = store.all_nodes().await?;
        let relationships = store.all_relationships().await?;
        Ok(Self::new(nodes, relationships))
    }

    fn insert(&mut self, rel: Relationship) {
        self.next_rel = self.next_rel.max(rel.id.0 + 1);
        self.outgoing.entry(rel.src).or_default().push((rel.rel_type.clone(), rel.dst));
        self.incoming.entry(rel.dst).or_default().push((rel.rel_type.clone(), rel.src));
        self.relationships.push(rel);
    }

    /// Add an edge unless one with the same `(start, end, type)` exists.
    pub fn link(&mut self, start: NodeId, end: NodeId, rel_type: &str) {
        if self.has_edge(start, end, rel_type) {
            return;
        }
        let id = RelId(self.next_rel);
        self.insert(Relationship::new(id, start, end, rel_type));
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Nodes carrying every label in `labels`, in id order.
    pub fn labelled<'a>(&'a self, labels: &'a [&'a str]) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| n.has_labels(labels))
    }

    pub fn has_edge(&self, start: NodeId, end: NodeId, rel_type: &str) -> bool {
        self.outgoing.get(&start)
            .is_some_and(|edges| edges.iter().any(|(t, n)| t == rel_type && *n == end))
    }

    /// Ends of `rel_type` edges leaving `node` whose far end carries `labels`.
    pub fn out<'a>(&'a self, node: NodeId, rel_type: &'a str, labels: &'a [&'a str]) -> impl Iterator<Item = NodeId> + 'a {
        self.neighbours(&self.outgoing, node, rel_type, labels)
    }

    /// Starts of `rel_type` edges entering `node` whose far end carries `labels`.
    pub fn inc<'a>(&'a self, node: NodeId, rel_type: &'a str, labels: &'a [&'a str]) -> impl Iterator<Item = NodeId> + 'a {
        self.neighbours(&self.incoming, node, rel_type, labels)
    }

    fn neighbours<'a>(
        &'a self,
        index: &'a BTreeMap<NodeId, Vec<(String, NodeId)>>,
        node: NodeId,
        rel_type: &'a str,
        labels: &'a [&'a str],
    ) -> impl Iterator<Item = NodeId> + 'a {
        index.get(&node)
            .into_iter()
            .flatten()
            .filter(move |(t, _)| t == rel_type)
            .map(|(_, other)| *other)
            .filter(move |other| self.nodes.get(other).is_some_and(|n| n.has_labels(labels)))
    }
}
