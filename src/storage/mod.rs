//! # Graph Store Adapter
//!
//! This is THE contract between the importer and any graph store.
//! Every mapper and every inference step is written against the four
//! write primitives below; nothing else in the crate talks to a store.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory for testing/embedding |
//! | `BoltStore` | `bolt` | External Neo4j via Bolt protocol |
//!
//! Every call is its own transaction. There is no transaction spanning
//! several calls, so an interrupted document import leaves partial state
//! behind; re-importing is the recovery path.

pub mod memory;
#[cfg(feature = "bolt")]
pub mod bolt;

use std::str::FromStr;

use async_trait::async_trait;

use crate::model::*;
use crate::{Error, Result};

pub use memory::MemoryStore;
#[cfg(feature = "bolt")]
pub use bolt::BoltStore;

// ============================================================================
// Configuration
// ============================================================================

/// Connection settings for a remote Neo4j instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// `None` selects the server's default database.
    pub database: Option<String>,
}

impl Default for BoltConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: String::new(),
            password: String::new(),
            database: None,
        }
    }
}

impl BoltConfig {
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

// ============================================================================
// Drop scope
// ============================================================================

/// Which nodes `drop_by_label` deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropScope {
    /// Every node labelled `Ast` (design-time intent).
    Ast,
    /// Every node labelled `Sim` (generated artifacts).
    Sim,
    /// Everything.
    All,
}

impl DropScope {
    /// Namespace label selected by this scope, `None` for `All`.
    pub fn label(self) -> Option<&'static str> {
        match self {
            DropScope::Ast => Some(crate::mapper::AST),
            DropScope::Sim => Some(crate::mapper::SIM),
            DropScope::All => None,
        }
    }
}

impl FromStr for DropScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ast" => Ok(DropScope::Ast),
            "sim" => Ok(DropScope::Sim),
            "all" | "--all" => Ok(DropScope::All),
            other => Err(Error::Unsupported(format!(
                "drop scope '{other}' (use 'ast', 'sim' or 'all')"
            ))),
        }
    }
}

// ============================================================================
// GraphStore Trait
// ============================================================================

/// The store contract.
///
/// Node identity follows MERGE semantics: a node matches an upsert when it
/// carries every requested label and every match property with an equal
/// value. Replacement properties then overwrite per key (values are
/// replaced whole, never merged), and a `Null` replacement removes the key.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    /// Round-trip a trivial request.
    async fn ping(&self) -> Result<()>;

    // ========================================================================
    // Write primitives
    // ========================================================================

    /// Merge a node identified by `(labels, match_props)` and overwrite its
    /// replacement properties with `props`, on create and on match alike.
    async fn upsert_node(
        &self,
        labels: &[&str],
        match_props: PropertyMap,
        props: PropertyMap,
    ) -> Result<NodeId>;

    /// Merge the edge `(start)-[rel_type]->(end)`. `Some(props)` overwrites
    /// the edge's properties per key; `None` leaves them as they are.
    async fn upsert_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        rel_type: &str,
        props: Option<PropertyMap>,
    ) -> Result<RelId>;

    /// Run an arbitrary write statement returning at most one `id` column.
    /// Zero rows is `Ok(None)`, not an error.
    async fn run_scalar_write(&self, query: &str, params: PropertyMap) -> Result<Option<u64>>;

    /// Delete every node in `scope` together with its relationships.
    /// Returns the number of deleted nodes.
    async fn drop_by_label(&self, scope: DropScope) -> Result<u64>;

    // ========================================================================
    // Read side (inference snapshots, export, reporting)
    // ========================================================================

    /// Return all nodes.
    async fn all_nodes(&self) -> Result<Vec<Node>>;

    /// Find all nodes with a given label.
    async fn nodes_by_label(&self, label: &str) -> Result<Vec<Node>>;

    /// Return all relationships.
    async fn all_relationships(&self) -> Result<Vec<Relationship>>;

    /// Find all relationships of a given type.
    ///
    /// Default: filters `all_relationships`.
    async fn relationships_by_type(&self, rel_type: &str) -> Result<Vec<Relationship>> {
        Ok(self.all_relationships().await?
            .into_iter()
            .filter(|r| r.rel_type == rel_type)
            .collect())
    }

    /// Total number of nodes.
    async fn node_count(&self) -> Result<u64>;

    /// Total number of relationships.
    async fn relationship_count(&self) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_scope_parse() {
        assert_eq!("ast".parse::<DropScope>().unwrap(), DropScope::Ast);
        assert_eq!("SIM".parse::<DropScope>().unwrap(), DropScope::Sim);
        assert_eq!("--all".parse::<DropScope>().unwrap(), DropScope::All);
        assert!("nodes".parse::<DropScope>().is_err());
    }

    #[test]
    fn test_bolt_config_defaults() {
        let cfg = BoltConfig::default().with_database("sim");
        assert_eq!(cfg.uri, "bolt://localhost:7687");
        assert_eq!(cfg.database.as_deref(), Some("sim"));
        assert!(cfg.user.is_empty());
    }
}
