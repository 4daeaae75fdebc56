//! # Kind Mappers
//!
//! Translate one decoded [`Document`] into node and relationship upserts.
//! `import_document` creates the `File` node, the document's primary node and
//! the `Contains` edge between them, then hands the primary node to the
//! mapper for the document's kind and finally applies any graph fragment.
//!
//! Structures without a natural key are keyed by an `owner` property holding
//! the parent node id, so equal-looking children of different parents stay
//! distinct.

pub mod fragment;
mod manifest;
mod model;
mod network;
mod parameter_set;
mod propagator;
mod runnable;
mod signal_group;
mod simulation;
mod stack;

use tracing::debug;

use crate::document::{Document, KindSpec};
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

/// Namespace label for generated/runtime artifacts.
pub const SIM: &str = "Sim";
/// Namespace label for design-time intent.
pub const AST: &str = "Ast";
/// Label of the node standing for a source file.
pub const FILE: &str = "File";
/// Match property linking a keyless child to its parent.
pub const OWNER: &str = "owner";

// Relationship types written by mappers.
pub const CONTAINS: &str = "Contains";
pub const HAS: &str = "Has";
pub const ALIAS: &str = "Alias";
pub const IDENTIFIES: &str = "Identifies";
pub const CONNECTS: &str = "Connects";

/// Materialize one document. Returns the primary node id.
///
/// A store error aborts this document only; whatever was written before the
/// failure stays in the graph.
pub async fn import_document<S: GraphStore + ?Sized>(store: &S, doc: &Document) -> Result<NodeId> {
    let kind = doc.kind();

    let file_id = store
        .upsert_node(&[FILE], Key::new().with("name", doc.file.as_str()).build(), PropertyMap::new())
        .await?;

    let mut primary_props = props([
        ("labels", Value::from(doc.labels.clone())),
        ("annotations", Value::from(doc.annotations.clone())),
    ]);
    if let KindSpec::Simulation(spec) = &doc.spec {
        primary_props.insert("arch".into(), Value::from(spec.arch.clone()));
    }

    let primary = store
        .upsert_node(
            &[kind.namespace(), kind.as_str()],
            Key::new().with("name", doc.name.as_str()).build(),
            primary_props,
        )
        .await?;
    store
        .upsert_relationship(file_id, primary, CONTAINS, Some(props([("index", doc.index as u64)])))
        .await?;
    debug!(file = %doc.file, index = doc.index, %kind, name = %doc.name, id = %primary, "primary node");

    match &doc.spec {
        KindSpec::SignalGroup(spec) => signal_group::map(store, doc, spec, primary).await?,
        KindSpec::Model(spec) => model::map(store, spec, primary).await?,
        KindSpec::Stack(spec) => stack::map(store, spec, primary).await?,
        KindSpec::Network(spec) => network::map(store, spec, primary).await?,
        KindSpec::Propagator(spec) => propagator::map(store, spec, primary).await?,
        KindSpec::Manifest(spec) => manifest::map(store, spec, primary).await?,
        KindSpec::Simulation(spec) => simulation::map(store, spec, primary).await?,
        KindSpec::ParameterSet(spec) => parameter_set::map(store, spec, primary).await?,
        KindSpec::Runnable(spec) => runnable::map(store, spec, primary).await?,
    }

    if let Some(fragment) = &doc.fragment {
        fragment::apply(store, primary, fragment).await?;
    }

    Ok(primary)
}

// ============================================================================
// Helpers shared by the kind mappers
// ============================================================================

/// Match-property builder. Absent values are left out of the key.
#[derive(Debug, Default)]
pub(crate) struct Key(PropertyMap);

impl Key {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of a child without a natural identity of its own.
    pub fn owner(parent: NodeId) -> Self {
        Self::new().with(OWNER, parent.0)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn with_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    pub fn build(self) -> PropertyMap {
        self.0
    }
}

/// Upsert a `Sim` child under `parent`, linked by `rel`.
pub(crate) async fn sim_child<S: GraphStore + ?Sized>(
    store: &S,
    parent: NodeId,
    rel: &str,
    label: &str,
    key: Key,
    props: PropertyMap,
) -> Result<NodeId> {
    child(store, parent, rel, &[SIM, label], key, props).await
}

/// Upsert an `Ast` child under `parent`, linked by `rel`.
pub(crate) async fn ast_child<S: GraphStore + ?Sized>(
    store: &S,
    parent: NodeId,
    rel: &str,
    label: &str,
    key: Key,
    props: PropertyMap,
) -> Result<NodeId> {
    child(store, parent, rel, &[AST, label], key, props).await
}

async fn child<S: GraphStore + ?Sized>(
    store: &S,
    parent: NodeId,
    rel: &str,
    labels: &[&str],
    key: Key,
    props: PropertyMap,
) -> Result<NodeId> {
    let id = store.upsert_node(labels, key.build(), props).await?;
    store.upsert_relationship(parent, id, rel, None).await?;
    Ok(id)
}

/// Opaque JSON payload as a property value (`Null` when absent).
pub(crate) fn opaque(value: &Option<serde_json::Value>) -> Value {
    Value::from(value.clone())
}
