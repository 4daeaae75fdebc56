//! # Relationship Inference
//!
//! A second pass over the whole graph, run after a batch of documents is
//! materialized. Each step re-reads the store into a [`GraphSnapshot`], asks
//! a pure rule for the edges it implies and upserts them. Steps are
//! best-effort: a failing step is logged and recorded, and the next step
//! still runs. Inferred edges are never retracted.

pub mod rules;
pub mod snapshot;

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::storage::GraphStore;
use crate::{Error, Result};
pub use rules::EdgeProposal;
pub use snapshot::GraphSnapshot;

/// The derivation steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Step {
    InstanceOf,
    Belongs,
    Selects,
    Represents,
    ModelInstBridge,
    ChannelBridge,
}

impl Step {
    pub const ORDER: [Step; 6] = [
        Step::InstanceOf,
        Step::Belongs,
        Step::Selects,
        Step::Represents,
        Step::ModelInstBridge,
        Step::ChannelBridge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::InstanceOf => "instance_of",
            Step::Belongs => "belongs",
            Step::Selects => "selects",
            Step::Represents => "represents",
            Step::ModelInstBridge => "model_inst_bridge",
            Step::ChannelBridge => "channel_bridge",
        }
    }

    /// Edges this step wants over `snap`.
    pub fn propose(self, snap: &GraphSnapshot) -> Vec<EdgeProposal> {
        match self {
            Step::InstanceOf => rules::instance_of(snap),
            Step::Belongs => rules::belongs(snap),
            Step::Selects => rules::selects(snap),
            Step::Represents => rules::represents(snap),
            Step::ModelInstBridge => rules::model_inst_bridge(snap),
            Step::ChannelBridge => rules::channel_bridge(snap),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    pub proposals: usize,
    /// Edges upserted before the step finished or failed.
    pub written: usize,
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run every step in order against `store`.
pub async fn run<S: GraphStore + ?Sized>(store: &S) -> Vec<StepOutcome> {
    let mut outcomes = Vec::with_capacity(Step::ORDER.len());
    for step in Step::ORDER {
        let mut outcome = StepOutcome { step, proposals: 0, written: 0, error: None };
        if let Err(e) = run_step(store, step, &mut outcome).await {
            let err = Error::Inference { step: step.name(), message: e.to_string() };
            warn!(%step, error = %err, "inference step failed");
            outcome.error = Some(err.to_string());
        }
        outcomes.push(outcome);
    }

    let written: usize = outcomes.iter().map(|o| o.written).sum();
    info!(edges = written, "inference finished");
    outcomes
}

async fn run_step<S: GraphStore + ?Sized>(store: &S, step: Step, outcome: &mut StepOutcome) -> Result<()> {
    let snap = GraphSnapshot::capture(store).await?;
    let proposals = step.propose(&snap);
    outcome.proposals = proposals.len();

    for p in proposals {
        store.upsert_relationship(p.start, p.end, p.rel_type, None).await?;
        debug!(%step, start = %p.start, end = %p.end, rel = p.rel_type, "inferred edge");
        outcome.written += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::storage::{DropScope, MemoryStore};
    use async_trait::async_trait;

    /// Store whose relationship writes always fail.
    struct ReadOnly(MemoryStore);

    #[async_trait]
    impl GraphStore for ReadOnly {
        async fn ping(&self) -> Result<()> { Ok(()) }
        async fn upsert_node(&self, labels: &[&str], m: PropertyMap, p: PropertyMap) -> Result<NodeId> {
            self.0.upsert_node(labels, m, p).await
        }
        async fn upsert_relationship(&self, _: NodeId, _: NodeId, rel_type: &str, _: Option<PropertyMap>) -> Result<RelId> {
            Err(Error::StorageError(format!("read-only: {rel_type}")))
        }
        async fn run_scalar_write(&self, q: &str, p: PropertyMap) -> Result<Option<u64>> {
            self.0.run_scalar_write(q, p).await
        }
        async fn drop_by_label(&self, scope: DropScope) -> Result<u64> { self.0.drop_by_label(scope).await }
        async fn all_nodes(&self) -> Result<Vec<Node>> { self.0.all_nodes().await }
        async fn nodes_by_label(&self, label: &str) -> Result<Vec<Node>> { self.0.nodes_by_label(label).await }
        async fn all_relationships(&self) -> Result<Vec<Relationship>> { self.0.all_relationships().await }
        async fn node_count(&self) -> Result<u64> { self.0.node_count().await }
        async fn relationship_count(&self) -> Result<u64> { self.0.relationship_count().await }
    }

    #[tokio::test]
    async fn test_failed_step_does_not_stop_pipeline() {
        let store = ReadOnly(MemoryStore::new());
        store.upsert_node(&["Sim", "ModelInst"], props([("name", "a")]), props([("model", "m")])).await.unwrap();
        store.upsert_node(&["Sim", "Model"], props([("name", "m")]), PropertyMap::new()).await.unwrap();
        store.upsert_node(&["Sim", "Channel"], props([("name", "c")]), PropertyMap::new()).await.unwrap();
        store.upsert_node(&["Sim", "SimbusChannel"], props([("name", "c")]), PropertyMap::new()).await.unwrap();

        let outcomes = run(&store).await;
        assert_eq!(outcomes.len(), Step::ORDER.len());
        assert!(!outcomes[0].is_ok());
        assert_eq!(outcomes[0].proposals, 1);
        assert_eq!(outcomes[1].step, Step::Belongs);
        assert!(outcomes[1].error.as_deref().unwrap_or_default().contains("belongs"));
        assert!(outcomes[2].is_ok());
    }

    #[tokio::test]
    async fn test_rerun_writes_nothing_new() {
        let store = MemoryStore::new();
        store.upsert_node(&["Sim", "ModelInst"], props([("name", "a")]), props([("model", "m")])).await.unwrap();
        store.upsert_node(&["Sim", "Model"], props([("name", "m")]), PropertyMap::new()).await.unwrap();

        run(&store).await;
        let before = store.relationship_count().await.unwrap();
        let outcomes = run(&store).await;
        assert!(outcomes.iter().all(StepOutcome::is_ok));
        assert_eq!(store.relationship_count().await.unwrap(), before);
        assert_eq!(before, 1);
    }
}
