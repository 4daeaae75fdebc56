//! Simulation (Ast) → SimulationChannel → Network, Stack → {Env, ModelInst →
//! {ModelChannel, Env, Workflow → Var}}, Uses, Var.
//!
//! Each `ModelChannel` is connected to the `SimulationChannel` of the same
//! name declared in the same document.

use std::collections::HashMap;

use tracing::debug;

use crate::document::{SimulationSpec, Var};
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::{ast_child, Key, CONNECTS, CONTAINS, HAS};

pub const SIMULATION_CHANNEL: &str = "SimulationChannel";
pub const MODEL_INST: &str = "ModelInst";
pub const MODEL_CHANNEL: &str = "ModelChannel";

pub(super) async fn map<S: GraphStore + ?Sized>(store: &S, spec: &SimulationSpec, simulation: NodeId) -> Result<()> {
    let mut channel_ids: HashMap<&str, NodeId> = HashMap::new();

    for channel in &spec.channels {
        let channel_id = ast_child(
            store,
            simulation,
            HAS,
            SIMULATION_CHANNEL,
            Key::new().with("channel_name", channel.name.as_str()),
            PropertyMap::new(),
        )
        .await?;
        channel_ids.insert(channel.name.as_str(), channel_id);

        for network in &channel.networks {
            ast_child(
                store,
                channel_id,
                HAS,
                "Network",
                Key::new()
                    .with("network_name", network.name.as_str())
                    .with_opt("mime_type", network.mime_type.as_deref()),
                PropertyMap::new(),
            )
            .await?;
        }
    }

    for stack in &spec.stacks {
        let stack_id = ast_child(
            store,
            simulation,
            HAS,
            "Stack",
            Key::new().with("stack_name", stack.name.as_str()),
            props([
                ("arch", Value::from(stack.arch.clone())),
                ("stacked", Value::from(stack.stacked)),
            ]),
        )
        .await?;
        env(store, stack_id, &stack.env).await?;

        for model in &stack.models {
            let model_id = ast_child(
                store,
                stack_id,
                HAS,
                MODEL_INST,
                Key::new().with("model_name", model.name.as_str()),
                props([
                    ("arch", Value::from(model.arch.clone())),
                    ("model", Value::from(model.model.clone())),
                ]),
            )
            .await?;

            for channel in &model.channels {
                let mc = ast_child(
                    store,
                    model_id,
                    CONTAINS,
                    MODEL_CHANNEL,
                    Key::owner(model_id).with("channel_name", channel.name.as_str()),
                    props([("alias", Value::from(channel.alias.clone()))]),
                )
                .await?;
                if let Some(&sc) = channel_ids.get(channel.name.as_str()) {
                    store.upsert_relationship(mc, sc, CONNECTS, None).await?;
                } else {
                    debug!(channel = %channel.name, model = %model.name, "no simulation channel to connect");
                }
            }

            env(store, model_id, &model.env).await?;

            for workflow in &model.workflows {
                let workflow_id = ast_child(
                    store,
                    model_id,
                    HAS,
                    "Workflow",
                    Key::owner(model_id).with("workflow_name", workflow.name.as_str()),
                    props([("uses", Value::from(workflow.uses.clone()))]),
                )
                .await?;
                vars(store, workflow_id, &workflow.vars).await?;
            }
        }
    }

    for uses in &spec.uses {
        ast_child(
            store,
            simulation,
            HAS,
            "Uses",
            Key::new().with("uses_name", uses.name.as_str()),
            props([
                ("path", Value::from(uses.path.clone())),
                ("url", Value::from(uses.url.clone())),
                ("version", Value::from(uses.version.clone())),
            ]),
        )
        .await?;
    }

    vars(store, simulation, &spec.vars).await
}

async fn env<S: GraphStore + ?Sized>(store: &S, parent: NodeId, entries: &[Var]) -> Result<()> {
    for var in entries {
        ast_child(
            store,
            parent,
            HAS,
            "Env",
            Key::new().with("env_name", var.name.as_str()).with("env_value", var.value.as_str()),
            PropertyMap::new(),
        )
        .await?;
    }
    Ok(())
}

async fn vars<S: GraphStore + ?Sized>(store: &S, parent: NodeId, entries: &[Var]) -> Result<()> {
    for var in entries {
        ast_child(
            store,
            parent,
            HAS,
            "Var",
            Key::new().with("var_name", var.name.as_str()).with("var_value", var.value.as_str()),
            PropertyMap::new(),
        )
        .await?;
    }
    Ok(())
}
