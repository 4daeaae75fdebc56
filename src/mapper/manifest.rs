//! Manifest → Documentation, Model → Channels, Repo, Simulation → {Files, Models → Channels}, Tool.
//!
//! Manifest models share `Sim:Model` nodes with Model documents of the same
//! name, so `InstanceOf` reaches them too. Documentation, Repo and Tool are
//! shared by name across manifests; simulation files belong to their simulation.

use crate::document::{ChannelSelectors, ManifestFile, ManifestSpec};
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::{opaque, sim_child, Key, HAS, SIM};

const CHANNELS: &str = "Channels";

pub(super) async fn map<S: GraphStore + ?Sized>(store: &S, spec: &ManifestSpec, manifest: NodeId) -> Result<()> {
    for doc in &spec.documentation {
        file_node(store, manifest, "Documentation", Key::new(), doc).await?;
    }

    for model in &spec.models {
        let model_id = store
            .upsert_node(
                &[SIM, "Model"],
                Key::new().with("name", model.name.as_str()).build(),
                props([
                    ("arch", opaque(&model.arch)),
                    ("repo", Value::from(model.repo.clone())),
                    ("schema", Value::from(model.schema.clone())),
                    ("version", Value::from(model.version.clone())),
                ]),
            )
            .await?;
        store.upsert_relationship(manifest, model_id, HAS, None).await?;
        channels(store, model_id, &model.channels).await?;
    }

    for repo in &spec.repos {
        sim_child(
            store,
            manifest,
            HAS,
            "Repo",
            Key::new().with("name", repo.name.as_str()),
            props([
                ("path", Value::from(repo.path.clone())),
                ("registry", Value::from(repo.registry.clone())),
                ("repo", Value::from(repo.repo.clone())),
                ("token", Value::from(repo.token.clone())),
                ("user", Value::from(repo.user.clone())),
            ]),
        )
        .await?;
    }

    for simulation in &spec.simulations {
        let parameters = simulation.parameters.clone().unwrap_or_default();
        let sim_id = sim_child(
            store,
            manifest,
            HAS,
            "Simulation",
            Key::owner(manifest).with("name", simulation.name.as_str()),
            props([
                ("transport", opaque(&parameters.transport)),
                ("environment", opaque(&parameters.environment)),
            ]),
        )
        .await?;

        for file in &simulation.files {
            file_node(store, sim_id, "Files", Key::owner(sim_id), file).await?;
        }
        for model in &simulation.models {
            let model_id = sim_child(
                store,
                sim_id,
                HAS,
                "Models",
                Key::owner(sim_id).with("name", model.name.as_str()),
                props([("model", Value::from(model.model.clone()))]),
            )
            .await?;
            channels(store, model_id, &model.channels).await?;
        }
    }

    for tool in &spec.tools {
        sim_child(
            store,
            manifest,
            HAS,
            "Tool",
            Key::new().with("name", tool.name.as_str()),
            props([
                ("arch", opaque(&tool.arch)),
                ("repo", Value::from(tool.repo.clone())),
                ("schema", Value::from(tool.schema.clone())),
                ("version", Value::from(tool.version.clone())),
            ]),
        )
        .await?;
    }
    Ok(())
}

async fn file_node<S: GraphStore + ?Sized>(
    store: &S,
    parent: NodeId,
    label: &str,
    key: Key,
    file: &ManifestFile,
) -> Result<NodeId> {
    sim_child(
        store,
        parent,
        HAS,
        label,
        key.with("name", file.name.as_str()),
        props([
            ("generate", Value::from(file.generate)),
            ("modelc", Value::from(file.modelc)),
            ("processing", Value::from(file.processing.clone())),
            ("repo", Value::from(file.repo.clone())),
            ("uri", Value::from(file.uri.clone())),
        ]),
    )
    .await
}

/// Channel requirements listed by a manifest model, labelled `Channels` so
/// they stay apart from runtime `Channel` nodes. Selectors stay opaque.
async fn channels<S: GraphStore + ?Sized>(store: &S, model: NodeId, channels: &[ChannelSelectors]) -> Result<()> {
    for channel in channels {
        sim_child(
            store,
            model,
            HAS,
            CHANNELS,
            Key::owner(model).with("alias", channel.alias.as_deref().unwrap_or_default()),
            props([("selectors", Value::from(channel.selectors.clone()))]),
        )
        .await?;
    }
    Ok(())
}
