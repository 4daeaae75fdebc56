//! Stack → ModelInst (or Simbus) → Channel/Selector/Runtime, Connection, StackRuntime.
//!
//! Channels, Simbus channels and Selectors are keyed globally (by name and
//! selector tuple) so documents from different files meet on the same nodes;
//! inference joins over them.

use tracing::warn;

use crate::document::{ModelInstance, StackSpec};
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::model::SELECTOR;
use super::{opaque, sim_child, Key, ALIAS, HAS, IDENTIFIES, SIM};

pub const MODEL_INST: &str = "ModelInst";
pub const CHANNEL: &str = "Channel";
pub const SIMBUS: &str = "Simbus";
pub const SIMBUS_CHANNEL: &str = "SimbusChannel";

pub(super) async fn map<S: GraphStore + ?Sized>(store: &S, spec: &StackSpec, stack: NodeId) -> Result<()> {
    for instance in &spec.models {
        if instance.is_simbus() {
            simbus(store, instance, stack).await?;
        } else {
            model_instance(store, instance, stack).await?;
        }
    }

    if let Some(timeout) = spec.connection.as_ref().and_then(|c| c.timeout.as_deref()) {
        sim_child(store, stack, HAS, "Connection", Key::new().with("timeout", timeout), PropertyMap::new())
            .await?;
    }

    if let Some(runtime) = &spec.runtime {
        sim_child(
            store,
            stack,
            HAS,
            "StackRuntime",
            Key::owner(stack),
            props([
                ("env", opaque(&runtime.env)),
                ("stacked", Value::from(runtime.stacked)),
            ]),
        )
        .await?;
    }
    Ok(())
}

async fn simbus<S: GraphStore + ?Sized>(store: &S, instance: &ModelInstance, stack: NodeId) -> Result<()> {
    let bus = sim_child(store, stack, HAS, SIMBUS, Key::new().with("name", instance.name.as_str()), PropertyMap::new())
        .await?;

    for channel in &instance.channels {
        let Some(name) = channel.name.as_deref() else {
            warn!(stack = %stack, "simbus channel without name skipped");
            continue;
        };
        sim_child(
            store,
            bus,
            HAS,
            SIMBUS_CHANNEL,
            Key::new().with("name", name),
            props([("expectedModelCount", Value::from(channel.expected_model_count))]),
        )
        .await?;
    }
    Ok(())
}

async fn model_instance<S: GraphStore + ?Sized>(store: &S, instance: &ModelInstance, stack: NodeId) -> Result<()> {
    let mi = sim_child(
        store,
        stack,
        HAS,
        MODEL_INST,
        Key::new().with("name", instance.name.as_str()),
        props([
            ("annotations", opaque(&instance.annotations)),
            ("uid", Value::from(instance.uid)),
            ("model", Value::from(instance.model_name())),
        ]),
    )
    .await?;

    for channel in &instance.channels {
        let Some(name) = channel.name.as_deref() else {
            warn!(instance = %instance.name, "channel without name skipped");
            continue;
        };
        let channel_id = sim_child(store, mi, HAS, CHANNEL, Key::new().with("name", name), PropertyMap::new())
            .await?;

        let Some(alias) = channel.alias.as_deref() else {
            if !channel.selectors.is_empty() {
                warn!(instance = %instance.name, channel = name, "selectors without alias skipped");
            }
            continue;
        };
        store
            .upsert_relationship(mi, channel_id, ALIAS, Some(props([("name", alias)])))
            .await?;

        for (selector, value) in &channel.selectors {
            let selector_id = store
                .upsert_node(
                    &[SIM, SELECTOR],
                    Key::new()
                        .with("channelName", name)
                        .with("channelAlias", alias)
                        .with("selectorName", selector.as_str())
                        .with("selectorValue", value.as_str())
                        .build(),
                    PropertyMap::new(),
                )
                .await?;
            store.upsert_relationship(mi, selector_id, HAS, None).await?;
            store
                .upsert_relationship(selector_id, channel_id, IDENTIFIES, Some(props([("alias", alias)])))
                .await?;
        }
    }

    if let Some(runtime) = &instance.runtime {
        sim_child(
            store,
            mi,
            HAS,
            "ModelInstanceRuntime",
            Key::owner(mi),
            props([
                ("env", opaque(&runtime.env)),
                ("x32", Value::from(runtime.x32)),
                ("files", Value::from(runtime.files.clone())),
            ]),
        )
        .await?;
    }
    Ok(())
}
