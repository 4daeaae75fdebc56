//! Model → Selector, Runtime → {Dynlib, Executable, Gateway, Mcl}.

use tracing::warn;

use crate::document::{Lib, ModelSpec};
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::{opaque, sim_child, Key, HAS};

pub const SELECTOR: &str = "Selector";

pub(super) async fn map<S: GraphStore + ?Sized>(store: &S, spec: &ModelSpec, model: NodeId) -> Result<()> {
    for channel in &spec.channels {
        let Some(alias) = channel.alias.as_deref() else {
            if !channel.selectors.is_empty() {
                warn!(model = %model, "channel selectors without alias skipped");
            }
            continue;
        };
        for (name, value) in &channel.selectors {
            sim_child(
                store,
                model,
                HAS,
                SELECTOR,
                Key::new()
                    .with("channelAlias", alias)
                    .with("selectorName", name.as_str())
                    .with("selectorValue", value.as_str()),
                PropertyMap::new(),
            )
            .await?;
        }
    }

    let Some(runtime) = &spec.runtime else { return Ok(()) };
    let runtime_id = sim_child(store, model, HAS, "Runtime", Key::owner(model), PropertyMap::new()).await?;

    for lib in &runtime.dynlib {
        lib_node(store, runtime_id, "Dynlib", lib).await?;
    }
    for exe in &runtime.executable {
        sim_child(
            store,
            runtime_id,
            HAS,
            "Executable",
            Key::owner(runtime_id).with_opt("arch", exe.arch.as_deref()).with_opt("os", exe.os.as_deref()),
            props([
                ("annotations", opaque(&exe.annotations)),
                ("libs", Value::from(exe.libs.clone())),
            ]),
        )
        .await?;
    }
    if let Some(gateway) = &runtime.gateway {
        sim_child(
            store,
            runtime_id,
            HAS,
            "Gateway",
            Key::owner(runtime_id),
            props([("annotations", opaque(&gateway.annotations))]),
        )
        .await?;
    }
    for lib in &runtime.mcl {
        lib_node(store, runtime_id, "Mcl", lib).await?;
    }
    Ok(())
}

async fn lib_node<S: GraphStore + ?Sized>(store: &S, runtime: NodeId, label: &str, lib: &Lib) -> Result<NodeId> {
    sim_child(
        store,
        runtime,
        HAS,
        label,
        Key::owner(runtime)
            .with_opt("arch", lib.arch.as_deref())
            .with_opt("os", lib.os.as_deref())
            .with_opt("path", lib.path.as_deref()),
        props([
            ("annotations", opaque(&lib.annotations)),
            ("libs", Value::from(lib.libs.clone())),
            ("variant", Value::from(lib.variant.clone())),
        ]),
    )
    .await
}
