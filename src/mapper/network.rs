//! Network → Message → {Signal, Functions → {Encode, Decode}}.

use crate::document::{Function, NetworkSpec};
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::{opaque, sim_child, Key, HAS};

pub(super) async fn map<S: GraphStore + ?Sized>(store: &S, spec: &NetworkSpec, network: NodeId) -> Result<()> {
    for message in &spec.messages {
        let message_id = sim_child(
            store,
            network,
            HAS,
            "Message",
            Key::owner(network).with("message", message.message.as_str()),
            props([("annotations", opaque(&message.annotations))]),
        )
        .await?;

        for signal in &message.signals {
            sim_child(
                store,
                message_id,
                HAS,
                "Signal",
                Key::owner(message_id).with("signal", signal.signal.as_str()),
                props([("annotations", opaque(&signal.annotations))]),
            )
            .await?;
        }

        if let Some(functions) = &message.functions {
            let functions_id =
                sim_child(store, message_id, HAS, "Functions", Key::owner(message_id), PropertyMap::new()).await?;
            for function in &functions.decode {
                function_node(store, functions_id, "Decode", function).await?;
            }
            for function in &functions.encode {
                function_node(store, functions_id, "Encode", function).await?;
            }
        }
    }
    Ok(())
}

async fn function_node<S: GraphStore + ?Sized>(
    store: &S,
    functions: NodeId,
    label: &str,
    function: &Function,
) -> Result<NodeId> {
    sim_child(
        store,
        functions,
        HAS,
        label,
        Key::owner(functions).with("function", function.function.as_str()),
        props([("annotations", opaque(&function.annotations))]),
    )
    .await
}
