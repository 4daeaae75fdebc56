//! Apply a document's `annotations.graph` fragment.
//!
//! Text-valued properties form the node's identity; every other value is a
//! replacement property. Works the same for every kind.

use tracing::debug;

use crate::document::GraphFragment;
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::SIM;

/// Upsert each fragment node under `Sim:<label>` and link it to `primary`.
pub async fn apply<S: GraphStore + ?Sized>(store: &S, primary: NodeId, fragment: &GraphFragment) -> Result<Vec<NodeId>> {
    let mut created = Vec::with_capacity(fragment.nodes.len());

    for node in &fragment.nodes {
        let (match_props, other): (Vec<_>, Vec<_>) =
            node.properties.iter().partition(|(_, v)| v.is_string());
        let to_map = |pairs: Vec<(&String, &serde_json::Value)>| -> PropertyMap {
            pairs.into_iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))).collect()
        };

        let id = store
            .upsert_node(&[SIM, node.label.as_str()], to_map(match_props), to_map(other))
            .await?;

        let (src, dst) = match fragment.direction {
            Direction::Incoming => (id, primary),
            Direction::Outgoing => (primary, id),
        };
        store.upsert_relationship(src, dst, &fragment.edge_label, None).await?;
        debug!(label = %node.label, id = %id, edge = %fragment.edge_label, "fragment node");
        created.push(id);
    }
    Ok(created)
}
