//! SignalGroup → Signal (Contains), Label (Has).

use crate::document::{Document, SignalGroupSpec};
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::{opaque, sim_child, Key, CONTAINS, HAS};

pub const SIGNAL: &str = "Signal";
pub const LABEL: &str = "Label";

pub(super) async fn map<S: GraphStore + ?Sized>(
    store: &S,
    doc: &Document,
    spec: &SignalGroupSpec,
    group: NodeId,
) -> Result<()> {
    for signal in &spec.signals {
        sim_child(
            store,
            group,
            CONTAINS,
            SIGNAL,
            Key::owner(group).with("name", signal.signal.as_str()),
            props([("annotations", opaque(&signal.annotations))]),
        )
        .await?;
    }

    // One Label per metadata label; these are what Selectors match against.
    for (name, value) in &doc.labels {
        sim_child(
            store,
            group,
            HAS,
            LABEL,
            Key::owner(group).with("label_name", name.as_str()),
            props([("label_value", value.as_str())]),
        )
        .await?;
    }
    Ok(())
}
