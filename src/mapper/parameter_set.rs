//! ParameterSet → Parameter.

use crate::document::ParameterSetSpec;
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::{opaque, sim_child, Key, HAS};

pub(super) async fn map<S: GraphStore + ?Sized>(store: &S, spec: &ParameterSetSpec, set: NodeId) -> Result<()> {
    for parameter in &spec.parameters {
        sim_child(
            store,
            set,
            HAS,
            "Parameter",
            Key::owner(set).with("parameter", parameter.parameter.as_str()),
            props([
                ("value", opaque(&parameter.value)),
                ("annotations", opaque(&parameter.annotations)),
            ]),
        )
        .await?;
    }
    Ok(())
}
