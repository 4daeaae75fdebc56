//! Propagator → Signal → Encoding → {Linear, Mapping → Range}, Options.

use crate::document::PropagatorSpec;
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::{opaque, sim_child, Key, HAS};

pub(super) async fn map<S: GraphStore + ?Sized>(store: &S, spec: &PropagatorSpec, propagator: NodeId) -> Result<()> {
    for signal in &spec.signals {
        let signal_id = sim_child(
            store,
            propagator,
            HAS,
            "Signal",
            Key::owner(propagator)
                .with("signal", signal.signal.as_str())
                .with_opt("target", signal.target.as_deref()),
            PropertyMap::new(),
        )
        .await?;

        let Some(encoding) = &signal.encoding else { continue };
        let encoding_id =
            sim_child(store, signal_id, HAS, "Encoding", Key::owner(signal_id), PropertyMap::new()).await?;

        if let Some(linear) = &encoding.linear {
            sim_child(
                store,
                encoding_id,
                HAS,
                "Linear",
                Key::owner(encoding_id),
                props([
                    ("factor", Value::from(linear.factor)),
                    ("offset", Value::from(linear.offset)),
                    ("min", Value::from(linear.min)),
                    ("max", Value::from(linear.max)),
                ]),
            )
            .await?;
        }

        for mapping in &encoding.mapping {
            let mapping_id = sim_child(
                store,
                encoding_id,
                HAS,
                "Mapping",
                Key::owner(encoding_id).with_opt("name", mapping.name.as_deref()),
                props([("source", opaque(&mapping.source)), ("target", opaque(&mapping.target))]),
            )
            .await?;

            if let Some(range) = &mapping.range {
                sim_child(
                    store,
                    mapping_id,
                    HAS,
                    "Range",
                    Key::owner(mapping_id),
                    props([("min", Value::from(range.min)), ("max", Value::from(range.max))]),
                )
                .await?;
            }
        }
    }

    if let Some(direction) = spec.options.as_ref().and_then(|o| o.direction.as_deref()) {
        sim_child(
            store,
            propagator,
            HAS,
            "Options",
            Key::owner(propagator),
            props([("direction", direction)]),
        )
        .await?;
    }
    Ok(())
}
