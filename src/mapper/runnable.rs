//! Runnable → Task.

use crate::document::RunnableSpec;
use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

use super::{sim_child, Key, HAS};

pub(super) async fn map<S: GraphStore + ?Sized>(store: &S, spec: &RunnableSpec, runnable: NodeId) -> Result<()> {
    for task in &spec.tasks {
        sim_child(
            store,
            runnable,
            HAS,
            "Task",
            Key::owner(runnable).with("function", task.function.as_str()),
            props([("schedule", Value::from(task.schedule))]),
        )
        .await?;
    }
    Ok(())
}
