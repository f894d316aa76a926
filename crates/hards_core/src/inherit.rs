//! Datapoint inheritance along the ancestor chain.
//!
//! A dataset sees its own datapoints and those of every dataset above it,
//! up to its top-level dataset. The database contributes none. Datapoints
//! never travel upward: a dataset does not see the datapoints of its
//! children.

use crate::datapoint::Datapoint;
use crate::error::CoreResult;
use crate::node::NodeRef;
use crate::types::EntityKind;

/// Returns the datapoints created directly under `dataset`, in creation
/// order.
pub(crate) fn direct_datapoints(dataset: &NodeRef) -> CoreResult<Vec<Datapoint>> {
    let names = dataset.store.children(&dataset.path, EntityKind::Datapoint)?;
    Ok(names
        .iter()
        .map(|name| {
            let path = dataset.path.child(EntityKind::Datapoint, name);
            Datapoint::from_node(dataset.with_path(path))
        })
        .collect())
}

/// Returns the datapoints visible from `node`: the direct datapoints of
/// each dataset from the top-level dataset down to `node`, in that order.
pub(crate) fn visible_datapoints(node: &NodeRef) -> CoreResult<Vec<Datapoint>> {
    let mut visible = Vec::new();
    for dataset in node.path.dataset_chain() {
        visible.extend(direct_datapoints(&node.with_path(dataset))?);
    }
    Ok(visible)
}
