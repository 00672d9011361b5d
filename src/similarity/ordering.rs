//! Dependency ordering of retained instances

use std::collections::HashSet;

use crate::inference::{InferenceError, InstanceId, Result};

/// Order `retained` so every referenced child precedes the instance referencing it.
///
/// Instances are visited depth-first in input order and emitted after their children.
/// `children` must only return ids from `retained`; anything else is an engine bug and
/// reported as [`InferenceError::MissingEntry`]. The output is a permutation of the input.
pub fn order_instances<F>(retained: &[InstanceId], children: F) -> Result<Vec<InstanceId>>
where
    F: Fn(InstanceId) -> Result<Vec<InstanceId>>,
{
    let members: HashSet<InstanceId> = retained.iter().copied().collect();
    let mut visited = HashSet::with_capacity(retained.len());
    let mut order = Vec::with_capacity(retained.len());

    for id in retained {
        visit(*id, &members, &children, &mut visited, &mut order)?;
    }

    if order.len() != retained.len() {
        return Err(InferenceError::OrderingMismatch {
            expected: retained.len(),
            actual: order.len(),
        });
    }
    Ok(order)
}

fn visit<F>(
    id: InstanceId,
    members: &HashSet<InstanceId>,
    children: &F,
    visited: &mut HashSet<InstanceId>,
    order: &mut Vec<InstanceId>,
) -> Result<()>
where
    F: Fn(InstanceId) -> Result<Vec<InstanceId>>,
{
    if !visited.insert(id) {
        return Ok(());
    }
    if !members.contains(&id) {
        return Err(InferenceError::MissingEntry(format!(
            "instance {id} is referenced but not retained"
        )));
    }
    for child in children(id)? {
        visit(child, members, children, visited, order)?;
    }
    order.push(id);
    Ok(())
}
