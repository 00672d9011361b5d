//! Best-base selection
//!
//! Every instance looks for its base among the instances of the same type registered
//! before it, so a base link always points backwards.

use std::collections::HashMap;

use serde::Serialize;

use super::diff::{Comparator, DiffEntry};
use crate::inference::{Instance, InstanceId, InferenceError, Result, TypeId, TypeRegistry};

/// Link from an instance to the earlier instance it patches
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLink {
    pub base: InstanceId,
    /// Patch that turns the base into the linked instance
    pub diff: Vec<DiffEntry>,
    /// Fields the two instances share
    pub same: usize,
    pub cost: usize,
}

impl BaseLink {
    /// Whether the instance is value-identical to its base
    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }
}

/// Memoized best-base search over one instance arena
pub struct BaseMatcher<'a> {
    instances: &'a [Instance],
    comparator: Comparator<'a>,
    /// Instances per type, in registration order
    by_type: HashMap<TypeId, Vec<InstanceId>>,
    links: HashMap<InstanceId, Option<BaseLink>>,
}

impl<'a> BaseMatcher<'a> {
    pub fn new(registry: &'a TypeRegistry, instances: &'a [Instance]) -> Self {
        let mut by_type: HashMap<TypeId, Vec<InstanceId>> = HashMap::new();
        for instance in instances {
            by_type.entry(instance.type_id).or_default().push(instance.id);
        }
        Self {
            instances,
            comparator: Comparator::new(registry, instances),
            by_type,
            links: HashMap::new(),
        }
    }

    /// Cheapest earlier same-typed instance to patch into `id`.
    ///
    /// A candidate sharing no field with `id` is never chosen. Among equally cheap
    /// candidates the earliest registered wins.
    pub fn best_base_for(&mut self, id: InstanceId) -> Result<Option<&BaseLink>> {
        if !self.links.contains_key(&id) {
            let link = self.search(id)?;
            self.links.insert(id, link);
        }
        Ok(self.links.get(&id).and_then(Option::as_ref))
    }

    /// Distinct instance pairs compared so far
    pub fn comparisons(&self) -> usize {
        self.comparator.comparisons()
    }

    fn search(&mut self, id: InstanceId) -> Result<Option<BaseLink>> {
        let instance = self
            .instances
            .get(id.index())
            .ok_or_else(|| InferenceError::MissingEntry(format!("instance {id}")))?;
        let candidates: Vec<InstanceId> = self
            .by_type
            .get(&instance.type_id)
            .map(|ids| ids.iter().copied().take_while(|c| *c < id).collect())
            .unwrap_or_default();

        let mut best: Option<BaseLink> = None;
        for candidate in candidates {
            let Some(comparison) = self.comparator.compare(candidate, id)? else {
                continue;
            };
            if comparison.same == 0 {
                continue;
            }
            if best.as_ref().is_some_and(|b| comparison.cost >= b.cost) {
                continue;
            }
            best = Some(BaseLink {
                base: candidate,
                diff: comparison.entries.clone(),
                same: comparison.same,
                cost: comparison.cost,
            });
            if comparison.cost == 0 {
                break;
            }
        }
        Ok(best)
    }
}
