//! Pairwise instance diffing
//!
//! A [`Comparator`] turns a base/target pair of same-typed instances into the patch that
//! rewrites the base into the target. Fields are visited in the type's declaration order:
//!
//! - arrays of different lengths produce one [`DiffEntry::FullArray`] weighing the target
//!   length;
//! - arrays of equal length produce one [`DiffEntry::Element`] per differing position;
//! - a differing child object produces one entry carrying the target child wholesale,
//!   however deep the difference sits;
//! - anything else is compared by value.
//!
//! Every ordered pair is compared at most once per comparator.

use std::collections::HashMap;

use serde::Serialize;

use crate::inference::{Instance, InstanceId, InferenceError, Result, TypeRegistry, Value};

/// One change that patches a base instance towards a target
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiffEntry {
    /// Whole field takes the target value
    Field { field: String, value: Value },
    /// One array position takes the target value
    Element {
        field: String,
        index: usize,
        value: Value,
    },
    /// Array field replaced wholesale (lengths differ)
    FullArray { field: String, values: Vec<Value> },
}

impl DiffEntry {
    /// Name of the patched field
    pub fn field(&self) -> &str {
        match self {
            DiffEntry::Field { field, .. }
            | DiffEntry::Element { field, .. }
            | DiffEntry::FullArray { field, .. } => field,
        }
    }

    /// Cost contributed to a comparison
    pub fn weight(&self) -> usize {
        match self {
            DiffEntry::FullArray { values, .. } => values.len().max(1),
            DiffEntry::Field { .. } | DiffEntry::Element { .. } => 1,
        }
    }

    pub(crate) fn map_objects(&mut self, f: &impl Fn(InstanceId) -> InstanceId) {
        match self {
            DiffEntry::Field { value, .. } | DiffEntry::Element { value, .. } => {
                *value = value.map_objects(f);
            }
            DiffEntry::FullArray { values, .. } => {
                for value in values.iter_mut() {
                    *value = value.map_objects(f);
                }
            }
        }
    }
}

/// Result of comparing two same-typed instances
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    /// Fields (or array positions) equal on both sides
    pub same: usize,
    pub entries: Vec<DiffEntry>,
    /// Sum of entry weights
    pub cost: usize,
}

impl Comparison {
    /// Whether the target is value-identical to the base
    pub fn is_identical(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: DiffEntry) {
        self.cost += entry.weight();
        self.entries.push(entry);
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    /// Instances of different types
    Rejected,
    Compared(Comparison),
}

/// Memoizing pairwise comparator over one instance arena
pub struct Comparator<'a> {
    registry: &'a TypeRegistry,
    instances: &'a [Instance],
    memo: HashMap<(InstanceId, InstanceId), Outcome>,
}

impl<'a> Comparator<'a> {
    pub fn new(registry: &'a TypeRegistry, instances: &'a [Instance]) -> Self {
        Self {
            registry,
            instances,
            memo: HashMap::new(),
        }
    }

    /// Compare `base` against `target`; `None` when their types differ
    pub fn compare(&mut self, base: InstanceId, target: InstanceId) -> Result<Option<&Comparison>> {
        if base == target {
            return Err(InferenceError::SelfComparison(
                self.instance(base)?.name.clone(),
            ));
        }
        self.ensure(base, target)?;
        Ok(match self.memo.get(&(base, target)) {
            Some(Outcome::Compared(comparison)) => Some(comparison),
            Some(Outcome::Rejected) | None => None,
        })
    }

    /// Number of distinct pairs compared so far
    pub fn comparisons(&self) -> usize {
        self.memo.len()
    }

    fn instance(&self, id: InstanceId) -> Result<&'a Instance> {
        let instances = self.instances;
        instances
            .get(id.index())
            .ok_or_else(|| InferenceError::MissingEntry(format!("instance {id}")))
    }

    fn ensure(&mut self, base: InstanceId, target: InstanceId) -> Result<()> {
        if self.memo.contains_key(&(base, target)) {
            return Ok(());
        }
        let outcome = self.diff(base, target)?;
        self.memo.insert((base, target), outcome);
        Ok(())
    }

    fn diff(&mut self, base: InstanceId, target: InstanceId) -> Result<Outcome> {
        let base = self.instance(base)?;
        let target = self.instance(target)?;
        if base.type_id != target.type_id {
            return Ok(Outcome::Rejected);
        }

        let registry = self.registry;
        let ty = registry.get(target.type_id)?;
        let mut comparison = Comparison::default();
        for field in ty.field_names() {
            match (base.get(field), target.get(field)) {
                (None, None) => {}
                (Some(old), Some(new)) => self.diff_field(field, old, new, &mut comparison)?,
                (_, new) => comparison.push(DiffEntry::Field {
                    field: field.to_string(),
                    value: new.cloned().unwrap_or(Value::Null),
                }),
            }
        }
        Ok(Outcome::Compared(comparison))
    }

    fn diff_field(
        &mut self,
        field: &str,
        old: &Value,
        new: &Value,
        comparison: &mut Comparison,
    ) -> Result<()> {
        match (old, new) {
            (Value::Array(old_items), Value::Array(new_items)) => {
                if old_items.len() != new_items.len() {
                    comparison.push(DiffEntry::FullArray {
                        field: field.to_string(),
                        values: new_items.clone(),
                    });
                    return Ok(());
                }
                if new_items.is_empty() {
                    comparison.same += 1;
                }
                for (index, (a, b)) in old_items.iter().zip(new_items).enumerate() {
                    if self.values_equal(a, b)? {
                        comparison.same += 1;
                    } else {
                        comparison.push(DiffEntry::Element {
                            field: field.to_string(),
                            index,
                            value: b.clone(),
                        });
                    }
                }
            }
            _ => {
                if self.values_equal(old, new)? {
                    comparison.same += 1;
                } else {
                    comparison.push(DiffEntry::Field {
                        field: field.to_string(),
                        value: new.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn values_equal(&mut self, a: &Value, b: &Value) -> Result<bool> {
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => {
                if x == y {
                    return Ok(true);
                }
                self.ensure(*x, *y)?;
                Ok(matches!(
                    self.memo.get(&(*x, *y)),
                    Some(Outcome::Compared(c)) if c.is_identical()
                ))
            }
            (Value::Array(xs), Value::Array(ys)) => {
                if xs.len() != ys.len() {
                    return Ok(false);
                }
                for (x, y) in xs.iter().zip(ys) {
                    if !self.values_equal(x, y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(a == b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Inferrer;
    use serde_json::json;

    fn arena(docs: &[serde_json::Value]) -> Inferrer {
        let mut inferrer = Inferrer::new();
        for (i, doc) in docs.iter().enumerate() {
            inferrer.add_document(&format!("doc{i}.json"), doc).unwrap();
        }
        inferrer
    }

    fn id(index: usize) -> InstanceId {
        InstanceId::from_index(index)
    }

    #[test]
    fn test_scalar_difference() {
        let inferrer = arena(&[json!({"a": 1, "b": "x"}), json!({"a": 1, "b": "y"})]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());
        let comparison = comparator.compare(id(0), id(1)).unwrap().unwrap();

        assert_eq!(comparison.same, 1);
        assert_eq!(
            comparison.entries,
            vec![DiffEntry::Field {
                field: "b".to_string(),
                value: Value::Scalar(crate::inference::Scalar::String("y".to_string())),
            }]
        );
        assert_eq!(comparison.cost, 1);
    }

    #[test]
    fn test_length_mismatch_replaces_whole_array() {
        let inferrer = arena(&[json!({"list": [1, 2]}), json!({"list": [7, 8, 9]})]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());
        let comparison = comparator.compare(id(0), id(1)).unwrap().unwrap();

        assert_eq!(comparison.entries.len(), 1);
        assert!(matches!(
            &comparison.entries[0],
            DiffEntry::FullArray { field, values } if field == "list" && values.len() == 3
        ));
        assert_eq!(comparison.cost, 3);
        assert_eq!(comparison.same, 0);
    }

    #[test]
    fn test_equal_length_arrays_diff_per_index() {
        let inferrer = arena(&[json!({"list": [1, 2, 3]}), json!({"list": [1, 5, 6]})]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());
        let comparison = comparator.compare(id(0), id(1)).unwrap().unwrap();

        let indices: Vec<_> = comparison
            .entries
            .iter()
            .map(|entry| match entry {
                DiffEntry::Element { index, .. } => *index,
                other => panic!("Expected element entry, got {other:?}"),
            })
            .collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(comparison.same, 1);
    }

    #[test]
    fn test_nested_difference_counts_once() {
        let inferrer = arena(&[
            json!({"d": {"m": "google", "n": 1}}),
            json!({"d": {"m": "apple", "n": 2}}),
        ]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());

        // instances: 0 Base, 1 D, 2 Base, 3 D
        let parent = comparator.compare(id(0), id(2)).unwrap().unwrap().clone();
        assert_eq!(
            parent.entries,
            vec![DiffEntry::Field {
                field: "d".to_string(),
                value: Value::Object(id(3)),
            }]
        );
        assert_eq!(parent.cost, 1);

        let child = comparator.compare(id(1), id(3)).unwrap().unwrap();
        assert_eq!(child.entries.len(), 2);
    }

    #[test]
    fn test_identical_nested_objects_count_as_same() {
        let inferrer = arena(&[
            json!({"d": {"m": "google"}, "x": 1}),
            json!({"d": {"m": "google"}, "x": 2}),
        ]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());
        let comparison = comparator.compare(id(0), id(2)).unwrap().unwrap();
        assert_eq!(comparison.same, 1);
        assert_eq!(comparison.entries.len(), 1);
        assert_eq!(comparison.entries[0].field(), "x");
    }

    #[test]
    fn test_missing_fields() {
        let inferrer = arena(&[json!({"a": 1}), json!({"b": 2}), json!({"a": 1})]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());

        let comparison = comparator.compare(id(0), id(1)).unwrap().unwrap();
        assert_eq!(
            comparison.entries,
            vec![
                DiffEntry::Field {
                    field: "a".to_string(),
                    value: Value::Null
                },
                DiffEntry::Field {
                    field: "b".to_string(),
                    value: Value::Scalar(crate::inference::Scalar::Number(serde_json::Number::from(2i64))),
                },
            ]
        );

        // b is absent on both sides
        let comparison = comparator.compare(id(0), id(2)).unwrap().unwrap();
        assert!(comparison.is_identical());
        assert_eq!(comparison.same, 1);
    }

    #[test]
    fn test_different_types_rejected() {
        let inferrer = arena(&[json!({"d": {"m": 1}})]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());
        assert!(comparator.compare(id(0), id(1)).unwrap().is_none());
    }

    #[test]
    fn test_self_comparison_is_rejected() {
        let inferrer = arena(&[json!({"a": 1})]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());
        let err = comparator.compare(id(0), id(0)).unwrap_err();
        assert!(matches!(err, InferenceError::SelfComparison(ref name) if name == "DOC0_BASE_1"));
    }

    #[test]
    fn test_pairs_are_memoized() {
        let inferrer = arena(&[json!({"d": {"m": 1}}), json!({"d": {"m": 2}})]);
        let mut comparator = Comparator::new(inferrer.registry(), inferrer.instances());
        comparator.compare(id(0), id(2)).unwrap();
        // parent pair plus the nested child pair
        assert_eq!(comparator.comparisons(), 2);
        comparator.compare(id(1), id(3)).unwrap();
        assert_eq!(comparator.comparisons(), 2);
    }
}
