//! Finished inference run
//!
//! Owns the type registry, every instance and document, each instance's base link and
//! the dependency order over the instances that survive collapsing.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::catalogue::{Catalogue, CatalogueDocument, CatalogueType};
use super::config::InferenceConfig;
use super::error::{InferenceError, Result};
use super::instance::{Document, Instance, InstanceId, Value};
use super::merge::TypeRegistry;
use super::path::PathInterner;
use crate::similarity::{BaseLink, BaseMatcher, order_instances};

/// Summary counts of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceStats {
    pub documents: usize,
    pub types: usize,
    pub instances: usize,
    /// Instances identical to their base
    pub collapsed: usize,
    pub retained: usize,
    /// Distinct instance pairs diffed during the base search
    pub comparisons: usize,
}

/// Types, instances and patch links of a finished run
pub struct InferenceResult {
    config: InferenceConfig,
    registry: TypeRegistry,
    paths: PathInterner,
    instances: Vec<Instance>,
    documents: Vec<Document>,
    links: Vec<Option<BaseLink>>,
    canonical: Vec<InstanceId>,
    order: Vec<InstanceId>,
    comparisons: usize,
}

impl InferenceResult {
    pub(crate) fn build(
        config: InferenceConfig,
        registry: TypeRegistry,
        paths: PathInterner,
        instances: Vec<Instance>,
        documents: Vec<Document>,
    ) -> Result<Self> {
        if instances.len() > config.pairwise_warning_threshold {
            warn!(
                "Searching bases for {} instances (threshold {}); pairwise search is quadratic",
                instances.len(),
                config.pairwise_warning_threshold
            );
        }

        let (mut links, comparisons) = {
            let mut matcher = BaseMatcher::new(&registry, &instances);
            let mut links = Vec::with_capacity(instances.len());
            for instance in &instances {
                links.push(matcher.best_base_for(instance.id)?.cloned());
            }
            (links, matcher.comparisons())
        };

        // Bases always precede their instance, so one forward pass resolves chains.
        let mut canonical: Vec<InstanceId> = Vec::with_capacity(instances.len());
        for (index, link) in links.iter().enumerate() {
            let id = match link {
                Some(link) if link.is_empty() => {
                    canonical.get(link.base.index()).copied().ok_or_else(|| {
                        InferenceError::MissingEntry(format!("base {} of #{}", link.base, index))
                    })?
                }
                _ => InstanceId::from_index(index),
            };
            canonical.push(id);
        }

        let to_canonical = |id: InstanceId| canonical.get(id.index()).copied().unwrap_or(id);
        for link in links.iter_mut().flatten() {
            link.base = to_canonical(link.base);
            for entry in &mut link.diff {
                entry.map_objects(&to_canonical);
            }
        }

        let retained: Vec<InstanceId> = canonical
            .iter()
            .enumerate()
            .filter(|(index, id)| id.index() == *index)
            .map(|(_, id)| *id)
            .collect();
        let order = order_instances(&retained, |id| {
            let instance = instances
                .get(id.index())
                .ok_or_else(|| InferenceError::MissingEntry(format!("instance {id}")))?;
            Ok(instance.children().into_iter().map(to_canonical).collect())
        })?;

        info!(
            "Inferred {} types and {} instances from {} documents ({} collapsed)",
            registry.len(),
            instances.len(),
            documents.len(),
            instances.len() - retained.len()
        );

        Ok(Self {
            config,
            registry,
            paths,
            instances,
            documents,
            links,
            canonical,
            order,
            comparisons,
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Type catalogue in registration order
    pub fn types(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Every instance, collapsed ones included, in registration order
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, id: InstanceId) -> Result<&Instance> {
        self.instances
            .get(id.index())
            .ok_or_else(|| InferenceError::MissingEntry(format!("instance {id}")))
    }

    /// Canonical path text of an instance, e.g. `friends[1]`
    pub fn path_of(&self, id: InstanceId) -> Result<&str> {
        Ok(self.paths.resolve(self.instance(id)?.path))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Base link of `id`, if a usable base was found
    pub fn base_link(&self, id: InstanceId) -> Option<&BaseLink> {
        self.links.get(id.index()).and_then(Option::as_ref)
    }

    /// Whether `id` is value-identical to an earlier instance
    pub fn is_collapsed(&self, id: InstanceId) -> bool {
        self.canonical(id) != id
    }

    /// Surviving instance that stands for `id`
    pub fn canonical(&self, id: InstanceId) -> InstanceId {
        self.canonical.get(id.index()).copied().unwrap_or(id)
    }

    /// Instances that survive collapsing, in registration order
    pub fn unique_instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances
            .iter()
            .filter(move |instance| !self.is_collapsed(instance.id))
    }

    /// Surviving instances with every child ahead of its parent
    pub fn ordered(&self) -> &[InstanceId] {
        &self.order
    }

    /// Per document: its key and its root after collapsing
    pub fn document_roots(&self) -> Vec<(&str, InstanceId)> {
        self.documents
            .iter()
            .map(|doc| (doc.key.as_str(), self.canonical(doc.root)))
            .collect()
    }

    /// Rewrite object references in `value` to surviving instances
    pub fn resolve(&self, value: &Value) -> Value {
        value.map_objects(&|id| self.canonical(id))
    }

    /// Surviving children referenced by `id`'s fields
    pub fn children(&self, id: InstanceId) -> Result<Vec<InstanceId>> {
        Ok(self
            .instance(id)?
            .children()
            .into_iter()
            .map(|child| self.canonical(child))
            .collect())
    }

    /// Persistable catalogue reproducing this run's types and path kinds
    pub fn to_catalogue(&self) -> Catalogue {
        Catalogue {
            types: self
                .registry
                .iter()
                .map(|(_, ty)| CatalogueType::from(ty))
                .collect(),
            data_files: self
                .documents
                .iter()
                .map(|doc| CatalogueDocument {
                    file: doc.key.clone(),
                    root_model: Some(doc.root_type.to_string()),
                    field_type_map: doc
                        .field_kinds
                        .iter()
                        .map(|(path, kind)| {
                            (
                                self.paths.resolve(*path).to_string(),
                                kind.kind.label().to_string(),
                            )
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            documents: self.documents.len(),
            types: self.registry.len(),
            instances: self.instances.len(),
            collapsed: self.instances.len() - self.order.len(),
            retained: self.order.len(),
            comparisons: self.comparisons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Inferrer;
    use serde_json::json;

    fn run(docs: &[serde_json::Value]) -> InferenceResult {
        let mut inferrer = Inferrer::new();
        for (i, doc) in docs.iter().enumerate() {
            inferrer.add_document(&format!("doc{i}.json"), doc).unwrap();
        }
        inferrer.finalize().unwrap()
    }

    fn id(index: usize) -> InstanceId {
        InstanceId::from_index(index)
    }

    #[test]
    fn test_identical_documents_collapse() {
        let result = run(&[
            json!({"a": 1, "d": {"m": "x"}}),
            json!({"a": 1, "d": {"m": "x"}}),
        ]);
        // 0 Base, 1 D, 2 Base, 3 D
        assert!(result.is_collapsed(id(2)));
        assert!(result.is_collapsed(id(3)));
        assert_eq!(result.canonical(id(3)), id(1));
        assert_eq!(result.document_roots(), vec![("doc0.json", id(0)), ("doc1.json", id(0))]);
        assert_eq!(result.ordered(), &[id(1), id(0)]);

        let stats = result.stats();
        assert_eq!(stats.instances, 4);
        assert_eq!(stats.collapsed, 2);
        assert_eq!(stats.retained, 2);
    }

    #[test]
    fn test_diff_references_canonical_children() {
        let result = run(&[
            json!({"a": 1, "d": {"m": "x"}}),
            json!({"a": 1, "d": {"m": "y"}}),
            json!({"a": 2, "d": {"m": "y"}}),
        ]);
        // 0 Base, 1 D, 2 Base, 3 D, 4 Base, 5 D (5 collapses onto 3)
        assert_eq!(result.canonical(id(5)), id(3));
        let link = result.base_link(id(4)).unwrap();
        assert_eq!(link.base, id(2));
        assert_eq!(link.diff.len(), 1);
        assert_eq!(link.diff[0].field(), "a");

        assert_eq!(result.children(id(4)).unwrap(), vec![id(3)]);
        let value = result.instance(id(4)).unwrap().get("d").unwrap();
        assert_eq!(result.resolve(value), Value::Object(id(3)));
    }

    #[test]
    fn test_order_is_permutation_of_retained() {
        let result = run(&[
            json!({"friends": [{"n": 1}, {"n": 2}], "device": {"m": "a"}}),
            json!({"friends": [{"n": 2}], "device": {"m": "b"}}),
        ]);
        let unique: Vec<_> = result.unique_instances().map(|i| i.id).collect();
        let mut ordered = result.ordered().to_vec();
        assert_eq!(ordered.len(), unique.len());

        for (position, id) in ordered.iter().enumerate() {
            for child in result.children(*id).unwrap() {
                let child_position = ordered.iter().position(|c| *c == child).unwrap();
                assert!(child_position < position);
            }
        }

        ordered.sort();
        assert_eq!(ordered, unique);
    }

    #[test]
    fn test_path_of() {
        let result = run(&[json!({"friends": [{"n": 1}, {"n": 2}]})]);
        assert_eq!(result.path_of(id(0)).unwrap(), "");
        assert_eq!(result.path_of(id(2)).unwrap(), "friends[1]");
        assert!(result.instance(id(9)).is_err());
    }

    #[test]
    fn test_to_catalogue() {
        let result = run(&[json!({"id": "a", "friends": [{"n": 1}], "device": null})]);
        let catalogue = result.to_catalogue();

        let names: Vec<_> = catalogue.types.iter().map(|t| t.type_name.as_str()).collect();
        assert_eq!(names, vec!["Base", "Friends"]);

        let doc = &catalogue.data_files[0];
        assert_eq!(doc.file, "doc0.json");
        assert_eq!(doc.root_model.as_deref(), Some("Base"));
        let entries: Vec<_> = doc
            .field_type_map
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("id", "String"),
                ("friends", "Friends"),
                ("friends.n", "Int64"),
                ("device", "Unknown")
            ]
        );
        assert!(catalogue.validate().is_ok());
    }
}
