//! Instance builder
//!
//! Walks each document, creates one instance per object (array elements included),
//! binds it to an inferred or overridden type and feeds the observed shape back into the
//! registry. Documents are added one at a time; [`Inferrer::finalize`] runs the
//! similarity search and ordering pass over everything collected.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::catalogue::Catalogue;
use super::config::InferenceConfig;
use super::error::{InferenceError, Result};
use super::instance::{Document, DocumentId, Instance, InstanceId, Scalar, Value};
use super::merge::{TypeId, TypeRegistry};
use super::path::{PathId, PathInterner};
use super::result::InferenceResult;
use super::types::{FieldKind, Kind, StructuralType, TypeName};

/// Per-document build state
struct DocumentContext {
    id: DocumentId,
    key: String,
    prefix: String,
    root_type: TypeName,
    field_kinds: IndexMap<PathId, FieldKind>,
}

/// Builds instances and structural types from JSON documents
pub struct Inferrer {
    config: InferenceConfig,
    catalogue: Option<Catalogue>,
    registry: TypeRegistry,
    paths: PathInterner,
    instances: Vec<Instance>,
    documents: Vec<Document>,
    /// Next 1-based name counter per (document, type)
    counters: HashMap<(DocumentId, TypeId), usize>,
}

impl Inferrer {
    /// Create a new inferrer with default configuration
    pub fn new() -> Self {
        Self::with_config(InferenceConfig::default())
    }

    /// Create a new inferrer with custom configuration
    pub fn with_config(config: InferenceConfig) -> Self {
        Self {
            config,
            catalogue: None,
            registry: TypeRegistry::new(),
            paths: PathInterner::new(),
            instances: Vec::new(),
            documents: Vec::new(),
            counters: HashMap::new(),
        }
    }

    /// Create an inferrer seeded from a persisted catalogue
    ///
    /// Declared types are registered in catalogue order and the per-document path tables
    /// override natural inference.
    pub fn with_catalogue(config: InferenceConfig, catalogue: Catalogue) -> Result<Self> {
        catalogue.validate()?;
        let registry = TypeRegistry::seeded(catalogue.structural_types()?)?;
        debug!(
            "Seeded {} types from catalogue ({} document tables)",
            registry.len(),
            catalogue.data_files.len()
        );
        Ok(Self {
            catalogue: Some(catalogue),
            registry,
            ..Self::with_config(config)
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Types registered so far
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Instances built so far, in registration order
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Parse and add a JSON document
    pub fn add_json(&mut self, key: &str, json: &str) -> Result<DocumentId> {
        let value: JsonValue =
            serde_json::from_str(json).map_err(|e| InferenceError::JsonParse {
                document: key.to_string(),
                message: e.to_string(),
            })?;
        self.add_document(key, &value)
    }

    /// Add a parsed document with the default (or catalogue-declared) root type
    pub fn add_document(&mut self, key: &str, value: &JsonValue) -> Result<DocumentId> {
        self.add_document_as(key, value, None)
    }

    /// Add a parsed document with an explicit root type.
    ///
    /// A document that fails to build leaves the inferrer unchanged.
    pub fn add_document_as(
        &mut self,
        key: &str,
        value: &JsonValue,
        root_type: Option<&str>,
    ) -> Result<DocumentId> {
        if self.documents.iter().any(|doc| doc.key == key) {
            return Err(InferenceError::DuplicateDocument(key.to_string()));
        }
        let prefix = Document::name_prefix(key);
        if let Some(existing) = self
            .documents
            .iter()
            .find(|doc| Document::name_prefix(&doc.key) == prefix)
        {
            return Err(InferenceError::DuplicateNamePrefix {
                document: key.to_string(),
                existing: existing.key.clone(),
                prefix,
            });
        }
        let JsonValue::Object(root) = value else {
            return Err(InferenceError::NotAnObject {
                document: key.to_string(),
                path: self.paths.display(self.paths.root()).to_string(),
                found: json_type_name(value),
            });
        };

        let declared = self
            .catalogue
            .as_ref()
            .and_then(|catalogue| catalogue.document(key))
            .and_then(|doc| doc.root_model.as_deref());
        let root_type = TypeName::new(
            root_type
                .or(declared)
                .unwrap_or(self.config.root_type_name.as_str()),
        );

        let id = DocumentId::from_index(self.documents.len());
        let mut ctx = DocumentContext {
            id,
            key: key.to_string(),
            prefix,
            root_type,
            field_kinds: IndexMap::new(),
        };
        debug!("Building document {} as {}", key, ctx.root_type);

        let snapshot = self.registry.clone();
        let first_instance = self.instances.len();
        let root_path = self.paths.root();
        let root = match self.build_object(&mut ctx, root, root_path, 0) {
            Ok(root) => root,
            Err(e) => {
                self.registry = snapshot;
                self.instances.truncate(first_instance);
                self.counters.retain(|(doc, _), _| *doc != id);
                return Err(e);
            }
        };

        debug!(
            "Document {} produced {} instances",
            key,
            self.instances.len() - first_instance
        );
        self.documents.push(Document {
            id,
            key: ctx.key,
            root_type: ctx.root_type,
            root,
            field_kinds: ctx.field_kinds,
        });
        Ok(id)
    }

    /// Run the similarity search and ordering pass over all added documents
    pub fn finalize(self) -> Result<InferenceResult> {
        InferenceResult::build(
            self.config,
            self.registry,
            self.paths,
            self.instances,
            self.documents,
        )
    }

    fn build_object(
        &mut self,
        ctx: &mut DocumentContext,
        object: &Map<String, JsonValue>,
        path: PathId,
        depth: usize,
    ) -> Result<InstanceId> {
        if depth > self.config.max_depth {
            return Err(InferenceError::MaxDepthExceeded {
                document: ctx.key.clone(),
                path: self.paths.display(path).to_string(),
                max: self.config.max_depth,
            });
        }

        let type_name = self.resolve_type_name(ctx, path);
        let type_id = self.registry.ensure(type_name.clone());
        let id = InstanceId::from_index(self.instances.len());
        let name = self.next_name(ctx, type_id, &type_name);
        self.instances
            .push(Instance::new(id, name, type_id, ctx.id, path));

        let mut observed = StructuralType::new(type_name);
        let mut fields = IndexMap::with_capacity(object.len());
        for (key, raw) in object {
            let field_path = self.paths.field(path, key);
            let kind = self.field_kind(ctx, type_id, key, field_path, raw)?;
            let value = self.build_value(ctx, raw, field_path, &kind, depth)?;
            observed.add_field(key.clone(), kind);
            fields.insert(key.clone(), value);
        }
        self.registry.merge(&observed);

        let instance = self
            .instances
            .get_mut(id.index())
            .ok_or_else(|| InferenceError::MissingEntry(format!("instance {id}")))?;
        instance.set_fields(fields);
        Ok(id)
    }

    fn build_value(
        &mut self,
        ctx: &mut DocumentContext,
        raw: &JsonValue,
        path: PathId,
        kind: &FieldKind,
        depth: usize,
    ) -> Result<Value> {
        Ok(match raw {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Scalar(Scalar::Bool(*b)),
            JsonValue::Number(n) => Value::Scalar(Scalar::Number(n.clone())),
            JsonValue::String(s) => Value::Scalar(Scalar::String(s.clone())),
            JsonValue::Object(object) => {
                Value::Object(self.build_object(ctx, object, path, depth + 1)?)
            }
            JsonValue::Array(items) => {
                let requires_object =
                    kind.kind.object_name().is_some() || items.iter().any(JsonValue::is_object);
                let nested = FieldKind::new(Kind::Unknown, true);
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_path = self.paths.index(path, index);
                    if requires_object && item.is_null() {
                        return Err(InferenceError::NullObject {
                            document: ctx.key.clone(),
                            path: self.paths.display(item_path).to_string(),
                        });
                    }
                    values.push(self.build_value(ctx, item, item_path, &nested, depth)?);
                }
                Value::Array(values)
            }
        })
    }

    /// Kind of `key` at `path`, consulting the catalogue before natural classification
    fn field_kind(
        &mut self,
        ctx: &mut DocumentContext,
        type_id: TypeId,
        key: &str,
        path: PathId,
        raw: &JsonValue,
    ) -> Result<FieldKind> {
        let stripped = self.paths.strip_indices(path);
        let kind = match self.override_kind(ctx, stripped) {
            Some(kind) => {
                let is_array = match raw {
                    JsonValue::Null => self
                        .registry
                        .get(type_id)?
                        .field(key)
                        .is_some_and(|existing| existing.is_array),
                    other => other.is_array(),
                };
                FieldKind::new(kind, is_array)
            }
            None => FieldKind::classify(key, raw),
        };
        ctx.field_kinds
            .entry(stripped)
            .or_insert_with(|| kind.clone());
        Ok(kind)
    }

    fn resolve_type_name(&mut self, ctx: &DocumentContext, path: PathId) -> TypeName {
        if self.paths.is_root(path) {
            return ctx.root_type.clone();
        }
        let stripped = self.paths.strip_indices(path);
        if let Some(Kind::Object(name)) = self.override_kind(ctx, stripped) {
            return name;
        }
        match self.paths.last_field(path) {
            Some(field) => TypeName::new(field),
            None => ctx.root_type.clone(),
        }
    }

    fn override_kind(&self, ctx: &DocumentContext, stripped: PathId) -> Option<Kind> {
        self.catalogue
            .as_ref()?
            .override_for(&ctx.key, self.paths.resolve(stripped))
            .map(Kind::from_label)
    }

    fn next_name(&mut self, ctx: &DocumentContext, type_id: TypeId, type_name: &TypeName) -> String {
        let counter = self.counters.entry((ctx.id, type_id)).or_insert(0);
        *counter += 1;
        format!("{}_{}_{}", ctx.prefix, type_name.screaming_snake(), counter)
    }
}

impl Default for Inferrer {
    fn default() -> Self {
        Self::new()
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
