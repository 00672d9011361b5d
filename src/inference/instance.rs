//! Concrete instances and documents
//!
//! Instances live in one arena owned by the run and reference each other by
//! [`InstanceId`]; a child is always registered after its parent.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::error::{InferenceError, Result};
use super::merge::TypeId;
use super::path::PathId;
use super::types::{FieldKind, TypeName};

/// Position of an instance in the arena (registration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u32);

impl InstanceId {
    pub(crate) fn from_index(index: usize) -> Self {
        InstanceId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a document in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(usize);

impl DocumentId {
    pub(crate) fn from_index(index: usize) -> Self {
        DocumentId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Scalar field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

/// Field value of an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    /// Explicitly unset or unknown
    Null,
    Scalar(Scalar),
    /// Reference to a child instance
    Object(InstanceId),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<InstanceId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Child instances referenced by this value, in order
    pub fn children(&self) -> Vec<InstanceId> {
        let mut out = Vec::new();
        self.collect_children(&mut out);
        out
    }

    fn collect_children(&self, out: &mut Vec<InstanceId>) {
        match self {
            Value::Object(id) => out.push(*id),
            Value::Array(items) => {
                for item in items {
                    item.collect_children(out);
                }
            }
            Value::Null | Value::Scalar(_) => {}
        }
    }

    /// Copy of this value with every object reference passed through `f`
    pub fn map_objects(&self, f: &impl Fn(InstanceId) -> InstanceId) -> Value {
        match self {
            Value::Object(id) => Value::Object(f(*id)),
            Value::Array(items) => Value::Array(items.iter().map(|v| v.map_objects(f)).collect()),
            other => other.clone(),
        }
    }
}

/// One concrete realization of a structural type
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: InstanceId,
    /// Identifier of the form `DOCUMENT_TYPE_N`
    pub name: String,
    pub type_id: TypeId,
    pub document: DocumentId,
    /// Canonical path, array indices included
    pub path: PathId,
    fields: IndexMap<String, Value>,
}

impl Instance {
    pub(crate) fn new(
        id: InstanceId,
        name: String,
        type_id: TypeId,
        document: DocumentId,
        path: PathId,
    ) -> Self {
        Self {
            id,
            name,
            type_id,
            document,
            path,
            fields: IndexMap::new(),
        }
    }

    pub(crate) fn set_fields(&mut self, fields: IndexMap<String, Value>) {
        self.fields = fields;
    }

    /// Value recorded for `field`
    pub fn value(&self, field: &str) -> Result<&Value> {
        self.fields
            .get(field)
            .ok_or_else(|| InferenceError::FieldNotRecorded {
                instance: self.name.clone(),
                field: field.to_string(),
            })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn has_value(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Recorded fields in document order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Child instances referenced by any field
    pub fn children(&self) -> Vec<InstanceId> {
        self.fields.values().flat_map(Value::children).collect()
    }
}

/// One parsed input document
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    /// Identifier supplied by the caller, usually the file name
    pub key: String,
    pub root_type: TypeName,
    pub root: InstanceId,
    /// Index-stripped path → kind observed in this document
    pub field_kinds: IndexMap<PathId, FieldKind>,
}

impl Document {
    /// Upper-cased file stem used as instance name prefix
    pub fn name_prefix(key: &str) -> String {
        let file = key.rsplit(['/', '\\']).next().unwrap_or(key);
        let stem = match file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file,
        };
        stem.chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}
