//! Structural types inferred from JSON values

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Normalized (PascalCase) type identifier
///
/// `hair_style` and `HairStyle` name the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Normalize a raw field or declared name
    pub fn new(raw: &str) -> Self {
        let name = raw
            .split('_')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<String>();
        TypeName(name)
    }

    /// The normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SCREAMING_SNAKE rendering, used for instance identifiers
    pub fn screaming_snake(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 4);
        for (i, c) in self.0.chars().enumerate() {
            if c.is_uppercase() && i > 0 {
                out.push('_');
            }
            out.extend(c.to_uppercase());
        }
        out
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of a field value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Kind {
    Bool,
    /// Any JSON number
    Integer,
    String,
    /// Null or empty array: nothing to infer from
    Unknown,
    Object(TypeName),
}

impl Kind {
    /// Catalogue label: the scalar system type name or the object type name
    pub fn label(&self) -> &str {
        match self {
            Kind::Bool => "Bool",
            Kind::Integer => "Int64",
            Kind::String => "String",
            Kind::Unknown => "Unknown",
            Kind::Object(name) => name.as_str(),
        }
    }

    /// Inverse of [`Kind::label`]; any non-scalar label names an object type
    pub fn from_label(label: &str) -> Self {
        match label {
            "Bool" => Kind::Bool,
            "Int64" => Kind::Integer,
            "String" => Kind::String,
            "Unknown" => Kind::Unknown,
            other => Kind::Object(TypeName::new(other)),
        }
    }

    /// Whether this is a primitive (Bool, Integer, String) kind
    pub fn is_primitive(&self) -> bool {
        matches!(self, Kind::Bool | Kind::Integer | Kind::String)
    }

    /// Nested type name for object kinds
    pub fn object_name(&self) -> Option<&TypeName> {
        match self {
            Kind::Object(name) => Some(name),
            _ => None,
        }
    }
}

/// Kind of a field plus its array flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldKind {
    pub kind: Kind,
    pub is_array: bool,
}

impl FieldKind {
    pub fn new(kind: Kind, is_array: bool) -> Self {
        Self { kind, is_array }
    }

    pub fn scalar(kind: Kind) -> Self {
        Self::new(kind, false)
    }

    /// Classify a JSON value found under `field_name`
    ///
    /// Arrays take the kind of their first element; an empty array is Unknown.
    pub fn classify(field_name: &str, value: &JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => match items.first() {
                Some(first) => FieldKind::new(classify_single(field_name, first), true),
                None => FieldKind::new(Kind::Unknown, true),
            },
            other => FieldKind::scalar(classify_single(field_name, other)),
        }
    }
}

fn classify_single(field_name: &str, value: &JsonValue) -> Kind {
    match value {
        JsonValue::Null => Kind::Unknown,
        JsonValue::Bool(_) => Kind::Bool,
        JsonValue::Number(_) => Kind::Integer,
        JsonValue::String(_) => Kind::String,
        JsonValue::Object(_) => Kind::Object(TypeName::new(field_name)),
        // Nested arrays carry no element type of their own.
        JsonValue::Array(_) => Kind::Unknown,
    }
}

/// Outcome of merging one observed shape into a registered type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeReport {
    /// Fields added to the existing type
    pub added: Vec<String>,
    /// Fields whose incoming kind disagreed with the kept one
    pub conflicts: Vec<String>,
}

impl MergeReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty()
    }
}

/// Named structural type: an ordered, name-unique field list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralType {
    pub name: TypeName,
    fields: IndexMap<String, FieldKind>,
}

impl StructuralType {
    /// Create a type with no fields
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            fields: IndexMap::new(),
        }
    }

    /// Add a field; an existing field keeps its first kind.
    ///
    /// Returns whether the field was new.
    pub fn add_field(&mut self, name: impl Into<String>, kind: FieldKind) -> bool {
        match self.fields.entry(name.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(kind);
                true
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldKind> {
        self.fields.get(name)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), kind))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Union `incoming` into this type in place.
    ///
    /// Fields missing here are appended; conflicting kinds keep the first-seen kind and are
    /// reported.
    pub fn merge_from(&mut self, incoming: &StructuralType) -> MergeReport {
        let mut report = MergeReport::default();
        for (name, kind) in &incoming.fields {
            if let Some(existing) = self.fields.get(name) {
                if existing != kind {
                    report.conflicts.push(name.clone());
                }
                continue;
            }
            self.fields.insert(name.clone(), kind.clone());
            report.added.push(name.clone());
        }
        report
    }

    /// Structural equality: same name, same field count, every field name present in both.
    ///
    /// Field kinds are not compared.
    pub fn compare(&self, other: &StructuralType) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self.fields.keys().all(|name| other.fields.contains_key(name))
    }
}
