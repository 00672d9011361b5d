//! Persisted type catalogue
//!
//! A catalogue declares named types with explicit fields and, per document, a table
//! mapping index-stripped paths to type labels. Loading one pre-seeds the registry and
//! lets the labels override natural inference:
//!
//! ```yaml
//! types:
//!   - typeName: Device
//!     fields:
//!       - { fieldName: android, systemType: Object, objectName: Phone, isArray: false }
//! dataFiles:
//!   - file: test01.json
//!     rootModel: Base
//!     fieldTypeMap: { device.android: Phone }
//! ```

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::{InferenceError, Result};
use super::types::{FieldKind, Kind, StructuralType, TypeName};

/// Declared kind of a catalogue field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemType {
    Int64,
    String,
    Bool,
    Object,
    Unknown,
}

/// One declared field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueField {
    pub field_name: String,
    pub system_type: SystemType,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub is_array: bool,
}

impl CatalogueField {
    pub fn from_field_kind(field_name: &str, kind: &FieldKind) -> Self {
        let (system_type, object_name) = match &kind.kind {
            Kind::Bool => (SystemType::Bool, None),
            Kind::Integer => (SystemType::Int64, None),
            Kind::String => (SystemType::String, None),
            Kind::Unknown => (SystemType::Unknown, None),
            Kind::Object(name) => (SystemType::Object, Some(name.to_string())),
        };
        Self {
            field_name: field_name.to_string(),
            system_type,
            object_name,
            is_array: kind.is_array,
        }
    }

    fn to_field_kind(&self, type_name: &str) -> Result<FieldKind> {
        let kind = match self.system_type {
            SystemType::Int64 => Kind::Integer,
            SystemType::String => Kind::String,
            SystemType::Bool => Kind::Bool,
            SystemType::Unknown => Kind::Unknown,
            SystemType::Object => match self.object_name.as_deref() {
                Some(name) => Kind::Object(TypeName::new(name)),
                None => {
                    return Err(InferenceError::MissingObjectName {
                        type_name: type_name.to_string(),
                        field: self.field_name.clone(),
                    });
                }
            },
        };
        Ok(FieldKind::new(kind, self.is_array))
    }
}

/// One declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueType {
    pub type_name: String,
    #[serde(default)]
    pub fields: Vec<CatalogueField>,
}

impl From<&StructuralType> for CatalogueType {
    fn from(ty: &StructuralType) -> Self {
        Self {
            type_name: ty.name.to_string(),
            fields: ty
                .fields()
                .map(|(name, kind)| CatalogueField::from_field_kind(name, kind))
                .collect(),
        }
    }
}

/// Per-document override table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueDocument {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_model: Option<String>,
    #[serde(default)]
    pub field_type_map: IndexMap<String, String>,
}

/// Persisted catalogue of types and per-document path overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogue {
    #[serde(default)]
    pub types: Vec<CatalogueType>,
    #[serde(default)]
    pub data_files: Vec<CatalogueDocument>,
}

impl Catalogue {
    /// Parse and validate a YAML catalogue
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let catalogue: Catalogue = serde_yaml::from_str(text)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Parse and validate a JSON catalogue
    pub fn from_json_str(text: &str) -> Result<Self> {
        let catalogue: Catalogue = serde_json::from_str(text)
            .map_err(|e| InferenceError::CatalogueParse(e.to_string()))?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| InferenceError::CatalogueParse(e.to_string()))
    }

    /// Check names are unique and every object reference resolves to a declared type
    pub fn validate(&self) -> Result<()> {
        let mut declared = HashSet::new();
        for ty in &self.types {
            if !declared.insert(TypeName::new(&ty.type_name)) {
                return Err(InferenceError::DuplicateType(ty.type_name.clone()));
            }
        }

        for ty in &self.types {
            for field in &ty.fields {
                let kind = field.to_field_kind(&ty.type_name)?;
                if let Kind::Object(name) = &kind.kind {
                    if !declared.contains(name) {
                        return Err(InferenceError::UndeclaredObjectType {
                            type_name: ty.type_name.clone(),
                            field: field.field_name.clone(),
                            object_name: name.to_string(),
                        });
                    }
                }
            }
        }

        let mut files = HashSet::new();
        for doc in &self.data_files {
            if !files.insert(doc.file.as_str()) {
                return Err(InferenceError::DuplicateDocument(doc.file.clone()));
            }
            for (path, label) in &doc.field_type_map {
                if let Kind::Object(name) = Kind::from_label(label) {
                    if !declared.contains(&name) {
                        return Err(InferenceError::UndeclaredObjectType {
                            type_name: doc.file.clone(),
                            field: path.clone(),
                            object_name: name.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Declared types in catalogue order
    pub fn structural_types(&self) -> Result<Vec<StructuralType>> {
        self.types
            .iter()
            .map(|ty| -> Result<StructuralType> {
                let mut out = StructuralType::new(TypeName::new(&ty.type_name));
                for field in &ty.fields {
                    out.add_field(field.field_name.clone(), field.to_field_kind(&ty.type_name)?);
                }
                Ok(out)
            })
            .collect()
    }

    pub fn document(&self, file: &str) -> Option<&CatalogueDocument> {
        self.data_files.iter().find(|doc| doc.file == file)
    }

    /// Type label for `path` in `document`.
    ///
    /// Falls back to the first other document (catalogue order) that has an entry for
    /// the path.
    pub fn override_for(&self, document: &str, path: &str) -> Option<&str> {
        if let Some(label) = self
            .document(document)
            .and_then(|doc| doc.field_type_map.get(path))
        {
            return Some(label.as_str());
        }
        self.data_files
            .iter()
            .filter(|doc| doc.file != document)
            .find_map(|doc| doc.field_type_map.get(path))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
types:
  - typeName: Base
    fields:
      - { fieldName: id, systemType: String, isArray: false }
      - { fieldName: device, systemType: Object, objectName: Device, isArray: false }
  - typeName: Device
    fields:
      - { fieldName: model, systemType: String }
dataFiles:
  - file: a.json
    rootModel: Base
    fieldTypeMap:
      id: String
      device: Device
  - file: b.json
    fieldTypeMap:
      device.model: String
      extra: Int64
"#;

    #[test]
    fn test_load_yaml() {
        let catalogue = Catalogue::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(catalogue.types.len(), 2);
        assert_eq!(catalogue.data_files.len(), 2);
        assert_eq!(
            catalogue.document("a.json").unwrap().root_model.as_deref(),
            Some("Base")
        );

        let types = catalogue.structural_types().unwrap();
        assert_eq!(types[0].name.as_str(), "Base");
        assert_eq!(
            types[0].field("device").unwrap().kind,
            Kind::Object(TypeName::new("Device"))
        );
    }

    #[test]
    fn test_undeclared_object_type() {
        let text = r#"
types:
  - typeName: Base
    fields:
      - { fieldName: device, systemType: Object, objectName: Gadget }
"#;
        let err = Catalogue::from_yaml_str(text).unwrap_err();
        match err {
            InferenceError::UndeclaredObjectType {
                type_name,
                field,
                object_name,
            } => {
                assert_eq!(type_name, "Base");
                assert_eq!(field, "device");
                assert_eq!(object_name, "Gadget");
            }
            other => panic!("Expected UndeclaredObjectType, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_object_name() {
        let text = r#"
types:
  - typeName: Base
    fields:
      - { fieldName: device, systemType: Object }
"#;
        assert!(matches!(
            Catalogue::from_yaml_str(text),
            Err(InferenceError::MissingObjectName { .. })
        ));
    }

    #[test]
    fn test_duplicate_type_names() {
        let text = r#"
types:
  - typeName: hair_style
  - typeName: HairStyle
"#;
        assert!(matches!(
            Catalogue::from_yaml_str(text),
            Err(InferenceError::DuplicateType(_))
        ));
    }

    #[test]
    fn test_override_label_must_be_declared() {
        let text = r#"
dataFiles:
  - file: a.json
    fieldTypeMap: { device: Device }
"#;
        assert!(matches!(
            Catalogue::from_yaml_str(text),
            Err(InferenceError::UndeclaredObjectType { .. })
        ));
    }

    #[test]
    fn test_override_fallback_across_documents() {
        let catalogue = Catalogue::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(catalogue.override_for("a.json", "device"), Some("Device"));
        // a.json has no entry for device.model; b.json supplies it
        assert_eq!(catalogue.override_for("a.json", "device.model"), Some("String"));
        // unknown documents still see every table
        assert_eq!(catalogue.override_for("c.json", "extra"), Some("Int64"));
        assert_eq!(catalogue.override_for("a.json", "missing"), None);
    }

    #[test]
    fn test_yaml_round_trip() {
        let catalogue = Catalogue::from_yaml_str(SAMPLE).unwrap();
        let text = catalogue.to_yaml_string().unwrap();
        let reloaded = Catalogue::from_yaml_str(&text).unwrap();
        assert_eq!(catalogue, reloaded);
    }

    #[test]
    fn test_parse_error() {
        let err = Catalogue::from_yaml_str("types: [").unwrap_err();
        assert!(matches!(err, InferenceError::CatalogueParse(_)));
    }
}
