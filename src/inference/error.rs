//! Error types for type inference and instance diffing

use thiserror::Error;

/// Broad classification of an [`InferenceError`]
///
/// `InvalidArgument` errors point at a bug in the engine, not at bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed type catalogue
    Validation,
    /// Internal contract violation
    InvalidArgument,
    /// Malformed input document
    Data,
}

/// Errors that can occur while building or comparing instances
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Two catalogue types share a name
    #[error("Duplicate type name in catalogue: {0}")]
    DuplicateType(String),

    /// Two documents share a key
    #[error("Duplicate document: {0}")]
    DuplicateDocument(String),

    /// Two document keys reduce to the same instance name prefix
    #[error("Document {document} would name instances {prefix}_*, already used by {existing}")]
    DuplicateNamePrefix {
        document: String,
        existing: String,
        prefix: String,
    },

    /// Object field referencing a type the catalogue does not declare
    #[error("Type {type_name} field {field} references undeclared type {object_name}")]
    UndeclaredObjectType {
        type_name: String,
        field: String,
        object_name: String,
    },

    /// Object field declared without a nested type name
    #[error("Type {type_name} field {field} is an object but has no objectName")]
    MissingObjectName { type_name: String, field: String },

    /// Catalogue text could not be parsed
    #[error("Catalogue parsing error: {0}")]
    CatalogueParse(String),

    /// Lookup miss on an entry that must exist
    #[error("Missing entry: {0}")]
    MissingEntry(String),

    /// An instance was compared against itself
    #[error("Instance {0} compared with itself")]
    SelfComparison(String),

    /// Ordering pass lost or duplicated instances
    #[error("Ordering produced {actual} instances, expected {expected}")]
    OrderingMismatch { expected: usize, actual: usize },

    /// Null where an object is required
    #[error("Null value where an object is required: {document} at '{path}'")]
    NullObject { document: String, path: String },

    /// Non-object where an object is required
    #[error("Expected object in {document} at '{path}', found {found}")]
    NotAnObject {
        document: String,
        path: String,
        found: &'static str,
    },

    /// Field value requested that was never recorded for the instance
    #[error("Field {field} was never recorded for instance {instance}")]
    FieldNotRecorded { instance: String, field: String },

    /// Maximum depth exceeded
    #[error("Maximum nesting depth {max} exceeded in {document} at '{path}'")]
    MaxDepthExceeded {
        document: String,
        path: String,
        max: usize,
    },

    /// JSON parsing error
    #[error("JSON parsing error in {document}: {message}")]
    JsonParse { document: String, message: String },
}

impl InferenceError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::DuplicateType(_)
            | InferenceError::DuplicateDocument(_)
            | InferenceError::DuplicateNamePrefix { .. }
            | InferenceError::UndeclaredObjectType { .. }
            | InferenceError::MissingObjectName { .. }
            | InferenceError::CatalogueParse(_) => ErrorKind::Validation,
            InferenceError::MissingEntry(_)
            | InferenceError::SelfComparison(_)
            | InferenceError::OrderingMismatch { .. } => ErrorKind::InvalidArgument,
            InferenceError::NullObject { .. }
            | InferenceError::NotAnObject { .. }
            | InferenceError::FieldNotRecorded { .. }
            | InferenceError::MaxDepthExceeded { .. }
            | InferenceError::JsonParse { .. } => ErrorKind::Data,
        }
    }
}

impl From<serde_yaml::Error> for InferenceError {
    fn from(e: serde_yaml::Error) -> Self {
        InferenceError::CatalogueParse(e.to_string())
    }
}

/// Result type for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InferenceError::NullObject {
            document: "test01.json".to_string(),
            path: "device.android".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("test01.json"));
        assert!(msg.contains("device.android"));

        let err = InferenceError::UndeclaredObjectType {
            type_name: "Base".to_string(),
            field: "device".to_string(),
            object_name: "Device".to_string(),
        };
        assert!(err.to_string().contains("undeclared type Device"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            InferenceError::DuplicateType("Base".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            InferenceError::OrderingMismatch {
                expected: 3,
                actual: 2
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            InferenceError::FieldNotRecorded {
                instance: "TEST01_BASE_1".into(),
                field: "age".into()
            }
            .kind(),
            ErrorKind::Data
        );
    }
}
