//! Datatrait - structural type inference and base-plus-patch instance diffing
//!
//! Provides:
//! - Type inference and merging across sample JSON documents
//! - A persisted YAML type catalogue with per-document path overrides
//! - Per-instance best-base selection with field-level patches
//! - Dependency ordering of the deduplicated instances for code emitters

pub mod inference;
pub mod similarity;

// Re-export commonly used types
pub use inference::{
    Catalogue, InferenceConfig, InferenceError, InferenceResult, InferenceStats, Inferrer,
    Instance, InstanceId, StructuralType, TypeName, Value,
};
pub use similarity::{BaseLink, DiffEntry};
