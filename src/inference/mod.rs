//! Structural type inference for JSON documents
//!
//! This module builds a structural type system and an instance arena from sample JSON
//! documents, then hands the arena to [`crate::similarity`] to express every instance as
//! a patch against an earlier one.
//!
//! ## Features
//!
//! - **Type inference** - One named type per object shape, named after its field
//! - **Type merging** - Fields seen in any sample are unioned into the type
//! - **Catalogue overrides** - Persisted YAML catalogue pre-seeds types and path kinds
//! - **Instance naming** - Stable `DOCUMENT_TYPE_N` identifiers for every instance
//!
//! ## Example
//!
//! ```rust,ignore
//! use datatrait::inference::Inferrer;
//!
//! let mut inferrer = Inferrer::new();
//! inferrer.add_json("test01.json", r#"{"id": 1, "device": {"model": "pixel"}}"#)?;
//! inferrer.add_json("test02.json", r#"{"id": 2, "device": {"model": "pixel"}}"#)?;
//!
//! let result = inferrer.finalize()?;
//! for id in result.ordered() {
//!     println!("{}", result.instance(*id)?.name);
//! }
//! println!("{}", result.to_catalogue().to_yaml_string()?);
//! ```

mod catalogue;
mod config;
mod error;
mod inferrer;
mod instance;
mod merge;
mod path;
mod result;
mod types;

pub use catalogue::{Catalogue, CatalogueDocument, CatalogueField, CatalogueType, SystemType};
pub use config::{DEFAULT_ROOT_TYPE, InferenceConfig, InferenceConfigBuilder};
pub use error::{ErrorKind, InferenceError, Result};
pub use inferrer::Inferrer;
pub use instance::{Document, DocumentId, Instance, InstanceId, Scalar, Value};
pub use merge::{TypeId, TypeRegistry};
pub use path::{PathId, PathInterner};
pub use result::{InferenceResult, InferenceStats};
pub use types::{FieldKind, Kind, MergeReport, StructuralType, TypeName};
