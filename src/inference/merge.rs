//! Type registry and shape merging
//!
//! Every observed object shape is merged into the registry entry of its type name. An
//! entry is created once and then only extended in place, so a [`TypeId`] handed out
//! early stays valid and keeps describing the same type for the rest of the run.

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::{debug, warn};

use super::error::{InferenceError, Result};
use super::types::{StructuralType, TypeName};

/// Stable handle to a registered type (its registration position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    pub(crate) fn from_index(index: usize) -> Self {
        TypeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// All structural types of one inference run, in registration order
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<TypeName, StructuralType>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-seeded with declared types
    pub fn seeded(declared: Vec<StructuralType>) -> Result<Self> {
        let mut registry = Self::new();
        for ty in declared {
            match registry.types.entry(ty.name.clone()) {
                Entry::Occupied(_) => {
                    return Err(InferenceError::DuplicateType(ty.name.to_string()));
                }
                Entry::Vacant(slot) => {
                    slot.insert(ty);
                }
            }
        }
        Ok(registry)
    }

    /// Get or create the entry for `name`
    pub fn ensure(&mut self, name: TypeName) -> TypeId {
        let entry = self.types.entry(name);
        let index = entry.index();
        if let Entry::Vacant(slot) = entry {
            let ty = StructuralType::new(slot.key().clone());
            slot.insert(ty);
        }
        TypeId(index)
    }

    /// Merge an observed shape into its registered type, creating the entry if absent.
    ///
    /// Fields are unioned by name; a conflicting kind keeps the first-seen kind.
    pub fn merge(&mut self, observed: &StructuralType) -> TypeId {
        let id = self.ensure(observed.name.clone());
        let Some((_, existing)) = self.types.get_index_mut(id.0) else {
            return id;
        };
        if existing.compare(observed) && existing.fields().eq(observed.fields()) {
            return id;
        }
        let report = existing.merge_from(observed);
        if !report.is_unchanged() {
            debug!(
                "Extended type {} with fields [{}]",
                existing.name,
                report.added.join(", ")
            );
        }
        for field in &report.conflicts {
            warn!(
                "Conflicting kinds for {}.{}; keeping the first-seen kind",
                existing.name, field
            );
        }
        id
    }

    /// Look up a registered type
    pub fn get(&self, id: TypeId) -> Result<&StructuralType> {
        self.types
            .get_index(id.0)
            .map(|(_, ty)| ty)
            .ok_or_else(|| InferenceError::MissingEntry(format!("type #{}", id.0)))
    }

    pub fn id_of(&self, name: &TypeName) -> Option<TypeId> {
        self.types.get_index_of(name).map(TypeId)
    }

    pub fn by_name(&self, name: &TypeName) -> Option<&StructuralType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }

    /// Types in registration order
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &StructuralType)> {
        self.types
            .values()
            .enumerate()
            .map(|(index, ty)| (TypeId(index), ty))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
