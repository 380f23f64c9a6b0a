use serde::{Deserialize, Serialize};

use crate::error::ColumnError;

/// Characters that would collide with the query-parameter encoding used by
/// the layers above the core.
const RESERVED_NAME_CHARS: &[char] = &['&', '=', ':', ','];

/// Column metadata. `entity_type` is an opaque tag consumed by external
/// collaborators (URL resolution); the core only cares whether it is empty,
/// which gates key-index construction at finalize time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub display_name: String,
    pub entity_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, entity_type: impl Into<String>) -> Result<Self, ColumnError> {
        let name = name.into();
        if name.contains(RESERVED_NAME_CHARS) {
            return Err(ColumnError::InvalidName(name));
        }
        Ok(Self { name, display_name: display_name.into(), entity_type: entity_type.into() })
    }

    /// A def with the display name equal to the name and no entity type.
    pub fn named(name: impl Into<String>) -> Result<Self, ColumnError> {
        let name = name.into();
        Self::new(name.clone(), name, "")
    }

    pub fn is_entity(&self) -> bool { !self.entity_type.is_empty() }
}
