use std::collections::HashMap;
use std::sync::Arc;

use crate::column::Column;
use crate::error::TableError;

/// The immutable column store a view reads from. Columns are added once,
/// already finalized, and shared read-only across views afterwards.
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: HashMap<String, Arc<Column>>,
    joined: HashMap<String, Arc<Column>>,
    len: Option<u32>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), ..Default::default() } }

    pub fn name(&self) -> &str { &self.name }

    /// Row count, shared by every column. Zero before the first column.
    pub fn len(&self) -> u32 { self.len.unwrap_or(0) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn add_column(&mut self, column: Column) -> Result<(), TableError> {
        self.insert(column, false)
    }

    /// A join-projected column surfaced under the table's namespace. Looked
    /// up by `column` only when no base column has the name.
    pub fn add_joined_column(&mut self, column: Column) -> Result<(), TableError> {
        self.insert(column, true)
    }

    fn insert(&mut self, column: Column, joined: bool) -> Result<(), TableError> {
        let name = column.def().name.clone();
        if !column.is_finalized() {
            return Err(TableError::NotFinalized(name));
        }
        if self.columns.contains_key(&name) || self.joined.contains_key(&name) {
            return Err(TableError::DuplicateColumn { table: self.name.clone(), column: name });
        }
        match self.len {
            None => self.len = Some(column.len()),
            Some(expected) if expected != column.len() => {
                return Err(TableError::LengthMismatch { table: self.name.clone(), column: name, len: column.len(), expected });
            }
            Some(_) => {}
        }
        let slot = if joined { &mut self.joined } else { &mut self.columns };
        slot.insert(name, Arc::new(column));
        Ok(())
    }

    /// Base column if present, else the join-projected column of that name.
    pub fn column(&self, name: &str) -> Option<&Arc<Column>> { self.columns.get(name).or_else(|| self.joined.get(name)) }

    /// Base column names only, sorted for deterministic enumeration.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
