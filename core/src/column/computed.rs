use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ColumnError;
use crate::value::{ColumnType, Value, ValueKey};

use super::cell::{render_value, CellFormat};
use super::def::ColumnDef;
use super::GroupedIndices;

/// The per-row evaluation closure of a computed column. Must be a
/// referentially transparent total function over `[0, len)`; source columns
/// are captured by shared immutable reference.
pub type ComputeFn = Arc<dyn Fn(u32) -> Result<Value, ColumnError> + Send + Sync>;

/// A virtual column whose cells are produced on demand by a closure over
/// other columns. Never supports reverse lookup.
#[derive(Clone)]
pub struct ComputedColumn {
    def: ColumnDef,
    len: u32,
    value_type: ColumnType,
    format: CellFormat,
    eval: ComputeFn,
}

impl fmt::Debug for ComputedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedColumn")
            .field("def", &self.def)
            .field("len", &self.len)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

impl ComputedColumn {
    pub fn new(def: ColumnDef, len: u32, value_type: ColumnType, eval: ComputeFn) -> Self {
        Self::with_format(def, len, value_type, CellFormat::default(), eval)
    }

    pub fn with_format(def: ColumnDef, len: u32, value_type: ColumnType, format: CellFormat, eval: ComputeFn) -> Self {
        Self { def, len, value_type, format, eval }
    }

    pub fn len(&self) -> u32 { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn def(&self) -> &ColumnDef { &self.def }

    pub fn value_type(&self) -> ColumnType { self.value_type }

    pub fn value(&self, i: u32) -> Result<Value, ColumnError> {
        if i >= self.len {
            return Err(ColumnError::OutOfRange { index: i, len: self.len });
        }
        (self.eval)(i)
    }

    pub fn string(&self, i: u32) -> Result<String, ColumnError> { Ok(render_value(&self.value(i)?, &self.format)) }

    /// Group by evaluated value; rows whose evaluation fails are unmapped.
    pub fn group_indices(&self, idxs: &[u32]) -> GroupedIndices {
        let mut slots: HashMap<ValueKey, usize> = HashMap::new();
        let mut groups: Vec<Vec<u32>> = Vec::new();
        let mut unmapped = Vec::new();
        for &i in idxs {
            let Ok(v) = self.value(i) else {
                unmapped.push(i);
                continue;
            };
            let bucket = v.group_bucket();
            let slot = match slots.get(&bucket) {
                Some(&slot) => slot,
                None => {
                    let slot = groups.len();
                    slots.insert(bucket, slot);
                    groups.push(Vec::new());
                    slot
                }
            };
            groups[slot].push(i);
        }
        GroupedIndices { groups, unmapped }
    }

    /// Evaluate both rows and delegate to the value ordering; evaluation
    /// errors sort after successful cells.
    pub fn compare(&self, i: u32, j: u32) -> Ordering {
        match (self.value(i), self.value(j)) {
            (Ok(a), Ok(b)) => a.compare(&b),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => Ordering::Equal,
        }
    }
}
