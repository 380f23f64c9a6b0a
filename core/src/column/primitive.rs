use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::ColumnError;
use crate::value::{Value, ValueKey};

use super::cell::{Cell, CellFormat};
use super::def::ColumnDef;
use super::GroupedIndices;

/// Fixed-width column storage, monomorphized per cell type. Build phase is
/// append-only; `finalize` freezes the column and, for entity-tagged
/// columns with all-distinct values, builds the reverse `value → row` map.
#[derive(Debug, Clone)]
pub struct PrimitiveColumn<T: Cell> {
    def: ColumnDef,
    values: Vec<T>,
    format: CellFormat,
    index: Option<HashMap<ValueKey, u32>>,
    key: bool,
    finalized: bool,
}

impl<T: Cell> PrimitiveColumn<T> {
    pub fn new(def: ColumnDef) -> Self { Self::with_format(def, CellFormat::default()) }

    pub fn with_format(def: ColumnDef, format: CellFormat) -> Self {
        Self { def, values: Vec::new(), format, index: None, key: false, finalized: false }
    }

    pub fn len(&self) -> u32 { self.values.len() as u32 }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn def(&self) -> &ColumnDef { &self.def }

    pub fn cell_format(&self) -> &CellFormat { &self.format }

    pub(crate) fn cells(&self) -> &[T] { &self.values }

    pub fn append(&mut self, v: T) -> Result<(), ColumnError> {
        if self.finalized {
            return Err(ColumnError::Finalized(self.def.name.clone()));
        }
        self.values.push(v);
        Ok(())
    }

    pub fn append_str(&mut self, token: &str) -> Result<(), ColumnError> {
        let v = T::parse(token)?;
        self.append(v)
    }

    /// Freeze the column. Builds the key index when the column carries an
    /// entity type and every value is distinct; any NaN bucket disqualifies
    /// key status. Idempotent.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        if !self.def.is_entity() {
            return;
        }
        let mut index = HashMap::with_capacity(self.values.len());
        for (i, v) in self.values.iter().enumerate() {
            let bucket = v.bucket();
            if bucket == ValueKey::Nan || index.insert(bucket, i as u32).is_some() {
                return;
            }
        }
        self.index = Some(index);
        self.key = true;
    }

    pub fn is_finalized(&self) -> bool { self.finalized }

    pub fn is_key(&self) -> bool { self.key }

    pub fn get(&self, i: u32) -> Result<T, ColumnError> {
        self.values.get(i as usize).copied().ok_or(ColumnError::OutOfRange { index: i, len: self.len() })
    }

    pub fn value(&self, i: u32) -> Result<Value, ColumnError> { Ok(self.get(i)?.into_value()) }

    pub fn string(&self, i: u32) -> Result<String, ColumnError> { Ok(self.get(i)?.format(&self.format)) }

    pub fn index_of(&self, v: T) -> Result<u32, ColumnError> {
        let index = match &self.index {
            Some(index) if self.key => index,
            _ => return Err(ColumnError::NotKey(self.def.name.clone())),
        };
        index.get(&v.bucket()).copied().ok_or_else(|| ColumnError::NotFound(v.format(&self.format)))
    }

    /// Partition `idxs` into dense groups keyed by first occurrence of each
    /// distinct value. Out-of-range indices land in `unmapped`. Boolean
    /// columns reorder their (at most two) buckets so false groups first.
    pub fn group_indices(&self, idxs: &[u32]) -> GroupedIndices {
        let mut slots: HashMap<ValueKey, usize> = HashMap::new();
        let mut buckets: Vec<ValueKey> = Vec::new();
        let mut groups: Vec<Vec<u32>> = Vec::new();
        let mut unmapped = Vec::new();
        for &i in idxs {
            let Some(v) = self.values.get(i as usize) else {
                unmapped.push(i);
                continue;
            };
            let bucket = v.bucket();
            let slot = match slots.get(&bucket) {
                Some(&slot) => slot,
                None => {
                    let slot = groups.len();
                    slots.insert(bucket.clone(), slot);
                    buckets.push(bucket);
                    groups.push(Vec::new());
                    slot
                }
            };
            groups[slot].push(i);
        }
        if T::ORDERED_BUCKETS && groups.len() > 1 {
            let mut paired: Vec<(ValueKey, Vec<u32>)> = buckets.into_iter().zip(groups).collect();
            paired.sort_by(|a, b| a.0.cmp(&b.0));
            groups = paired.into_iter().map(|(_, g)| g).collect();
        }
        GroupedIndices { groups, unmapped }
    }

    /// Strict weak ordering by stored value; out-of-range sorts last.
    pub fn compare(&self, i: u32, j: u32) -> Ordering {
        match (self.values.get(i as usize), self.values.get(j as usize)) {
            (Some(a), Some(b)) => a.compare_cells(*b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}
