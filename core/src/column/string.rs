use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::ColumnError;
use crate::value::Value;

use super::def::ColumnDef;
use super::GroupedIndices;

/// UTF-8 column storage. Mirrors [`PrimitiveColumn`] but owns its cells and
/// keys its reverse index by the string itself.
///
/// [`PrimitiveColumn`]: super::primitive::PrimitiveColumn
#[derive(Debug, Clone)]
pub struct StringColumn {
    def: ColumnDef,
    values: Vec<String>,
    index: Option<HashMap<String, u32>>,
    key: bool,
    finalized: bool,
}

impl StringColumn {
    pub fn new(def: ColumnDef) -> Self { Self { def, values: Vec::new(), index: None, key: false, finalized: false } }

    pub fn len(&self) -> u32 { self.values.len() as u32 }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn def(&self) -> &ColumnDef { &self.def }

    pub(crate) fn cells(&self) -> &[String] { &self.values }

    pub fn append(&mut self, v: impl Into<String>) -> Result<(), ColumnError> {
        if self.finalized {
            return Err(ColumnError::Finalized(self.def.name.clone()));
        }
        self.values.push(v.into());
        Ok(())
    }

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
            if index.insert(v.clone(), i as u32).is_some() {
                return;
            }
        }
        self.index = Some(index);
        self.key = true;
    }

    pub fn is_finalized(&self) -> bool { self.finalized }

    pub fn is_key(&self) -> bool { self.key }

    pub fn get(&self, i: u32) -> Result<&str, ColumnError> {
        self.values.get(i as usize).map(String::as_str).ok_or(ColumnError::OutOfRange { index: i, len: self.len() })
    }

    pub fn value(&self, i: u32) -> Result<Value, ColumnError> { Ok(Value::String(self.get(i)?.to_string())) }

    pub fn string(&self, i: u32) -> Result<String, ColumnError> { Ok(self.get(i)?.to_string()) }

    pub fn index_of(&self, v: &str) -> Result<u32, ColumnError> {
        let index = match &self.index {
            Some(index) if self.key => index,
            _ => return Err(ColumnError::NotKey(self.def.name.clone())),
        };
        index.get(v).copied().ok_or_else(|| ColumnError::NotFound(v.to_string()))
    }

    pub fn group_indices(&self, idxs: &[u32]) -> GroupedIndices {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Vec<u32>> = Vec::new();
        let mut unmapped = Vec::new();
        for &i in idxs {
            let Some(v) = self.values.get(i as usize) else {
                unmapped.push(i);
                continue;
            };
            let slot = match slots.get(v.as_str()) {
                Some(&slot) => slot,
                None => {
                    let slot = groups.len();
                    slots.insert(v, slot);
                    groups.push(Vec::new());
                    slot
                }
            };
            groups[slot].push(i);
        }
        GroupedIndices { groups, unmapped }
    }

    /// Lexicographic byte order; out-of-range sorts last.
    pub fn compare(&self, i: u32, j: u32) -> Ordering {
        match (self.values.get(i as usize), self.values.get(j as usize)) {
            (Some(a), Some(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}
