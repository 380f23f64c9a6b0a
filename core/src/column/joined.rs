use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ColumnError;
use crate::value::{Value, ValueKey};

use super::def::ColumnDef;
use super::{Column, GroupedIndices};

/// Resolves a row of the owning view to a row of the joined table. The core
/// never inspects join geometry; this is the whole interface.
pub trait Joiner: Send + Sync {
    fn lookup(&self, source_index: u32) -> Option<u32>;
}

/// A joiner backed by an explicit source → target mapping.
#[derive(Debug, Clone, Default)]
pub struct MapJoiner {
    targets: HashMap<u32, u32>,
}

impl MapJoiner {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, u32)>) -> Self { Self { targets: pairs.into_iter().collect() } }
}

impl Joiner for MapJoiner {
    fn lookup(&self, source_index: u32) -> Option<u32> { self.targets.get(&source_index).copied() }
}

/// Joins a local foreign-key column to a key column of a related table by
/// reading the local cell and resolving it through the target's key index.
pub struct KeyJoiner {
    local: Arc<Column>,
    target: Arc<Column>,
}

impl KeyJoiner {
    pub fn new(local: Arc<Column>, target: Arc<Column>) -> Self { Self { local, target } }
}

impl Joiner for KeyJoiner {
    fn lookup(&self, source_index: u32) -> Option<u32> {
        let v = self.local.value(source_index).ok()?;
        self.target.index_of(&v).ok()
    }
}

/// Chains joiners hop by hop; any missing hop misses the whole chain.
pub struct ComposedJoiner {
    hops: Vec<Arc<dyn Joiner>>,
}

impl ComposedJoiner {
    pub fn new(hops: Vec<Arc<dyn Joiner>>) -> Self { Self { hops } }
}

impl Joiner for ComposedJoiner {
    fn lookup(&self, source_index: u32) -> Option<u32> {
        let mut i = source_index;
        for hop in &self.hops {
            i = hop.lookup(i)?;
        }
        Some(i)
    }
}

/// A virtual column projecting a column of a related table through a
/// [`Joiner`]. Its length is the owning view's row count, not the source
/// table's; a joiner miss surfaces as *Unmatched*.
#[derive(Clone)]
pub struct JoinedColumn {
    def: ColumnDef,
    source: Arc<Column>,
    joiner: Arc<dyn Joiner>,
    len: u32,
}

impl fmt::Debug for JoinedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinedColumn").field("def", &self.def).field("source", &self.source.def().name).field("len", &self.len).finish_non_exhaustive()
    }
}

impl JoinedColumn {
    pub fn new(def: ColumnDef, source: Arc<Column>, joiner: Arc<dyn Joiner>, len: u32) -> Self { Self { def, source, joiner, len } }

    pub fn len(&self) -> u32 { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn def(&self) -> &ColumnDef { &self.def }

    pub fn source(&self) -> &Arc<Column> { &self.source }

    fn resolve(&self, i: u32) -> Result<u32, ColumnError> {
        if i >= self.len {
            return Err(ColumnError::OutOfRange { index: i, len: self.len });
        }
        self.joiner.lookup(i).ok_or_else(|| ColumnError::Unmatched { column: self.def.name.clone(), index: i })
    }

    pub fn value(&self, i: u32) -> Result<Value, ColumnError> { self.source.value(self.resolve(i)?) }

    pub fn string(&self, i: u32) -> Result<String, ColumnError> { self.source.string(self.resolve(i)?) }

    /// Group by the joined-to value; joiner misses accumulate in `unmapped`.
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

    pub fn compare(&self, i: u32, j: u32) -> Ordering {
        match (self.value(i), self.value(j)) {
            (Ok(a), Ok(b)) => a.compare(&b),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => Ordering::Equal,
        }
    }
}
