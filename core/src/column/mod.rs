pub mod cell;
pub mod computed;
pub mod datetime;
pub mod def;
pub mod duration;
pub mod joined;
pub mod primitive;
pub mod string;

pub use cell::{parse_bool, parse_float, Cell, CellFormat};
pub use computed::{ComputeFn, ComputedColumn};
pub use datetime::{format_datetime, parse_datetime, Datetime};
pub use def::ColumnDef;
pub use duration::{format_compact, format_verbose, parse_duration, Duration};
pub use joined::{ComposedJoiner, JoinedColumn, Joiner, KeyJoiner, MapJoiner};
pub use primitive::PrimitiveColumn;
pub use string::StringColumn;

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::ColumnError;
use crate::value::{ColumnType, Value};

/// The result of partitioning an index set by a column's values: dense
/// groups in first-occurrence order plus the indices the column could not
/// resolve (out of range, join miss, compute failure).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedIndices {
    pub groups: Vec<Vec<u32>>,
    pub unmapped: Vec<u32>,
}

impl GroupedIndices {
    /// Total number of indices across groups and unmapped, for the
    /// per-block reconciliation check.
    pub fn total(&self) -> usize { self.groups.iter().map(Vec::len).sum::<usize>() + self.unmapped.len() }
}

/// The column sum type. Storage variants own their cells; `Computed` and
/// `Joined` are virtual and evaluate on demand.
#[derive(Debug, Clone)]
pub enum Column {
    String(StringColumn),
    Uint32(PrimitiveColumn<u32>),
    Int64(PrimitiveColumn<i64>),
    Uint64(PrimitiveColumn<u64>),
    Float64(PrimitiveColumn<f64>),
    Bool(PrimitiveColumn<bool>),
    Datetime(PrimitiveColumn<Datetime>),
    Duration(PrimitiveColumn<Duration>),
    Computed(ComputedColumn),
    Joined(JoinedColumn),
}

/// Dispatch a capability shared by every variant.
macro_rules! with_column {
    ($col:expr, $c:ident => $body:expr) => {
        match $col {
            Column::String($c) => $body,
            Column::Uint32($c) => $body,
            Column::Int64($c) => $body,
            Column::Uint64($c) => $body,
            Column::Float64($c) => $body,
            Column::Bool($c) => $body,
            Column::Datetime($c) => $body,
            Column::Duration($c) => $body,
            Column::Computed($c) => $body,
            Column::Joined($c) => $body,
        }
    };
}

/// Dispatch over the storage variants only, with fallbacks for the virtual
/// ones.
macro_rules! with_stored_column {
    ($col:expr, $c:ident => $body:expr, $virtual:ident => $fallback:expr) => {
        match $col {
            Column::String($c) => $body,
            Column::Uint32($c) => $body,
            Column::Int64($c) => $body,
            Column::Uint64($c) => $body,
            Column::Float64($c) => $body,
            Column::Bool($c) => $body,
            Column::Datetime($c) => $body,
            Column::Duration($c) => $body,
            Column::Computed($virtual) => $fallback,
            Column::Joined($virtual) => $fallback,
        }
    };
}

impl Column {
    /// An empty storage column of the given type with default formatting.
    pub fn new(def: ColumnDef, column_type: ColumnType) -> Self { Self::with_format(def, column_type, CellFormat::default()) }

    pub fn with_format(def: ColumnDef, column_type: ColumnType, format: CellFormat) -> Self {
        match column_type {
            ColumnType::String => Column::String(StringColumn::new(def)),
            ColumnType::Uint32 => Column::Uint32(PrimitiveColumn::with_format(def, format)),
            ColumnType::Int64 => Column::Int64(PrimitiveColumn::with_format(def, format)),
            ColumnType::Uint64 => Column::Uint64(PrimitiveColumn::with_format(def, format)),
            ColumnType::Float64 => Column::Float64(PrimitiveColumn::with_format(def, format)),
            ColumnType::Bool => Column::Bool(PrimitiveColumn::with_format(def, format)),
            ColumnType::Datetime => Column::Datetime(PrimitiveColumn::with_format(def, format)),
            ColumnType::Duration => Column::Duration(PrimitiveColumn::with_format(def, format)),
        }
    }

    /// A joined column projecting `source` through `joiner`, owned by a view
    /// of `len` rows.
    pub fn create_joined(source: &Arc<Column>, def: ColumnDef, joiner: Arc<dyn Joiner>, len: u32) -> Self {
        Column::Joined(JoinedColumn::new(def, source.clone(), joiner, len))
    }

    pub fn len(&self) -> u32 {
        with_column!(self, c => c.len())
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn def(&self) -> &ColumnDef {
        with_column!(self, c => c.def())
    }

    pub fn name(&self) -> &str { &self.def().name }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::String(_) => ColumnType::String,
            Column::Uint32(_) => ColumnType::Uint32,
            Column::Int64(_) => ColumnType::Int64,
            Column::Uint64(_) => ColumnType::Uint64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Bool(_) => ColumnType::Bool,
            Column::Datetime(_) => ColumnType::Datetime,
            Column::Duration(_) => ColumnType::Duration,
            Column::Computed(c) => c.value_type(),
            Column::Joined(c) => c.source().column_type(),
        }
    }

    /// Parse `token` per the column's type and append. Virtual columns are
    /// read-only.
    pub fn append_str(&mut self, token: &str) -> Result<(), ColumnError> {
        match self {
            Column::String(c) => c.append(token),
            Column::Uint32(c) => c.append_str(token),
            Column::Int64(c) => c.append_str(token),
            Column::Uint64(c) => c.append_str(token),
            Column::Float64(c) => c.append_str(token),
            Column::Bool(c) => c.append_str(token),
            Column::Datetime(c) => c.append_str(token),
            Column::Duration(c) => c.append_str(token),
            Column::Computed(c) => Err(ColumnError::Finalized(c.def().name.clone())),
            Column::Joined(c) => Err(ColumnError::Finalized(c.def().name.clone())),
        }
    }

    /// Append an already-typed value; the variant must match.
    pub fn append_value(&mut self, v: Value) -> Result<(), ColumnError> {
        fn typed<T: Cell>(c: &mut PrimitiveColumn<T>, v: &Value) -> Result<(), ColumnError> {
            match T::from_value(v) {
                Some(t) => c.append(t),
                None => Err(ColumnError::TypeMismatch { column: c.def().name.clone(), expected: T::TYPE.as_str(), actual: ColumnType::of(v).as_str() }),
            }
        }
        match self {
            Column::String(c) => match v {
                Value::String(s) => c.append(s),
                other => Err(ColumnError::TypeMismatch { column: c.def().name.clone(), expected: "String", actual: ColumnType::of(&other).as_str() }),
            },
            Column::Uint32(c) => typed(c, &v),
            Column::Int64(c) => typed(c, &v),
            Column::Uint64(c) => typed(c, &v),
            Column::Float64(c) => typed(c, &v),
            Column::Bool(c) => typed(c, &v),
            Column::Datetime(c) => typed(c, &v),
            Column::Duration(c) => typed(c, &v),
            Column::Computed(c) => Err(ColumnError::Finalized(c.def().name.clone())),
            Column::Joined(c) => Err(ColumnError::Finalized(c.def().name.clone())),
        }
    }

    /// Freeze the column and build the key index when eligible. A no-op on
    /// virtual columns, which are born finalized.
    pub fn finalize(&mut self) {
        with_stored_column!(self, c => c.finalize(), _v => ())
    }

    pub fn is_finalized(&self) -> bool {
        with_stored_column!(self, c => c.is_finalized(), _v => true)
    }

    pub fn is_key(&self) -> bool {
        with_stored_column!(self, c => c.is_key(), _v => false)
    }

    pub fn value(&self, i: u32) -> Result<Value, ColumnError> {
        with_column!(self, c => c.value(i))
    }

    pub fn string(&self, i: u32) -> Result<String, ColumnError> {
        with_column!(self, c => c.string(i))
    }

    /// Reverse lookup on a key column.
    pub fn index_of(&self, v: &Value) -> Result<u32, ColumnError> {
        fn typed<T: Cell>(c: &PrimitiveColumn<T>, v: &Value) -> Result<u32, ColumnError> {
            if !c.is_key() {
                return Err(ColumnError::NotKey(c.def().name.clone()));
            }
            match T::from_value(v) {
                Some(t) => c.index_of(t),
                None => Err(ColumnError::TypeMismatch { column: c.def().name.clone(), expected: T::TYPE.as_str(), actual: ColumnType::of(v).as_str() }),
            }
        }
        match self {
            Column::String(c) => match v {
                Value::String(s) => c.index_of(s),
                other => {
                    if !c.is_key() {
                        return Err(ColumnError::NotKey(c.def().name.clone()));
                    }
                    Err(ColumnError::TypeMismatch { column: c.def().name.clone(), expected: "String", actual: ColumnType::of(other).as_str() })
                }
            },
            Column::Uint32(c) => typed(c, v),
            Column::Int64(c) => typed(c, v),
            Column::Uint64(c) => typed(c, v),
            Column::Float64(c) => typed(c, v),
            Column::Bool(c) => typed(c, v),
            Column::Datetime(c) => typed(c, v),
            Column::Duration(c) => typed(c, v),
            Column::Computed(c) => Err(ColumnError::NotKey(c.def().name.clone())),
            Column::Joined(c) => Err(ColumnError::NotKey(c.def().name.clone())),
        }
    }

    pub fn group_indices(&self, idxs: &[u32]) -> GroupedIndices {
        with_column!(self, c => c.group_indices(idxs))
    }

    /// Strict weak ordering between two rows of this column; unreadable
    /// cells sort after readable ones.
    pub fn compare(&self, i: u32, j: u32) -> Ordering {
        with_column!(self, c => c.compare(i, j))
    }
}
