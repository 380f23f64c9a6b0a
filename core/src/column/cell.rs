use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::ParseError;
use crate::value::{compare_floats, format_float, ColumnType, Value, ValueKey};

use super::datetime::{self, Datetime};
use super::duration::{self, Duration};

/// Per-column display configuration. Only datetime and duration cells
/// consult it; every other type has a single canonical rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFormat {
    /// chrono format string; `None` renders with [`datetime::DEFAULT_FORMAT`].
    pub datetime_format: Option<String>,
    /// Render durations as prose instead of the compact `2h30m0s` form.
    pub verbose_duration: bool,
}

/// A fixed-width cell type storable in a [`PrimitiveColumn`]. One impl per
/// scalar column variant; every kernel operation on primitive columns is
/// monomorphized through this trait.
///
/// [`PrimitiveColumn`]: super::primitive::PrimitiveColumn
pub trait Cell: Copy + PartialEq + Debug + Send + Sync + 'static {
    const TYPE: ColumnType;

    /// Group buckets are emitted in bucket order rather than
    /// first-occurrence order. Only booleans set this: `false` groups
    /// before `true` regardless of which appears first.
    const ORDERED_BUCKETS: bool = false;

    fn parse(token: &str) -> Result<Self, ParseError>;
    fn format(self, fmt: &CellFormat) -> String;

    /// The hashable partition image. All NaN floats collapse to
    /// [`ValueKey::Nan`]; everything else is a 64-bit pattern that is
    /// bit-equal iff the cells are semantically equal.
    fn bucket(self) -> ValueKey;

    fn compare_cells(self, other: Self) -> Ordering;
    fn into_value(self) -> Value;
    fn from_value(v: &Value) -> Option<Self>;
}

impl Cell for u32 {
    const TYPE: ColumnType = ColumnType::Uint32;

    fn parse(token: &str) -> Result<Self, ParseError> { token.parse().map_err(|_| ParseError::Int(token.to_string())) }

    fn format(self, _fmt: &CellFormat) -> String { self.to_string() }

    fn bucket(self) -> ValueKey { ValueKey::Bits(self as u64) }

    fn compare_cells(self, other: Self) -> Ordering { self.cmp(&other) }

    fn into_value(self) -> Value { Value::Uint32(self) }

    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Uint32(n) => Some(*n),
            _ => None,
        }
    }
}

impl Cell for i64 {
    const TYPE: ColumnType = ColumnType::Int64;

    fn parse(token: &str) -> Result<Self, ParseError> { token.parse().map_err(|_| ParseError::Int(token.to_string())) }

    fn format(self, _fmt: &CellFormat) -> String { self.to_string() }

    fn bucket(self) -> ValueKey { ValueKey::Bits(self as u64) }

    fn compare_cells(self, other: Self) -> Ordering { self.cmp(&other) }

    fn into_value(self) -> Value { Value::Int64(self) }

    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }
}

impl Cell for u64 {
    const TYPE: ColumnType = ColumnType::Uint64;

    fn parse(token: &str) -> Result<Self, ParseError> { token.parse().map_err(|_| ParseError::Int(token.to_string())) }

    fn format(self, _fmt: &CellFormat) -> String { self.to_string() }

    fn bucket(self) -> ValueKey { ValueKey::Bits(self) }

    fn compare_cells(self, other: Self) -> Ordering { self.cmp(&other) }

    fn into_value(self) -> Value { Value::Uint64(self) }

    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Uint64(n) => Some(*n),
            _ => None,
        }
    }
}

impl Cell for f64 {
    const TYPE: ColumnType = ColumnType::Float64;

    fn parse(token: &str) -> Result<Self, ParseError> { parse_float(token) }

    fn format(self, _fmt: &CellFormat) -> String { format_float(self) }

    fn bucket(self) -> ValueKey {
        if self.is_nan() {
            ValueKey::Nan
        } else {
            ValueKey::Bits(self.to_bits())
        }
    }

    fn compare_cells(self, other: Self) -> Ordering { compare_floats(self, other) }

    fn into_value(self) -> Value { Value::Float64(self) }

    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Float64(n) => Some(*n),
            _ => None,
        }
    }
}

impl Cell for bool {
    const TYPE: ColumnType = ColumnType::Bool;
    const ORDERED_BUCKETS: bool = true;

    fn parse(token: &str) -> Result<Self, ParseError> { parse_bool(token) }

    fn format(self, _fmt: &CellFormat) -> String { if self { "True".to_string() } else { "False".to_string() } }

    fn bucket(self) -> ValueKey { ValueKey::Bits(self as u64) }

    fn compare_cells(self, other: Self) -> Ordering { self.cmp(&other) }

    fn into_value(self) -> Value { Value::Bool(self) }

    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Cell for Datetime {
    const TYPE: ColumnType = ColumnType::Datetime;

    fn parse(token: &str) -> Result<Self, ParseError> { datetime::parse_datetime(token) }

    fn format(self, fmt: &CellFormat) -> String {
        datetime::format_datetime(self, fmt.datetime_format.as_deref().unwrap_or(datetime::DEFAULT_FORMAT))
    }

    fn bucket(self) -> ValueKey { ValueKey::Bits(self.nanos() as u64) }

    fn compare_cells(self, other: Self) -> Ordering { self.nanos().cmp(&other.nanos()) }

    fn into_value(self) -> Value { Value::Datetime(self) }

    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Datetime(d) => Some(*d),
            _ => None,
        }
    }
}

impl Cell for Duration {
    const TYPE: ColumnType = ColumnType::Duration;

    fn parse(token: &str) -> Result<Self, ParseError> { duration::parse_duration(token) }

    fn format(self, fmt: &CellFormat) -> String {
        if fmt.verbose_duration {
            duration::format_verbose(self)
        } else {
            duration::format_compact(self)
        }
    }

    fn bucket(self) -> ValueKey { ValueKey::Bits(self.nanos() as u64) }

    fn compare_cells(self, other: Self) -> Ordering { self.nanos().cmp(&other.nanos()) }

    fn into_value(self) -> Value { Value::Duration(self) }

    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

/// Case-insensitive boolean parsing. The empty token is false, matching the
/// importer's empty-cell default.
pub fn parse_bool(token: &str) -> Result<bool, ParseError> {
    let lower = token.to_ascii_lowercase();
    match lower.as_str() {
        "true" | "1" | "yes" | "t" | "y" => Ok(true),
        "false" | "0" | "no" | "f" | "n" | "" => Ok(false),
        _ => Err(ParseError::Bool(token.to_string())),
    }
}

pub fn parse_float(token: &str) -> Result<f64, ParseError> { token.parse().map_err(|_| ParseError::Float(token.to_string())) }

/// Render a boxed value with a column's display configuration. Used by the
/// virtual (computed/joined) columns, which carry values rather than cells.
pub(crate) fn render_value(v: &Value, fmt: &CellFormat) -> String {
    match v {
        Value::Datetime(d) => d.format(fmt),
        Value::Duration(d) => d.format(fmt),
        other => other.to_string(),
    }
}
