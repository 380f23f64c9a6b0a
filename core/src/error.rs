use thiserror::Error;

/// Errors raised by the column kernel. The kernel never panics; every
/// fallible operation returns one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColumnError {
    #[error("index {index} out of range for column of length {len}")]
    OutOfRange { index: u32, len: u32 },
    #[error("value {0:?} not found")]
    NotFound(String),
    #[error("column {0:?} is not a key column")]
    NotKey(String),
    #[error("no join target for column {column:?} at index {index}")]
    Unmatched { column: String, index: u32 },
    #[error("column {0:?} is finalized and read-only")]
    Finalized(String),
    #[error("column {column:?} holds {actual}, not {expected}")]
    TypeMismatch { column: String, expected: &'static str, actual: &'static str },
    #[error("column name {0:?} contains a reserved character")]
    InvalidName(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors from the typed parsing surface (`append_str` and the standalone
/// parse functions). The offending token is carried for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("invalid integer {0:?}")]
    Int(String),
    #[error("invalid float {0:?}")]
    Float(String),
    #[error("invalid boolean {0:?}")]
    Bool(String),
    #[error("invalid datetime {0:?}")]
    Datetime(String),
    #[error("invalid duration {0:?}")]
    Duration(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("table {table:?} already has a column named {column:?}")]
    DuplicateColumn { table: String, column: String },
    #[error("column {column:?} has {len} rows but table {table:?} has {expected}")]
    LengthMismatch { table: String, column: String, len: u32, expected: u32 },
    #[error("column {0:?} must be finalized before it joins a table")]
    NotFinalized(String),
}

/// Errors surfaced by `TableView` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error("unknown column {0:?}")]
    UnknownColumn(String),
    #[error("unknown join {0:?}")]
    UnknownJoin(String),
    #[error("malformed join path {0:?}")]
    InvalidJoinPath(String),
    #[error("unknown table {0:?}")]
    UnknownTable(String),
    #[error("grouping requires at least one column")]
    EmptyGrouping,
    #[error("view has no grouping")]
    NoGrouping,
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Column(#[from] ColumnError),
}
