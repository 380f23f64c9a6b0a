//! Delimited-text importer: reads records with a configurable delimiter,
//! infers or accepts per-column types, and produces a finalized
//! [`Table`](strata_core::Table).

pub mod importer;
pub mod infer;
pub mod options;

pub use importer::{import_reader, import_str};
pub use infer::infer_type;
pub use options::{ColumnAnnotation, ImportOptions, ParsePolicy};

use thiserror::Error;

use strata_core::error::{ColumnError, ParseError, TableError};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}, column {column:?}: {source}")]
    Parse { row: usize, column: String, source: ParseError },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error("input has no columns")]
    Empty,
}
