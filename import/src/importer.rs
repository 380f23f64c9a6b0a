use std::collections::HashMap;
use std::io::Read;

use tracing::{debug, warn};

use strata_core::column::{parse_bool, parse_datetime, parse_duration, Column, ColumnDef};
use strata_core::error::ParseError;
use strata_core::table::Table;
use strata_core::value::{ColumnType, Value};

use crate::infer::infer_type;
use crate::options::{ColumnAnnotation, ImportOptions, ParsePolicy};
use crate::ImportError;

/// Import delimited text into a finalized [`Table`]. Annotations are keyed
/// by column name (header name, or `colN` without a header row).
pub fn import_reader<R: Read>(
    table_name: &str,
    reader: R,
    options: &ImportOptions,
    annotations: &HashMap<String, ColumnAnnotation>,
) -> Result<Table, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new().delimiter(options.delimiter).has_headers(options.has_header).from_reader(reader);

    let header: Vec<String> = if options.has_header { csv_reader.headers()?.iter().map(str::to_string).collect() } else { Vec::new() };
    let records: Vec<csv::StringRecord> = csv_reader.records().collect::<Result<_, _>>()?;

    let width = if options.has_header { header.len() } else { records.first().map_or(0, csv::StringRecord::len) };
    if width == 0 {
        return Err(ImportError::Empty);
    }
    let names: Vec<String> = if options.has_header { header } else { (0..width).map(|i| format!("col{i}")).collect() };

    let mut columns = Vec::with_capacity(width);
    for (slot, name) in names.iter().enumerate() {
        let annotation = annotations.get(name).cloned().unwrap_or_default();
        let column_type = annotation
            .explicit_type
            .unwrap_or_else(|| infer_type(records.iter().take(options.sample_rows).map(|r| r.get(slot).unwrap_or_default())));
        let def = ColumnDef::new(
            name.clone(),
            annotation.display_name.unwrap_or_else(|| name.clone()),
            annotation.entity_type.unwrap_or_default(),
        )?;
        debug!(column = name.as_str(), column_type = %column_type, "import column");
        columns.push(Column::new(def, column_type));
    }

    'rows: for (row, record) in records.iter().enumerate() {
        // parse the full row first so a skipped row leaves no partial cells
        let mut cells = Vec::with_capacity(width);
        for (slot, column) in columns.iter().enumerate() {
            let token = record.get(slot).unwrap_or_default();
            match parse_cell(column.column_type(), token) {
                Ok(v) => cells.push(v),
                Err(source) => match options.on_parse_error {
                    ParsePolicy::Abort => {
                        return Err(ImportError::Parse { row, column: column.def().name.clone(), source });
                    }
                    ParsePolicy::SkipRow => {
                        warn!(row, column = column.def().name.as_str(), error = %source, "skipping row");
                        continue 'rows;
                    }
                    ParsePolicy::Default => cells.push(zero_value(column.column_type())),
                },
            }
        }
        for (column, cell) in columns.iter_mut().zip(cells) {
            column.append_value(cell)?;
        }
    }

    let mut table = Table::new(table_name);
    for mut column in columns {
        column.finalize();
        table.add_column(column)?;
    }
    Ok(table)
}

pub fn import_str(table_name: &str, data: &str, options: &ImportOptions, annotations: &HashMap<String, ColumnAnnotation>) -> Result<Table, ImportError> {
    import_reader(table_name, data.as_bytes(), options, annotations)
}

/// Typed cell parsing with the importer's defaults: empty integer cells
/// are 0, unparsable float cells are NaN, and the remaining types carry
/// their own empty-token rules.
fn parse_cell(column_type: ColumnType, token: &str) -> Result<Value, ParseError> {
    let trimmed = token.trim();
    match column_type {
        ColumnType::String => Ok(Value::String(token.to_string())),
        ColumnType::Uint32 => {
            if trimmed.is_empty() {
                Ok(Value::Uint32(0))
            } else {
                trimmed.parse().map(Value::Uint32).map_err(|_| ParseError::Int(token.to_string()))
            }
        }
        ColumnType::Int64 => {
            if trimmed.is_empty() {
                Ok(Value::Int64(0))
            } else {
                trimmed.parse().map(Value::Int64).map_err(|_| ParseError::Int(token.to_string()))
            }
        }
        ColumnType::Uint64 => {
            if trimmed.is_empty() {
                Ok(Value::Uint64(0))
            } else {
                trimmed.parse().map(Value::Uint64).map_err(|_| ParseError::Int(token.to_string()))
            }
        }
        ColumnType::Float64 => Ok(Value::Float64(trimmed.parse().unwrap_or(f64::NAN))),
        ColumnType::Bool => parse_bool(trimmed).map(Value::Bool),
        ColumnType::Datetime => parse_datetime(trimmed).map(Value::Datetime),
        ColumnType::Duration => parse_duration(trimmed).map(Value::Duration),
    }
}

fn zero_value(column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::String => Value::String(String::new()),
        ColumnType::Uint32 => Value::Uint32(0),
        ColumnType::Int64 => Value::Int64(0),
        ColumnType::Uint64 => Value::Uint64(0),
        ColumnType::Float64 => Value::Float64(f64::NAN),
        ColumnType::Bool => Value::Bool(false),
        ColumnType::Datetime => Value::Datetime(strata_core::column::Datetime::from_nanos(0)),
        ColumnType::Duration => Value::Duration(strata_core::column::Duration::from_nanos(0)),
    }
}
