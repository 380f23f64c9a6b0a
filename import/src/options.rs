use serde::{Deserialize, Serialize};

use strata_core::value::ColumnType;

/// What to do with a cell that fails typed parsing. Unparsable cells in
/// float columns always become NaN regardless of policy, and empty cells
/// in integer columns always become 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParsePolicy {
    /// Fail the import on the first bad cell.
    #[default]
    Abort,
    /// Drop the whole row.
    SkipRow,
    /// Substitute the type's zero value.
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub delimiter: u8,
    pub has_header: bool,
    /// Rows scanned for type inference.
    pub sample_rows: usize,
    pub on_parse_error: ParsePolicy,
}

impl Default for ImportOptions {
    fn default() -> Self { Self { delimiter: b',', has_header: true, sample_rows: 100, on_parse_error: ParsePolicy::Abort } }
}

/// Optional per-column metadata supplied alongside the data stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnAnnotation {
    pub display_name: Option<String>,
    pub entity_type: Option<String>,
    pub explicit_type: Option<ColumnType>,
}

impl ColumnAnnotation {
    pub fn typed(column_type: ColumnType) -> Self { Self { explicit_type: Some(column_type), ..Default::default() } }

    pub fn entity(entity_type: impl Into<String>) -> Self { Self { entity_type: Some(entity_type.into()), ..Default::default() } }
}
