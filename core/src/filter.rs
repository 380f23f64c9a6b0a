//! Bitmap filtering over a base table: one pass per filtered column, with
//! the match mode resolved once per column rather than once per row.

use tracing::debug;

use crate::column::{Cell, Column, ComputedColumn, JoinedColumn, PrimitiveColumn, StringColumn};

/// A parsed predicate spec. A quoted literal is a case-sensitive exact
/// match on the canonical string form; anything else is a case-insensitive
/// substring match (the needle is lowercased here, once).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    Substring(String),
    Exact(String),
}

impl FilterSpec {
    pub fn parse(raw: &str) -> Self {
        if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            FilterSpec::Exact(raw[1..raw.len() - 1].to_string())
        } else {
            FilterSpec::Substring(raw.to_lowercase())
        }
    }
}

impl Column {
    /// Narrow `mask` in place: a bit stays set only if the row matches.
    /// Rows whose cell cannot be produced do not match.
    pub fn apply_filter(&self, mask: &mut [bool], spec: &FilterSpec) {
        let before = mask.iter().filter(|m| **m).count();
        match self {
            Column::String(c) => filter_strings(c, mask, spec),
            Column::Uint32(c) => filter_cells(c, mask, spec),
            Column::Int64(c) => filter_cells(c, mask, spec),
            Column::Uint64(c) => filter_cells(c, mask, spec),
            Column::Float64(c) => filter_cells(c, mask, spec),
            Column::Bool(c) => filter_cells(c, mask, spec),
            Column::Datetime(c) => filter_cells(c, mask, spec),
            Column::Duration(c) => filter_cells(c, mask, spec),
            Column::Computed(c) => filter_computed(c, mask, spec),
            Column::Joined(c) => filter_joined(c, mask, spec),
        }
        let after = mask.iter().filter(|m| **m).count();
        debug!(column = self.name(), before, after, "filter pass");
    }

    /// Standalone form: the indices matching `spec` over the whole column.
    pub fn filter_matching(&self, spec: &FilterSpec) -> Vec<u32> {
        let mut mask = vec![true; self.len() as usize];
        self.apply_filter(&mut mask, spec);
        mask.iter().enumerate().filter_map(|(i, m)| m.then_some(i as u32)).collect()
    }
}

/// Exact match on a typed column parses the literal once and compares cell
/// buckets, allocation-free per row. The canonical string form round-trips
/// through parsing, so a literal that fails to parse or does not re-format
/// to itself matches no row.
fn filter_cells<T: Cell>(col: &PrimitiveColumn<T>, mask: &mut [bool], spec: &FilterSpec) {
    let cells = col.cells();
    match spec {
        FilterSpec::Exact(literal) => {
            let canonical = T::parse(literal).ok().filter(|v| v.format(col.cell_format()) == *literal);
            let Some(wanted) = canonical.map(Cell::bucket) else {
                mask.fill(false);
                return;
            };
            for (i, m) in mask.iter_mut().enumerate() {
                if *m && cells.get(i).map(|v| v.bucket()) != Some(wanted.clone()) {
                    *m = false;
                }
            }
        }
        FilterSpec::Substring(needle) => {
            for (i, m) in mask.iter_mut().enumerate() {
                if *m && !cells.get(i).is_some_and(|v| v.format(col.cell_format()).to_lowercase().contains(needle)) {
                    *m = false;
                }
            }
        }
    }
}

fn filter_strings(col: &StringColumn, mask: &mut [bool], spec: &FilterSpec) {
    let cells = col.cells();
    match spec {
        FilterSpec::Exact(literal) => {
            for (i, m) in mask.iter_mut().enumerate() {
                if *m && cells.get(i).map(String::as_str) != Some(literal.as_str()) {
                    *m = false;
                }
            }
        }
        FilterSpec::Substring(needle) => {
            for (i, m) in mask.iter_mut().enumerate() {
                if *m && !cells.get(i).is_some_and(|v| v.to_lowercase().contains(needle)) {
                    *m = false;
                }
            }
        }
    }
}

/// Virtual columns go through their string form; an evaluation error clears
/// the bit.
fn filter_virtual(string_of: impl Fn(u32) -> Option<String>, mask: &mut [bool], spec: &FilterSpec) {
    match spec {
        FilterSpec::Exact(literal) => {
            for (i, m) in mask.iter_mut().enumerate() {
                if *m && string_of(i as u32).as_deref() != Some(literal.as_str()) {
                    *m = false;
                }
            }
        }
        FilterSpec::Substring(needle) => {
            for (i, m) in mask.iter_mut().enumerate() {
                if *m && !string_of(i as u32).is_some_and(|s| s.to_lowercase().contains(needle)) {
                    *m = false;
                }
            }
        }
    }
}

fn filter_computed(col: &ComputedColumn, mask: &mut [bool], spec: &FilterSpec) { filter_virtual(|i| col.string(i).ok(), mask, spec) }

fn filter_joined(col: &JoinedColumn, mask: &mut [bool], spec: &FilterSpec) { filter_virtual(|i| col.string(i).ok(), mask, spec) }
