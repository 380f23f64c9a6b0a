//! Row projection: materialize filtered or grouped output as string cells,
//! plus a diagnostic ASCII rendering. One bad cell renders the error label
//! instead of failing the row.

use std::collections::HashMap;

use crate::error::ViewError;
use crate::group::{GroupId, GroupTree};
use crate::sort::SortKey;
use crate::view::TableView;

/// Substituted for any cell whose string rendering fails.
pub const ERROR_LABEL: &str = "#ERR";

pub type Row = HashMap<String, String>;

/// One output row of a grouped projection: the grouped cells that start at
/// this leaf (carrying their rowspan) followed by the leaf's aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub cells: Vec<GroupedCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedCell {
    pub column: String,
    pub text: String,
    /// Rows this cell spans in a tabular rendering; 1 for aggregate cells.
    pub rowspan: usize,
}

impl TableView {
    /// Materialize the filtered rows as `column → string` maps, in
    /// ascending row order, up to `limit`.
    pub fn filtered_rows(&self, cols: &[&str], limit: Option<usize>) -> Result<Vec<Row>, ViewError> {
        let mut indices = self.filtered_indices();
        indices.truncate(limit.unwrap_or(indices.len()));
        self.project(cols, &indices)
    }

    /// Materialize the top-`limit` filtered rows under `order`.
    pub fn filtered_rows_sorted(&self, cols: &[&str], order: &[SortKey], limit: Option<usize>) -> Result<Vec<Row>, ViewError> {
        let indices = self.sorted_filtered_indices(order, limit)?;
        self.project(cols, &indices)
    }

    fn project(&self, cols: &[&str], indices: &[u32]) -> Result<Vec<Row>, ViewError> {
        let resolved = cols
            .iter()
            .map(|name| self.column(name).map(|c| (*name, c)).ok_or_else(|| ViewError::UnknownColumn(name.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = indices
            .iter()
            .map(|&i| {
                resolved
                    .iter()
                    .map(|(name, column)| (name.to_string(), column.string(i).unwrap_or_else(|_| ERROR_LABEL.to_string())))
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    /// Walk the group tree depth-first in block order, emitting one row per
    /// leaf group. Grouped cells appear on the first row of their span with
    /// `rowspan` equal to the group's height.
    pub fn grouped_rows(&self) -> Result<Vec<GroupedRow>, ViewError> {
        let tree = self.grouping().ok_or(ViewError::NoGrouping)?;
        let mut rows = Vec::new();
        let mut pending = Vec::new();
        for &g in &tree.first_block().groups {
            self.emit_group(tree, g, &mut pending, &mut rows)?;
        }
        Ok(rows)
    }

    fn emit_group(&self, tree: &GroupTree, g: GroupId, pending: &mut Vec<GroupedCell>, rows: &mut Vec<GroupedRow>) -> Result<(), ViewError> {
        let group = &tree.groups[g];
        let level = tree.blocks[group.block].level;
        let column_name = &tree.levels[level].column;
        let column = self.column(column_name).ok_or_else(|| ViewError::UnknownColumn(column_name.clone()))?;
        let text = column.string(group.indices[0]).unwrap_or_else(|_| ERROR_LABEL.to_string());
        pending.push(GroupedCell { column: column_name.clone(), text, rowspan: tree.height(g) });

        match group.child_block {
            None => {
                let mut cells = std::mem::take(pending);
                for (spec, value) in tree.aggregates.iter().zip(&group.aggregates) {
                    cells.push(GroupedCell { column: spec.label(), text: value.render(), rowspan: 1 });
                }
                rows.push(GroupedRow { cells });
            }
            Some(b) => {
                for &child in &tree.blocks[b].groups {
                    self.emit_group(tree, child, pending, rows)?;
                }
                if tree.blocks[b].groups.is_empty() {
                    // every child row was unmapped away; this group renders nothing
                    pending.pop();
                }
            }
        }
        Ok(())
    }

    /// Diagnostic text rendering: the grouped tree when a grouping is set,
    /// otherwise the visible columns over the filtered rows. Spanned cells
    /// are blank on continuation rows.
    pub fn ascii_table(&self) -> Result<String, ViewError> {
        match self.grouping() {
            Some(tree) => {
                let mut header: Vec<String> = tree.levels.iter().map(|l| l.column.clone()).collect();
                header.extend(tree.aggregates.iter().map(|s| s.label()));
                let grouped = self.grouped_rows()?;
                let matrix: Vec<Vec<String>> = grouped
                    .iter()
                    .map(|row| {
                        header
                            .iter()
                            .map(|col| row.cells.iter().find(|c| &c.column == col).map(|c| c.text.clone()).unwrap_or_default())
                            .collect()
                    })
                    .collect();
                Ok(render_ascii(&header, &matrix))
            }
            None => {
                let cols: Vec<&str> = self.visible_columns().iter().map(String::as_str).collect();
                let rows = self.filtered_rows(&cols, None)?;
                let header: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
                let matrix: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| header.iter().map(|col| row.get(col).cloned().unwrap_or_default()).collect())
                    .collect();
                Ok(render_ascii(&header, &matrix))
            }
        }
    }
}

fn render_ascii(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }
    let render_row = |cells: &[String]| {
        let padded: Vec<String> = cells.iter().zip(&widths).map(|(c, &w)| format!("{:<w$}", c, w = w)).collect();
        format!("| {} |", padded.join(" | "))
    };
    let separator = format!("|{}|", widths.iter().map(|w| "-".repeat(w + 2)).collect::<Vec<_>>().join("|"));
    let mut out = String::new();
    out.push_str(&render_row(header));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}
