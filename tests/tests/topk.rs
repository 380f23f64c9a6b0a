use std::sync::Arc;

use anyhow::Result;

use strata::core::group::GroupRequest;
use strata::{CancelToken, Column, ColumnDef, ColumnType, SortKey, Table, TableView, Value};

fn wide_table(rows: u32) -> Arc<Table> {
    let mut values = Column::new(ColumnDef::named("value").expect("plain name"), ColumnType::Uint32);
    for v in (0..rows).rev() {
        values.append_value(Value::Uint32(v)).expect("build phase append");
    }
    values.finalize();
    let mut table = Table::new("wide");
    table.add_column(values).expect("single column");
    Arc::new(table)
}

#[test]
fn top_k_over_a_million_rows() -> Result<()> {
    let view = TableView::new(wide_table(1_000_000));
    let order = vec![SortKey::asc("value")];
    let top = view.sorted_filtered_indices(&order, Some(100))?;
    assert_eq!(top.len(), 100);
    // values were appended descending, so value v sits at row (len - 1 - v)
    for (rank, &row) in top.iter().enumerate() {
        assert_eq!(row, 999_999 - rank as u32);
    }
    let rows = view.filtered_rows_sorted(&["value"], &order, Some(3))?;
    assert_eq!(rows.iter().map(|r| r["value"].as_str()).collect::<Vec<_>>(), vec!["0", "1", "2"]);
    Ok(())
}

#[test]
fn grouping_limit_truncates_high_cardinality_blocks() -> Result<()> {
    let mut view = TableView::new(wide_table(1_000));
    let cancel = CancelToken::new();
    let tree = view.group_table_with_limit(&GroupRequest::new(["value"]), 10, &cancel)?;
    assert_eq!(tree.first_block().groups.len(), 10);
    assert_eq!(tree.first_block().dropped, 990);
    // the 10 best under ascending value order
    let firsts: Vec<u32> = tree.first_block().groups.iter().map(|&g| tree.groups[g].indices[0]).collect();
    assert_eq!(firsts, (990..1000).rev().collect::<Vec<u32>>());
    Ok(())
}

#[test]
fn cancellation_stops_a_grouping_build() -> Result<()> {
    let mut view = TableView::new(wide_table(1_000));
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = view.group_table_with_limit(&GroupRequest::new(["value"]), 10, &cancel);
    assert!(err.is_err());
    assert!(view.grouping().is_none());
    Ok(())
}
