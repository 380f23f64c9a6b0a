mod common;

use std::collections::HashMap;

use anyhow::Result;

use common::FixtureResolver;
use strata::core::group::{AggSpec, Aggregate, GroupRequest};
use strata::core::view::Resolver;
use strata::{SortKey, TableView};

#[test]
fn filter_modes_end_to_end() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));

    // substring is case-insensitive: "active" also matches Inactive rows
    view.apply_filters(&HashMap::from([("status".to_string(), "active".to_string())]))?;
    assert_eq!(view.filtered_indices(), vec![0, 1, 2, 3, 4, 5]);

    view.apply_filters(&HashMap::from([("status".to_string(), "\"Active\"".to_string())]))?;
    assert_eq!(view.filtered_indices(), vec![0, 1, 3, 5]);

    view.apply_filters(&HashMap::from([("status".to_string(), "\"active\"".to_string())]))?;
    assert!(view.filtered_indices().is_empty());

    // filters compose across columns
    view.apply_filters(&HashMap::from([
        ("status".to_string(), "\"Active\"".to_string()),
        ("region".to_string(), "north".to_string()),
    ]))?;
    assert_eq!(view.filtered_indices(), vec![0, 3]);
    Ok(())
}

#[test]
fn grouped_exploration_end_to_end() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));

    let request = GroupRequest::new(["status", "region"])
        .aggregate(AggSpec::new("amount", Aggregate::Sum))
        .aggregate(AggSpec::row_count());
    let tree = view.group_table(&request)?;

    assert_eq!(tree.first_block().groups.len(), 2);
    let active = tree.first_block().groups[0];
    let inactive = tree.first_block().groups[1];
    assert_eq!(tree.height(active), 3);
    assert_eq!(tree.height(inactive), 2);
    assert_eq!(tree.groups[active].aggregates[0].render(), "32");
    assert_eq!(tree.groups[inactive].aggregates[0].render(), "6");
    assert_eq!(tree.groups[active].aggregates[1].render(), "4");

    let rows = view.grouped_rows()?;
    assert_eq!(rows.len(), 5);
    // the first leaf opens both the status and region spans
    assert_eq!(rows[0].cells[0].column, "status");
    assert_eq!(rows[0].cells[0].text, "Active");
    assert_eq!(rows[0].cells[0].rowspan, 3);
    assert_eq!(rows[0].cells[1].text, "East");
    assert_eq!(rows[0].cells[2].text, "1"); // Sum(amount) for the East leaf
    // continuation rows carry only their own level's cell
    assert_eq!(rows[1].cells[0].column, "region");
    assert_eq!(rows[1].cells[0].text, "North");

    let ascii = view.ascii_table()?;
    assert!(ascii.contains("Sum(amount)"));
    assert!(ascii.contains("Active"));
    Ok(())
}

#[test]
fn filtered_grouping_only_sees_passing_rows() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));
    view.apply_filters(&HashMap::from([("status".to_string(), "\"Active\"".to_string())]))?;
    let tree = view.group_table(&GroupRequest::new(["region"]))?;
    // Active rows only: East {5}, North {0,3}, South {1}
    let sizes: Vec<usize> = tree.first_block().groups.iter().map(|&g| tree.groups[g].indices.len()).collect();
    assert_eq!(sizes, vec![1, 2, 1]);
    Ok(())
}

#[test]
fn sorted_projection_renders_strings() -> Result<()> {
    let resolver = FixtureResolver::new();
    let view = TableView::new(resolver.table("Orders").expect("fixture table"));
    let rows = view.filtered_rows_sorted(&["id", "amount", "handling_time"], &[SortKey::desc("amount")], Some(2))?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["amount"], "17");
    assert_eq!(rows[0]["handling_time"], "30m0s");
    assert_eq!(rows[1]["amount"], "9");
    assert_eq!(rows[1]["handling_time"], "1h30m0s");
    Ok(())
}

#[test]
fn datetime_cells_render_canonically() -> Result<()> {
    let resolver = FixtureResolver::new();
    let view = TableView::new(resolver.table("Orders").expect("fixture table"));
    let rows = view.filtered_rows(&["placed_at"], Some(1))?;
    assert_eq!(rows[0]["placed_at"], "2024-01-01 00:00:00");
    Ok(())
}

#[test]
fn duration_aggregates_group_report() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));
    let request = GroupRequest::new(["status"]).aggregate(AggSpec::new("handling_time", Aggregate::Sum)).aggregate(AggSpec::new("handling_time", Aggregate::Max));
    let tree = view.group_table(&request)?;
    let active = tree.first_block().groups[0];
    // 2h + 30m + 1h30m + 5m
    assert_eq!(tree.groups[active].aggregates[0].render(), "4h5m0s");
    assert_eq!(tree.groups[active].aggregates[1].render(), "2h0m0s");
    Ok(())
}
