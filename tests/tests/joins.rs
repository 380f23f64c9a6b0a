mod common;

use std::collections::HashMap;

use anyhow::Result;

use common::FixtureResolver;
use strata::core::group::GroupRequest;
use strata::core::project::ERROR_LABEL;
use strata::core::view::Resolver;
use strata::TableView;

const NAME_PATH: &str = "customer_id.Customers.id.name";
const CITY_PATH: &str = "customer_id.Customers.id.region_id.Regions.id.city";

#[test]
fn join_projection_with_misses() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));
    view.update_joined_columns(vec!["id".to_string(), NAME_PATH.to_string()], &resolver)?;

    let col = view.column(NAME_PATH).expect("joined column");
    assert_eq!(col.string(0)?, "Ada");
    assert_eq!(col.string(1)?, "Grace");
    // order 6 references customer 99, which does not exist
    assert!(col.string(5).is_err());

    let rows = view.filtered_rows(&["id", NAME_PATH], None)?;
    assert_eq!(rows[0][NAME_PATH], "Ada");
    assert_eq!(rows[5][NAME_PATH], ERROR_LABEL);
    Ok(())
}

#[test]
fn grouping_by_a_joined_column_elides_misses() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));
    view.update_joined_columns(vec![NAME_PATH.to_string()], &resolver)?;

    let tree = view.group_table(&GroupRequest::new([NAME_PATH]))?;
    // Ada gets orders 1, 3, 4; Grace gets 2 and 5; order 6 is unmapped
    let sizes: Vec<usize> = tree.first_block().groups.iter().map(|&g| tree.groups[g].indices.len()).collect();
    assert_eq!(sizes, vec![3, 2]);
    assert_eq!(tree.first_block().unmapped, vec![5]);
    Ok(())
}

#[test]
fn multi_hop_join_resolves_through_two_tables() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));
    view.update_joined_columns(vec![CITY_PATH.to_string()], &resolver)?;

    let col = view.column(CITY_PATH).expect("joined column");
    assert_eq!(col.string(0)?, "North"); // Ada -> region 7
    assert_eq!(col.string(1)?, "South"); // Grace -> region 8
    assert!(col.string(5).is_err());
    Ok(())
}

#[test]
fn filtering_on_joined_values() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));
    view.update_joined_columns(vec![NAME_PATH.to_string()], &resolver)?;

    view.apply_filters(&HashMap::from([(NAME_PATH.to_string(), "\"Ada\"".to_string())]))?;
    assert_eq!(view.filtered_indices(), vec![0, 2, 3]);
    Ok(())
}

#[test]
fn dropped_paths_release_their_columns() -> Result<()> {
    let resolver = FixtureResolver::new();
    let mut view = TableView::new(resolver.table("Orders").expect("fixture table"));
    view.update_joined_columns(vec![NAME_PATH.to_string(), CITY_PATH.to_string()], &resolver)?;
    assert!(view.column(NAME_PATH).is_some());

    view.update_joined_columns(vec![CITY_PATH.to_string()], &resolver)?;
    assert!(view.column(NAME_PATH).is_none());
    assert!(view.column(CITY_PATH).is_some());
    Ok(())
}
