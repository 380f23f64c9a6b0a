use std::collections::HashMap;
use std::sync::Arc;

use strata::core::column::KeyJoiner;
use strata::core::view::Resolver;
use strata::{Column, ColumnType, Joiner, Table};
use strata_import::{import_str, ColumnAnnotation, ImportOptions};

pub const ORDERS_CSV: &str = "\
id,customer_id,status,region,amount,placed_at,handling_time
1,10,Active,North,5,1704067200,2h
2,11,Active,South,17,1704153600,30m
3,10,Inactive,North,2,1704240000,45m
4,10,Active,North,9,1704326400,1h30m
5,11,Inactive,South,4,1704412800,10m
6,99,Active,East,1,1704499200,5m
";

pub const CUSTOMERS_CSV: &str = "\
id,name,region_id
10,Ada,7
11,Grace,8
";

pub const REGIONS_CSV: &str = "\
id,city
7,North
8,South
";

pub fn orders_table() -> Arc<Table> {
    let annotations = HashMap::from([
        ("id".to_string(), ColumnAnnotation::entity("order")),
        ("amount".to_string(), ColumnAnnotation::typed(ColumnType::Int64)),
        ("placed_at".to_string(), ColumnAnnotation::typed(ColumnType::Datetime)),
        ("handling_time".to_string(), ColumnAnnotation::typed(ColumnType::Duration)),
    ]);
    Arc::new(import_str("Orders", ORDERS_CSV, &ImportOptions::default(), &annotations).expect("orders fixture imports"))
}

pub fn customers_table() -> Arc<Table> {
    let annotations = HashMap::from([("id".to_string(), ColumnAnnotation::entity("customer"))]);
    Arc::new(import_str("Customers", CUSTOMERS_CSV, &ImportOptions::default(), &annotations).expect("customers fixture imports"))
}

pub fn regions_table() -> Arc<Table> {
    let annotations = HashMap::from([("id".to_string(), ColumnAnnotation::entity("region"))]);
    Arc::new(import_str("Regions", REGIONS_CSV, &ImportOptions::default(), &annotations).expect("regions fixture imports"))
}

/// Resolver over the three fixture tables with key-backed joins for
/// `Orders.customer_id->Customers.id` and `Customers.region_id->Regions.id`.
pub struct FixtureResolver {
    tables: HashMap<String, Arc<Table>>,
    joins: HashMap<String, Arc<dyn Joiner>>,
}

impl FixtureResolver {
    pub fn new() -> Self {
        let orders = orders_table();
        let customers = customers_table();
        let regions = regions_table();

        let key_join = |local: &Arc<Column>, target: &Arc<Column>| -> Arc<dyn Joiner> { Arc::new(KeyJoiner::new(local.clone(), target.clone())) };
        let joins = HashMap::from([
            (
                "Orders.customer_id->Customers.id".to_string(),
                key_join(orders.column("customer_id").expect("fixture column"), customers.column("id").expect("fixture column")),
            ),
            (
                "Customers.region_id->Regions.id".to_string(),
                key_join(customers.column("region_id").expect("fixture column"), regions.column("id").expect("fixture column")),
            ),
        ]);
        let tables = HashMap::from([
            ("Orders".to_string(), orders),
            ("Customers".to_string(), customers),
            ("Regions".to_string(), regions),
        ]);
        Self { tables, joins }
    }
}

impl Default for FixtureResolver {
    fn default() -> Self { Self::new() }
}

impl Resolver for FixtureResolver {
    fn join(&self, key: &str) -> Option<Arc<dyn Joiner>> { self.joins.get(key).cloned() }

    fn table(&self, name: &str) -> Option<Arc<Table>> { self.tables.get(name).cloned() }
}
