use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::column::{Column, ColumnDef, ComposedJoiner, ComputedColumn, Joiner};
use crate::error::ViewError;
use crate::filter::FilterSpec;
use crate::group::{self, GroupRequest, GroupTree};
use crate::sort::{top_k_by, SortKey};
use crate::table::Table;

/// Supplies join objects and related tables when a view materializes its
/// joined columns. Join keys are `fromTable.fromCol->toTable.toCol`. The
/// core never inspects join geometry beyond [`Joiner::lookup`].
pub trait Resolver {
    fn join(&self, key: &str) -> Option<Arc<dyn Joiner>>;
    fn table(&self, name: &str) -> Option<Arc<Table>>;
}

/// A per-request composition layer over a shared base table: visible
/// columns, joined and computed columns, the filter mask, the group tree,
/// and the sort order. Cheap to clone; the base columns are shared.
#[derive(Debug, Clone)]
pub struct TableView {
    table: Arc<Table>,
    visible: Vec<String>,
    joined: HashMap<String, Arc<Column>>,
    computed: HashMap<String, Arc<Column>>,
    mask: Option<Vec<bool>>,
    grouping: Option<GroupTree>,
    sort: Vec<SortKey>,
}

impl TableView {
    pub fn new(table: Arc<Table>) -> Self {
        let visible = table.column_names().iter().map(|s| s.to_string()).collect();
        Self { table, visible, joined: HashMap::new(), computed: HashMap::new(), mask: None, grouping: None, sort: Vec::new() }
    }

    pub fn table(&self) -> &Arc<Table> { &self.table }

    pub fn len(&self) -> u32 { self.table.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn visible_columns(&self) -> &[String] { &self.visible }

    pub fn set_visible_columns(&mut self, visible: Vec<String>) { self.visible = visible }

    /// Register a computed column. The closure must cover `[0, len)` of the
    /// base table.
    pub fn add_computed_column(&mut self, column: ComputedColumn) {
        self.computed.insert(column.def().name.clone(), Arc::new(Column::Computed(column)));
    }

    /// Lookup order: base table (with its join-projected columns), then the
    /// view's joined columns, then computed columns.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.table
            .column(name)
            .or_else(|| self.joined.get(name))
            .or_else(|| self.computed.get(name))
            .map(Arc::as_ref)
    }

    pub fn column_arc(&self, name: &str) -> Option<Arc<Column>> {
        self.table.column(name).or_else(|| self.joined.get(name)).or_else(|| self.computed.get(name)).cloned()
    }

    /// Reconcile the view's joined columns with the visible set: a visible
    /// name containing a dot is a join path (`fk.Table.key[.fk2.Table2.key2…].col`);
    /// missing joined columns are built through the resolver, and joined
    /// columns whose path is no longer visible are dropped.
    pub fn update_joined_columns(&mut self, visible: Vec<String>, resolver: &dyn Resolver) -> Result<(), ViewError> {
        for name in &visible {
            if name.contains('.') && !self.joined.contains_key(name) {
                let column = self.build_joined_column(name, resolver)?;
                self.joined.insert(name.clone(), Arc::new(column));
            }
        }
        self.joined.retain(|name, _| visible.iter().any(|v| v == name));
        self.visible = visible;
        Ok(())
    }

    /// A join path is hops of `(fromCol, toTable, toCol)` followed by the
    /// projected column; each hop resolves one joiner and multi-hop paths
    /// compose them.
    fn build_joined_column(&self, path: &str, resolver: &dyn Resolver) -> Result<Column, ViewError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.len() < 4 || (segments.len() - 1) % 3 != 0 {
            return Err(ViewError::InvalidJoinPath(path.to_string()));
        }
        let hops = (segments.len() - 1) / 3;
        let mut joiners: Vec<Arc<dyn Joiner>> = Vec::with_capacity(hops);
        let mut from_table = self.table.name().to_string();
        let mut target_table = "";
        for hop in 0..hops {
            let from_col = segments[3 * hop];
            let to_table = segments[3 * hop + 1];
            let to_col = segments[3 * hop + 2];
            let key = format!("{from_table}.{from_col}->{to_table}.{to_col}");
            joiners.push(resolver.join(&key).ok_or(ViewError::UnknownJoin(key))?);
            from_table = to_table.to_string();
            target_table = to_table;
        }
        let table = resolver.table(target_table).ok_or_else(|| ViewError::UnknownTable(target_table.to_string()))?;
        let projected = segments[segments.len() - 1];
        let source = table.column(projected).ok_or_else(|| ViewError::UnknownColumn(projected.to_string()))?.clone();

        let def = ColumnDef::new(path, path, source.def().entity_type.clone())?;
        let joiner = if joiners.len() == 1 { joiners.remove(0) } else { Arc::new(ComposedJoiner::new(joiners)) as Arc<dyn Joiner> };
        Ok(Column::create_joined(&source, def, joiner, self.table.len()))
    }

    /// Rebuild the row bitmap from scratch: all rows pass, then one
    /// narrowing pass per filtered column.
    pub fn apply_filters(&mut self, filters: &HashMap<String, String>) -> Result<(), ViewError> {
        let mut mask = vec![true; self.table.len() as usize];
        for (name, raw) in filters {
            let column = self.column(name).ok_or_else(|| ViewError::UnknownColumn(name.clone()))?;
            column.apply_filter(&mut mask, &FilterSpec::parse(raw));
        }
        self.mask = Some(mask);
        Ok(())
    }

    pub fn clear_filters(&mut self) { self.mask = None }

    /// Rows currently passing the filter, ascending by row index.
    pub fn filtered_indices(&self) -> Vec<u32> {
        match &self.mask {
            None => (0..self.table.len()).collect(),
            Some(mask) => mask.iter().enumerate().filter_map(|(i, m)| m.then_some(i as u32)).collect(),
        }
    }

    pub fn group_table(&mut self, request: &GroupRequest) -> Result<&GroupTree, ViewError> {
        let request = GroupRequest { limit: None, ..request.clone() };
        self.group_with(request, &CancelToken::new())
    }

    /// Grouping with per-block top-K truncation and cooperative
    /// cancellation, for high-cardinality columns.
    pub fn group_table_with_limit(&mut self, request: &GroupRequest, limit: usize, cancel: &CancelToken) -> Result<&GroupTree, ViewError> {
        let request = GroupRequest { limit: Some(limit), ..request.clone() };
        self.group_with(request, cancel)
    }

    fn group_with(&mut self, request: GroupRequest, cancel: &CancelToken) -> Result<&GroupTree, ViewError> {
        let indices = self.filtered_indices();
        let tree = group::build(self, &indices, &request, cancel)?;
        Ok(self.grouping.insert(tree))
    }

    pub fn grouping(&self) -> Option<&GroupTree> { self.grouping.as_ref() }

    pub fn clear_grouping(&mut self) { self.grouping = None }

    pub fn set_sort(&mut self, sort: Vec<SortKey>) { self.sort = sort }

    pub fn sort(&self) -> &[SortKey] { &self.sort }

    /// Filtered indices ordered by the multi-column comparator, truncated
    /// to the `limit` best via bounded-heap selection.
    pub fn sorted_filtered_indices(&self, order: &[SortKey], limit: Option<usize>) -> Result<Vec<u32>, ViewError> {
        let mut indices = self.filtered_indices();
        if order.is_empty() {
            indices.truncate(limit.unwrap_or(indices.len()));
            return Ok(indices);
        }
        let keys: Vec<(&Column, bool)> = order
            .iter()
            .map(|k| self.column(&k.column).map(|c| (c, k.descending)).ok_or_else(|| ViewError::UnknownColumn(k.column.clone())))
            .collect::<Result<_, _>>()?;
        let k = limit.unwrap_or(indices.len());
        top_k_by(&mut indices, k, |&a, &b| compare_rows(&keys, a, b));
        Ok(indices)
    }
}

/// First non-equal key wins, reversed for descending keys; full ties break
/// by row index so the output is deterministic.
fn compare_rows(keys: &[(&Column, bool)], a: u32, b: u32) -> Ordering {
    for (column, descending) in keys {
        let ordering = column.compare(a, b);
        let ordering = if *descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{KeyJoiner, MapJoiner};
    use crate::value::{ColumnType, Value};

    fn column_of(name: &str, entity: &str, column_type: ColumnType, tokens: &[&str]) -> Column {
        let mut col = Column::new(ColumnDef::new(name, name, entity).unwrap(), column_type);
        for t in tokens {
            col.append_str(t).unwrap();
        }
        col.finalize();
        col
    }

    fn orders_table() -> Arc<Table> {
        let mut t = Table::new("Orders");
        t.add_column(column_of("id", "order", ColumnType::Uint32, &["1", "2", "3", "4"])).unwrap();
        t.add_column(column_of("customer_id", "", ColumnType::Uint32, &["10", "11", "10", "99"])).unwrap();
        t.add_column(column_of("amount", "", ColumnType::Int64, &["5", "17", "2", "9"])).unwrap();
        Arc::new(t)
    }

    fn customers_table() -> Arc<Table> {
        let mut t = Table::new("Customers");
        t.add_column(column_of("id", "customer", ColumnType::Uint32, &["10", "11"])).unwrap();
        t.add_column(column_of("name", "", ColumnType::String, &["Ada", "Grace"])).unwrap();
        t.add_column(column_of("region_id", "", ColumnType::Uint32, &["7", "8"])).unwrap();
        Arc::new(t)
    }

    fn regions_table() -> Arc<Table> {
        let mut t = Table::new("Regions");
        t.add_column(column_of("id", "region", ColumnType::Uint32, &["7", "8"])).unwrap();
        t.add_column(column_of("city", "", ColumnType::String, &["North", "South"])).unwrap();
        Arc::new(t)
    }

    struct FixtureResolver {
        tables: HashMap<String, Arc<Table>>,
        joins: HashMap<String, Arc<dyn Joiner>>,
    }

    impl FixtureResolver {
        fn new() -> Self {
            let orders = orders_table();
            let customers = customers_table();
            let regions = regions_table();
            let mut joins: HashMap<String, Arc<dyn Joiner>> = HashMap::new();
            joins.insert(
                "Orders.customer_id->Customers.id".to_string(),
                Arc::new(KeyJoiner::new(orders.column("customer_id").unwrap().clone(), customers.column("id").unwrap().clone())),
            );
            joins.insert(
                "Customers.region_id->Regions.id".to_string(),
                Arc::new(KeyJoiner::new(customers.column("region_id").unwrap().clone(), regions.column("id").unwrap().clone())),
            );
            let mut tables = HashMap::new();
            tables.insert("Orders".to_string(), orders);
            tables.insert("Customers".to_string(), customers);
            tables.insert("Regions".to_string(), regions);
            Self { tables, joins }
        }
    }

    impl Resolver for FixtureResolver {
        fn join(&self, key: &str) -> Option<Arc<dyn Joiner>> { self.joins.get(key).cloned() }

        fn table(&self, name: &str) -> Option<Arc<Table>> { self.tables.get(name).cloned() }
    }

    #[test]
    fn joined_columns_follow_visibility() {
        let resolver = FixtureResolver::new();
        let mut view = TableView::new(resolver.table("Orders").unwrap());

        let path = "customer_id.Customers.id.name".to_string();
        view.update_joined_columns(vec!["id".into(), path.clone()], &resolver).unwrap();
        assert_eq!(view.column(&path).unwrap().string(0).unwrap(), "Ada");
        assert_eq!(view.column(&path).unwrap().string(1).unwrap(), "Grace");
        // row 3 references customer 99, which does not exist
        assert!(view.column(&path).unwrap().string(3).is_err());

        view.update_joined_columns(vec!["id".into()], &resolver).unwrap();
        assert!(view.column(&path).is_none());
    }

    #[test]
    fn multi_hop_paths_compose() {
        let resolver = FixtureResolver::new();
        let mut view = TableView::new(resolver.table("Orders").unwrap());
        let path = "customer_id.Customers.id.region_id.Regions.id.city".to_string();
        view.update_joined_columns(vec![path.clone()], &resolver).unwrap();
        assert_eq!(view.column(&path).unwrap().string(0).unwrap(), "North");
        assert_eq!(view.column(&path).unwrap().string(1).unwrap(), "South");
        assert!(view.column(&path).unwrap().string(3).is_err());
    }

    #[test]
    fn malformed_paths_are_rejected() {
        let resolver = FixtureResolver::new();
        let mut view = TableView::new(resolver.table("Orders").unwrap());
        let err = view.update_joined_columns(vec!["a.b".into()], &resolver);
        assert_eq!(err, Err(ViewError::InvalidJoinPath("a.b".into())));
        let err = view.update_joined_columns(vec!["x.Customers.id.name".into()], &resolver);
        assert!(matches!(err, Err(ViewError::UnknownJoin(_))));
    }

    #[test]
    fn filters_narrow_the_index_set() {
        let resolver = FixtureResolver::new();
        let mut view = TableView::new(resolver.table("Orders").unwrap());
        assert_eq!(view.filtered_indices(), vec![0, 1, 2, 3]);

        let filters = HashMap::from([("customer_id".to_string(), "\"10\"".to_string())]);
        view.apply_filters(&filters).unwrap();
        assert_eq!(view.filtered_indices(), vec![0, 2]);

        view.clear_filters();
        assert_eq!(view.filtered_indices().len(), 4);
    }

    #[test]
    fn unknown_filter_column_errors() {
        let resolver = FixtureResolver::new();
        let mut view = TableView::new(resolver.table("Orders").unwrap());
        let filters = HashMap::from([("nope".to_string(), "x".to_string())]);
        assert_eq!(view.apply_filters(&filters), Err(ViewError::UnknownColumn("nope".into())));
    }

    #[test]
    fn sorted_indices_respect_order_and_limit() {
        let resolver = FixtureResolver::new();
        let view = TableView::new(resolver.table("Orders").unwrap());
        let order = vec![SortKey::asc("amount")];
        assert_eq!(view.sorted_filtered_indices(&order, None).unwrap(), vec![2, 0, 3, 1]);
        assert_eq!(view.sorted_filtered_indices(&order, Some(2)).unwrap(), vec![2, 0]);
        let order = vec![SortKey::desc("amount")];
        assert_eq!(view.sorted_filtered_indices(&order, Some(1)).unwrap(), vec![1]);
    }

    #[test]
    fn ties_break_by_row_index() {
        let resolver = FixtureResolver::new();
        let view = TableView::new(resolver.table("Orders").unwrap());
        let order = vec![SortKey::asc("customer_id")];
        assert_eq!(view.sorted_filtered_indices(&order, None).unwrap(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn computed_columns_resolve_after_base() {
        let resolver = FixtureResolver::new();
        let mut view = TableView::new(resolver.table("Orders").unwrap());
        let amounts = view.column_arc("amount").unwrap();
        let len = view.len();
        view.add_computed_column(ComputedColumn::new(
            ColumnDef::named("amount_doubled").unwrap(),
            len,
            ColumnType::Int64,
            Arc::new(move |i| Ok(Value::Int64(match amounts.value(i)? {
                Value::Int64(n) => n * 2,
                _ => 0,
            }))),
        ));
        assert_eq!(view.column("amount_doubled").unwrap().string(1).unwrap(), "34");
    }

    #[test]
    fn joiner_miss_values_error_but_filtering_goes_on() {
        let resolver = FixtureResolver::new();
        let mut view = TableView::new(resolver.table("Orders").unwrap());
        let path = "customer_id.Customers.id.name".to_string();
        view.update_joined_columns(vec![path.clone()], &resolver).unwrap();
        let filters = HashMap::from([(path.clone(), "a".to_string())]);
        view.apply_filters(&filters).unwrap();
        // Ada and Grace both contain "a"; the missed row 3 never matches
        assert_eq!(view.filtered_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn map_joiner_backed_view() {
        let resolver = FixtureResolver::new();
        let orders = resolver.table("Orders").unwrap();
        let customers = resolver.table("Customers").unwrap();
        let source = customers.column("name").unwrap();
        let joined = Column::create_joined(source, ColumnDef::named("who").unwrap(), Arc::new(MapJoiner::from_pairs([(0, 1)])), orders.len());
        assert_eq!(joined.string(0).unwrap(), "Grace");
    }
}
