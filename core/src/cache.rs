use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::view::TableView;

/// Process-wide `table name → view` cache, owned explicitly by the caller
/// (a request router, typically). Entries are inserted once per table
/// lifetime; reads after the first build take no lock on the content.
#[derive(Debug, Default)]
pub struct TableViewCache {
    views: DashMap<String, Arc<TableView>>,
}

impl TableViewCache {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, table: &str) -> Option<Arc<TableView>> { self.views.get(table).map(|v| v.clone()) }

    /// Insert-once: returns false (leaving the existing view) when the
    /// table already has one.
    pub fn insert(&self, table: impl Into<String>, view: TableView) -> bool {
        match self.views.entry(table.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(view));
                true
            }
        }
    }

    pub fn get_or_insert_with(&self, table: impl Into<String>, build: impl FnOnce() -> TableView) -> Arc<TableView> {
        self.views.entry(table.into()).or_insert_with(|| Arc::new(build())).clone()
    }

    pub fn len(&self) -> usize { self.views.len() }

    pub fn is_empty(&self) -> bool { self.views.is_empty() }
}
