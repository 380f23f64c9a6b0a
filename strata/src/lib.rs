pub use strata_core as core;
pub use strata_import as import;

pub use strata_core::cache::TableViewCache;
pub use strata_core::cancel::CancelToken;
pub use strata_core::column::{Column, ColumnDef, Joiner};
pub use strata_core::group::{AggSpec, Aggregate, GroupRequest};
pub use strata_core::sort::SortKey;
pub use strata_core::table::Table;
pub use strata_core::value::{ColumnType, Value};
pub use strata_core::view::{Resolver, TableView};
pub use strata_import::{ColumnAnnotation, ImportOptions};
