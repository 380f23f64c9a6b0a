pub mod cache;
pub mod cancel;
pub mod column;
pub mod error;
pub mod filter;
pub mod group;
pub mod project;
pub mod sort;
pub mod table;
pub mod value;
pub mod view;

pub use cache::TableViewCache;
pub use cancel::CancelToken;
pub use column::{Column, ColumnDef, ComputedColumn, JoinedColumn, Joiner};
pub use error::{ColumnError, ParseError, TableError, ViewError};
pub use filter::FilterSpec;
pub use group::{AggSpec, Aggregate, GroupCompare, GroupRequest, GroupTree};
pub use project::{GroupedRow, Row, ERROR_LABEL};
pub use sort::SortKey;
pub use table::Table;
pub use value::{ColumnType, Value};
pub use view::{Resolver, TableView};
