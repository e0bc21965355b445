//! Table projection: columns, client-side sort and page windowing

pub mod columns;
pub mod view;

pub use columns::{ColumnKind, TableColumn, build_columns};
pub use view::{NumberedRow, SortDirection, TablePage, TableViewState, compare_cells};
