//! Data source implementations

pub mod reference_table;

pub use reference_table::ReferenceTableDataSource;
