//! Resource implementations

pub mod reference_table;

pub use reference_table::ReferenceTableResource;
