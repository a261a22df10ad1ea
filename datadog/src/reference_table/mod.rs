//! Reference table domain: typed model, wire mapping and remote lifecycle

pub mod error;
pub mod lifecycle;
pub mod lookup;
pub mod mapper;
pub mod model;
pub mod state;

pub use error::{ReferenceTableError, Result};
pub use lifecycle::TableLifecycle;
pub use lookup::{LookupKey, TableLookup};
pub use model::{
    AccessDetails, FieldType, FileMetadata, SchemaField, SourceType, StorageType,
    TableDescriptor, TableSchema,
};
