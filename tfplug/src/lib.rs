//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-facing half of a Terraform plugin framework: dynamic state
//! values, schemas, plan modifiers and the traits that providers, resources
//! and data sources implement. Wire protocol handling lives outside this crate.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod import;
pub mod plan_modifier;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::Provider;
pub use resource::{
    Resource, ResourceWithConfigure, ResourceWithImportState, ResourceWithModifyPlan,
};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue};
