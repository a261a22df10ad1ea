//! Provider data structure passed to resources and data sources

use crate::api::{Client, ReferenceTablesApi};
use std::sync::Arc;

#[derive(Clone)]
pub struct DatadogProviderData {
    pub client: Arc<dyn ReferenceTablesApi>,
}

impl DatadogProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Wraps any implementation of the reference tables API
    pub fn with_api(api: Arc<dyn ReferenceTablesApi>) -> Self {
        Self { client: api }
    }
}
