//! Common types and utilities for the Datadog API

use serde::Deserialize;

/// A decoded response body together with the HTTP status it arrived with
#[derive(Debug, Clone)]
pub struct HttpResponse<T> {
    pub status: u16,
    pub body: T,
}

/// Datadog error bodies look like `{"errors": ["..."]}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}
