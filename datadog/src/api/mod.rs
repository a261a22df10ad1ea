pub mod client;
pub mod common;
pub mod error;
pub mod reference_tables;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use common::HttpResponse;
pub use error::ApiError;
pub use reference_tables::ReferenceTablesApi;

use std::future::Future;
use tfplug::Context;

/// Runs a remote call until it completes or `ctx` is cancelled
///
/// A cancelled call is dropped mid-flight and reported as
/// [`ApiError::Cancelled`]; nothing is retried.
pub async fn with_context<T, F>(ctx: &Context, call: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    if ctx.is_cancelled() {
        return Err(ApiError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ApiError::Cancelled),
        result = call => result,
    }
}
