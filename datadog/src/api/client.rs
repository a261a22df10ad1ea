use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::common::{ApiErrorResponse, HttpResponse};
use super::error::ApiError;

pub const DEFAULT_API_URL: &str = "https://api.datadoghq.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "DD-API-KEY";
const APP_KEY_HEADER: &str = "DD-APPLICATION-KEY";

/// Datadog API client
///
/// Every call is a single attempt. Retrying is left to whoever owns the
/// operation, since a retried create can leave a duplicate table behind.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    app_key: String,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: String,
    pub app_key: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: &str, api_key: &str, app_key: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            app_key: app_key.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Client {
    /// Create a new API client with the default timeout
    pub fn new(api_url: &str, api_key: &str, app_key: &str) -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::new(api_url, api_key, app_key))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        let parsed = Url::parse(&config.api_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ApiError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                config.api_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("terraform-provider-datadog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                api_key: config.api_key,
                app_key: config.app_key,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<HttpResponse<T>, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("GET request to: {}", url);

        let response = self.send(self.inner.http_client.get(&url), path).await?;
        Self::parse_success_response(response).await
    }

    /// Execute a POST request with a JSON body and decode the JSON reply
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpResponse<T>, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("POST request to: {}", url);

        let request = self
            .inner
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        let response = self.send(request, path).await?;
        Self::parse_success_response(response).await
    }

    /// Execute a PATCH request whose reply carries no body worth decoding
    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<u16, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("PATCH request to: {}", url);

        let request = self
            .inner
            .http_client
            .patch(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        let response = self.send(request, path).await?;
        Ok(response.status().as_u16())
    }

    /// Execute a DELETE request
    pub async fn delete(&self, path: &str) -> Result<u16, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("DELETE request to: {}", url);

        let response = self
            .send(self.inner.http_client.delete(&url), path)
            .await?;
        Ok(response.status().as_u16())
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request
            .header(API_KEY_HEADER, &self.inner.api_key)
            .header(APP_KEY_HEADER, &self.inner.app_key)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("{} responded with {}", path, status);

        if status.is_success() {
            Ok(response)
        } else {
            Err(Self::handle_error_response(response).await)
        }
    }

    async fn parse_success_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<HttpResponse<T>, ApiError> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        tracing::trace!("API response body: {}", text);

        match serde_json::from_str::<T>(&text) {
            Ok(body) => Ok(HttpResponse { status, body }),
            Err(e) => {
                tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
                Err(ApiError::ParseError(e.to_string()))
            }
        }
    }

    async fn handle_error_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let errors = serde_json::from_str::<ApiErrorResponse>(&text)
            .map(|body| body.errors)
            .unwrap_or_default();
        let message = if errors.is_empty() {
            text
        } else {
            errors.join("; ")
        };

        ApiError::ApiError {
            status,
            message,
            errors,
        }
    }
}
