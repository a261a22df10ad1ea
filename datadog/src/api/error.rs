use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        errors: Vec<String>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// HTTP status of the failed call, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ApiError { status, .. } => Some(*status),
            ApiError::RequestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
