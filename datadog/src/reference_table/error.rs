use tfplug::{AttributePath, Diagnostic};
use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum ReferenceTableError {
    #[error("invalid value {value:?} for {path}, expected one of: {}", .allowed.join(", "))]
    InvalidEnumValue {
        path: AttributePath,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("{path} must set exactly one of upload_id or access_details")]
    MissingRequiredUnionVariant { path: AttributePath },

    #[error("either 'id' or 'table_name' must be specified")]
    MissingLookupKey,

    #[error("could not find a reference table with {key} {value:?}")]
    NotFound { key: &'static str, value: String },

    #[error("unexpected status code while {operation}: expected {expected}, got {actual}")]
    UnexpectedStatus {
        operation: &'static str,
        expected: u16,
        actual: u16,
    },

    #[error("response contains unparsed fields: {}", .fields.join(", "))]
    UnparsedResponseField { fields: Vec<String> },

    #[error("response is missing required field {field}")]
    MissingResponseField { field: String },

    #[error("invalid value for {path}: {reason}")]
    InvalidConfiguration { path: AttributePath, reason: String },

    #[error("error {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: ApiError,
    },
}

pub type Result<T> = std::result::Result<T, ReferenceTableError>;

impl ReferenceTableError {
    pub fn not_found_id(id: &str) -> Self {
        Self::NotFound {
            key: "id",
            value: id.to_string(),
        }
    }

    pub fn not_found_name(table_name: &str) -> Self {
        Self::NotFound {
            key: "table_name",
            value: table_name.to_string(),
        }
    }

    pub fn transport(operation: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| Self::Transport { operation, source }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                source: ApiError::Cancelled,
                ..
            }
        )
    }

    /// Attribute the error points at, if it is about a single attribute
    pub fn attribute(&self) -> Option<&AttributePath> {
        match self {
            Self::InvalidEnumValue { path, .. }
            | Self::MissingRequiredUnionVariant { path }
            | Self::InvalidConfiguration { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Converts to a diagnostic. `summary` names the failed operation, except
    /// for response problems, which get a summary of their own.
    pub fn to_diagnostic(&self, summary: &str) -> Diagnostic {
        let summary = match self {
            Self::UnparsedResponseField { .. } => "response contains unparsedObject",
            Self::UnexpectedStatus { .. } => "unexpected status code",
            _ => summary,
        };
        let diagnostic = Diagnostic::error(summary, self.to_string());
        match self.attribute() {
            Some(path) => diagnostic.with_attribute(path.clone()),
            None => diagnostic,
        }
    }
}
