//! Failure taxonomy exposed to callers of the gateway

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Shown when the server gave no usable message
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors returned by `ApiClient`
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authorization failed and could not be recovered by a token refresh
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The server could not process the bearer token itself; stored tokens were cleared
    #[error("Invalid credential: {message}")]
    MalformedToken { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Request rejected by server-side validation
    #[error("Validation failed ({status}): {message}")]
    Validation {
        status: StatusCode,
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Server error ({status}): {message}")]
    Server { status: StatusCode, message: String },

    #[error("Unexpected response ({status}): {message}")]
    Unexpected { status: StatusCode, message: String },

    /// No response was received at all
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request description could not be turned into an HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Map a non-success status and its parsed body onto the taxonomy
    pub(crate) fn from_failure(status: StatusCode, body: ErrorBody) -> Self {
        let message = body.message.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { message },
            StatusCode::FORBIDDEN => ApiError::Forbidden { message },
            StatusCode::NOT_FOUND => ApiError::NotFound { message },
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation {
                    status,
                    message,
                    fields: body.fields,
                }
            }
            s if s.is_server_error() => ApiError::Server { status, message },
            _ => ApiError::Unexpected { status, message },
        }
    }

    /// Errors that should send the user back to the login screen
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::MalformedToken { .. }
        )
    }

    /// Errors worth offering a "try again" for
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server { .. })
    }

    /// HTTP status of the failed response, if one was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::MalformedToken { .. } => Some(StatusCode::UNPROCESSABLE_ENTITY),
            ApiError::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ApiError::Validation { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::Unexpected { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => None,
        }
    }

    /// The server-provided message, if any
    pub fn server_message(&self) -> Option<&str> {
        let message = match self {
            ApiError::Unauthorized { message }
            | ApiError::MalformedToken { message }
            | ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::Validation { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Unexpected { message, .. } => message.as_str(),
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::InvalidRequest(_) => {
                return None;
            }
        };
        (!message.is_empty()).then_some(message)
    }

    /// Text to show next to a form or in an error banner
    pub fn user_message(&self) -> &str {
        self.server_message().unwrap_or(GENERIC_ERROR_MESSAGE)
    }

    /// Per-field validation messages; `None` for every other kind of failure
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ApiError::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

/// Error body as sent by the API: `{"error": ...}` from route handlers,
/// `{"msg": ...}` from the token layer, optionally with `{"errors": {field: message}}`.
#[derive(Debug, Default, Clone)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    pub fields: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawErrorBody {
    error: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, serde_json::Value>>,
}

impl ErrorBody {
    pub fn parse(raw: &[u8]) -> Self {
        let Ok(body) = serde_json::from_slice::<RawErrorBody>(raw) else {
            return Self::default();
        };

        let fields = body
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|(field, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Array(items) => items
                        .iter()
                        .filter_map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                    other => other.to_string(),
                };
                (field, text)
            })
            .collect();

        Self {
            message: body.error.or(body.msg).or(body.message),
            fields,
        }
    }

    /// Whether the body carries structured per-field errors
    pub fn has_field_errors(&self) -> bool {
        !self.fields.is_empty()
    }
}
