//! Error types for the API client.

use crate::transport::TransportError;

/// Errors that can occur when making API requests or decoding their responses.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The transport could not reach the endpoint (connection refused, timeout).
    #[error("Service unavailable")]
    ServiceUnavailable {
        #[source]
        cause: TransportError,
    },
    /// The body is not valid JSON, or has a shape the decoder cannot interpret.
    #[error("Malformed response: {reason}")]
    MalformedResponse {
        reason: String,
        #[source]
        cause: Option<serde_json::Error>,
    },
    /// The API answered 401 and the caller did not handle it.
    #[error("Unauthorized request: {status} - {body}")]
    UnauthorizedRequest { status: u16, body: String },
    /// The API answered a non-success status the caller did not handle.
    #[error("Unexpected response: {status} - {body}")]
    UnexpectedResponse { status: u16, body: String },
    /// Decoding was requested into an entity type with no registered mapping.
    #[error("Unknown object type: {0}")]
    UnknownObjectType(String),
    /// The expanded URL template is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A transport failure other than a connectivity failure.
    #[error("Transport failure")]
    Transport(#[source] TransportError),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!("Malformed response: {}", reason);
        Error::MalformedResponse {
            reason,
            cause: None,
        }
    }

    pub(crate) fn invalid_json(cause: serde_json::Error, body: &str) -> Self {
        tracing::error!(
            "Failed to parse response: {} | body: {}",
            cause,
            truncate_body(body)
        );
        Error::MalformedResponse {
            reason: "body is not valid JSON".to_string(),
            cause: Some(cause),
        }
    }

    /// Returns the HTTP status carried by a classified status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnauthorizedRequest { status, .. } | Error::UnexpectedResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Caps a response body for diagnostics, cutting on a char boundary.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
