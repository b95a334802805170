//! Error handling for the backend module

use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the checker backend, e.g. `{"error": "Invalid request ID"}`.
#[derive(Deserialize)]
struct RawError {
    error: String,
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// Reqwest error, typically a connection failure or a timeout.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP error with status {status}: {message}")]
    Http { status: u16, message: String },

    /// A required field was missing from an otherwise successful response.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    pub async fn from_response(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response text".to_string());

        BackendError::Http {
            status,
            message: Self::extract_message(body),
        }
    }

    /// Prefer the `error` field of a JSON body over the raw text.
    fn extract_message(body: String) -> String {
        match serde_json::from_str::<RawError>(&body) {
            Ok(parsed) => parsed.error,
            Err(_) => body,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }

    /// HTTP status of the failure, if the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // The `error` field of a JSON body becomes the message.
    fn test_extract_message_from_json_body() {
        let message = BackendError::extract_message(r#"{"error": "Invalid request ID"}"#.to_string());
        assert_eq!(message, "Invalid request ID");
    }

    #[test]
    // Bodies that are not the expected JSON shape are kept verbatim.
    fn test_extract_message_keeps_plain_text() {
        let message = BackendError::extract_message("Internal Server Error".to_string());
        assert_eq!(message, "Internal Server Error");
    }
}
