//! Client Errors
//!
//! One error type for all three backend surfaces. Backend-provided message
//! text is preserved verbatim so the UI can show it as-is.

use thiserror::Error;

/// Shown when the backend answers with an error but no usable message text.
pub const FALLBACK_MESSAGE: &str = "Request failed";

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Backend answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },
    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),
    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
    /// Client was built without backend credentials
    #[error("{0}")]
    Config(String),
    /// Operation requires a signed-in session
    #[error("No active session")]
    MissingSession,
}

impl Error {
    /// Human-readable text for the UI's error line.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        Error::Api {
            status,
            message: extract_message(body),
        }
    }
}

impl From<gloo_net::Error> for Error {
    fn from(err: gloo_net::Error) -> Self {
        match err {
            gloo_net::Error::SerdeError(e) => Error::Decode(e.to_string()),
            other => Error::Network(other.to_string()),
        }
    }
}

/// GoTrue and PostgREST disagree on the error field name; try each in turn.
pub(crate) fn extract_message(body: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return FALLBACK_MESSAGE.to_string(),
    };
    for key in ["message", "msg", "error_description", "error"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }
    FALLBACK_MESSAGE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_postgrest_message() {
        let body = r#"{"code":"42501","message":"permission denied for table tasks"}"#;
        assert_eq!(extract_message(body), "permission denied for table tasks");
    }

    #[test]
    fn test_extract_gotrue_variants() {
        assert_eq!(
            extract_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(extract_message(r#"{"msg":"User already registered"}"#), "User already registered");
    }

    #[test]
    fn test_fallback_when_no_message() {
        assert_eq!(extract_message("{}"), FALLBACK_MESSAGE);
        assert_eq!(extract_message("<html>bad gateway</html>"), FALLBACK_MESSAGE);
        assert_eq!(extract_message(r#"{"message":""}"#), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_api_error_displays_backend_text() {
        let err = Error::from_response(401, r#"{"message":"JWT expired"}"#);
        assert_eq!(err.message(), "JWT expired");
    }
}
