//! # API Error Types Module
//!
//! Structured failure kinds for calls made to the backend HTTP API.

/// Failure of a single backend call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, TLS...)
    Network(String),
    /// The backend answered with a non-success status
    Status { status: u16, body: String },
    /// The response body did not have the expected shape
    Decode(String),
    /// The backend rejected submitted data with a validation payload
    Rejected(String),
}

impl ApiError {
    /// Text that may be shown to the user alongside a generic failure message
    pub fn user_detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected(detail) => Some(detail),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {msg}"),
            ApiError::Status { status, body } => write!(f, "Backend returned {status}: {body}"),
            ApiError::Decode(msg) => write!(f, "Decode error: {msg}"),
            ApiError::Rejected(msg) => write!(f, "Rejected: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
