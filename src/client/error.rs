//! # Proxy Client Errors
//!
//! Failures raised while talking to the Prefect proxy. The display strings are
//! what callers surface to users, so a transport failure always reads
//! `connection error` and a rejected request reads as the proxy's response body.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// The request never produced a response (DNS, refused connection, timeout).
    #[error("connection error")]
    Connection(#[source] reqwest::Error),

    /// The proxy answered with a non-2xx status.
    #[error("{body}")]
    Status { status_code: u16, body: String },

    /// A 2xx response whose body could not be decoded.
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl HttpError {
    pub fn status(status_code: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status_code,
            body: body.into(),
        }
    }

    pub fn invalid_response(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status of a rejected request, if the proxy answered at all.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Connection(_) => true,
            HttpError::Status { status_code, .. } => *status_code >= 500 || *status_code == 429,
            HttpError::InvalidResponse { .. } => false,
        }
    }
}
