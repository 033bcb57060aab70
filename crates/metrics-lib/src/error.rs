//! Error types for the Dynatrace API client
//!
//! Empty results are not errors: no matching entities is an empty list and
//! a metric without data points is a zero range.

use thiserror::Error;

/// Errors that can occur while collecting deployment metrics
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Missing or invalid URL/token, detected before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The API rejected the token (401/403)
    #[error("Authentication failed ({status}) for {endpoint} - check the API token and its scopes")]
    Auth {
        /// HTTP status code
        status: u16,
        /// Endpoint path that was called
        endpoint: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded for {endpoint}")]
    RateLimited {
        /// Endpoint path that was called
        endpoint: String,
    },

    /// Server error
    #[error("Server error ({status}) for {endpoint}: {message}")]
    Server {
        /// HTTP status code (5xx)
        status: u16,
        /// Endpoint path that was called
        endpoint: String,
        /// Error message from the API
        message: String,
    },

    /// Any other non-2xx response
    #[error("API error ({status}) for {endpoint}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Endpoint path that was called
        endpoint: String,
        /// Error message from the API
        message: String,
    },

    /// Network, DNS or timeout failure
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint path that was called
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be decoded
    #[error("Failed to parse response from {endpoint}: {message}")]
    Parse {
        /// Endpoint path that was called
        endpoint: String,
        /// Decoder message
        message: String,
    },
}

impl MetricsError {
    /// Whether this error aborts the whole run rather than a single deployment
    ///
    /// Transport errors only abort while deployments are being listed; once
    /// per-deployment collection has started they skip that deployment.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MetricsError::Configuration(_) | MetricsError::Auth { .. })
    }

    /// HTTP status code, when the error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            MetricsError::Auth { status, .. }
            | MetricsError::Server { status, .. }
            | MetricsError::Api { status, .. } => Some(*status),
            MetricsError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Map a non-2xx status to the matching error variant
    pub(crate) fn from_status(status: u16, endpoint: &str, message: String) -> Self {
        let endpoint = endpoint.to_string();
        match status {
            401 | 403 => MetricsError::Auth { status, endpoint },
            429 => MetricsError::RateLimited { endpoint },
            500..=599 => MetricsError::Server {
                status,
                endpoint,
                message,
            },
            _ => MetricsError::Api {
                status,
                endpoint,
                message,
            },
        }
    }
}

/// Result type alias for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;
