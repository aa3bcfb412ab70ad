//! Error types for lwkit operations

use thiserror::Error;

/// Configuration errors. Fatal: reported once, then the process exits.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Remote API errors, classified by upstream outcome.
///
/// HTTP variants carry the upstream status, reason phrase, and whatever body
/// the service returned so callers can surface the server's own message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Unauthorized (HTTP {status} {reason}): check LW_API_TOKEN")]
    Unauthorized {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Not found (HTTP {status} {reason}): check LW_API_URL")]
    NotFound {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Conflict (HTTP {status} {reason}): {body}")]
    Conflict {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Bad request (HTTP {status} {reason}): {body}")]
    BadRequest {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("HTTP {status} {reason}: {body}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Classify a non-success HTTP status into the matching variant.
    pub fn from_status(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        let reason = reason.into();
        let body = body.into();
        match status {
            400 => Self::BadRequest {
                status,
                reason,
                body,
            },
            401 => Self::Unauthorized {
                status,
                reason,
                body,
            },
            404 => Self::NotFound {
                status,
                reason,
                body,
            },
            409 => Self::Conflict {
                status,
                reason,
                body,
            },
            _ => Self::Http {
                status,
                reason,
                body,
            },
        }
    }

    /// Upstream HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. }
            | Self::NotFound { status, .. }
            | Self::Conflict { status, .. }
            | Self::BadRequest { status, .. }
            | Self::Http { status, .. } => Some(*status),
            Self::Connection(_) | Self::Decode(_) | Self::InvalidRequest(_) => None,
        }
    }

    /// Response body returned with the failure, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { body, .. }
            | Self::NotFound { body, .. }
            | Self::Conflict { body, .. }
            | Self::BadRequest { body, .. }
            | Self::Http { body, .. } => Some(body.as_str()),
            Self::Connection(_) | Self::Decode(_) | Self::InvalidRequest(_) => None,
        }
    }

    /// Returns true if no response was received at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for remote operations.
pub type ApiResult<T> = Result<T, ApiError>;
