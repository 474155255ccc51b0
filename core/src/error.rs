//! Error types for the daybook API client.
//!
//! # Design
//! Transport failures (the request never produced a response) are kept apart
//! from status failures (the backend answered with a non-2xx code) so callers
//! can tell a dead network from a rejected request, but both reach the caller
//! through the same `ApiError`. The facade logs each one once and hands it
//! back untouched; nothing here retries or substitutes a value.

use std::time::Duration;

use thiserror::Error;

use crate::config::ApiVersion;

/// The request never produced an HTTP response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Errors returned by `ApiClient` parse methods and every `DaybookApi` call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// A typed request payload could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A 2xx response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The facade was built from a configuration that cannot work.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The operation is not part of the configured endpoint surface.
    #[error("{operation} requires API {required}, client is configured for {configured}")]
    Unsupported {
        operation: &'static str,
        required: ApiVersion,
        configured: ApiVersion,
    },
}

impl ApiError {
    /// Status code of the backend response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport(TransportError::Timeout(_)))
    }
}

/// Errors raised while loading `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors raised by a `KeyValueStore` write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
