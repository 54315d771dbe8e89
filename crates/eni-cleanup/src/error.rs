//! Error types for detection and cleanup.
//!
//! Only [`ConfigError`] is ever returned to the caller as a hard failure.
//! [`GatewayError`] is what a provider gateway reports; the detector and
//! orchestrator turn it into a recorded [`eni_types::CleanupError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Structurally invalid input.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field failed validation.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Config file could not be read.
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML for this schema.
    #[error("Failed to parse config: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors reported by a provider gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The interface (or attachment) does not exist.
    #[error("Resource '{id}' not found")]
    NotFound { id: String },

    /// The provider API rejected the call.
    #[error("{operation} failed: {message}")]
    Api {
        /// The operation that failed (e.g., "DeleteNetworkInterface").
        operation: String,
        /// Provider error code, when one was returned.
        code: Option<String>,
        /// Error message.
        message: String,
    },

    /// No usable client for the region.
    #[error("No client for region '{region}': {message}")]
    Client { region: String, message: String },
}

impl GatewayError {
    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an API error without a provider code.
    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Creates an API error carrying the provider's error code.
    pub fn api_with_code(
        operation: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            operation: operation.into(),
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Creates a client construction error.
    pub fn client(region: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Client {
            region: region.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}
