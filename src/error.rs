//! Error types for tap-hubspot
//!
//! This module defines the error hierarchy for the whole tap.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into two groups. Run-level failures (auth, schema discovery,
//! config, non-recoverable HTTP) abort the sync. Partition-level failures
//! (one association batch, one event type) are logged by the component that
//! hit them and replaced with an empty result.

use thiserror::Error;

/// Marker HubSpot puts in 403 bodies when the token lacks a scope
pub const MISSING_SCOPES_MARKER: &str = "MISSING_SCOPES";

/// The main error type for tap-hubspot
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // HubSpot-specific Errors
    // ============================================================================
    #[error("Property discovery for '{entity}' failed: {message}")]
    UpstreamMetadata { entity: String, message: String },

    #[error("Association batch {from}->{to} failed: {message}")]
    AssociationBatch {
        from: String,
        to: String,
        message: String,
    },

    #[error("Missing scope for '{resource}': {body}")]
    PermissionScope { resource: String, body: String },

    #[error("Transient HTTP failure for '{resource}': {message}")]
    TransientHttp { resource: String, message: String },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("JSONPath error: {message}")]
    JsonPath { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Invalid bookmark value '{value}': {message}")]
    Bookmark { value: String, message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // Stream Errors
    // ============================================================================
    #[error("Connection check failed: {message}")]
    ConnectionCheck { message: String },

    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    #[error("Partition error for stream '{stream}': {message}")]
    Partition { stream: String, message: String },

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a metadata discovery error
    pub fn upstream_metadata(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamMetadata {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a partition error
    pub fn partition(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Partition {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this is a 403 caused by a missing OAuth scope
    pub fn is_permission_scope(&self) -> bool {
        match self {
            Error::PermissionScope { .. } => true,
            Error::HttpStatus { status, body } => {
                *status == 403 || body.contains(MISSING_SCOPES_MARKER)
            }
            _ => false,
        }
    }

    /// Check if this error only affects one partition and may be skipped
    pub fn is_partition_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PermissionScope { .. } | Error::TransientHttp { .. }
        )
    }

    /// Classify an error raised while fetching one partition of a stream.
    ///
    /// Returns `Ok` with the partition-level error when the failure only
    /// affects that partition, `Err` with the original error when it must
    /// abort the run.
    pub fn into_partition_error(self, resource: &str) -> std::result::Result<Error, Error> {
        if self.is_permission_scope() {
            let body = match self {
                Error::HttpStatus { body, .. } | Error::PermissionScope { body, .. } => body,
                other => other.to_string(),
            };
            return Ok(Error::PermissionScope {
                resource: resource.to_string(),
                body,
            });
        }

        match self {
            Error::Auth { .. } | Error::TokenRefresh { .. } => Err(self),
            Error::HttpStatus { status: 401, .. } => Err(self),
            Error::Http(_)
            | Error::HttpStatus { .. }
            | Error::RateLimited { .. }
            | Error::Timeout { .. }
            | Error::MaxRetriesExceeded { .. }
            | Error::Decode { .. }
            | Error::JsonParse(_) => Ok(Error::TransientHttp {
                resource: resource.to_string(),
                message: self.to_string(),
            }),
            other => Err(other),
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for tap-hubspot
pub type Result<T> = std::result::Result<T, Error>;
