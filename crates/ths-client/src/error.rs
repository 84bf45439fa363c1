//! # Client Error Types
//!
//! Error types for everything that talks to the outside world.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Validation     │  │   Transport     │  │     Configuration       │ │
//! │  │  (local)        │  │   (remote)      │  │                         │ │
//! │  │  Core(..)       │  │  Http           │  │  InvalidConfig          │ │
//! │  │  Busy           │  │  Api / NotFound │  │  InvalidUrl             │ │
//! │  │  NotAuthenticated│ │  Unauthorized   │  │  ConfigLoadFailed       │ │
//! │  │                 │  │  InvalidResponse│  │  ConfigSaveFailed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Validation errors never reach the network. Transport errors are       │
//! │  swallowed by read operations and propagated by write operations.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use ths_core::CoreError;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Network failure, timeout or TLS error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response not covered by a more specific variant.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 2xx response whose body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache error: {0}")]
    Cache(String),

    /// The same operation is already in flight.
    #[error("{0} already in progress")]
    Busy(&'static str),

    #[error("No user is logged in")]
    NotAuthenticated,

    /// Login finished but the account is missing from the user list.
    #[error("User {0} not found")]
    UserNotFound(String),

    /// Local business rule violation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<ths_core::ValidationError> for ClientError {
    fn from(err: ths_core::ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if the error was detected locally, before any request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClientError::Core(_) | ClientError::Busy(_) | ClientError::NotAuthenticated
        )
    }

    /// Returns true if the error came from the network or the remote service.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_)
                | ClientError::Api { .. }
                | ClientError::Unauthorized
                | ClientError::Forbidden(_)
                | ClientError::NotFound(_)
                | ClientError::InvalidResponse(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}
