// src/error.rs

//! Unified error handling for the directory client.

use std::fmt;

use thiserror::Error;

/// Result type alias for directory operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body did not have the expected shape
    #[error("Unexpected payload: {0}")]
    Payload(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Login or token request rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Session transition not allowed from the current state
    #[error("Session error: {0}")]
    Session(String),

    /// An action for this entry is still waiting on the server
    #[error("Request already in flight for {0}")]
    InFlight(String),
}

impl AppError {
    /// Create an unexpected-payload error.
    pub fn payload(message: impl fmt::Display) -> Self {
        Self::Payload(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create a session state error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    /// Whether the failure happened before any response was read.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
