//! Error types for formrelay.
//!
//! This module defines all error types used throughout the formrelay crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for formrelay operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to read the submission log file.
    #[error("failed to read submission log at {path}: {source}")]
    LogRead {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the submission log file.
    #[error("failed to write submission log at {path}: {source}")]
    LogWrite {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The submission log file is not a valid JSON array.
    #[error("submission log at {path} is corrupt: {source}")]
    LogParse {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Mail Errors ===
    /// An email address could not be parsed.
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Building an outbound message failed.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// The SMTP transport reported a failure.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// A send was rejected before reaching the transport.
    #[error("mail delivery failed: {message}")]
    Delivery {
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for formrelay operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new delivery error.
    #[must_use]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
