//! Unified error type for the service.
//!
//! Parsing and matching ambiguity is never an error (it becomes an `unmatched`
//! log entry). The variants here cover malformed requests, authorization
//! failures, review-time failures and persistence faults.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Ingestion payload had no usable `text`
    #[error("text required")]
    TextRequired,

    /// Review-time re-parse yielded no amount or direction
    #[error("unable to parse amount")]
    UnableToParseAmount,

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    /// Missing or not owned by the caller's group
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn not_found(what: &str) -> Self {
        Self::NotFound {
            what: what.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
