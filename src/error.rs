//! Error types for the ticket-triage library.
//!
//! Every failure a request can run into is one of four kinds. The HTTP layer
//! maps each kind to a status code; nothing here is retried.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while serving a ticket request.
#[derive(Error, Debug)]
pub enum TriageError {
    /// Store credentials or other required settings are missing
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Request body is malformed or a field fails validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No ticket with the given identifier exists
    #[error("Ticket not found: {0}")]
    NotFound(Uuid),

    /// The underlying read or write failed
    #[error("Data store error: {0}")]
    DataStore(String),
}

/// Convenience type alias for Result with TriageError
pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    /// Short machine-readable name of the error kind, used as a metrics label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::DataStore(_) => "data_store",
        }
    }

    /// The error text without the kind prefix.
    #[must_use]
    pub fn details(&self) -> String {
        match self {
            Self::Configuration(msg) | Self::Validation(msg) | Self::DataStore(msg) => msg.clone(),
            Self::NotFound(id) => format!("No ticket with id {id}"),
        }
    }
}

impl From<rusqlite::Error> for TriageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::DataStore(err.to_string())
    }
}

impl From<r2d2::Error> for TriageError {
    fn from(err: r2d2::Error) -> Self {
        Self::DataStore(format!("connection pool: {err}"))
    }
}

impl From<reqwest::Error> for TriageError {
    fn from(err: reqwest::Error) -> Self {
        Self::DataStore(err.to_string())
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataStore(format!("malformed row: {err}"))
    }
}

impl From<tokio::task::JoinError> for TriageError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::DataStore(format!("store task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(TriageError::Configuration("x".into()).kind(), "configuration");
        assert_eq!(TriageError::Validation("x".into()).kind(), "validation");
        assert_eq!(TriageError::NotFound(Uuid::nil()).kind(), "not_found");
        assert_eq!(TriageError::DataStore("x".into()).kind(), "data_store");
    }

    #[test]
    fn test_details_strip_prefix() {
        let err = TriageError::DataStore("disk full".to_string());
        assert_eq!(err.to_string(), "Data store error: disk full");
        assert_eq!(err.details(), "disk full");
    }
}
