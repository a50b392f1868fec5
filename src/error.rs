//! Error types
//!
//! `StorageError` covers everything the record layer can report from inside a
//! transaction. `ApiError` is the outer surface used by configuration, logging
//! and the command line.

use thiserror::Error;

/// Failures raised while loading, saving or deleting entity records.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record exists under the requested identifier.
    #[error("Id not found: {0}")]
    NotFound(String),

    /// The record is still referenced and cannot be removed.
    #[error("Entry in use: {0}")]
    Conflict(String),

    /// The store namespace for an entity could not be obtained.
    #[error("Unable to access bucket: {0}")]
    BucketAccess(String),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Failed to decode record: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Underlying engine failure, passed through untouched.
    #[error("Store error: {0}")]
    Store(#[from] sled::Error),

    /// The engine detected a concurrent write and will re-run the transaction.
    #[error("Transaction conflict")]
    TransactionConflict,
}

impl StorageError {
    /// True for malformed bytes on decode or an encoder failure.
    pub fn is_serialization(&self) -> bool {
        matches!(self, StorageError::Encode(_) | StorageError::Decode(_))
    }
}

/// Errors surfaced by the configuration and command layers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
