// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store error types.

/// Errors returned by store and backend operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed at {path}: {message}")]
    Query { path: String, message: String },

    #[error("Write failed at {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to decode document at {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Store connection is closed")]
    Closed,
}

impl StoreError {
    pub(crate) fn query(path: impl ToString, message: impl ToString) -> Self {
        Self::Query {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn write(path: impl ToString, message: impl ToString) -> Self {
        Self::Write {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn decode(path: impl ToString, message: impl ToString) -> Self {
        Self::Decode {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// True for failures raised before any round trip to the store.
    pub fn is_local(&self) -> bool {
        matches!(self, StoreError::InvalidPath(_) | StoreError::Closed)
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
