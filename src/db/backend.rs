// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document backend abstraction.
//!
//! Documents cross this boundary as JSON objects; typed decoding happens in
//! the store facade. Writes with caller-supplied keys and writes with
//! store-generated keys are separate primitives.

use crate::db::path::{CollectionPath, DocumentPath};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Field map of a single document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document id (last path segment)
    pub id: String,
    pub fields: Fields,
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Document id written (generated by the store for inserts)
    pub id: String,
    /// Server-assigned update time
    pub update_time: DateTime<Utc>,
}

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Fetch one document; `None` when it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<StoredDocument>, StoreError>;

    /// Fetch every document of a collection, in store order.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<StoredDocument>, StoreError>;

    /// Overwrite the whole document at `path`, creating it if needed.
    async fn upsert_at_key(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError>;

    /// Write only the given top-level fields, leaving others untouched.
    async fn merge_at_key(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError>;

    /// Create a new document whose key the store generates.
    async fn insert_with_generated_key(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError>;

    /// Release the connection. Later calls fail with `StoreError::Closed`.
    async fn close(&self) -> Result<(), StoreError>;
}

pub type SharedBackend = Arc<dyn DocumentBackend>;
