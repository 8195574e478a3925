// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process [`DocumentBackend`] for tests and offline runs.
//!
//! Documents live in a sorted map keyed by full path, so listing a collection
//! returns documents in key order. Failures can be injected per path, and
//! every successful write is recorded for inspection.

use crate::db::backend::{DocumentBackend, Fields, StoredDocument, WriteReceipt};
use crate::db::path::{CollectionPath, DocumentPath};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Kind of write recorded by [`MemoryBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Upsert,
    Merge,
    Insert,
}

/// A successful write, as seen by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub path: String,
    pub kind: WriteKind,
    pub fields: Fields,
}

#[derive(Default)]
struct Inner {
    docs: Mutex<BTreeMap<String, Fields>>,
    writes: Mutex<Vec<RecordedWrite>>,
    /// Injected failures, keyed by document or collection path
    failures: DashMap<String, String>,
    closed: AtomicBool,
}

/// In-memory document backend. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read or write touching `path` fail with `message`.
    pub fn fail_at(&self, path: &str, message: &str) {
        self.inner
            .failures
            .insert(path.to_string(), message.to_string());
    }

    /// Remove an injected failure.
    pub fn clear_failure(&self, path: &str) {
        self.inner.failures.remove(path);
    }

    /// Successful writes so far, in the order they were applied.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        lock(&self.inner.writes).clone()
    }

    /// Raw fields stored at `path`, if any.
    pub fn document(&self, path: &str) -> Option<Fields> {
        lock(&self.inner.docs).get(path).cloned()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn injected(&self, path: &str) -> Option<String> {
        self.inner.failures.get(path).map(|m| m.value().clone())
    }

    fn apply_write(
        &self,
        path: &DocumentPath,
        fields: Fields,
        kind: WriteKind,
    ) -> Result<WriteReceipt, StoreError> {
        self.ensure_open()?;
        let key = path.to_string();
        if let Some(message) = self.injected(&key) {
            return Err(StoreError::write(&key, message));
        }

        let update_time = Utc::now();
        {
            let mut docs = lock(&self.inner.docs);
            match (kind, docs.get_mut(&key)) {
                (WriteKind::Merge, Some(existing)) => {
                    for (name, value) in fields.clone() {
                        existing.insert(name, value);
                    }
                }
                _ => {
                    docs.insert(key.clone(), fields.clone());
                }
            }
        }

        lock(&self.inner.writes).push(RecordedWrite {
            path: key,
            kind,
            fields,
        });

        Ok(WriteReceipt {
            id: path.id().to_string(),
            update_time,
        })
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn get(&self, path: &DocumentPath) -> Result<Option<StoredDocument>, StoreError> {
        self.ensure_open()?;
        let key = path.to_string();
        if let Some(message) = self.injected(&key) {
            return Err(StoreError::query(&key, message));
        }

        Ok(lock(&self.inner.docs).get(&key).map(|fields| StoredDocument {
            id: path.id().to_string(),
            fields: fields.clone(),
        }))
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<StoredDocument>, StoreError> {
        self.ensure_open()?;
        let prefix = format!("{}/", collection);
        if let Some(message) = self.injected(&collection.to_string()) {
            return Err(StoreError::query(collection, message));
        }

        let docs = lock(&self.inner.docs);
        Ok(docs
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            // Direct children only, not documents of nested collections.
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .map(|(key, fields)| StoredDocument {
                id: key[prefix.len()..].to_string(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn upsert_at_key(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError> {
        self.apply_write(path, fields, WriteKind::Upsert)
    }

    async fn merge_at_key(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError> {
        self.apply_write(path, fields, WriteKind::Merge)
    }

    async fn insert_with_generated_key(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError> {
        self.ensure_open()?;
        if let Some(message) = self.injected(&collection.to_string()) {
            return Err(StoreError::write(collection, message));
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        let path = collection.doc(&id)?;
        self.apply_write(&path, fields, WriteKind::Insert)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_merge_keeps_other_fields() {
        let backend = MemoryBackend::new();
        let path = DocumentPath::new("compare", "commit").unwrap();

        backend
            .upsert_at_key(&path, fields(json!({"lastcommit": "a", "note": "keep"})))
            .await
            .unwrap();
        backend
            .merge_at_key(&path, fields(json!({"lastcommit": "b"})))
            .await
            .unwrap();

        let doc = backend.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["lastcommit"], "b");
        assert_eq!(doc.fields["note"], "keep");
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_document() {
        let backend = MemoryBackend::new();
        let path = DocumentPath::new("data", "food").unwrap();

        backend
            .upsert_at_key(&path, fields(json!({"a": 1, "b": 2})))
            .await
            .unwrap();
        backend
            .upsert_at_key(&path, fields(json!({"a": 3})))
            .await
            .unwrap();

        let doc = backend.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.fields["a"], 3);
    }

    #[tokio::test]
    async fn test_list_skips_nested_collections() {
        let backend = MemoryBackend::new();
        let user = DocumentPath::new("Users", "u1").unwrap();
        let query = user.collection("queries").unwrap().doc("q1").unwrap();

        backend.upsert_at_key(&user, Fields::new()).await.unwrap();
        backend.upsert_at_key(&query, Fields::new()).await.unwrap();

        let users = backend.list(&user.parent()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u1");

        let queries = backend.list(&query.parent()).await.unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].id, "q1");
    }

    #[tokio::test]
    async fn test_injected_failure_and_close() {
        let backend = MemoryBackend::new();
        let path = DocumentPath::new("compare", "etags").unwrap();

        backend.fail_at("compare/etags", "unavailable");
        let err = backend.get(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));

        backend.clear_failure("compare/etags");
        assert!(backend.get(&path).await.unwrap().is_none());

        backend.close().await.unwrap();
        assert!(matches!(
            backend.get(&path).await,
            Err(StoreError::Closed)
        ));
    }
}
