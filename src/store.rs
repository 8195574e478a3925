// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed store facade over a [`DocumentBackend`].
//!
//! Provides high-level operations for:
//! - Users (with their nested resource queries)
//! - Resource data (whole documents and per-state district groups)
//! - Sync markers (`compare/commit`, `compare/etags`)
//! - Webhooks (store-generated keys)

use crate::config::{BackendKind, Config};
use crate::db::{
    collections, documents, CollectionPath, CredentialSource, DocumentPath, Fields,
    FirestoreBackend, MemoryBackend, SharedBackend,
};
use crate::error::{Result, StoreError};
use crate::models::{CommitMarker, Data, EtagMarker, ResourceQuery, User, Webhook};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Result of writing one state's district document.
#[derive(Debug, Clone)]
pub struct StateWriteOutcome {
    pub state: String,
    pub district_count: usize,
    pub record_count: usize,
    /// Server update time, or the error for this state alone
    pub result: std::result::Result<DateTime<Utc>, StoreError>,
}

/// Per-state outcomes of [`Store::put_food_data`], sorted by state.
#[derive(Debug, Clone)]
pub struct FoodDataReport {
    pub resource: String,
    pub outcomes: Vec<StateWriteOutcome>,
}

impl FoodDataReport {
    /// True when every state's write succeeded.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &StateWriteOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn written_states(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.state.as_str())
    }

    /// Collapse into an error if any state failed (the first, by state name).
    pub fn into_result(self) -> Result<Self> {
        if let Some(err) = self.failures().find_map(|o| o.result.clone().err()) {
            return Err(err);
        }
        Ok(self)
    }
}

/// Store facade. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct Store {
    backend: SharedBackend,
    user_query_concurrency: usize,
}

impl Store {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            user_query_concurrency: 1,
        }
    }

    /// Cap on concurrent `queries` fetches in [`Store::list_users_with_queries`].
    ///
    /// 1 (the default) fetches strictly one user after another.
    pub fn with_user_query_concurrency(mut self, limit: usize) -> Self {
        self.user_query_concurrency = limit.max(1);
        self
    }

    /// Open a connection as described by `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let backend: SharedBackend = match config.backend {
            BackendKind::Firestore => {
                let source = if config.emulator_host.is_some() {
                    CredentialSource::Emulator
                } else {
                    CredentialSource::EnvVar(config.credentials_var.clone())
                };
                Arc::new(FirestoreBackend::connect(&config.project_id, source).await?)
            }
            BackendKind::Memory => {
                tracing::info!("Using in-memory document store");
                Arc::new(MemoryBackend::new())
            }
        };

        Ok(Self::new(backend).with_user_query_concurrency(config.user_query_concurrency))
    }

    /// Release the connection. Closing twice is harmless.
    pub async fn close(&self) -> Result<()> {
        self.backend.close().await
    }

    // ─── Users ───────────────────────────────────────────────────

    /// List all users, each with its `queries` sub-collection.
    ///
    /// One list call, then one sub-collection fetch per user. Fetches run
    /// with bounded concurrency but results keep the store's user order.
    /// Not atomic: a user written mid-listing may or may not appear.
    pub async fn list_users_with_queries(&self) -> Result<Vec<User>> {
        let users = CollectionPath::root(collections::USERS)?;
        let docs = self.backend.list(&users).await?;
        tracing::debug!(count = docs.len(), "Listed users");

        let users = &users;
        let backend = &self.backend;

        stream::iter(docs)
            .map(|doc| async move {
                let user_path = users.doc(&doc.id)?;
                let mut user: User = decode(&user_path, doc.fields)?;
                user.id = doc.id;

                let queries_path = user_path.collection(collections::QUERIES)?;
                user.queries = backend
                    .list(&queries_path)
                    .await?
                    .into_iter()
                    .map(|q| -> Result<ResourceQuery> {
                        let mut query: ResourceQuery = decode(&queries_path, q.fields)?;
                        query.id = q.id;
                        Ok(query)
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok::<_, StoreError>(user)
            })
            .buffered(self.user_query_concurrency)
            .try_collect()
            .await
    }

    // ─── Resource Data ───────────────────────────────────────────

    /// Read `data/{resource}`. Missing documents are `StoreError::NotFound`.
    pub async fn get_data(&self, resource: &str) -> Result<Data> {
        let path = DocumentPath::new(collections::DATA, resource)?;
        self.get_optional(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    /// Overwrite `data/{resource}` with `details`. Returns the update time.
    pub async fn put_data(&self, details: &Data, resource: &str) -> Result<DateTime<Utc>> {
        let path = DocumentPath::new(collections::DATA, resource)?;
        let receipt = self
            .backend
            .upsert_at_key(&path, encode(&path, details)?)
            .await?;

        tracing::info!(
            resource,
            records = details.data.len(),
            update_time = %receipt.update_time,
            "Data written"
        );
        Ok(receipt.update_time)
    }

    /// Write `details` grouped per state to `data/{resource}/{state}/districts`.
    ///
    /// Each state is one merge-write of `{district: [records]}`, issued
    /// independently. A failing state does not stop the others; every
    /// outcome is in the returned report. Only errors that prevent any write
    /// (an invalid resource key) are returned as `Err`.
    pub async fn put_food_data(&self, details: &Data, resource: &str) -> Result<FoodDataReport> {
        let base = DocumentPath::new(collections::DATA, resource)?;
        let groups = details.group_by_state_and_district();

        let base = &base;
        let backend = &self.backend;

        let mut outcomes: Vec<StateWriteOutcome> = stream::iter(groups)
            .map(|(state, districts)| async move {
                let record_count = districts.values().map(Vec::len).sum();
                let district_count = districts.len();

                let result = async {
                    let path = base.collection(&state)?.doc(documents::DISTRICTS)?;
                    let receipt = backend
                        .merge_at_key(&path, encode(&path, &districts)?)
                        .await?;
                    Ok::<_, StoreError>(receipt.update_time)
                }
                .await;

                match &result {
                    Ok(update_time) => tracing::info!(
                        resource,
                        state = %state,
                        districts = district_count,
                        update_time = %update_time,
                        "Data initialised"
                    ),
                    Err(e) => tracing::error!(
                        resource,
                        state = %state,
                        error = %e,
                        "Failed to write state districts"
                    ),
                }

                StateWriteOutcome {
                    state,
                    district_count,
                    record_count,
                    result,
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        outcomes.sort_by(|a, b| a.state.cmp(&b.state));

        Ok(FoodDataReport {
            resource: resource.to_string(),
            outcomes,
        })
    }

    /// Same as [`Store::get_data`]; kept for callers that use this name.
    pub async fn get_food_data(&self, resource: &str) -> Result<Data> {
        self.get_data(resource).await
    }

    // ─── Sync Markers ────────────────────────────────────────────

    /// Record the last checked commit in `compare/commit`.
    pub async fn set_last_checked_commit(&self, commit: &str) -> Result<()> {
        let path = DocumentPath::new(collections::COMPARE, documents::COMMIT)?;
        let marker = CommitMarker {
            lastcommit: Some(commit.to_string()),
        };
        self.backend
            .merge_at_key(&path, encode(&path, &marker)?)
            .await?;
        tracing::debug!(commit, "Last checked commit updated");
        Ok(())
    }

    /// Last checked commit, `None` if never recorded.
    pub async fn get_last_checked_commit(&self) -> Result<Option<String>> {
        let path = DocumentPath::new(collections::COMPARE, documents::COMMIT)?;
        let marker: Option<CommitMarker> = self.get_optional(&path).await?;
        Ok(marker.and_then(|m| m.lastcommit))
    }

    /// Record the last seen ETag in `compare/etags`.
    pub async fn set_etag(&self, etag: &str) -> Result<()> {
        let path = DocumentPath::new(collections::COMPARE, documents::ETAGS)?;
        let marker = EtagMarker {
            etag: Some(etag.to_string()),
        };
        self.backend
            .merge_at_key(&path, encode(&path, &marker)?)
            .await?;
        tracing::debug!(etag, "ETag updated");
        Ok(())
    }

    /// Last seen ETag, `None` if never recorded.
    pub async fn get_etag(&self) -> Result<Option<String>> {
        let path = DocumentPath::new(collections::COMPARE, documents::ETAGS)?;
        let marker: Option<EtagMarker> = self.get_optional(&path).await?;
        Ok(marker.and_then(|m| m.etag))
    }

    // ─── Webhooks ────────────────────────────────────────────────

    /// Register a callback URL under a generated key. Duplicates are allowed.
    ///
    /// Returns the generated document key.
    pub async fn register_webhook(&self, url: &str) -> Result<String> {
        let webhooks = CollectionPath::root(collections::WEBHOOKS)?;
        let webhook = Webhook {
            url: Some(url.to_string()),
        };
        let receipt = self
            .backend
            .insert_with_generated_key(&webhooks, encode(&webhooks, &webhook)?)
            .await?;

        tracing::info!(id = %receipt.id, "Webhook registered");
        Ok(receipt.id)
    }

    /// All registered URLs, in store order.
    pub async fn list_webhooks(&self) -> Result<Vec<String>> {
        let webhooks = CollectionPath::root(collections::WEBHOOKS)?;
        let docs = self.backend.list(&webhooks).await?;

        let mut urls = Vec::with_capacity(docs.len());
        for doc in docs {
            let webhook: Webhook = decode(&webhooks, doc.fields)?;
            match webhook.url {
                Some(url) => urls.push(url),
                None => tracing::warn!(id = %doc.id, "Webhook document has no url"),
            }
        }
        Ok(urls)
    }

    // ─── Helper Methods ──────────────────────────────────────────

    async fn get_optional<T: DeserializeOwned>(&self, path: &DocumentPath) -> Result<Option<T>> {
        match self.backend.get(path).await? {
            Some(doc) => decode(path, doc.fields).map(Some),
            None => Ok(None),
        }
    }
}

/// Decode document fields, ignoring fields the record does not know.
fn decode<T: DeserializeOwned>(path: &impl Display, fields: Fields) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| StoreError::decode(path, e))
}

fn encode<T: Serialize>(path: &impl Display, value: &T) -> Result<Fields> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(StoreError::write(
            path,
            format!("expected an object, got {}", other),
        )),
        Err(e) => Err(StoreError::write(path, format!("cannot serialize: {}", e))),
    }
}
