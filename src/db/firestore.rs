// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore implementation of [`DocumentBackend`].
//!
//! Nested paths are addressed by computing the parent document path under
//! the database's documents root, so `data/{resource}/{state}/districts`
//! becomes collection `{state}` with parent `.../documents/data/{resource}`.

use crate::db::backend::{DocumentBackend, Fields, StoredDocument, WriteReceipt};
use crate::db::path::{CollectionPath, DocumentPath};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt::Display;
use std::sync::{Arc, RwLock};

/// Where credential material comes from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Service-account JSON held in the named environment variable.
    EnvVar(String),
    /// Service-account JSON passed in directly.
    Json(String),
    /// Unauthenticated access (Firestore emulator only).
    Emulator,
}

/// Metadata the client returns for a written document.
#[derive(Debug, Deserialize)]
struct WrittenMeta {
    #[serde(rename = "_firestore_id")]
    firestore_id: Option<String>,
    #[serde(rename = "_firestore_updated")]
    updated_at: Option<DateTime<Utc>>,
}

impl WrittenMeta {
    /// Server update time; a write response without one is malformed.
    fn update_time(&self, path: &impl Display) -> Result<DateTime<Utc>, StoreError> {
        self.updated_at
            .ok_or_else(|| StoreError::decode(path, "write returned no update time"))
    }
}

/// Firestore database backend.
#[derive(Clone)]
pub struct FirestoreBackend {
    client: Arc<RwLock<Option<firestore::FirestoreDb>>>,
}

impl FirestoreBackend {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST; the
    /// credential source is then ignored.
    pub async fn connect(project_id: &str, source: CredentialSource) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let json = match source {
            CredentialSource::EnvVar(name) => std::env::var(&name).map_err(|_| {
                StoreError::Connection(format!("Credential variable {name} is not set"))
            })?,
            CredentialSource::Json(json) => json,
            CredentialSource::Emulator => return Self::create_emulator_client(project_id).await,
        };
        check_credentials(&json)?;

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());
        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::Json(json),
        )
        .await
        .map_err(|e| StoreError::Connection(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::from_client(client))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Connection(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::from_client(client))
    }

    fn from_client(client: firestore::FirestoreDb) -> Self {
        Self {
            client: Arc::new(RwLock::new(Some(client))),
        }
    }

    /// Helper to get the client or return an error once closed.
    fn get_client(&self) -> Result<firestore::FirestoreDb, StoreError> {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(StoreError::Closed)
    }

    async fn write_at_key(
        &self,
        path: &DocumentPath,
        fields: Fields,
        merge: bool,
    ) -> Result<WriteReceipt, StoreError> {
        let client = self.get_client()?;
        let collection = path.parent();
        let parent = parent_path(&client, &collection);

        let update = if merge {
            let mask: Vec<String> = fields.keys().map(|k| quote_field_path(k)).collect();
            client.fluent().update().fields(mask)
        } else {
            client.fluent().update()
        };

        let meta: WrittenMeta = update
            .in_col(collection.name())
            .document_id(path.id())
            .parent(&parent)
            .object(&fields)
            .execute()
            .await
            .map_err(|e| StoreError::write(path, e))?;

        tracing::debug!(path = %path, merge, "Document written");

        Ok(WriteReceipt {
            id: path.id().to_string(),
            update_time: meta.update_time(path)?,
        })
    }
}

#[async_trait]
impl DocumentBackend for FirestoreBackend {
    async fn get(&self, path: &DocumentPath) -> Result<Option<StoredDocument>, StoreError> {
        let client = self.get_client()?;
        let collection = path.parent();
        let parent = parent_path(&client, &collection);

        let doc = client
            .fluent()
            .select()
            .by_id_in(collection.name())
            .parent(&parent)
            .one(path.id())
            .await
            .map_err(|e| StoreError::query(path, e))?;

        doc.map(|doc| to_stored(path, &doc)).transpose()
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<StoredDocument>, StoreError> {
        let client = self.get_client()?;
        let parent = parent_path(&client, collection);

        let docs = client
            .fluent()
            .select()
            .from(collection.name())
            .parent(&parent)
            .query()
            .await
            .map_err(|e| StoreError::query(collection, e))?;

        docs.iter().map(|doc| to_stored(collection, doc)).collect()
    }

    async fn upsert_at_key(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError> {
        self.write_at_key(path, fields, false).await
    }

    async fn merge_at_key(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError> {
        self.write_at_key(path, fields, true).await
    }

    async fn insert_with_generated_key(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<WriteReceipt, StoreError> {
        let client = self.get_client()?;
        let parent = parent_path(&client, collection);

        let meta: WrittenMeta = client
            .fluent()
            .insert()
            .into(collection.name())
            .generate_document_id()
            .parent(&parent)
            .object(&fields)
            .execute()
            .await
            .map_err(|e| StoreError::write(collection, e))?;

        let update_time = meta.update_time(collection)?;
        let id = meta
            .firestore_id
            .ok_or_else(|| StoreError::decode(collection, "insert returned no document id"))?;

        tracing::debug!(collection = %collection, id = %id, "Document inserted");

        Ok(WriteReceipt { id, update_time })
    }

    async fn close(&self) -> Result<(), StoreError> {
        let client = self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if client.is_some() {
            tracing::info!("Firestore connection released");
        }
        Ok(())
    }
}

/// Check that credential material at least parses as a service-account blob.
pub(crate) fn check_credentials(json: &str) -> Result<(), StoreError> {
    if json.trim().is_empty() {
        return Err(StoreError::Connection(
            "Credential material is empty".to_string(),
        ));
    }
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| StoreError::Connection(format!("Malformed credential JSON: {}", e)))?;
    match value.get("type").and_then(|t| t.as_str()) {
        Some(_) => Ok(()),
        None => Err(StoreError::Connection(
            "Credential JSON has no \"type\" field".to_string(),
        )),
    }
}

/// Full parent path for a collection (the documents root for top-level ones).
fn parent_path(client: &firestore::FirestoreDb, collection: &CollectionPath) -> String {
    match collection.parent() {
        Some(doc) => format!("{}/{}", client.get_documents_path(), doc),
        None => client.get_documents_path().to_string(),
    }
}

/// Quote a field name for use in an update mask.
///
/// Simple names pass through; anything else (district names with spaces,
/// dots or dashes) is wrapped in backticks.
pub(crate) fn quote_field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn to_stored(
    path: &impl Display,
    doc: &firestore::FirestoreDocument,
) -> Result<StoredDocument, StoreError> {
    let mut fields: Fields =
        firestore::FirestoreDb::deserialize_doc_to(doc).map_err(|e| StoreError::decode(path, e))?;
    // Drop the metadata the client injects alongside user fields.
    fields.retain(|key, _| !key.starts_with("_firestore_"));

    let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();

    Ok(StoredDocument { id, fields })
}
