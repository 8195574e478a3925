//! Sync marker and webhook documents.

use serde::{Deserialize, Serialize};

/// `compare/commit`: last commit the ingestion job checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitMarker {
    #[serde(default)]
    pub lastcommit: Option<String>,
}

/// `compare/etags`: last ETag seen from the upstream source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtagMarker {
    #[serde(default)]
    pub etag: Option<String>,
}

/// `webhooks/{auto-id}`: a registered callback URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(default)]
    pub url: Option<String>,
}
