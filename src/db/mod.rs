//! Database layer: backend trait, Firestore and in-memory implementations.

pub mod backend;
pub mod firestore;
pub mod memory;
pub mod path;

pub use backend::{DocumentBackend, Fields, SharedBackend, StoredDocument, WriteReceipt};
pub use firestore::{CredentialSource, FirestoreBackend};
pub use memory::MemoryBackend;
pub use path::{CollectionPath, DocumentPath};

/// Collection names as constants.
pub mod collections {
    /// Registered users; capitalised to match existing deployments.
    pub const USERS: &str = "Users";
    /// Per-user sub-collection of resource queries
    pub const QUERIES: &str = "queries";
    pub const DATA: &str = "data";
    pub const COMPARE: &str = "compare";
    pub const WEBHOOKS: &str = "webhooks";
}

/// Fixed document ids.
pub mod documents {
    /// `compare/commit`: last ingested commit marker
    pub const COMMIT: &str = "commit";
    /// `compare/etags`: last seen ETag marker
    pub const ETAGS: &str = "etags";
    /// `data/{resource}/{state}/districts`
    pub const DISTRICTS: &str = "districts";
}
