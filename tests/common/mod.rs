// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use safelife_store::config::{BackendKind, Config};
use safelife_store::db::{Fields, MemoryBackend};
use safelife_store::Store;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a store connected to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_store() -> Store {
    let config = Config {
        backend: BackendKind::Firestore,
        emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST").ok(),
        ..Config::default()
    };
    Store::connect(&config)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a store over a fresh in-memory backend.
///
/// The backend handle is returned for seeding, fault injection and
/// inspecting writes.
#[allow(dead_code)]
pub fn memory_store() -> (Store, MemoryBackend) {
    let backend = MemoryBackend::new();
    (Store::new(Arc::new(backend.clone())), backend)
}

/// Build a field map from a JSON object literal.
#[allow(dead_code)]
pub fn fields(value: serde_json::Value) -> Fields {
    value
        .as_object()
        .cloned()
        .expect("fields() needs a JSON object")
}

/// Unique suffix for test isolation against a shared emulator.
#[allow(dead_code)]
pub fn unique_key(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
