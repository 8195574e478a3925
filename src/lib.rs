// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! SafeLife store: typed access to the SafeLife Firestore collections.
//!
//! This crate wraps the hosted document store used by the SafeLife resource
//! tracker: registered users and their queries, resource data grouped by
//! state and district, ingestion sync markers and webhook registrations.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{FoodDataReport, StateWriteOutcome, Store};
