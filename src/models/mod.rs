// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod data;
pub mod marker;
pub mod user;

pub use data::{Data, DistrictGroups, ResourceData};
pub use marker::{CommitMarker, EtagMarker, Webhook};
pub use user::{ResourceQuery, User};
