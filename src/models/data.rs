// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resource data documents and their per-state grouping.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Resource document stored at `data/{resource}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    /// Resource entries, in source order
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<ResourceData>,
    /// Other top-level fields (timestamps, source info, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One resource entry. Only `state` and `district` are interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub district: String,
    #[serde(flatten)]
    pub payload: BTreeMap<String, Value>,
}

/// Older ingesters write explicit nulls; read them as the empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// District name to that district's entries.
pub type DistrictGroups = BTreeMap<String, Vec<ResourceData>>;

impl Data {
    pub fn new(data: Vec<ResourceData>) -> Self {
        Self {
            data,
            extra: BTreeMap::new(),
        }
    }

    /// Group entries by state, then by district.
    ///
    /// Entries keep their relative order inside each district.
    pub fn group_by_state_and_district(&self) -> BTreeMap<String, DistrictGroups> {
        let mut states: BTreeMap<String, DistrictGroups> = BTreeMap::new();
        for entry in &self.data {
            states
                .entry(entry.state.clone())
                .or_default()
                .entry(entry.district.clone())
                .or_default()
                .push(entry.clone());
        }
        states
    }
}

impl ResourceData {
    pub fn new(state: &str, district: &str) -> Self {
        Self {
            state: state.to_string(),
            district: district.to_string(),
            payload: BTreeMap::new(),
        }
    }

    /// Builder-style payload field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }
}
