// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Validated collection and document paths.
//!
//! A path alternates collection and document segments, starting with a
//! collection: `data/{resource}/{state}/districts`. Segments come partly from
//! caller data (resource keys, state names), so they are checked before any
//! request leaves the process.

use crate::error::StoreError;
use std::fmt;

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath("empty path segment".to_string()));
    }
    if segment.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "segment {segment:?} contains '/'"
        )));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::InvalidPath(format!(
            "segment {segment:?} is reserved"
        )));
    }
    // Firestore reserves ids of the form __.*__
    if segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__") {
        return Err(StoreError::InvalidPath(format!(
            "segment {segment:?} is reserved"
        )));
    }
    Ok(())
}

/// Path to a collection, optionally nested under a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Path to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Top-level collection.
    pub fn root(name: &str) -> Result<Self, StoreError> {
        validate_segment(name)?;
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    /// Document inside this collection.
    pub fn doc(&self, id: &str) -> Result<DocumentPath, StoreError> {
        validate_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(DocumentPath { segments })
    }

    /// Last segment (the collection id).
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Document that owns this collection, if nested.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

impl DocumentPath {
    /// Shorthand for `collection/id` at the root.
    pub fn new(collection: &str, id: &str) -> Result<Self, StoreError> {
        CollectionPath::root(collection)?.doc(id)
    }

    /// Sub-collection under this document.
    pub fn collection(&self, name: &str) -> Result<CollectionPath, StoreError> {
        validate_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(CollectionPath { segments })
    }

    /// Document id (last segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Collection containing this document.
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
