//! Whole-document JSON storage with a version stamp on every document.
//!
//! All users share one `links` document and one `users` document. Writers
//! read the full document, change only their own entry and write the full
//! document back. Write-back is a compare-and-swap on the version read, so a
//! writer holding a stale copy can never overwrite someone else's change; it
//! re-reads and re-applies its own edit instead.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// How many times a writer re-reads after losing a compare-and-swap.
pub const MAX_WRITE_ATTEMPTS: usize = 5;

/// A document body plus the version it was read at. Absent documents read
/// as version 0 with a null body.
#[derive(Debug, Clone)]
pub struct Versioned {
    pub version: u64,
    pub body: Value,
}

pub trait DocumentStore: Send + Sync {
    fn load(&self, name: &str) -> StoreResult<Versioned>;

    /// Replace the document if its version is still `expected`. Returns the
    /// new version, or `Conflict` if another writer got there first.
    fn save(&self, name: &str, body: &Value, expected: u64) -> StoreResult<u64>;
}

/// Process-local document store.
#[derive(Default)]
pub struct MemoryDocuments {
    docs: Mutex<HashMap<String, (u64, Value)>>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocuments {
    fn load(&self, name: &str) -> StoreResult<Versioned> {
        let docs = self
            .docs
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("document lock poisoned: {}", e)))?;
        Ok(docs
            .get(name)
            .map(|(version, body)| Versioned {
                version: *version,
                body: body.clone(),
            })
            .unwrap_or(Versioned {
                version: 0,
                body: Value::Null,
            }))
    }

    fn save(&self, name: &str, body: &Value, expected: u64) -> StoreResult<u64> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("document lock poisoned: {}", e)))?;
        let current = docs.get(name).map(|(v, _)| *v).unwrap_or(0);
        if current != expected {
            return Err(StoreError::Conflict(name.to_string()));
        }
        let next = expected + 1;
        docs.insert(name.to_string(), (next, body.clone()));
        Ok(next)
    }
}

/// Read a document and decode it, treating an absent document as empty.
pub fn read_document<D, T>(docs: &D, name: &str) -> StoreResult<T>
where
    D: DocumentStore + ?Sized,
    T: DeserializeOwned + Default,
{
    decode(docs.load(name)?.body)
}

/// Read-modify-write with compare-and-swap.
///
/// `apply` may run more than once; it gets a fresh copy of the document each
/// time and returns its result plus whether the document needs writing.
pub fn update_document<D, T, R, F>(docs: &D, name: &str, mut apply: F) -> StoreResult<R>
where
    D: DocumentStore + ?Sized,
    T: Serialize + DeserializeOwned + Default,
    F: FnMut(&mut T) -> StoreResult<(R, bool)>,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let current = docs.load(name)?;
        let mut doc: T = decode(current.body)?;

        let (result, dirty) = apply(&mut doc)?;
        if !dirty {
            return Ok(result);
        }

        let body = serde_json::to_value(&doc)?;
        match docs.save(name, &body, current.version) {
            Ok(version) => {
                debug!("Wrote document {} at version {}", name, version);
                return Ok(result);
            }
            Err(StoreError::Conflict(_)) => {
                debug!(
                    "Document {} changed under us (attempt {}/{}), retrying",
                    name, attempt, MAX_WRITE_ATTEMPTS
                );
            }
            Err(e) => return Err(e),
        }
    }

    warn!("Giving up on document {} after {} conflicting writes", name, MAX_WRITE_ATTEMPTS);
    Err(StoreError::Conflict(name.to_string()))
}

fn decode<T>(body: Value) -> StoreResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(body)?)
}
