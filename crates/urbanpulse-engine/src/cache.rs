//! Bounding-box coverage cache.
//!
//! An append-only log of rectangular coverage regions plus the points fetched
//! for them. A queried center is "covered" iff it falls inside at least one
//! entry's rectangle (inclusive bounds). Entries are never merged, evicted,
//! or expired; overlapping entries near region boundaries render points
//! twice, which the additive heatmap aggregation tolerates.
//!
//! The cache is generic over its payload: the thermal and flood layers store
//! [`crate::types::WeightedPoint`], the solar layer stores
//! [`crate::types::Building`].
//!
//! Persistence is injectable: [`MemoryStore`] for tests, [`FileStore`] (one
//! JSON document on disk) for production. A corrupt or unreadable persisted
//! cache rehydrates empty rather than failing the caller.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::supersede::QueryTicket;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A rectangular coverage region and the samples fetched for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub data: Vec<T>,
}

impl<T> CacheEntry<T> {
    /// Build an entry covering `half_spread` degrees on each side of a center.
    #[must_use]
    pub fn around(lat: f64, lng: f64, half_spread: f64, data: Vec<T>) -> Self {
        Self {
            min_lat: lat - half_spread,
            max_lat: lat + half_spread,
            min_lng: lng - half_spread,
            max_lng: lng + half_spread,
            data,
        }
    }

    /// Inclusive point-in-rectangle containment.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// Persistence strategy for the coverage cache.
pub trait CacheStore<T> {
    /// Rehydrate previously persisted entries. Corrupt or missing state
    /// yields an empty cache; this method never fails the caller.
    fn load(&self) -> Vec<CacheEntry<T>>;

    /// Persist the full entry log.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStoreError`] if the entries cannot be written.
    fn persist(&self, entries: &[CacheEntry<T>]) -> Result<(), CacheStoreError>;
}

impl<T, S: CacheStore<T> + ?Sized> CacheStore<T> for Box<S> {
    fn load(&self) -> Vec<CacheEntry<T>> {
        (**self).load()
    }

    fn persist(&self, entries: &[CacheEntry<T>]) -> Result<(), CacheStoreError> {
        (**self).persist(entries)
    }
}

/// Non-persisting store for tests and ephemeral deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore;

impl<T> CacheStore<T> for MemoryStore {
    fn load(&self) -> Vec<CacheEntry<T>> {
        Vec::new()
    }

    fn persist(&self, _entries: &[CacheEntry<T>]) -> Result<(), CacheStoreError> {
        Ok(())
    }
}

/// Durable store writing the entry log as one JSON document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<T: Serialize + DeserializeOwned> CacheStore<T> for FileStore {
    fn load(&self) -> Vec<CacheEntry<T>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "coverage cache unreadable; starting empty"
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "coverage cache corrupt; starting empty"
                );
                Vec::new()
            }
        }
    }

    fn persist(&self, entries: &[CacheEntry<T>]) -> Result<(), CacheStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(entries)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

/// Repository over the append-only coverage log.
#[derive(Debug)]
pub struct CoverageCache<T, S: CacheStore<T>> {
    store: S,
    entries: Vec<CacheEntry<T>>,
}

impl<T: Clone, S: CacheStore<T>> CoverageCache<T, S> {
    /// Open the cache, rehydrating whatever the store holds.
    pub fn open(store: S) -> Self {
        let entries = store.load();
        Self { store, entries }
    }

    /// Linear scan; returns the first entry whose rectangle contains the point.
    #[must_use]
    pub fn lookup(&self, lat: f64, lng: f64) -> Option<&CacheEntry<T>> {
        self.entries.iter().find(|e| e.contains(lat, lng))
    }

    /// Append an entry and persist the log. A persistence failure keeps the
    /// in-memory entry and is only logged; cache writes must not fail queries.
    pub fn insert(&mut self, entry: CacheEntry<T>) {
        self.entries.push(entry);
        if let Err(e) = self.store.persist(&self.entries) {
            tracing::warn!(error = %e, "failed to persist coverage cache");
        }
    }

    /// Append only if `ticket` has not been superseded by a newer query.
    /// Returns whether the entry was written.
    pub fn insert_if_live(&mut self, ticket: &QueryTicket, entry: CacheEntry<T>) -> bool {
        if !ticket.is_live() {
            tracing::debug!("dropping cache write from superseded query");
            return false;
        }
        self.insert(entry);
        true
    }

    /// Flatten every entry's data. Overlapping entries may repeat points.
    #[must_use]
    pub fn snapshot_all(&self) -> Vec<T> {
        self.entries.iter().flat_map(|e| e.data.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
