//! Performer snapshot cache keyed by a fingerprint of the collection.
//!
//! A snapshot is only trusted while the fingerprint of the caller's collection matches
//! the one it was stored under. Anything else is a miss and the caller rebuilds from
//! scratch.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CollectionItem, Performer, PersonId, TitleId},
};

pub mod memory;
pub mod redis_store;

pub use memory::MemorySnapshotStore;
pub use redis_store::{create_redis_client, CacheWriterHandle, RedisSnapshotStore};

/// Stable hash of the collection's item ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type FingerprintFn = fn(&[CollectionItem]) -> Fingerprint;

/// SHA-256 over the sorted, de-duplicated item ids.
///
/// Order and repeated entries in the input do not change the result.
pub fn fingerprint_collection(items: &[CollectionItem]) -> Fingerprint {
    let ids: BTreeSet<TitleId> = items.iter().map(CollectionItem::title_id).collect();

    let mut hasher = Sha256::new();
    for id in &ids {
        hasher.update(id.to_string().as_bytes());
        hasher.update(b",");
    }

    Fingerprint(format!("{:x}", hasher.finalize()))
}

/// Everything learned from cast lookups for one collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSnapshot {
    pub performers: BTreeMap<PersonId, Performer>,
    pub fetched_items: BTreeSet<TitleId>,
    pub cached_at: DateTime<Utc>,
}

impl Default for CacheSnapshot {
    fn default() -> Self {
        Self {
            performers: BTreeMap::new(),
            fetched_items: BTreeSet::new(),
            cached_at: Utc::now(),
        }
    }
}

/// Backend holding performer snapshots
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns an owned copy of the snapshot stored under `fingerprint`, if any
    async fn get(&self, fingerprint: &Fingerprint) -> AppResult<Option<CacheSnapshot>>;

    /// Stores `snapshot` under `fingerprint`, replacing whatever was there
    async fn put(&self, fingerprint: &Fingerprint, snapshot: &CacheSnapshot) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Snapshot cache handed to every graph session
#[derive(Clone)]
pub struct GraphCache {
    store: Arc<dyn SnapshotStore>,
    fingerprint: FingerprintFn,
}

impl GraphCache {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            fingerprint: fingerprint_collection,
        }
    }

    /// Replaces the fingerprint function
    pub fn with_fingerprint(mut self, fingerprint: FingerprintFn) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySnapshotStore::new()))
    }

    pub fn fingerprint(&self, items: &[CollectionItem]) -> Fingerprint {
        (self.fingerprint)(items)
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> AppResult<Option<CacheSnapshot>> {
        let snapshot = self.store.get(fingerprint).await?;
        tracing::debug!(
            fingerprint = %fingerprint,
            store = self.store.name(),
            hit = snapshot.is_some(),
            "Snapshot lookup"
        );
        Ok(snapshot)
    }

    pub async fn put(&self, fingerprint: &Fingerprint, snapshot: &CacheSnapshot) -> AppResult<()> {
        self.store.put(fingerprint, snapshot).await?;
        tracing::debug!(
            fingerprint = %fingerprint,
            store = self.store.name(),
            performers = snapshot.performers.len(),
            fetched_items = snapshot.fetched_items.len(),
            "Snapshot stored"
        );
        Ok(())
    }
}
