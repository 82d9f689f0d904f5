use tokio::sync::RwLock;

use super::{CacheSnapshot, Fingerprint, SnapshotStore};
use crate::error::AppResult;

/// Single-slot in-process snapshot store.
///
/// Only the most recently stored fingerprint is kept; storing under a new fingerprint
/// evicts the previous collection.
#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: RwLock<Option<(Fingerprint, CacheSnapshot)>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, fingerprint: &Fingerprint) -> AppResult<Option<CacheSnapshot>> {
        let slot = self.slot.read().await;
        Ok(slot
            .as_ref()
            .filter(|(stored, _)| stored == fingerprint)
            .map(|(_, snapshot)| snapshot.clone()))
    }

    async fn put(&self, fingerprint: &Fingerprint, snapshot: &CacheSnapshot) -> AppResult<()> {
        let mut slot = self.slot.write().await;
        *slot = Some((fingerprint.clone(), snapshot.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
