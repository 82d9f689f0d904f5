use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{CacheSnapshot, Fingerprint, SnapshotStore};
use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Snapshot(Fingerprint),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Snapshot(fingerprint) => write!(f, "costar:snapshot:{}", fingerprint),
        }
    }
}

/// Creates a Redis client for snapshot storage
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Snapshot store shared through Redis.
///
/// Reads go straight to Redis. Writes are queued to a background task so a session
/// never waits on the store after its fetch pass.
#[derive(Clone)]
pub struct RedisSnapshotStore {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
    ttl: u64,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task and waits until pending snapshots are flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Snapshot writer shutdown signal sent");

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Snapshot writer task did not finish cleanly");
        }
    }
}

impl RedisSnapshotStore {
    /// Creates the store and spawns its background writer
    pub fn new(redis_client: Client, ttl: u64) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let store = Self {
            redis_client,
            write_tx,
            ttl,
        };

        (store, CacheWriterHandle { shutdown_tx, task })
    }

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Snapshot writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write snapshot to Redis");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Snapshot writer shutting down, flushing remaining writes");

                    // Senders live in every store clone, so drain what is queued right now
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush snapshot during shutdown");
                        }
                    }

                    tracing::info!("Snapshot writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn get(&self, fingerprint: &Fingerprint) -> AppResult<Option<CacheSnapshot>> {
        let key = CacheKey::Snapshot(fingerprint.clone());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let snapshot = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Snapshot deserialization error: {}", e))
                })?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, fingerprint: &Fingerprint, snapshot: &CacheSnapshot) -> AppResult<()> {
        let value = serde_json::to_string(snapshot)
            .map_err(|e| AppError::Internal(format!("Snapshot serialization error: {}", e)))?;

        let msg = CacheWriteMessage {
            key: CacheKey::Snapshot(fingerprint.clone()).to_string(),
            value,
            ttl: self.ttl,
        };

        self.write_tx
            .send(msg)
            .map_err(|e| AppError::Internal(format!("Snapshot writer unavailable: {}", e)))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
