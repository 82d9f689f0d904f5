use serde::Deserialize;
use std::time::Duration;

use crate::services::fetcher::BatchPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API read access token
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Redis connection URL. When unset, snapshots are kept in process memory.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// How long a snapshot survives in Redis
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cast_batch_size")]
    pub cast_batch_size: usize,

    #[serde(default = "default_cast_batch_delay_ms")]
    pub cast_batch_delay_ms: u64,

    #[serde(default = "default_credits_batch_size")]
    pub credits_batch_size: usize,

    #[serde(default = "default_credits_batch_delay_ms")]
    pub credits_batch_delay_ms: u64,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_snapshot_ttl_secs() -> u64 {
    86400
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cast_batch_size() -> usize {
    5
}

fn default_cast_batch_delay_ms() -> u64 {
    100
}

fn default_credits_batch_size() -> usize {
    3
}

fn default_credits_batch_delay_ms() -> u64 {
    150
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Batching used for per-item cast lookups
    pub fn cast_policy(&self) -> BatchPolicy {
        BatchPolicy::new(
            self.cast_batch_size,
            Duration::from_millis(self.cast_batch_delay_ms),
        )
    }

    /// Batching used for per-performer credits lookups
    pub fn credits_policy(&self) -> BatchPolicy {
        BatchPolicy::new(
            self.credits_batch_size,
            Duration::from_millis(self.credits_batch_delay_ms),
        )
    }
}
