use std::sync::Arc;

use costar_api::{
    api::{create_router, AppState},
    cache::{create_redis_client, CacheWriterHandle, GraphCache, RedisSnapshotStore},
    config::Config,
    services::providers::TmdbProvider,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("costar_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Snapshots go to Redis when configured, otherwise they live in this process
    let (cache, writer_handle): (GraphCache, Option<CacheWriterHandle>) = match &config.redis_url
    {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            let (store, handle) = RedisSnapshotStore::new(client, config.snapshot_ttl_secs);
            tracing::info!("Using Redis snapshot store");
            (GraphCache::new(Arc::new(store)), Some(handle))
        }
        None => {
            tracing::info!("Using in-memory snapshot store");
            (GraphCache::in_memory(), None)
        }
    };

    let provider = TmdbProvider::new(config.tmdb_api_key.clone(), config.tmdb_api_url.clone());
    let state = AppState::new(Arc::new(provider), cache)
        .with_policies(config.cast_policy(), config.credits_policy());

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = writer_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
