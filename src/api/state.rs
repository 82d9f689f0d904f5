use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::cache::GraphCache;
use crate::models::{CollectionItem, SessionStatus};
use crate::services::{fetcher::BatchPolicy, providers::CreditsProvider, GraphSession};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CreditsProvider>,
    pub cache: GraphCache,
    pub cast_policy: BatchPolicy,
    pub credits_policy: BatchPolicy,
    /// Status feed of the most recently started session
    pub latest_session: Arc<RwLock<Option<watch::Receiver<SessionStatus>>>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn CreditsProvider>, cache: GraphCache) -> Self {
        Self {
            provider,
            cache,
            cast_policy: BatchPolicy::CAST,
            credits_policy: BatchPolicy::CREDITS,
            latest_session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_policies(mut self, cast_policy: BatchPolicy, credits_policy: BatchPolicy) -> Self {
        self.cast_policy = cast_policy;
        self.credits_policy = credits_policy;
        self
    }

    /// Starts a session over `items` and makes it the one reported by the progress endpoint
    pub async fn start_session(&self, items: Vec<CollectionItem>) -> GraphSession {
        let session = GraphSession::new(self.provider.clone(), self.cache.clone(), items)
            .with_policies(self.cast_policy, self.credits_policy);

        let mut latest = self.latest_session.write().await;
        *latest = Some(session.subscribe());

        session
    }

    pub async fn latest_status(&self) -> SessionStatus {
        let latest = self.latest_session.read().await;
        latest
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or_default()
    }
}
