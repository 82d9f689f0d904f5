//! One graph-building session over a snapshot of the user's collection.
//!
//! A session walks Idle → FetchingCast → ReadyForGraph → FetchingRecommendations →
//! FullyReady. A cache hit with nothing left to fetch skips straight to ReadyForGraph,
//! or to FullyReady when every performer in recommendation scope is already resolved.
//! Nothing in here is fatal: lookups that fail are reported and retried by a later
//! session, and cache errors degrade to a miss.
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::{
    cache::{CacheSnapshot, Fingerprint, GraphCache},
    models::{
        CastGraphView, CollectionItem, PerformerSummary, PersonId, SessionPhase, SessionStatus,
        TitleId,
    },
    services::{
        fetcher::{fetch_missing_cast, unfetched_items, BatchPolicy, BatchReport},
        graph::build_graph,
        layout::layout_performers,
        providers::CreditsProvider,
        recommendations::{aggregate_recommendations, fetch_recommendations, select_scope},
    },
};

pub struct GraphSession {
    provider: Arc<dyn CreditsProvider>,
    cache: GraphCache,
    cast_policy: BatchPolicy,
    credits_policy: BatchPolicy,
    items: Vec<CollectionItem>,
    fingerprint: Fingerprint,
    snapshot: CacheSnapshot,
    status: watch::Sender<SessionStatus>,
}

impl GraphSession {
    pub fn new(
        provider: Arc<dyn CreditsProvider>,
        cache: GraphCache,
        items: Vec<CollectionItem>,
    ) -> Self {
        let fingerprint = cache.fingerprint(&items);
        let (status, _) = watch::channel(SessionStatus::default());

        Self {
            provider,
            cache,
            cast_policy: BatchPolicy::CAST,
            credits_policy: BatchPolicy::CREDITS,
            items,
            fingerprint,
            snapshot: CacheSnapshot::default(),
            status,
        }
    }

    pub fn with_policies(mut self, cast_policy: BatchPolicy, credits_policy: BatchPolicy) -> Self {
        self.cast_policy = cast_policy;
        self.credits_policy = credits_policy;
        self
    }

    /// Live phase and progress; receivers may be dropped at any time
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn snapshot(&self) -> &CacheSnapshot {
        &self.snapshot
    }

    fn set_status(&self, phase: SessionPhase, fetch_progress: u8) {
        self.status.send_replace(SessionStatus {
            phase,
            fetch_progress,
        });
    }

    fn recommendations_resolved(&self) -> bool {
        select_scope(&self.snapshot.performers).is_empty()
    }

    async fn store_snapshot(&mut self) {
        self.snapshot.cached_at = chrono::Utc::now();
        if let Err(e) = self.cache.put(&self.fingerprint, &self.snapshot).await {
            tracing::warn!(fingerprint = %self.fingerprint, error = %e, "Failed to store snapshot");
        }
    }

    /// Restores the cached performer map and fetches cast for anything still missing
    pub async fn load_cast(&mut self) -> Vec<BatchReport<TitleId>> {
        let cached = match self.cache.get(&self.fingerprint).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(fingerprint = %self.fingerprint, error = %e, "Snapshot lookup failed, rebuilding");
                None
            }
        };

        let hit = cached.is_some();
        self.snapshot = cached.unwrap_or_default();

        if hit && unfetched_items(&self.items, &self.snapshot.fetched_items).is_empty() {
            let phase = if self.recommendations_resolved() {
                SessionPhase::FullyReady
            } else {
                SessionPhase::ReadyForGraph
            };
            tracing::info!(
                fingerprint = %self.fingerprint,
                performers = self.snapshot.performers.len(),
                phase = ?phase,
                "Cache hit, skipping cast fetch"
            );
            self.set_status(phase, 100);
            return Vec::new();
        }

        self.set_status(SessionPhase::FetchingCast, 0);

        let status = &self.status;
        let reports = fetch_missing_cast(
            self.provider.as_ref(),
            &self.items,
            &mut self.snapshot,
            self.cast_policy,
            |progress| {
                status.send_replace(SessionStatus {
                    phase: SessionPhase::FetchingCast,
                    fetch_progress: progress,
                });
            },
        )
        .await;

        let failed: usize = reports.iter().map(|r| r.failed.len()).sum();
        tracing::info!(
            fingerprint = %self.fingerprint,
            batches = reports.len(),
            failed = failed,
            performers = self.snapshot.performers.len(),
            "Cast fetch pass complete"
        );

        self.store_snapshot().await;
        self.set_status(SessionPhase::ReadyForGraph, 100);
        reports
    }

    /// Fetches credits for in-scope performers that have none yet
    pub async fn load_recommendations(&mut self) -> Vec<BatchReport<PersonId>> {
        if self.recommendations_resolved() {
            self.set_status(SessionPhase::FullyReady, 100);
            return Vec::new();
        }

        self.set_status(SessionPhase::FetchingRecommendations, 100);

        let owned: HashSet<TitleId> = self.items.iter().map(CollectionItem::title_id).collect();
        let reports = fetch_recommendations(
            self.provider.as_ref(),
            &mut self.snapshot.performers,
            &owned,
            self.credits_policy,
            |_| {},
        )
        .await;

        self.store_snapshot().await;
        self.set_status(SessionPhase::FullyReady, 100);
        reports
    }

    /// Derives the renderable graph from the current performer map
    pub fn view<R: Rng>(&self, hide_voice_performers: bool, rng: &mut R) -> CastGraphView {
        let status = self.status();
        let graph = build_graph(&self.snapshot.performers, hide_voice_performers);

        CastGraphView {
            performers: layout_performers(&graph.displayed, rng),
            connections: graph.connections,
            top_performers: graph
                .top_performers
                .iter()
                .map(|p| PerformerSummary::from(*p))
                .collect(),
            recommendations: aggregate_recommendations(&self.snapshot.performers),
            stats: graph.stats,
            loading: matches!(status.phase, SessionPhase::Idle | SessionPhase::FetchingCast),
            fetch_progress: status.fetch_progress,
            loading_recommendations: status.phase == SessionPhase::FetchingRecommendations,
        }
    }
}
