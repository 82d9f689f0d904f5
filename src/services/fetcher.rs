//! Rate-limited batch fetching.
//!
//! Lookups run in fixed-size batches. Requests inside a batch are awaited together;
//! batches run one after another with a fixed pause in between, which is the only thing
//! keeping us under the upstream rate limit. A failed lookup is reported and skipped,
//! never fatal.
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::{
    cache::CacheSnapshot,
    error::AppResult,
    models::{Appearance, CastMember, CollectionItem, Performer, TitleId},
    services::providers::CreditsProvider,
};

/// Billed cast entries kept per collection item
pub const CAST_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub size: usize,
    pub delay: Duration,
}

impl BatchPolicy {
    /// Cast lookups: 5 per batch, 100 ms apart
    pub const CAST: BatchPolicy = BatchPolicy {
        size: 5,
        delay: Duration::from_millis(100),
    };

    /// Credits lookups: 3 per batch, 150 ms apart
    pub const CREDITS: BatchPolicy = BatchPolicy {
        size: 3,
        delay: Duration::from_millis(150),
    };

    pub fn new(size: usize, delay: Duration) -> Self {
        Self {
            size: size.max(1),
            delay,
        }
    }
}

/// Outcome of one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<K> {
    pub index: usize,
    pub succeeded: Vec<K>,
    pub failed: Vec<K>,
}

/// Percentage of batches completed, rounded down
pub fn batch_progress(completed: usize, total: usize) -> u8 {
    if total == 0 || completed >= total {
        return 100;
    }
    (completed * 100 / total) as u8
}

/// Runs `fetch` for every key in batches shaped by `policy`.
///
/// Each successful value is handed to `merge` as its batch settles. `progress` receives
/// the completed-batch percentage after every batch and reaches 100 only once the last
/// batch has settled. An empty key list reports 100 immediately.
pub async fn run_batched<K, T, F, Fut, M, P>(
    keys: Vec<K>,
    policy: BatchPolicy,
    fetch: F,
    mut merge: M,
    mut progress: P,
) -> Vec<BatchReport<K>>
where
    K: Clone + Display,
    F: Fn(K) -> Fut,
    Fut: Future<Output = AppResult<T>>,
    M: FnMut(&K, T),
    P: FnMut(u8),
{
    let size = policy.size.max(1);
    let total = keys.len().div_ceil(size);
    if total == 0 {
        progress(100);
        return Vec::new();
    }

    let mut reports = Vec::with_capacity(total);

    for (index, chunk) in keys.chunks(size).enumerate() {
        if index > 0 {
            tokio::time::sleep(policy.delay).await;
        }

        let results = join_all(chunk.iter().map(|key| {
            let request = fetch(key.clone());
            async move { (key.clone(), request.await) }
        }))
        .await;

        let mut report = BatchReport {
            index,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for (key, result) in results {
            match result {
                Ok(value) => {
                    merge(&key, value);
                    report.succeeded.push(key);
                }
                Err(e) => {
                    tracing::warn!(key = %key, batch = index, error = %e, "Lookup failed, left for a later pass");
                    report.failed.push(key);
                }
            }
        }

        tracing::debug!(
            batch = index,
            total_batches = total,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Batch settled"
        );

        progress(batch_progress(index + 1, total));
        reports.push(report);
    }

    reports
}

/// Collection items whose cast has not been fetched yet, in collection order
pub fn unfetched_items<'a>(
    items: &'a [CollectionItem],
    fetched: &BTreeSet<TitleId>,
) -> Vec<&'a CollectionItem> {
    let mut seen = BTreeSet::new();
    items
        .iter()
        .filter(|item| !fetched.contains(&item.title_id()) && seen.insert(item.title_id()))
        .collect()
}

/// Folds one item's cast into the performer map and marks the item fetched
pub fn merge_cast(snapshot: &mut CacheSnapshot, item: &CollectionItem, cast: Vec<CastMember>) {
    let item_id = item.title_id();

    for member in cast.into_iter().take(CAST_LIMIT) {
        let role = if member.character.trim().is_empty() {
            member.department.clone().unwrap_or_default()
        } else {
            member.character.clone()
        };

        let performer = snapshot
            .performers
            .entry(member.id)
            .or_insert_with(|| Performer::new(member.id, member.name, member.image, member.popularity));

        performer.add_appearance(Appearance {
            performer_id: performer.id,
            item_id,
            title: item.title.clone(),
            role,
            image: item.poster_path.clone(),
        });
    }

    snapshot.fetched_items.insert(item_id);
}

/// Fetches cast for every item not yet in `snapshot.fetched_items`.
///
/// Failed items stay unmarked so the next pass picks them up again.
pub async fn fetch_missing_cast<P>(
    provider: &dyn CreditsProvider,
    items: &[CollectionItem],
    snapshot: &mut CacheSnapshot,
    policy: BatchPolicy,
    progress: P,
) -> Vec<BatchReport<TitleId>>
where
    P: FnMut(u8),
{
    let pending = unfetched_items(items, &snapshot.fetched_items);
    let lookup: HashMap<TitleId, &CollectionItem> =
        pending.iter().map(|item| (item.title_id(), *item)).collect();
    let keys: Vec<TitleId> = pending.iter().map(|item| item.title_id()).collect();

    tracing::info!(
        pending = keys.len(),
        already_fetched = snapshot.fetched_items.len(),
        provider = provider.name(),
        "Fetching cast"
    );

    let lookup = &lookup;
    run_batched(
        keys,
        policy,
        move |id| provider.fetch_cast(lookup[&id]),
        |id, cast| merge_cast(snapshot, lookup[id], cast),
        progress,
    )
    .await
}
