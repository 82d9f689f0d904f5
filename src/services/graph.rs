use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::models::{
    Connection, GraphStats, MostConnectedPair, Performer, PerformerSummary, PersonId, TitleId,
};

/// Appearances needed before a performer counts as significant
pub const MIN_APPEARANCES: usize = 2;
pub const TOP_PERFORMER_COUNT: usize = 10;
/// Upper bound on performers placed in the graph
pub const MAX_DISPLAYED: usize = 300;

/// Derived co-occurrence graph over a performer map
#[derive(Debug, Clone)]
pub struct PerformerGraph<'a> {
    pub displayed: Vec<&'a Performer>,
    pub top_performers: Vec<&'a Performer>,
    pub connections: Vec<Connection>,
    pub stats: GraphStats,
}

/// Most appearances first, lowest id on ties
fn by_rank(a: &&Performer, b: &&Performer) -> Ordering {
    b.appearance_count()
        .cmp(&a.appearance_count())
        .then_with(|| a.id.cmp(&b.id))
}

/// Performers credited on at least two collection items, ranked
pub fn significant_performers(performers: &BTreeMap<PersonId, Performer>) -> Vec<&Performer> {
    let mut significant: Vec<&Performer> = performers
        .values()
        .filter(|p| p.appearance_count() >= MIN_APPEARANCES)
        .collect();
    significant.sort_by(by_rank);
    significant
}

/// Builds the displayed subset, its connections and summary stats.
///
/// `hide_voice_performers` drops performers whose roles are mostly voice work from the
/// displayed set, the top list and the connections. It never touches the map itself.
pub fn build_graph(
    performers: &BTreeMap<PersonId, Performer>,
    hide_voice_performers: bool,
) -> PerformerGraph<'_> {
    let significant = significant_performers(performers);
    let significant_count = significant.len();

    let ranked: Vec<&Performer> = significant
        .into_iter()
        .filter(|p| !(hide_voice_performers && p.is_voice_performer()))
        .collect();

    let top_performers: Vec<&Performer> = ranked.iter().take(TOP_PERFORMER_COUNT).copied().collect();
    let displayed: Vec<&Performer> = ranked.into_iter().take(MAX_DISPLAYED).collect();

    let connections = build_connections(&displayed);
    let most_connected_pair = most_connected(&connections).map(|c| MostConnectedPair {
        source: PerformerSummary::from(&performers[&c.source]),
        target: PerformerSummary::from(&performers[&c.target]),
        weight: c.weight,
    });

    tracing::debug!(
        total = performers.len(),
        significant = significant_count,
        displayed = displayed.len(),
        connections = connections.len(),
        "Performer graph built"
    );

    PerformerGraph {
        displayed,
        top_performers,
        connections,
        stats: GraphStats {
            total_performers: performers.len(),
            performers_in_multiple_items: significant_count,
            most_connected_pair,
        },
    }
}

/// One connection per pair of performers sharing at least one item
pub fn build_connections(displayed: &[&Performer]) -> Vec<Connection> {
    let item_sets: Vec<HashSet<TitleId>> = displayed
        .iter()
        .map(|p| p.appearances.iter().map(|a| a.item_id).collect())
        .collect();

    let mut connections = Vec::new();

    for i in 0..displayed.len() {
        for j in (i + 1)..displayed.len() {
            let (small, large) = if item_sets[i].len() <= item_sets[j].len() {
                (&item_sets[i], &item_sets[j])
            } else {
                (&item_sets[j], &item_sets[i])
            };

            let mut shared_items: Vec<TitleId> =
                small.iter().filter(|id| large.contains(id)).copied().collect();
            if shared_items.is_empty() {
                continue;
            }
            shared_items.sort();

            let (a, b) = (displayed[i].id, displayed[j].id);
            connections.push(Connection {
                source: a.min(b),
                target: a.max(b),
                weight: shared_items.len(),
                shared_items,
            });
        }
    }

    connections
}

/// Heaviest connection; equal weights go to the smallest (source, target) pair
pub fn most_connected(connections: &[Connection]) -> Option<&Connection> {
    connections.iter().min_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then_with(|| (a.source, a.target).cmp(&(b.source, b.target)))
    })
}
