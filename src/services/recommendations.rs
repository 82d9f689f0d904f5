use std::collections::{BTreeMap, HashSet};

use crate::{
    models::{
        is_voice_role, CreditCandidate, CreditEntry, Performer, PersonId, RankedRecommendation,
        Supporter, TitleId,
    },
    services::{
        fetcher::{run_batched, BatchPolicy, BatchReport},
        graph::significant_performers,
        providers::CreditsProvider,
    },
};

/// Significant performers whose credits are looked up per pass
pub const RECOMMENDATION_SCOPE: usize = 20;
pub const MIN_RATING: f64 = 6.5;
pub const MIN_VOTE_COUNT: u32 = 50;
pub const CANDIDATES_PER_PERFORMER: usize = 5;
pub const MAX_RECOMMENDATIONS: usize = 15;

/// Performers whose credits should be fetched.
///
/// Takes the top significant performers regardless of voice work, and skips any whose
/// recommendations are already known from an earlier pass.
pub fn select_scope(performers: &BTreeMap<PersonId, Performer>) -> Vec<PersonId> {
    significant_performers(performers)
        .into_iter()
        .take(RECOMMENDATION_SCOPE)
        .filter(|p| p.recommendations.is_none())
        .map(|p| p.id)
        .collect()
}

/// Keeps well-rated, unowned, on-screen credits, best first
pub fn filter_candidates(credits: Vec<CreditEntry>, owned: &HashSet<TitleId>) -> Vec<CreditCandidate> {
    let mut eligible: Vec<CreditEntry> = credits
        .into_iter()
        .filter(|c| !owned.contains(&c.title_id))
        .filter(|c| c.rating >= MIN_RATING && c.vote_count >= MIN_VOTE_COUNT)
        .filter(|c| !is_voice_role(&c.character))
        .collect();

    eligible.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then_with(|| b.vote_count.cmp(&a.vote_count))
            .then_with(|| a.title_id.cmp(&b.title_id))
    });

    let mut seen = HashSet::new();
    eligible
        .into_iter()
        .filter(|c| seen.insert(c.title_id))
        .take(CANDIDATES_PER_PERFORMER)
        .map(|c| CreditCandidate {
            title_id: c.title_id,
            name: c.name,
            image: c.image,
            role: c.character,
            rating: c.rating,
            vote_count: c.vote_count,
        })
        .collect()
}

/// Fetches credits for the performers in scope and attaches their candidates.
///
/// Performers whose lookup fails keep `recommendations == None` and are picked up by
/// the next pass.
pub async fn fetch_recommendations<P>(
    provider: &dyn CreditsProvider,
    performers: &mut BTreeMap<PersonId, Performer>,
    owned: &HashSet<TitleId>,
    policy: BatchPolicy,
    progress: P,
) -> Vec<BatchReport<PersonId>>
where
    P: FnMut(u8),
{
    let scope = select_scope(performers);

    tracing::info!(
        performers = scope.len(),
        provider = provider.name(),
        "Fetching recommendation credits"
    );

    run_batched(
        scope,
        policy,
        move |id| provider.fetch_credits(id),
        |id, credits| {
            if let Some(performer) = performers.get_mut(id) {
                performer.recommendations = Some(filter_candidates(credits, owned));
            }
        },
        progress,
    )
    .await
}

/// Groups every performer's candidates by title and ranks the titles.
///
/// More supporting performers wins; ties go to the higher rated title, then the lower
/// title id.
pub fn aggregate_recommendations(
    performers: &BTreeMap<PersonId, Performer>,
) -> Vec<RankedRecommendation> {
    let mut by_title: BTreeMap<TitleId, RankedRecommendation> = BTreeMap::new();

    for performer in performers.values() {
        let Some(candidates) = performer.recommendations.as_ref() else {
            continue;
        };

        for candidate in candidates {
            let entry = by_title
                .entry(candidate.title_id)
                .or_insert_with(|| RankedRecommendation {
                    title_id: candidate.title_id,
                    name: candidate.name.clone(),
                    image: candidate.image.clone(),
                    rating: candidate.rating,
                    vote_count: candidate.vote_count,
                    supporters: Vec::new(),
                });

            entry.supporters.push(Supporter {
                performer_id: performer.id,
                name: performer.name.clone(),
                role: candidate.role.clone(),
            });
        }
    }

    let mut ranked: Vec<RankedRecommendation> = by_title.into_values().collect();
    ranked.sort_by(|a, b| {
        b.supporters
            .len()
            .cmp(&a.supporters.len())
            .then_with(|| b.rating.total_cmp(&a.rating))
            .then_with(|| a.title_id.cmp(&b.title_id))
    });
    ranked.truncate(MAX_RECOMMENDATIONS);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::Appearance;
    use crate::services::providers::MockCreditsProvider;
    use std::time::Duration;

    fn credit(id: u64, rating: f64, votes: u32, character: &str) -> CreditEntry {
        CreditEntry {
            title_id: TitleId::Movie(id),
            name: format!("Film {}", id),
            image: None,
            character: character.to_string(),
            rating,
            vote_count: votes,
        }
    }

    fn candidate(id: u64, rating: f64) -> CreditCandidate {
        CreditCandidate {
            title_id: TitleId::Movie(id),
            name: format!("Film {}", id),
            image: None,
            role: "Role".to_string(),
            rating,
            vote_count: 100,
        }
    }

    fn performer(id: PersonId, items: u64, recs: Option<Vec<CreditCandidate>>) -> Performer {
        let mut p = Performer::new(id, format!("P{}", id), None, 1.0);
        for item in 0..items {
            p.add_appearance(Appearance {
                performer_id: id,
                item_id: TitleId::Tv(item),
                title: String::new(),
                role: "Lead".to_string(),
                image: None,
            });
        }
        p.recommendations = recs;
        p
    }

    fn map(performers: Vec<Performer>) -> BTreeMap<PersonId, Performer> {
        performers.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn test_filter_rejects_low_quality_owned_and_voice() {
        let owned: HashSet<TitleId> = [TitleId::Movie(4)].into_iter().collect();
        let credits = vec![
            credit(1, 6.4, 500, "Hero"),
            credit(2, 8.0, 49, "Hero"),
            credit(3, 9.0, 500, "Dragon (voice)"),
            credit(4, 9.0, 500, "Hero"),
            credit(5, 6.5, 50, "Hero"),
        ];

        let kept = filter_candidates(credits, &owned);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title_id, TitleId::Movie(5));
        for c in &kept {
            assert!(c.rating >= MIN_RATING);
            assert!(c.vote_count >= MIN_VOTE_COUNT);
            assert!(!is_voice_role(&c.role));
        }
    }

    #[test]
    fn test_filter_keeps_top_five_by_rating_without_duplicates() {
        let mut credits: Vec<CreditEntry> =
            (1..=8).map(|id| credit(id, 6.5 + id as f64 * 0.1, 100, "")).collect();
        credits.push(credit(8, 7.3, 100, "Cameo"));

        let kept = filter_candidates(credits, &HashSet::new());
        let ids: Vec<TitleId> = kept.iter().map(|c| c.title_id).collect();
        assert_eq!(
            ids,
            vec![
                TitleId::Movie(8),
                TitleId::Movie(7),
                TitleId::Movie(6),
                TitleId::Movie(5),
                TitleId::Movie(4)
            ]
        );
    }

    #[test]
    fn test_scope_takes_top_twenty_significant_and_skips_known() {
        let mut performers: Vec<Performer> = (1..=25).map(|id| performer(id, 30 - id, None)).collect();
        performers.push(performer(100, 1, None));
        performers[0].recommendations = Some(vec![]);

        let scope = select_scope(&map(performers));
        assert_eq!(scope.len(), RECOMMENDATION_SCOPE - 1);
        assert!(!scope.contains(&1));
        assert!(!scope.contains(&100));
        assert!(!scope.contains(&21));
        assert_eq!(scope[0], 2);
    }

    #[test]
    fn test_scope_ignores_voice_flag() {
        let mut voice = performer(1, 3, None);
        for a in voice.appearances.iter_mut() {
            a.role = "Voice of Y".to_string();
        }
        assert_eq!(select_scope(&map(vec![voice])), vec![1]);
    }

    #[test]
    fn test_aggregate_ranks_by_supporters_then_rating() {
        let performers = map(vec![
            performer(1, 2, Some(vec![candidate(10, 7.0), candidate(20, 9.0)])),
            performer(2, 2, Some(vec![candidate(10, 7.0), candidate(30, 8.0)])),
            performer(3, 2, None),
        ]);

        let ranked = aggregate_recommendations(&performers);
        let ids: Vec<TitleId> = ranked.iter().map(|r| r.title_id).collect();
        assert_eq!(
            ids,
            vec![TitleId::Movie(10), TitleId::Movie(20), TitleId::Movie(30)]
        );
        assert_eq!(ranked[0].supporters.len(), 2);
        assert_eq!(ranked[0].supporters[0].performer_id, 1);
        assert_eq!(ranked[0].supporters[1].name, "P2");
    }

    #[test]
    fn test_aggregate_includes_performers_outside_scope() {
        let performers = map(vec![performer(1, 1, Some(vec![candidate(10, 7.0)]))]);
        assert_eq!(aggregate_recommendations(&performers).len(), 1);
    }

    #[test]
    fn test_aggregate_caps_results() {
        let recs: Vec<CreditCandidate> = (1..=20).map(|id| candidate(id, 7.0)).collect();
        let performers = map(vec![performer(1, 2, Some(recs))]);
        assert_eq!(aggregate_recommendations(&performers).len(), MAX_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn test_fetch_attaches_candidates_and_leaves_failures_unset() {
        let mut provider = MockCreditsProvider::new();
        provider.expect_fetch_credits().returning(|id| {
            if id == 2 {
                Err(AppError::ExternalApi("429".to_string()))
            } else {
                Ok(vec![credit(id * 10, 8.0, 1000, "Lead")])
            }
        });
        provider.expect_name().return_const("mock");

        let mut performers = map(vec![performer(1, 3, None), performer(2, 2, None)]);
        let reports = fetch_recommendations(
            &provider,
            &mut performers,
            &HashSet::new(),
            BatchPolicy::new(3, Duration::ZERO),
            |_| {},
        )
        .await;

        assert_eq!(reports[0].succeeded, vec![1]);
        assert_eq!(reports[0].failed, vec![2]);
        assert_eq!(performers[&1].recommendations.as_ref().unwrap().len(), 1);
        assert!(performers[&2].recommendations.is_none());
    }
}
