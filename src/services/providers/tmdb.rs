/// TMDB API provider
///
/// API Flow:
/// 1. Cast: /{movie|tv}/{id}/credits → billed cast in order
/// 2. Credits: /person/{id}/combined_credits → movie and TV acting credits
///
/// Authenticates with a v4 read access token sent as a bearer header.
use crate::{
    error::{AppError, AppResult},
    models::{
        ApiCombinedCreditsResponse, ApiCreditsResponse, CastMember, CollectionItem, CreditEntry,
        PersonId,
    },
    services::{fetcher::CAST_LIMIT, providers::CreditsProvider},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn cast_url(&self, item: &CollectionItem) -> String {
        format!(
            "{}/{}/{}/credits",
            self.api_url,
            item.media_type.as_path(),
            item.id
        )
    }

    fn credits_url(&self, person_id: PersonId) -> String {
        format!("{}/person/{}/combined_credits", self.api_url, person_id)
    }

    /// GETs `url` and decodes the body into `T`
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!(url = %url, error = %e, "Failed to deserialize TMDB response");
            AppError::InvalidResponse(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

/// Validates the first `CAST_LIMIT` billed members; anything past them is never kept
fn billed_cast(response: ApiCreditsResponse) -> AppResult<Vec<CastMember>> {
    response
        .cast
        .into_iter()
        .take(CAST_LIMIT)
        .map(CastMember::try_from)
        .collect()
}

#[async_trait::async_trait]
impl CreditsProvider for TmdbProvider {
    async fn fetch_cast(&self, item: &CollectionItem) -> AppResult<Vec<CastMember>> {
        let response: ApiCreditsResponse = self.get_json(&self.cast_url(item)).await?;
        let cast = billed_cast(response)?;

        tracing::debug!(
            title_id = %item.title_id(),
            cast = cast.len(),
            provider = "tmdb",
            "Cast fetched"
        );

        Ok(cast)
    }

    async fn fetch_credits(&self, person_id: PersonId) -> AppResult<Vec<CreditEntry>> {
        let response: ApiCombinedCreditsResponse =
            self.get_json(&self.credits_url(person_id)).await?;

        let credits = response
            .cast
            .into_iter()
            .map(CreditEntry::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        tracing::debug!(
            person_id = person_id,
            credits = credits.len(),
            provider = "tmdb",
            "Credits fetched"
        );

        Ok(credits)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;

    fn create_test_provider() -> TmdbProvider {
        TmdbProvider::new("test_key".to_string(), "http://test.local/3/".to_string())
    }

    #[test]
    fn test_cast_url_for_series() {
        let provider = create_test_provider();
        let item = CollectionItem {
            id: 1396,
            media_type: MediaType::Tv,
            title: "Breaking Bad".to_string(),
            poster_path: None,
        };
        assert_eq!(provider.cast_url(&item), "http://test.local/3/tv/1396/credits");
    }

    #[test]
    fn test_cast_url_for_movie() {
        let provider = create_test_provider();
        let item = CollectionItem {
            id: 27205,
            media_type: MediaType::Movie,
            title: "Inception".to_string(),
            poster_path: None,
        };
        assert_eq!(
            provider.cast_url(&item),
            "http://test.local/3/movie/27205/credits"
        );
    }

    #[test]
    fn test_credits_url() {
        let provider = create_test_provider();
        assert_eq!(
            provider.credits_url(17419),
            "http://test.local/3/person/17419/combined_credits"
        );
    }

    fn cast_response(count: u64, blank_name_at: Option<u64>) -> ApiCreditsResponse {
        let cast: Vec<_> = (1..=count)
            .map(|id| {
                let name = if Some(id) == blank_name_at {
                    String::new()
                } else {
                    format!("Performer {}", id)
                };
                serde_json::json!({ "id": id, "name": name, "character": "Role" })
            })
            .collect();
        serde_json::from_value(serde_json::json!({ "cast": cast })).unwrap()
    }

    #[test]
    fn test_billed_cast_ignores_bad_records_past_the_limit() {
        let cast = billed_cast(cast_response(30, Some(28))).unwrap();
        assert_eq!(cast.len(), CAST_LIMIT);
        assert_eq!(cast.last().map(|m| m.id), Some(25));
    }

    #[test]
    fn test_billed_cast_rejects_bad_record_within_the_limit() {
        let result = billed_cast(cast_response(30, Some(3)));
        assert!(matches!(result, Err(AppError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_lookup_error() {
        let provider = TmdbProvider::new("k".to_string(), "http://127.0.0.1:9".to_string());
        assert!(provider.fetch_credits(1).await.is_err());
    }
}
