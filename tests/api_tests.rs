use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use costar_api::api::{create_router, AppState};
use costar_api::cache::GraphCache;
use costar_api::error::{AppError, AppResult};
use costar_api::models::{CastMember, CollectionItem, CreditEntry, PersonId, TitleId};
use costar_api::services::fetcher::BatchPolicy;
use costar_api::services::providers::CreditsProvider;

/// Provider answering from fixed tables; unknown ids fail like an upstream 404
#[derive(Default)]
struct ScriptedProvider {
    cast: HashMap<u64, Vec<CastMember>>,
    credits: HashMap<PersonId, Vec<CreditEntry>>,
    cast_calls: AtomicUsize,
}

impl ScriptedProvider {
    fn with_cast(mut self, item: u64, members: &[(u64, &str)]) -> Self {
        let cast = members
            .iter()
            .map(|(id, character)| CastMember {
                id: *id,
                name: format!("Performer {}", id),
                image: None,
                popularity: 1.0,
                department: Some("Acting".to_string()),
                character: character.to_string(),
            })
            .collect();
        self.cast.insert(item, cast);
        self
    }

    fn with_credit(mut self, person: PersonId, title: u64, rating: f64) -> Self {
        self.credits.entry(person).or_default().push(CreditEntry {
            title_id: TitleId::Movie(title),
            name: format!("Film {}", title),
            image: None,
            character: "Lead".to_string(),
            rating,
            vote_count: 1000,
        });
        self
    }
}

#[async_trait::async_trait]
impl CreditsProvider for ScriptedProvider {
    async fn fetch_cast(&self, item: &CollectionItem) -> AppResult<Vec<CastMember>> {
        self.cast_calls.fetch_add(1, Ordering::SeqCst);
        self.cast
            .get(&item.id)
            .cloned()
            .ok_or_else(|| AppError::ExternalApi(format!("no cast for {}", item.id)))
    }

    async fn fetch_credits(&self, person_id: PersonId) -> AppResult<Vec<CreditEntry>> {
        Ok(self.credits.get(&person_id).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn create_test_app(provider: Arc<ScriptedProvider>) -> Router {
    let instant = BatchPolicy::new(5, Duration::ZERO);
    let state = AppState::new(provider, GraphCache::in_memory()).with_policies(instant, instant);
    create_router(state)
}

fn sample_provider() -> ScriptedProvider {
    ScriptedProvider::default()
        .with_cast(1, &[(100, "Hero"), (200, "Villain")])
        .with_cast(2, &[(100, "Hero"), (200, "Sidekick"), (300, "Cameo")])
        .with_cast(3, &[(400, "Voice of Y")])
        .with_cast(4, &[(400, "Robot (voice)")])
        .with_credit(100, 900, 8.1)
        .with_credit(200, 900, 8.1)
        .with_credit(200, 901, 9.0)
}

async fn post_graph(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/graph")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn items(ids: &[u64]) -> Value {
    json!(ids
        .iter()
        .map(|id| json!({ "id": id, "title": format!("Show {}", id) }))
        .collect::<Vec<_>>())
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(Arc::new(ScriptedProvider::default()));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_graph_flow() {
    let app = create_test_app(Arc::new(sample_provider()));

    let (status, view) = post_graph(app, json!({ "items": items(&[1, 2, 3, 4]) })).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(view["loading"], false);
    assert_eq!(view["fetch_progress"], 100);
    assert_eq!(view["loading_recommendations"], false);
    assert_eq!(view["stats"]["total_performers"], 4);
    assert_eq!(view["stats"]["performers_in_multiple_items"], 3);

    let performers = view["performers"].as_array().unwrap();
    assert_eq!(performers.len(), 3);

    let connections = view["connections"].as_array().unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0]["source"], 100);
    assert_eq!(connections[0]["target"], 200);
    assert_eq!(connections[0]["weight"], 2);
    assert_eq!(view["stats"]["most_connected_pair"]["weight"], 2);

    let recommendations = view["recommendations"].as_array().unwrap();
    assert_eq!(recommendations[0]["title_id"], json!({ "movie": 900 }));
    assert_eq!(recommendations[0]["supporters"].as_array().unwrap().len(), 2);
    assert_eq!(recommendations[1]["title_id"], json!({ "movie": 901 }));
}

#[tokio::test]
async fn test_hide_voice_performers() {
    let app = create_test_app(Arc::new(sample_provider()));

    let (_, view) = post_graph(
        app,
        json!({ "items": items(&[1, 2, 3, 4]), "hide_voice_performers": true }),
    )
    .await;

    let ids: Vec<u64> = view["performers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![100, 200]);
    assert!(view["top_performers"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["id"] != 400));
}

#[tokio::test]
async fn test_repeat_request_served_from_cache() {
    let provider = Arc::new(sample_provider());
    let app = create_test_app(provider.clone());

    let body = json!({ "items": items(&[1, 2]), "include_recommendations": false });
    let (_, first) = post_graph(app.clone(), body.clone()).await;
    let (_, second) = post_graph(app, body).await;

    assert_eq!(provider.cast_calls.load(Ordering::SeqCst), 2);
    assert_eq!(first["connections"], second["connections"]);
    assert_eq!(second["recommendations"], json!([]));
}

#[tokio::test]
async fn test_failed_items_do_not_fail_the_request() {
    let app = create_test_app(Arc::new(sample_provider()));

    let (status, view) = post_graph(app, json!({ "items": items(&[1, 2, 99]) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["fetch_progress"], 100);
    assert_eq!(view["connections"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_progress_reports_latest_session() {
    let app = create_test_app(Arc::new(sample_provider()));

    let (_, _) = post_graph(app.clone(), json!({ "items": items(&[1, 2]) })).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/graph/progress")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let status: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status["phase"], "fully_ready");
    assert_eq!(status["fetch_progress"], 100);
}

#[tokio::test]
async fn test_oversized_collection_rejected() {
    let app = create_test_app(Arc::new(ScriptedProvider::default()));
    let ids: Vec<u64> = (0..5_001).collect();

    let (status, body) = post_graph(app, json!({ "items": items(&ids) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("5001"));
}
