use axum::{extract::State, http::StatusCode, Extension, Json};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{CastGraphView, CollectionItem, SessionStatus};

use super::AppState;

/// Largest collection accepted in one request
pub const MAX_COLLECTION_ITEMS: usize = 5_000;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct GraphRequest {
    pub items: Vec<CollectionItem>,
    #[serde(default)]
    pub hide_voice_performers: bool,
    #[serde(default = "default_include_recommendations")]
    pub include_recommendations: bool,
}

fn default_include_recommendations() -> bool {
    true
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Build the performer graph for a collection.
///
/// The session runs on its own task, so a client that disconnects mid-fetch does not
/// cancel it: whatever was fetched still lands in the cache for the next request.
pub async fn build_graph(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<GraphRequest>,
) -> AppResult<Json<CastGraphView>> {
    if request.items.len() > MAX_COLLECTION_ITEMS {
        return Err(AppError::InvalidInput(format!(
            "Collection has {} items, at most {} are supported",
            request.items.len(),
            MAX_COLLECTION_ITEMS
        )));
    }

    tracing::info!(
        request_id = %request_id,
        items = request.items.len(),
        hide_voice_performers = request.hide_voice_performers,
        include_recommendations = request.include_recommendations,
        "Processing graph request"
    );

    let mut session = state.start_session(request.items).await;
    let hide_voice = request.hide_voice_performers;
    let include_recommendations = request.include_recommendations;

    let view = tokio::spawn(async move {
        session.load_cast().await;
        if include_recommendations {
            session.load_recommendations().await;
        }
        session.view(hide_voice, &mut StdRng::from_entropy())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Graph session failed: {}", e)))?;

    tracing::info!(
        request_id = %request_id,
        performers = view.performers.len(),
        connections = view.connections.len(),
        recommendations = view.recommendations.len(),
        "Graph built"
    );

    Ok(Json(view))
}

/// Phase and progress of the most recently started session
pub async fn graph_progress(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.latest_status().await)
}
