use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use super::dto::{HistoryItem, SaveSearchRequest};
use super::repo;
use crate::{auth::jwt::AuthUser, error::ApiError, state::AppState};

/// History reads are bounded to the five most recent queries.
const RECENT_LIMIT: i64 = 5;

pub fn history_routes() -> Router<AppState> {
    Router::new().route("/search/history", post(save_search).get(get_history))
}

#[instrument(skip(state, payload))]
pub async fn save_search(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SaveSearchRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    repo::record(&state.db, user_id, &payload.query).await?;
    info!(user_id = %user_id, "search saved");
    Ok((StatusCode::CREATED, Json(json!({ "message": "Search saved" }))))
}

#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    let entries = repo::recent(&state.db, user_id, RECENT_LIMIT).await?;
    Ok(Json(entries.into_iter().map(HistoryItem::from).collect()))
}
