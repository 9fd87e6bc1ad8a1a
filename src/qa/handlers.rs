use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    extract::ApiJson,
    qa::{
        dto::{normalize_detections, QaRequest, QaResponse},
        services,
    },
    state::AppState,
};

pub fn qa_routes() -> Router<AppState> {
    Router::new().route("/qa", post(qa))
}

#[instrument(skip(state, payload))]
pub async fn qa(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<QaRequest>,
) -> Result<Json<QaResponse>, ApiError> {
    let question = payload.question.unwrap_or_default().trim().to_string();
    if question.is_empty() {
        return Err(ApiError::Validation("Question is required".into()));
    }

    // Absent detections read as an empty list; present-but-not-an-array is
    // a client error.
    let detections_value = payload
        .detections
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
    let items = detections_value
        .as_array()
        .ok_or_else(|| ApiError::Validation("Detections must be an array".into()))?;
    let detections = normalize_detections(items)?;

    let answer = services::answer(&question, &detections, state.llm.as_deref()).await;

    info!(user_id = %claims.sub, detections = detections.len(), "qa answered");
    Ok(Json(QaResponse { answer }))
}
