use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::jwt::AuthUser,
    detect::{
        annotate,
        dto::{DetectRequest, DetectResponse},
        services,
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

pub fn detect_routes() -> Router<AppState> {
    Router::new().route("/detect", post(detect))
}

#[instrument(skip(state, payload))]
pub async fn detect(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    let image = payload.image.unwrap_or_default();
    if image.is_empty() {
        return Err(ApiError::Validation("Image is required".into()));
    }
    if !image.starts_with("data:image") {
        return Err(ApiError::Validation(
            "Invalid image format. Expected base64 data URL".into(),
        ));
    }

    let detections = services::detect_objects(state.detector.as_ref(), &image).await;
    let annotated_image = annotate::draw_bounding_boxes(&image, &detections);

    info!(user_id = %claims.sub, count = detections.len(), "detection complete");
    Ok(Json(DetectResponse {
        detections,
        annotated_image,
    }))
}
