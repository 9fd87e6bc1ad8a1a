use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// `Json` with its rejection folded into the API error contract: any
/// malformed body surfaces as a 400 `{"error": ...}` response instead of
/// axum's plain-text 415/422 defaults, and serde's decode detail stays out
/// of the client body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                        "Invalid request body"
                    }
                    // Missing body or missing JSON content type.
                    _ => "Request body is required",
                };
                Err(ApiError::Validation(message.to_string()))
            }
        }
    }
}
