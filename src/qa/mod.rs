use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod heuristic;
pub mod llm;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::qa_routes()
}
