use crate::state::AppState;
use axum::Router;

pub mod annotate;
pub mod client;
pub mod dto;
mod font;
pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::detect_routes()
}
