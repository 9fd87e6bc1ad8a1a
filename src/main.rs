use std::net::SocketAddr;

mod app;
mod auth;
mod config;
mod detect;
mod error;
mod extract;
mod qa;
mod state;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "vision_platform=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port).parse()?;
    let production = state.config.production;
    let app = app::build_app(state);

    tracing::info!(production, "listening on {}", addr);
    tracing::info!("health check: http://{}/health", addr);
    tracing::info!("auth endpoints: http://{}/api/auth/*", addr);
    tracing::info!("detection endpoint: http://{}/api/detect", addr);
    tracing::info!("qa endpoint: http://{}/api/qa", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
