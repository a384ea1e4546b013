//! HTTP surface over the engine for hosting screens: state/district lists,
//! one-shot suggestion search, reverse resolution, and suggestion details.

mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::Engine;

pub fn build_router(engine: Arc<Engine>) -> Router {
    let state = Arc::new(AppState { engine });

    Router::new()
        .route("/api/states", get(handlers::states))
        .route("/api/districts", get(handlers::districts))
        .route("/api/suggest", get(handlers::suggest))
        .route("/api/reverse", get(handlers::reverse))
        .route("/api/resolve", post(handlers::resolve))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(engine: Arc<Engine>, host: &str, port: u16) {
    let app = build_router(engine);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  GramDisha place API listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    });
}
