use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod sessions;
pub mod state;

pub use state::{AppState, ChatBackend};

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/status", get(handlers::status))
        .route("/api/reload", post(handlers::reload))
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/search", get(handlers::search))
        .route("/api/keywords", get(handlers::keywords))
        .route("/api/insights", get(handlers::insights))
        .route("/api/chat/sessions", post(handlers::create_session))
        .route("/api/chat/sessions/:id", get(handlers::get_session).delete(handlers::delete_session))
        .route("/api/chat/sessions/:id/messages", post(handlers::post_message))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use insk_core::{Result, Error};
    pub use crate::{create_app, AppState, ChatBackend};
}
