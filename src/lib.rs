// Library exports for Yatube
// This allows integration tests and the binary to share the router

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod media;
pub mod pagination;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Request bodies above this size are rejected before reaching a handler.
pub const MAX_BODY_BYTES: usize = media::MAX_IMAGE_BYTES + 1024 * 1024;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let media = ServeDir::new(state.config.media_path());

    Router::new()
        .route("/", get(routes::home::index))
        .route("/assets/{*path}", get(routes::assets::serve))
        .merge(routes::posts::router())
        .merge(routes::follow::router())
        .merge(routes::auth::router())
        .merge(routes::about::router())
        .merge(routes::admin::router())
        .nest_service("/media", media)
        .fallback(routes::errors::fallback)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
