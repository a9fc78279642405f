use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Quire endpoints.
pub fn build_router(state: AppState, max_request_bytes: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/publications", post(handler::publish_handler))
        .route(
            "/v1/publications/by-filename/:filename",
            get(handler::lookup_handler),
        )
        .route("/v1/publications/:id", delete(handler::delete_handler))
        .route("/p/:id", get(handler::read_handler))
        .route("/p/:id/unlock", post(handler::unlock_handler))
        .route("/p/:id/images/:name", get(handler::image_handler))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
