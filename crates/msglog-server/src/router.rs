use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all msglog endpoints.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handler::dispatch).post(handler::dispatch))
        .route("/ws", get(handler::live_feed_handler))
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .layer(DefaultBodyLimit::max(state.config().max_body_bytes))
        .layer(TraceLayer::new_for_http());
    if state.config().allow_cors {
        router = router.layer(CorsLayer::permissive());
    }
    router.with_state(state)
}
