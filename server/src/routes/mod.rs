//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the realtime channel (websocket upgrade at the
//! channel path, long-polling under `{path}/poll`), the board and post HTTP
//! API under `/api`, and a health probe. CORS and request tracing wrap
//! everything.

pub mod boards;
pub mod channel;
pub mod polling;
pub mod posts;

use axum::Router;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, patch, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let path = state.config.channel_path.clone();
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .route(&path, get(channel::handle_ws))
        .route(&format!("{path}/poll"), post(polling::open))
        .route(
            &format!("{path}/poll/{{sid}}"),
            get(polling::poll).post(polling::push).delete(polling::close),
        )
        .route("/api/posts", get(posts::list).post(posts::create))
        .route("/api/posts/{id}", patch(posts::update_status).delete(posts::delete))
        .route("/api/boards", get(boards::list).post(boards::create))
        .route("/api/boards/active", get(boards::active))
        .route("/api/boards/{id}", get(boards::get).patch(boards::update))
        .route("/api/boards/{id}/activate", post(boards::activate))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            warn!(error = %e, "routes: invalid CORS origin, allowing any");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };
    CorsLayer::new().allow_origin(allow_origin).allow_methods(Any).allow_headers(Any)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
