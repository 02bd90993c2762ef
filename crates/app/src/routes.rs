use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec!["http://localhost:5173".to_string()],
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(origin = %origin, error = %error, "ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    // Credentials rule out wildcards, so methods and headers echo the preflight.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_router(state: AppState, config: &RouterConfig) -> Router {
    let api = Router::new()
        .route("/history", get(handlers::get_history))
        .route("/history/{item_id}", delete(handlers::delete_history_item))
        .route("/transcribe", post(handlers::transcribe))
        .route("/chat", post(handlers::chat))
        .route("/upload", post(handlers::upload));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}
