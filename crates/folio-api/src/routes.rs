//! Router setup with all API routes and middleware.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use folio_core::{FolioConfig, FolioError};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

/// CORS for the configured front-end origins. Unparseable origins are skipped.
fn cors_layer(config: &FolioConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let limiter = RateLimiter::new(state.config.server.rate_limit_per_sec);

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/guestbook", get(handlers::list_guestbook));

    // Writes share one budget; merged with the GET above by path.
    let limited_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/guestbook", post(handlers::sign_guestbook))
        .layer(axum::middleware::from_fn(
            crate::rate_limit::rate_limit_middleware,
        ))
        .layer(axum::Extension(limiter));

    let admin_routes = Router::new()
        .route("/chat/sessions", get(handlers::list_sessions))
        .route("/chat/sessions/{id}", delete(handlers::delete_session))
        .route("/chat/sessions/{id}/history", get(handlers::session_history))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_admin,
        ));

    public_routes
        .merge(limited_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind to the configured host and port and serve until shutdown.
pub async fn start_server(state: AppState) -> Result<(), FolioError> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FolioError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| FolioError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
