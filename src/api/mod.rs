//! API 模块
//!
//! 提供 REST API 支持。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use crate::api::app_state::AppState;
use crate::observability::{ObservabilityState, create_observability_router, metrics_middleware};
use crate::security::middleware::security_headers_middleware;
use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(app_state: AppState, observability: Arc<ObservabilityState>) -> Router {
    let server = app_state.config.server.clone();
    let metrics = app_state.metrics.clone();

    let api = Router::new()
        .merge(routes::chat_routes::create_chat_router())
        .merge(routes::profile_routes::create_profile_router());

    Router::new()
        .nest("/api", api)
        .with_state(app_state)
        .merge(create_observability_router(observability))
        // Add security headers middleware to all routes
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(RequestBodyLimitLayer::new(server.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout)))
        .layer(cors_layer(&server.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            metrics,
            metrics_middleware,
        ))
}

/// `"*"` 允许任意来源，否则只放行列出的来源
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
