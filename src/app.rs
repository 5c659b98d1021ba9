use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, handlers::health_check};
use crate::redirect;
use crate::registry::LinkRegistry;

/// Assemble the full HTTP surface: health check, `/api` management routes
/// and the catch-all redirect route.
///
/// Fixed routes take precedence over `/{code}`, which is why `healthz` is a
/// reserved code.
pub fn create_app(registry: Arc<LinkRegistry>, base_url: String) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .nest("/api", api::create_api_router(Arc::clone(&registry), base_url))
        .merge(redirect::create_redirect_router(registry))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
