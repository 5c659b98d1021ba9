use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

use crate::registry::{LinkRegistry, RegistryError};

pub struct RedirectState {
    pub registry: Arc<LinkRegistry>,
}

/// Count the visit and redirect to the link's target (302 Found).
///
/// Malformed and unknown codes produce the same 404 response.
pub async fn redirect_link(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
) -> Response {
    match state.registry.resolve_and_count(&code, Utc::now()).await {
        Ok(link) => {
            tracing::debug!(code = %link.code, clicks = link.clicks, "redirecting");
            (StatusCode::FOUND, [(header::LOCATION, link.url)]).into_response()
        }
        Err(RegistryError::InvalidCode) => {
            tracing::debug!(code = %code, "rejected malformed code");
            not_found()
        }
        Err(RegistryError::NotFound) => {
            tracing::debug!(code = %code, "unknown code");
            not_found()
        }
        Err(err) => {
            tracing::error!(code = %code, error = ?err, "failed to resolve code");
            (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
