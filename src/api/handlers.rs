use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::models::{CreateLinkRequest, CreatedLink, Link, RequestedCode};
use crate::registry::{LinkRegistry, RegistryError};
use crate::validate::is_valid_url;

pub struct AppState {
    pub registry: Arc<LinkRegistry>,
    pub base_url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: RegistryError) -> ApiError {
    let (status, message) = match &err {
        RegistryError::InvalidUrl => (StatusCode::BAD_REQUEST, "Invalid url".to_string()),
        RegistryError::InvalidCode => (
            StatusCode::BAD_REQUEST,
            "Custom code must match [A-Za-z0-9]{6,8}".to_string(),
        ),
        RegistryError::CodeConflict(_) => (StatusCode::CONFLICT, "Code already exists".to_string()),
        RegistryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        RegistryError::CodeSpaceExhausted(_) => {
            tracing::warn!(error = %err, "short code generation exhausted");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Could not allocate a short code, try again later".to_string(),
            )
        }
        RegistryError::StorageUnavailable(source) => {
            tracing::error!(error = ?source, "storage failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Storage unavailable".to_string(),
            )
        }
    };

    (status, Json(ErrorResponse { error: message }))
}

/// Whether the request declares a JSON body (`application/json` or `application/*+json`).
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Create a new short link
///
/// Malformed bodies answer 400 with `{"error": ...}` like any other invalid
/// input. A body without a JSON content type, or one that does not decode,
/// reads as an empty request and fails on the missing url.
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedLink>), ApiError> {
    let payload = if has_json_content_type(&headers) {
        CreateLinkRequest::from_slice(&body)
    } else {
        CreateLinkRequest::default()
    };

    let url = payload.url();
    let code = match payload.code() {
        RequestedCode::Generate => None,
        RequestedCode::Custom(code) => Some(code),
        // A bad url is still reported ahead of a bad code.
        RequestedCode::Malformed if !is_valid_url(url) => {
            return Err(error_response(RegistryError::InvalidUrl))
        }
        RequestedCode::Malformed => return Err(error_response(RegistryError::InvalidCode)),
    };

    let link = state
        .registry
        .create(url, code)
        .await
        .map_err(error_response)?;

    tracing::info!(code = %link.code, url = %link.url, "created link");

    Ok((
        StatusCode::CREATED,
        Json(CreatedLink::new(link, &state.base_url)),
    ))
}

/// List all links, newest first
pub async fn list_links(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Link>>, ApiError> {
    let links = state.registry.list().await.map_err(error_response)?;
    Ok(Json(links))
}

/// Get a link and its stats by code
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Link>, ApiError> {
    let link = state.registry.get(&code).await.map_err(error_response)?;
    Ok(Json(link))
}

/// Delete a link
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let link = state.registry.delete(&code).await.map_err(error_response)?;
    tracing::info!(code = %link.code, "deleted link");
    Ok(Json(OkResponse { ok: true }))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}
