use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::registry::LinkRegistry;

use super::handlers::{create_link, delete_link, get_link, list_links, AppState};

/// Management routes, mounted under `/api` by the caller.
pub fn create_api_router(registry: Arc<LinkRegistry>, base_url: String) -> Router {
    let state = Arc::new(AppState { registry, base_url });

    Router::new()
        .route("/links", post(create_link).get(list_links))
        .route("/links/{code}", get(get_link).delete(delete_link))
        .with_state(state)
}
