use axum::{routing::get, Router};
use std::sync::Arc;

use crate::registry::LinkRegistry;

use super::handlers::{redirect_link, RedirectState};

pub fn create_redirect_router(registry: Arc<LinkRegistry>) -> Router {
    let state = Arc::new(RedirectState { registry });

    Router::new()
        .route("/{code}", get(redirect_link))
        .with_state(state)
}
