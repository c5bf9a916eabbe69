pub mod admin;
pub mod basket;
pub mod public;

use std::sync::Arc;

use axum::{middleware, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use tower_http::trace::TraceLayer;

use crate::middleware::session::session_middleware;
use crate::AppState;

/// URL-safe slug: lowercase alphanumeric runs separated by single hyphens.
pub(crate) static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", public::public_api_router(state.clone()))
        .nest("/api", basket::basket_router(state.clone()))
        .nest("/api/admin", admin::admin_api_router(state))
        .layer(middleware::from_fn(session_middleware))
        .layer(TraceLayer::new_for_http())
}
