pub mod category;
pub mod product;
pub mod uploads;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

pub fn public_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(category::category_router(state.clone()))
        .merge(product::product_router(state.clone()))
        .merge(uploads::uploads_router(state))
}
