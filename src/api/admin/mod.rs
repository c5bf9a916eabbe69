pub mod category;
pub mod product;
pub mod product_type;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

pub fn admin_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(category::admin_category_router(state.clone()))
        .merge(product_type::admin_product_type_router(state.clone()))
        .merge(product::admin_product_router(state))
}
