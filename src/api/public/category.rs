use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::public::product::ProductListItem;
use crate::entities::category;
use crate::error::ApiError;
use crate::AppState;

pub fn category_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/category", get(get_categories))
        .route("/shop/:category_slug", get(shop_category))
        .layer(Extension(state))
}

/// Flat depth-first rendering of the forest; `depth` lets the storefront
/// indent without reassembling the tree.
#[derive(Serialize)]
struct CategoryResponse {
    id: i32,
    name: String,
    slug: String,
    parent_id: Option<i32>,
    depth: i32,
}

impl CategoryResponse {
    fn new(value: category::Model) -> CategoryResponse {
        CategoryResponse {
            id: value.id,
            name: value.name,
            slug: value.slug,
            parent_id: value.parent_id,
            depth: value.depth,
        }
    }
}

#[derive(Serialize)]
struct ShopResponse {
    category: CategoryResponse,
    products: Vec<ProductListItem>,
}

async fn get_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let forest = state.tree.forest().await?;
    let response: Vec<CategoryResponse> = forest
        .into_iter()
        .filter(|node| node.is_active)
        .map(CategoryResponse::new)
        .collect();
    Ok(Json(response))
}

/// The category page: the category itself plus every active product in its
/// subtree.
async fn shop_category(
    Path(category_slug): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let node = state.tree.resolve_by_slug(&category_slug).await?;
    let subtree = state.tree.descendants(node.id, true).await?;
    let category_ids: Vec<i32> = subtree.iter().map(|n| n.id).collect();

    let products = state
        .catalog
        .list_products_in_categories(category_ids)
        .await?;

    Ok(Json(ShopResponse {
        category: CategoryResponse::new(node),
        products: products.into_iter().map(ProductListItem::new).collect(),
    }))
}
