use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::entities::{
    product, product::Entity as ProductEntity, wishlist_entry,
    wishlist_entry::Entity as WishlistEntity,
};
use crate::error::ApiError;
use crate::middleware::session::SessionId;
use crate::AppState;

pub fn product_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/product", get(get_products))
        .route("/product/:slug", get(get_product))
        .route(
            "/product/:slug/wishlist",
            axum::routing::post(add_to_wishlist).delete(remove_from_wishlist),
        )
        .route("/wishlist", get(get_wishlist))
        .layer(Extension(state))
}

/// List entry for the storefront: display data only, no bookkeeping.
#[derive(Serialize)]
pub struct ProductListItem {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub regular_price: Decimal,
    pub discount_price: Decimal,
}

impl ProductListItem {
    pub fn new(value: product::Model) -> ProductListItem {
        ProductListItem {
            id: value.id,
            title: value.title,
            slug: value.slug,
            regular_price: value.regular_price,
            discount_price: value.discount_price,
        }
    }
}

async fn get_products(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.catalog.list_active_products().await?;
    let response: Vec<ProductListItem> = products.into_iter().map(ProductListItem::new).collect();
    Ok(Json(response))
}

async fn get_product(
    Path(slug): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.catalog.product_detail(&slug).await?;
    Ok(Json(detail))
}

async fn add_to_wishlist(
    Path(slug): Path<String>,
    Extension(session): Extension<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.get_product_by_slug(&slug).await?;
    let token = session.0.to_string();

    let existing = WishlistEntity::find()
        .filter(wishlist_entry::Column::ProductId.eq(product.id))
        .filter(wishlist_entry::Column::SessionToken.eq(token.as_str()))
        .one(&*state.db)
        .await?;
    if existing.is_some() {
        return Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Already on the wishlist"
            })),
        ));
    }

    let entry = wishlist_entry::ActiveModel {
        product_id: Set(product.id),
        session_token: Set(token),
        ..Default::default()
    };
    WishlistEntity::insert(entry).exec(&*state.db).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Added to the wishlist"
        })),
    ))
}

async fn remove_from_wishlist(
    Path(slug): Path<String>,
    Extension(session): Extension<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.get_product_by_slug(&slug).await?;

    let deleted = WishlistEntity::delete_many()
        .filter(wishlist_entry::Column::ProductId.eq(product.id))
        .filter(wishlist_entry::Column::SessionToken.eq(session.0.to_string()))
        .exec(&*state.db)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("wishlist entry for \"{slug}\"")));
    }
    Ok(Json(json!({
        "message": "Removed from the wishlist"
    })))
}

async fn get_wishlist(
    Extension(session): Extension<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = WishlistEntity::find()
        .filter(wishlist_entry::Column::SessionToken.eq(session.0.to_string()))
        .all(&*state.db)
        .await?;
    let product_ids: Vec<i32> = entries.iter().map(|entry| entry.product_id).collect();
    let products = ProductEntity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .filter(product::Column::IsActive.eq(true))
        .all(&*state.db)
        .await?;
    let response: Vec<ProductListItem> = products.into_iter().map(ProductListItem::new).collect();
    Ok(Json(response))
}
