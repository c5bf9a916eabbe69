use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use crate::entities::{product, product::Entity as ProductEntity};
use crate::error::ApiError;
use crate::middleware::session::SessionId;
use crate::AppState;

pub fn basket_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/basket", get(basket_summary))
        .route("/basket/add", post(basket_add))
        .route("/basket/update", patch(basket_update))
        .route("/basket/delete", delete(basket_delete))
        .layer(Extension(state))
}

#[derive(Serialize)]
struct BasketLineView {
    product_id: i32,
    title: String,
    slug: String,
    regular_price: Decimal,
    discount_price: Decimal,
    quantity: u32,
    line_total: Decimal,
}

#[derive(Serialize)]
struct BasketSummary {
    lines: Vec<BasketLineView>,
    total: Decimal,
}

/// Basket lines joined with current product data. Lines whose product is
/// gone or deactivated are pruned, not surfaced.
async fn basket_summary(
    Extension(session): Extension<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = state.baskets.lines(session.0);
    let product_ids: Vec<i32> = lines.iter().map(|line| line.product_id).collect();

    let products: HashMap<i32, product::Model> = ProductEntity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .filter(product::Column::IsActive.eq(true))
        .all(&*state.db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let live: Vec<i32> = products.keys().copied().collect();
    state.baskets.prune(session.0, &live);

    let mut total = Decimal::ZERO;
    let mut views = Vec::new();
    for line in lines {
        let Some(p) = products.get(&line.product_id) else {
            continue;
        };
        let line_total = p.regular_price * Decimal::from(line.quantity);
        total += line_total;
        views.push(BasketLineView {
            product_id: p.id,
            title: p.title.clone(),
            slug: p.slug.clone(),
            regular_price: p.regular_price,
            discount_price: p.discount_price,
            quantity: line.quantity,
            line_total,
        });
    }

    Ok(Json(BasketSummary {
        lines: views,
        total,
    }))
}

#[derive(Deserialize, Validate, Debug)]
struct AddToBasket {
    product_id: i32,
    #[validate(range(min = 1))]
    quantity: u32,
}

async fn basket_add(
    Extension(session): Extension<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<AddToBasket>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let product = ProductEntity::find_by_id(payload.product_id)
        .filter(product::Column::IsActive.eq(true))
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {}", payload.product_id)))?;

    state.baskets.add(session.0, product.id, payload.quantity);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Added to the basket"
        })),
    ))
}

#[derive(Deserialize, Debug)]
struct UpdateBasket {
    product_id: i32,
    /// 0 removes the line, same as the delete endpoint.
    quantity: u32,
}

async fn basket_update(
    Extension(session): Extension<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<UpdateBasket>,
) -> Result<impl IntoResponse, ApiError> {
    if !state
        .baskets
        .update(session.0, payload.product_id, payload.quantity)
    {
        return Err(ApiError::NotFound(format!(
            "basket line for product {}",
            payload.product_id
        )));
    }
    Ok(Json(json!({
        "message": "Basket updated"
    })))
}

#[derive(Deserialize, Debug)]
struct RemoveFromBasket {
    product_id: i32,
}

async fn basket_delete(
    Extension(session): Extension<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RemoveFromBasket>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.baskets.remove(session.0, payload.product_id) {
        return Err(ApiError::NotFound(format!(
            "basket line for product {}",
            payload.product_id
        )));
    }
    Ok(Json(json!({
        "message": "Removed from the basket"
    })))
}
