use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::SLUG_REGEX;
use crate::error::ApiError;
use crate::tree::{CategoryPatch, NewCategory};
use crate::AppState;

pub fn admin_category_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/category", get(list_categories).post(create_category))
        .route(
            "/category/:id",
            get(get_category)
                .patch(patch_category)
                .delete(delete_category),
        )
        .route("/category/:id/move", post(move_category))
        .layer(Extension(state))
}

// raw forest rows, bookkeeping included, depth-first
async fn list_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let forest = state.tree.forest().await?;
    Ok(Json(forest))
}

#[derive(Deserialize, Validate, Debug)]
struct CreateCategory {
    #[validate(length(min = 1, max = 255))]
    name: String,
    #[validate(length(min = 1, max = 255), regex(path = *SLUG_REGEX))]
    slug: String,
    parent_id: Option<i32>,
    is_active: Option<bool>,
}

async fn create_category(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateCategory>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let created = state
        .tree
        .insert(NewCategory {
            name: payload.name,
            slug: payload.slug,
            parent_id: payload.parent_id,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_category(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let node = state.tree.get(id).await?;
    Ok(Json(node))
}

#[derive(Deserialize, Validate, Debug)]
struct PatchCategory {
    #[validate(length(min = 1, max = 255))]
    name: Option<String>,
    #[validate(length(min = 1, max = 255), regex(path = *SLUG_REGEX))]
    slug: Option<String>,
    is_active: Option<bool>,
}

async fn patch_category(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchCategory>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let updated = state
        .tree
        .update(
            id,
            CategoryPatch {
                name: payload.name,
                slug: payload.slug,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(updated))
}

#[derive(Deserialize, Debug)]
struct MoveCategory {
    /// `null` moves the node to the root level.
    parent_id: Option<i32>,
}

async fn move_category(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<MoveCategory>,
) -> Result<impl IntoResponse, ApiError> {
    state.tree.move_node(id, payload.parent_id).await?;
    Ok(Json(json!({
        "message": "Category moved successfully"
    })))
}

async fn delete_category(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.tree.delete(id).await?;
    Ok(Json(json!({
        "message": "Category deleted successfully"
    })))
}
