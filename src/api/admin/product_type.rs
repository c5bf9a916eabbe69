use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::{
    product_specification, product_specification::Entity as SpecificationEntity, product_type,
    product_type::Entity as ProductTypeEntity,
};
use crate::error::ApiError;
use crate::AppState;

pub fn admin_product_type_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/product_type", get(list_types).post(create_type))
        .route(
            "/product_type/:id",
            get(get_type).patch(patch_type).delete(delete_type),
        )
        .route("/product_type/:id/specification", post(create_specification))
        .route(
            "/specification/:id",
            patch(patch_specification).delete(delete_specification),
        )
        .layer(Extension(state))
}

async fn list_types(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let types = ProductTypeEntity::find()
        .order_by_asc(product_type::Column::Name)
        .all(&*state.db)
        .await?;
    Ok(Json(types))
}

#[derive(Deserialize, Validate, Debug)]
struct CreateProductType {
    #[validate(length(min = 1, max = 255))]
    name: String,
    is_active: Option<bool>,
}

async fn create_type(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateProductType>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let taken = ProductTypeEntity::find()
        .filter(product_type::Column::Name.eq(payload.name.as_str()))
        .one(&*state.db)
        .await?
        .is_some();
    if taken {
        return Err(ApiError::DuplicateName(payload.name));
    }

    let new_type = product_type::ActiveModel {
        name: Set(payload.name),
        is_active: Set(payload.is_active.unwrap_or(true)),
        ..Default::default()
    };
    let created = new_type.insert(&*state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// The type with its specification slots inline, like the admin screen
/// shows them.
#[derive(Serialize)]
struct ProductTypeDetail {
    #[serde(flatten)]
    product_type: product_type::Model,
    specifications: Vec<product_specification::Model>,
}

async fn get_type(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let type_row = ProductTypeEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product type {id}")))?;

    let specifications = SpecificationEntity::find()
        .filter(product_specification::Column::ProductTypeId.eq(id))
        .order_by_asc(product_specification::Column::Id)
        .all(&*state.db)
        .await?;

    Ok(Json(ProductTypeDetail {
        product_type: type_row,
        specifications,
    }))
}

#[derive(Deserialize, Validate, Debug)]
struct PatchProductType {
    #[validate(length(min = 1, max = 255))]
    name: Option<String>,
    is_active: Option<bool>,
}

async fn patch_type(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchProductType>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let type_row = ProductTypeEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product type {id}")))?;

    if let Some(name) = &payload.name {
        let taken = ProductTypeEntity::find()
            .filter(product_type::Column::Name.eq(name.as_str()))
            .filter(product_type::Column::Id.ne(id))
            .one(&*state.db)
            .await?
            .is_some();
        if taken {
            return Err(ApiError::DuplicateName(name.clone()));
        }
    }

    let mut type_row: product_type::ActiveModel = type_row.into();
    if let Some(name) = payload.name {
        type_row.name = Set(name);
    }
    if let Some(is_active) = payload.is_active {
        type_row.is_active = Set(is_active);
    }
    let updated = type_row.update(&*state.db).await?;
    Ok(Json(updated))
}

async fn delete_type(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_product_type(id).await?;
    Ok(Json(json!({
        "message": "Product type deleted successfully"
    })))
}

#[derive(Deserialize, Validate, Debug)]
struct CreateSpecification {
    #[validate(length(min = 1, max = 255))]
    name: String,
}

async fn create_specification(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateSpecification>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    if ProductTypeEntity::find_by_id(id).one(&*state.db).await?.is_none() {
        return Err(ApiError::NotFound(format!("product type {id}")));
    }

    let new_specification = product_specification::ActiveModel {
        product_type_id: Set(id),
        name: Set(payload.name),
        ..Default::default()
    };
    let created = new_specification.insert(&*state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize, Validate, Debug)]
struct PatchSpecification {
    #[validate(length(min = 1, max = 255))]
    name: String,
}

async fn patch_specification(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchSpecification>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let specification = SpecificationEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("specification {id}")))?;

    let mut specification: product_specification::ActiveModel = specification.into();
    specification.name = Set(payload.name);
    let updated = specification.update(&*state.db).await?;
    Ok(Json(updated))
}

async fn delete_specification(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_specification(id).await?;
    Ok(Json(json!({
        "message": "Specification deleted successfully"
    })))
}
