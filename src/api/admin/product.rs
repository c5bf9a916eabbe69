use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::api::SLUG_REGEX;
use crate::catalog::max_price;
use crate::entities::{
    category::Entity as CategoryEntity, product, product::Entity as ProductEntity, product_image,
    product_image::Entity as ProductImageEntity, product_image::PLACEHOLDER_IMAGE,
    product_specification::Entity as SpecificationEntity, product_specification_value,
    product_specification_value::Entity as SpecificationValueEntity,
    product_type::Entity as ProductTypeEntity,
};
use crate::error::ApiError;
use crate::AppState;

pub fn admin_product_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/product", get(list_products).post(create_product))
        .route(
            "/product/:id",
            get(get_product).patch(patch_product).delete(delete_product),
        )
        .route(
            "/product/:id/specification_value",
            post(create_specification_value),
        )
        .route(
            "/specification_value/:id",
            patch(patch_specification_value).delete(delete_specification_value),
        )
        .route("/product/:id/image", post(upload_image))
        .route("/image/:id", patch(patch_image).delete(delete_image))
        .layer(Extension(state))
}

/// Prices come in as `Decimal`; anything outside the `Decimal(5, 2)` column
/// range is refused before it reaches the store.
fn checked_price(label: &str, value: Decimal) -> Result<Decimal, ApiError> {
    if value.is_sign_negative() || value > max_price() {
        return Err(ApiError::Validation(format!(
            "{label} must be between 0 and {}",
            max_price()
        )));
    }
    Ok(value.round_dp(2))
}

async fn list_products(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = ProductEntity::find()
        .order_by_desc(product::Column::CreatedAt)
        .all(&*state.db)
        .await?;
    Ok(Json(products))
}

#[derive(Deserialize, Validate, Debug)]
struct CreateProduct {
    product_type_id: i32,
    category_id: i32,
    #[validate(length(min = 1, max = 255))]
    title: String,
    #[serde(default)]
    description: String,
    #[validate(length(min = 1, max = 255), regex(path = *SLUG_REGEX))]
    slug: String,
    regular_price: Decimal,
    discount_price: Decimal,
    is_active: Option<bool>,
}

async fn create_product(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateProduct>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let regular_price = checked_price("regular_price", payload.regular_price)?;
    let discount_price = checked_price("discount_price", payload.discount_price)?;

    if ProductTypeEntity::find_by_id(payload.product_type_id)
        .one(&*state.db)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "product type {}",
            payload.product_type_id
        )));
    }
    if CategoryEntity::find_by_id(payload.category_id)
        .one(&*state.db)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "category {}",
            payload.category_id
        )));
    }
    let taken = ProductEntity::find()
        .filter(product::Column::Slug.eq(payload.slug.as_str()))
        .one(&*state.db)
        .await?
        .is_some();
    if taken {
        return Err(ApiError::DuplicateSlug(payload.slug));
    }

    let now = Utc::now();
    let new_product = product::ActiveModel {
        product_type_id: Set(payload.product_type_id),
        category_id: Set(payload.category_id),
        title: Set(payload.title),
        description: Set(payload.description),
        slug: Set(payload.slug),
        regular_price: Set(regular_price),
        discount_price: Set(discount_price),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_product.insert(&*state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Serialize)]
struct SpecificationValueRow {
    #[serde(flatten)]
    value: product_specification_value::Model,
    specification: String,
}

/// The admin product page: the row plus its values and images inline.
#[derive(Serialize)]
struct AdminProductDetail {
    #[serde(flatten)]
    product: product::Model,
    specification_values: Vec<SpecificationValueRow>,
    images: Vec<product_image::Model>,
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let product_row = ProductEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;

    let values = SpecificationValueEntity::find()
        .filter(product_specification_value::Column::ProductId.eq(id))
        .all(&*state.db)
        .await?;
    let spec_ids: Vec<i32> = values.iter().map(|v| v.specification_id).collect();
    let names: HashMap<i32, String> = SpecificationEntity::find()
        .filter(crate::entities::product_specification::Column::Id.is_in(spec_ids))
        .all(&*state.db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let specification_values = values
        .into_iter()
        .map(|v| SpecificationValueRow {
            specification: names.get(&v.specification_id).cloned().unwrap_or_default(),
            value: v,
        })
        .collect();

    let images = ProductImageEntity::find()
        .filter(product_image::Column::ProductId.eq(id))
        .order_by_asc(product_image::Column::Id)
        .all(&*state.db)
        .await?;

    Ok(Json(AdminProductDetail {
        product: product_row,
        specification_values,
        images,
    }))
}

#[derive(Deserialize, Validate, Debug)]
struct PatchProduct {
    product_type_id: Option<i32>,
    category_id: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    title: Option<String>,
    description: Option<String>,
    #[validate(length(min = 1, max = 255), regex(path = *SLUG_REGEX))]
    slug: Option<String>,
    regular_price: Option<Decimal>,
    discount_price: Option<Decimal>,
    is_active: Option<bool>,
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchProduct>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let product_row = ProductEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;

    if let Some(type_id) = payload.product_type_id {
        if ProductTypeEntity::find_by_id(type_id)
            .one(&*state.db)
            .await?
            .is_none()
        {
            return Err(ApiError::NotFound(format!("product type {type_id}")));
        }
    }
    if let Some(category_id) = payload.category_id {
        if CategoryEntity::find_by_id(category_id)
            .one(&*state.db)
            .await?
            .is_none()
        {
            return Err(ApiError::NotFound(format!("category {category_id}")));
        }
    }
    if let Some(slug) = &payload.slug {
        let taken = ProductEntity::find()
            .filter(product::Column::Slug.eq(slug.as_str()))
            .filter(product::Column::Id.ne(id))
            .one(&*state.db)
            .await?
            .is_some();
        if taken {
            return Err(ApiError::DuplicateSlug(slug.clone()));
        }
    }

    let mut product_row: product::ActiveModel = product_row.into();
    if let Some(type_id) = payload.product_type_id {
        product_row.product_type_id = Set(type_id);
    }
    if let Some(category_id) = payload.category_id {
        product_row.category_id = Set(category_id);
    }
    if let Some(title) = payload.title {
        product_row.title = Set(title);
    }
    if let Some(description) = payload.description {
        product_row.description = Set(description);
    }
    if let Some(slug) = payload.slug {
        product_row.slug = Set(slug);
    }
    if let Some(price) = payload.regular_price {
        product_row.regular_price = Set(checked_price("regular_price", price)?);
    }
    if let Some(price) = payload.discount_price {
        product_row.discount_price = Set(checked_price("discount_price", price)?);
    }
    if let Some(is_active) = payload.is_active {
        product_row.is_active = Set(is_active);
    }
    // created_at stays untouched for the row's whole life
    product_row.updated_at = Set(Utc::now());

    let updated = product_row.update(&*state.db).await?;
    Ok(Json(updated))
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_product(id).await?;
    Ok(Json(json!({
        "message": "Product deleted successfully"
    })))
}

#[derive(Deserialize, Validate, Debug)]
struct CreateSpecificationValue {
    specification_id: i32,
    #[validate(length(min = 1, max = 255))]
    value: String,
}

async fn create_specification_value(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateSpecificationValue>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    if ProductEntity::find_by_id(id).one(&*state.db).await?.is_none() {
        return Err(ApiError::NotFound(format!("product {id}")));
    }
    if SpecificationEntity::find_by_id(payload.specification_id)
        .one(&*state.db)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "specification {}",
            payload.specification_id
        )));
    }

    let new_value = product_specification_value::ActiveModel {
        product_id: Set(id),
        specification_id: Set(payload.specification_id),
        value: Set(payload.value),
        ..Default::default()
    };
    let created = new_value.insert(&*state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize, Validate, Debug)]
struct PatchSpecificationValue {
    #[validate(length(min = 1, max = 255))]
    value: String,
}

async fn patch_specification_value(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchSpecificationValue>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let value_row = SpecificationValueEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("specification value {id}")))?;

    let mut value_row: product_specification_value::ActiveModel = value_row.into();
    value_row.value = Set(payload.value);
    let updated = value_row.update(&*state.db).await?;
    Ok(Json(updated))
}

async fn delete_specification_value(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = SpecificationValueEntity::delete_by_id(id)
        .exec(&*state.db)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("specification value {id}")));
    }
    Ok(Json(json!({
        "message": "Specification value deleted successfully"
    })))
}

fn allowed_content_types() -> HashMap<&'static str, &'static str> {
    HashMap::from([("image/jpeg", "jpg"), ("image/png", "png")])
}

/// Multipart upload: an optional `image` file part (jpg/png), plus optional
/// `alt_text` and `is_feature` text parts. Without a file part the row is
/// created pointing at the placeholder image.
async fn upload_image(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    if ProductEntity::find_by_id(id).one(&*state.db).await?.is_none() {
        return Err(ApiError::NotFound(format!("product {id}")));
    }

    let mut file_name: Option<String> = None;
    let mut alt_text: Option<String> = None;
    let mut is_feature = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(err.to_string()))?
    {
        match field.name() {
            Some("image") => {
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let Some(extension) = allowed_content_types().get(content_type.as_str()).copied()
                else {
                    return Err(ApiError::Validation(format!(
                        "unsupported image content type \"{content_type}\""
                    )));
                };
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::Validation(err.to_string()))?;

                let name = format!("{}.{}", Uuid::new_v4(), extension);
                tokio::fs::create_dir_all(&state.upload_dir)
                    .await
                    .map_err(|err| {
                        ApiError::Validation(format!("failed to prepare upload dir: {err}"))
                    })?;
                tokio::fs::write(state.upload_dir.join(&name), &data)
                    .await
                    .map_err(|err| {
                        ApiError::Validation(format!("failed to store the image: {err}"))
                    })?;
                file_name = Some(name);
            }
            Some("alt_text") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::Validation(err.to_string()))?;
                if text.len() > 255 {
                    return Err(ApiError::Validation(
                        "alt_text must be at most 255 characters".to_owned(),
                    ));
                }
                alt_text = Some(text);
            }
            Some("is_feature") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::Validation(err.to_string()))?;
                is_feature = text.trim().eq_ignore_ascii_case("true");
            }
            _ => {}
        }
    }

    let now = Utc::now();
    let new_image = product_image::ActiveModel {
        product_id: Set(id),
        image: Set(file_name.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned())),
        alt_text: Set(alt_text),
        is_feature: Set(is_feature),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_image.insert(&*state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// An absent `alt_text` leaves the text untouched; an explicit `null`
/// clears it.
#[derive(Deserialize, Debug)]
struct PatchImage {
    #[serde(default, deserialize_with = "double_option")]
    alt_text: Option<Option<String>>,
    is_feature: Option<bool>,
}

async fn patch_image(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchImage>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(Some(text)) = &payload.alt_text {
        if text.len() > 255 {
            return Err(ApiError::Validation(
                "alt_text must be at most 255 characters".to_owned(),
            ));
        }
    }

    let image = ProductImageEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image {id}")))?;

    let mut image: product_image::ActiveModel = image.into();
    if let Some(alt_text) = payload.alt_text {
        image.alt_text = Set(alt_text);
    }
    if let Some(is_feature) = payload.is_feature {
        image.is_feature = Set(is_feature);
    }
    image.updated_at = Set(Utc::now());
    let updated = image.update(&*state.db).await?;
    Ok(Json(updated))
}

async fn delete_image(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let image = ProductImageEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image {id}")))?;

    let file = image.image.clone();
    ProductImageEntity::delete_by_id(id).exec(&*state.db).await?;

    // the placeholder is shared, everything else is this row's own file
    if file != PLACEHOLDER_IMAGE {
        let _ = tokio::fs::remove_file(state.upload_dir.join(&file)).await;
    }

    Ok(Json(json!({
        "message": "Image deleted successfully"
    })))
}
