use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Router,
};
use sea_orm::EntityTrait;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::entities::product_image::Entity as ProductImageEntity;
use crate::error::ApiError;
use crate::AppState;

pub fn uploads_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/image/:id", get(print_image))
        .layer(Extension(state))
}

async fn print_image(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let image = ProductImageEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image {id}")))?;

    let path = state.upload_dir.join(&image.image);
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| ApiError::NotFound(format!("image file \"{}\"", image.image)))?;

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    Ok((headers, body))
}
