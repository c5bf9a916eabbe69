use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

/// Error surface shared by the tree, catalog and basket layers. Every variant
/// except `Db` maps to a client-visible status; `Db` is logged and hidden.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("the name \"{0}\" is already taken")]
    DuplicateName(String),
    #[error("the slug \"{0}\" is already taken")]
    DuplicateSlug(String),
    #[error("cannot move a category into its own subtree")]
    Cycle,
    #[error("{0}")]
    HasActiveReferences(String),
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateName(_)
            | ApiError::DuplicateSlug(_)
            | ApiError::HasActiveReferences(_) => StatusCode::CONFLICT,
            ApiError::Cycle | ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            return (
                status,
                Json(json!({
                    "error": "Internal server error"
                })),
            )
                .into_response();
        }
        (
            status,
            Json(json!({
                "error": self.to_string()
            })),
        )
            .into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}
