//! Mapping of domain failures onto HTTP statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ldk_schemas::{NotFound, ValidationError};

use crate::api_types::ErrorResponse;

/// Any handler failure. Validation → 400, missing row → 404, everything
/// else → 500.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.find::<ValidationError>().is_some() {
            StatusCode::BAD_REQUEST
        } else if self.find::<NotFound>().is_some() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn find<T: std::error::Error + Send + Sync + 'static>(&self) -> Option<&T> {
        self.0.chain().find_map(|c| c.downcast_ref::<T>())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = match status {
            StatusCode::BAD_REQUEST => "validation",
            StatusCode::NOT_FOUND => "not_found",
            _ => "internal",
        };
        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                kind: kind.to_string(),
                error: format!("{:#}", self.0),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
