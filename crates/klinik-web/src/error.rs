//! 错误到 HTTP 响应的映射

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use klinik_core::KlinikError;
use serde_json::json;
use tracing::{error, warn};

/// 接口错误
#[derive(Debug)]
pub struct ApiError(pub KlinikError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            KlinikError::Validation(_) => StatusCode::BAD_REQUEST,
            KlinikError::NotFound(_) => StatusCode::NOT_FOUND,
            KlinikError::Config(_)
            | KlinikError::Database(_)
            | KlinikError::Spreadsheet(_)
            | KlinikError::Upstream(_)
            | KlinikError::Serialization(_)
            | KlinikError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<KlinikError> for ApiError {
    fn from(err: KlinikError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(KlinikError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(KlinikError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(KlinikError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        let body = Json(json!({
            "status": "error",
            "message": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
