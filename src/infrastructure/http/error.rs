//! HTTP Error Handling
//!
//! 处理链逃逸的错误映射为统一错误信封

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{ApiResult, FacadeError};

impl IntoResponse for FacadeError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let coded = self.to_coded();

        if self.is_client_error() {
            tracing::warn!(code = coded.code, error = %self, "Request failed");
        } else {
            tracing::error!(code = coded.code, error = %self, "Request failed");
        }

        (status, Json(ApiResult::from(&coded))).into_response()
    }
}
