use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => Self::ValidationError(msg),
            other => {
                tracing::error!("Internal error: {:?}", other);
                Self::InternalError(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::InternalError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse { error: message })
            }
            Self::ValidationError(message) => {
                (StatusCode::BAD_REQUEST, ErrorResponse { error: message })
            }
        };

        (status, Json(error_response)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: ApiError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        let api_error = ApiError::from(AppError::Validation("PDF 파일만 업로드 가능합니다.".into()));
        assert!(matches!(api_error, ApiError::ValidationError(_)));
        assert_eq!(status_of(api_error), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_map_to_internal_server_error() {
        let api_error = ApiError::from(AppError::Processing("stage failed".into()));
        assert_eq!(status_of(api_error), StatusCode::INTERNAL_SERVER_ERROR);

        let io_error = ApiError::from(AppError::Io(std::io::Error::other("io error")));
        assert_eq!(status_of(io_error), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
