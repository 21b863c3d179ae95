use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use envkeep_application::CommitError;
use envkeep_core::AppError;
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
}

/// Error payload for a commit that stopped part way.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/commit-error-response.ts"
)]
pub struct CommitErrorResponse {
    message: String,
    landed_keys: Vec<String>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

pub(crate) fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            message: self.0.to_string(),
        });

        (status_for(&self.0), payload).into_response()
    }
}

/// Commit failure that reports which keys were already written.
#[derive(Debug)]
pub struct ApiCommitError(pub CommitError);

impl From<CommitError> for ApiCommitError {
    fn from(value: CommitError) -> Self {
        Self(value)
    }
}

impl From<AppError> for ApiCommitError {
    fn from(value: AppError) -> Self {
        Self(CommitError::Rejected(value))
    }
}

impl IntoResponse for ApiCommitError {
    fn into_response(self) -> Response {
        let payload = Json(CommitErrorResponse {
            message: self.0.to_string(),
            landed_keys: self
                .0
                .landed_keys()
                .into_iter()
                .map(|key| key.as_str().to_owned())
                .collect(),
        });

        (status_for(self.0.app_error()), payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
