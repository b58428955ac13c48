//! 服务错误定义

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use souq_errors::AppError;
use thiserror::Error;

/// 认证流程领域错误
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User already exists with this email")]
    UserAlreadyExists,

    #[error("New password cannot be the same as the old password")]
    SamePassword,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::unauthorized("Invalid email or password"),
            AuthError::UserNotFound => AppError::not_found("User not found"),
            AuthError::UserAlreadyExists => {
                AppError::conflict("User already exists with this email")
            }
            AuthError::SamePassword => {
                AppError::validation("New password cannot be the same as the old password")
            }
        }
    }
}

/// HTTP 层错误包装，统一渲染为 Problem Details 响应
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let problem = self.0.to_problem_details();
        let status =
            StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        (status, Json(problem)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
