//! HTTP API 层

pub mod auth;
pub mod health;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use souq_auth_core::TokenService;

use crate::domain::otp::OtpGuard;
use crate::domain::repositories::UserRepository;

pub use health::HealthState;

/// 服务共享状态
#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<dyn UserRepository>,
    pub otp_guard: Arc<OtpGuard>,
    pub token_service: TokenService,
}

/// 认证路由
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/verify", post(auth::verify_registration))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh_token))
        .route("/api/auth/password/forgot", post(auth::forgot_password))
        .route("/api/auth/password/verify", post(auth::verify_forgot_password))
        .route("/api/auth/password/reset", post(auth::reset_password))
        .with_state(state)
}

/// 健康检查路由
pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .with_state(state)
}
