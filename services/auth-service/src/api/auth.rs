//! 认证 HTTP 处理器

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use souq_errors::AppError;
use tracing::info;

use crate::api::AppState;
use crate::domain::otp::OtpError;
use crate::domain::services::PasswordService;
use crate::domain::user::User;
use crate::domain::value_objects::{Email, Password};
use crate::error::{ApiResult, AuthError};
use crate::infrastructure::observability::metrics;
use souq_common::UserRole;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyForgotPasswordRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserSummary,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

/// 走完整的签发链：限制检查、请求计数，最后发码
async fn request_otp(
    state: &AppState,
    email: &Email,
    user_name: &str,
    subject: &str,
    template_name: &str,
) -> Result<(), OtpError> {
    state.otp_guard.check_restrictions(email.as_str()).await?;
    state.otp_guard.track_request(email.as_str()).await?;
    state
        .otp_guard
        .issue(email.as_str(), user_name, subject, template_name)
        .await?;
    Ok(())
}

/// 注册新用户：校验通过后向邮箱发送激活验证码
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required").into());
    }

    let email = Email::new(req.email.trim())?;
    Password::validate(&req.password)?;

    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AuthError::UserAlreadyExists.into());
    }

    match request_otp(
        &state,
        &email,
        name,
        "Verify your email",
        "user_activation.html",
    )
    .await
    {
        Ok(()) => metrics::record_otp_issued(),
        Err(e) => {
            metrics::record_otp_denied(e.reason());
            return Err(e.into());
        }
    }

    Ok(message(
        "OTP sent to your email. Please verify to complete registration.",
    ))
}

/// 校验激活验证码并完成注册
pub async fn verify_registration(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required").into());
    }

    let email = Email::new(req.email.trim())?;

    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AuthError::UserAlreadyExists.into());
    }

    match state.otp_guard.verify(email.as_str(), req.otp.trim()).await {
        Ok(()) => metrics::record_otp_verification(true),
        Err(e) => {
            metrics::record_otp_verification(false);
            return Err(e.into());
        }
    }

    let password_hash = PasswordService::hash_password(&req.password)?;
    let user = User::new(name.to_string(), email, password_hash, UserRole::User);
    state.user_repo.create(&user).await?;

    info!(user_id = %user.id, "User registered successfully");

    Ok((
        StatusCode::CREATED,
        message("User registered successfully"),
    ))
}

/// 登录
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = Email::new(req.email.trim())?;

    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !PasswordService::verify_password(&req.password, &user.password_hash)? {
        metrics::record_login_attempt(false);
        return Err(AuthError::InvalidCredentials.into());
    }

    let access_token = state
        .token_service
        .generate_access_token(&user.id, user.role)?;
    let refresh_token = state
        .token_service
        .generate_refresh_token(&user.id, user.role)?;

    metrics::record_login_attempt(true);
    info!(user_id = %user.id, "Login successful");

    Ok(Json(LoginResponse {
        user: UserSummary::from(&user),
        tokens: TokenResponse {
            access_token,
            refresh_token,
            expires_in: state.token_service.access_token_expires_in(),
            token_type: "Bearer".to_string(),
        },
    }))
}

/// 使用刷新令牌换取新的令牌对
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let claims = state
        .token_service
        .validate_refresh_token(&req.refresh_token)?;
    let user_id = claims.user_id()?;

    let user = state
        .user_repo
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

    let access_token = state
        .token_service
        .generate_access_token(&user.id, user.role)?;
    let refresh_token = state
        .token_service
        .generate_refresh_token(&user.id, user.role)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
        expires_in: state.token_service.access_token_expires_in(),
        token_type: "Bearer".to_string(),
    }))
}

/// 忘记密码：向注册邮箱发送重置验证码
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = Email::new(req.email.trim())?;

    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    match request_otp(
        &state,
        &email,
        &user.name,
        "Reset your password",
        "password_reset.html",
    )
    .await
    {
        Ok(()) => metrics::record_otp_issued(),
        Err(e) => {
            metrics::record_otp_denied(e.reason());
            return Err(e.into());
        }
    }

    Ok(message(
        "OTP sent to your email. Please verify to reset your password.",
    ))
}

/// 校验重置密码验证码
pub async fn verify_forgot_password(
    State(state): State<AppState>,
    Json(req): Json<VerifyForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = Email::new(req.email.trim())?;

    match state.otp_guard.verify(email.as_str(), req.otp.trim()).await {
        Ok(()) => metrics::record_otp_verification(true),
        Err(e) => {
            metrics::record_otp_verification(false);
            return Err(e.into());
        }
    }

    Ok(message("OTP verified. You can now reset your password."))
}

/// 重置密码
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = Email::new(req.email.trim())?;

    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    // 新密码不得与旧密码相同
    if PasswordService::verify_password(&req.new_password, &user.password_hash)? {
        return Err(AuthError::SamePassword.into());
    }

    let password_hash = PasswordService::hash_password(&req.new_password)?;
    state
        .user_repo
        .update_password(&user.id, &password_hash)
        .await?;

    info!(user_id = %user.id, "Password reset successfully");

    Ok(message("Password reset successfully"))
}
