//! souq-config - 配置加载库

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    // 根据环境自动调整连接池大小
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

/// Redis 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Secret<String>,
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_refresh_expires_in")]
    pub refresh_expires_in: u64,
}

fn default_expires_in() -> u64 {
    900
}

fn default_refresh_expires_in() -> u64 {
    604800
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 邮件配置
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// OTP 配置
///
/// 约束验证码签发与校验的节流阈值和各缓存键的 TTL
#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    /// 验证码有效期（秒）
    #[serde(default = "default_code_ttl_secs")]
    pub code_ttl_secs: u64,
    /// 两次请求之间的最小间隔（秒）
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// 请求计数窗口（秒）
    #[serde(default = "default_request_window_secs")]
    pub request_window_secs: u64,
    /// 窗口内允许的最大请求次数
    #[serde(default = "default_max_requests_per_window")]
    pub max_requests_per_window: u32,
    /// 超额请求后的封禁时长（秒）
    #[serde(default = "default_spam_lock_secs")]
    pub spam_lock_secs: u64,
    /// 同一验证码允许的最大错误次数
    #[serde(default = "default_max_verify_attempts")]
    pub max_verify_attempts: u32,
    /// 连续猜错后的锁定时长（秒）
    #[serde(default = "default_attempt_lock_secs")]
    pub attempt_lock_secs: u64,
}

fn default_code_ttl_secs() -> u64 {
    300
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_request_window_secs() -> u64 {
    3600
}

fn default_max_requests_per_window() -> u32 {
    3
}

fn default_spam_lock_secs() -> u64 {
    3600
}

fn default_max_verify_attempts() -> u32 {
    3
}

fn default_attempt_lock_secs() -> u64 {
    1800
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_code_ttl_secs(),
            cooldown_secs: default_cooldown_secs(),
            request_window_secs: default_request_window_secs(),
            max_requests_per_window: default_max_requests_per_window(),
            spam_lock_secs: default_spam_lock_secs(),
            max_verify_attempts: default_max_verify_attempts(),
            attempt_lock_secs: default_attempt_lock_secs(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub email: EmailConfig,
    #[serde(default)]
    pub otp: OtpConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("").split("_"))
            .extract()?;

        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
