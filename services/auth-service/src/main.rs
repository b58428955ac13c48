//! Souq Auth Service - 认证服务入口

use std::sync::Arc;

use axum::routing::get;
use secrecy::ExposeSecret;
use souq_adapter_email::{EmailClient, EmailSender, EmailTemplate};
use souq_adapter_postgres::PostgresConfig;
use souq_adapter_redis::RedisCache;
use souq_auth_core::TokenService;
use souq_config::AppConfig;
use souq_ports::CachePort;
use souq_telemetry::{init_metrics, init_tracing, init_tracing_json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use auth_service::api::{self, AppState, HealthState};
use auth_service::domain::otp::{OtpGuard, RandomOtpCodeGenerator};
use auth_service::domain::repositories::UserRepository;
use auth_service::infrastructure::persistence::PostgresUserRepository;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load("config")?;

    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }
    let metrics_handle = init_metrics();

    // PostgreSQL
    let pg_config = PostgresConfig::new(config.database.url.expose_secret().clone())
        .with_max_connections(config.database.max_connections);
    let pool = souq_adapter_postgres::create_pool(&pg_config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Redis（OTP 守卫的状态存储）
    let redis_conn =
        souq_adapter_redis::create_connection_manager(config.redis.url.expose_secret()).await?;
    let cache: Arc<dyn CachePort> = Arc::new(RedisCache::new(redis_conn.clone()));

    // 邮件客户端
    let email_config = souq_adapter_email::EmailConfig {
        smtp_host: config.email.smtp_host.clone(),
        smtp_port: config.email.smtp_port,
        username: config.email.username.clone(),
        password: config.email.password.clone(),
        from_email: config.email.from_email.clone(),
        from_name: config.email.from_name.clone(),
        use_tls: config.email.use_tls,
        timeout_secs: config.email.timeout_secs,
    };
    let template = EmailTemplate::new("templates")?;
    let email_sender: Arc<dyn EmailSender> = Arc::new(EmailClient::new(email_config, template));

    // OTP 守卫
    let otp_guard = Arc::new(OtpGuard::new(
        cache,
        email_sender,
        Arc::new(RandomOtpCodeGenerator),
        config.otp.clone(),
    ));

    // Token 服务
    let token_service = TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in as i64,
        config.jwt.refresh_expires_in as i64,
        "souq-auth".to_string(),
        "souq".to_string(),
    );

    let user_repo: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));

    let state = AppState {
        user_repo,
        otp_guard,
        token_service,
    };

    let app = api::routes(state)
        .merge(api::health_routes(HealthState {
            pool,
            redis: redis_conn,
        }))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: std::net::SocketAddr =
        format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, app_env = %config.app_env, "Starting auth service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
