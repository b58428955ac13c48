//! 健康检查

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use redis::aio::ConnectionManager;
use serde::Serialize;
use souq_telemetry::HealthStatus;
use sqlx::PgPool;

/// 健康检查依赖
#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
    pub redis: ConnectionManager,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub checks: Vec<HealthCheckEntry>,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckEntry {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<HealthStatus> for HealthResponse {
    fn from(status: HealthStatus) -> Self {
        Self {
            healthy: status.healthy,
            checks: status
                .checks
                .into_iter()
                .map(|c| HealthCheckEntry {
                    name: c.name,
                    healthy: c.healthy,
                    message: c.message,
                })
                .collect(),
        }
    }
}

/// 汇总 PostgreSQL 与 Redis 的连通性
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let mut status = HealthStatus::new();

    let pg = souq_adapter_postgres::check_connection(&state.pool).await;
    status.add_check("postgres", pg.is_ok(), pg.err().map(|e| e.to_string()));

    let mut conn = state.redis.clone();
    let redis = souq_adapter_redis::check_connection(&mut conn).await;
    status.add_check("redis", redis.is_ok(), redis.err().map(|e| e.to_string()));

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(HealthResponse::from(status)))
}
