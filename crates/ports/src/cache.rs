//! Cache trait 定义

use async_trait::async_trait;
use souq_errors::AppResult;
use std::time::Duration;

/// 缓存 trait
///
/// 所有值以字符串形式存取，TTL 到期后由存储端自动清除
#[async_trait]
pub trait CachePort: Send + Sync {
    /// 获取缓存值
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 设置缓存值
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// 删除缓存
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// 删除多个键（单次调用）
    async fn delete_many(&self, keys: &[&str]) -> AppResult<()>;

    /// 检查是否存在
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// 获取整数值，键不存在时返回 None
    async fn get_int(&self, key: &str) -> AppResult<Option<i64>>;
}
