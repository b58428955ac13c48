//! 用户 Repository 接口

use async_trait::async_trait;
use souq_common::UserId;
use souq_errors::AppResult;

use crate::domain::user::User;
use crate::domain::value_objects::{Email, HashedPassword};

/// 用户存储接口
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 按 ID 查找用户
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>>;

    /// 按邮箱查找用户
    async fn find_by_email(&self, email: &Email) -> AppResult<Option<User>>;

    /// 创建用户
    async fn create(&self, user: &User) -> AppResult<()>;

    /// 更新用户密码
    async fn update_password(&self, id: &UserId, password_hash: &HashedPassword) -> AppResult<()>;
}
