//! 用户实体

use chrono::{DateTime, Utc};
use souq_common::{UserId, UserRole};

use crate::domain::value_objects::{Email, HashedPassword};

/// 用户实体
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 创建新用户
    pub fn new(name: String, email: Email, password_hash: HashedPassword, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let email = Email::new("amina@example.com").unwrap();
        let hashed = HashedPassword::from_hash("$argon2id$stub".to_string());
        let user = User::new("Amina".to_string(), email, hashed, UserRole::User);

        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.created_at, user.updated_at);
    }
}
