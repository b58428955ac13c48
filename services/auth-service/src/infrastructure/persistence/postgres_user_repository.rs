//! PostgreSQL 用户 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use souq_common::{UserId, UserRole};
use souq_errors::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::repositories::UserRepository;
use crate::domain::user::User;
use crate::domain::value_objects::{Email, HashedPassword};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, String> {
        let email = Email::new(self.email).map_err(|e| e.to_string())?;
        let role =
            UserRole::parse(&self.role).ok_or_else(|| format!("Unknown role: {}", self.role))?;

        Ok(User {
            id: UserId::from_uuid(self.id),
            name: self.name,
            email,
            password_hash: HashedPassword::from_hash(self.password_hash),
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.into_user().map_err(AppError::database)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.into_user().map_err(AppError::database)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.0)
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.password_hash.as_str())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("User already exists with this email")
            }
            _ => AppError::database(format!("Failed to create user: {}", e)),
        })?;

        Ok(())
    }

    async fn update_password(&self, id: &UserId, password_hash: &HashedPassword) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(password_hash.as_str())
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update password: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        Ok(())
    }
}
