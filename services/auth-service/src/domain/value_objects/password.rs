//! Password 值对象

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::fmt;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;
/// 要求的最小复杂度类型数量（小写、大写、数字、特殊字符）
const MIN_COMPLEXITY_TYPES: usize = 2;

/// 哈希后的密码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// 从明文密码创建哈希密码
    pub fn from_plain(plain_password: &str) -> Result<Self, PasswordError> {
        Password::validate(plain_password)?;

        // 使用 Argon2 哈希密码
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();

        Ok(Self(password_hash))
    }

    /// 验证明文密码是否匹配
    pub fn verify(&self, plain_password: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(&self.0).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plain_password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// 从已有的哈希字符串创建
    pub fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    /// 获取字符串引用
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// 明文密码（仅用于验证）
pub struct Password;

impl Password {
    /// 验证密码策略
    pub fn validate(password: &str) -> Result<(), PasswordError> {
        if password.len() < MIN_LENGTH {
            return Err(PasswordError::TooShort(MIN_LENGTH));
        }

        if password.len() > MAX_LENGTH {
            return Err(PasswordError::TooLong(MAX_LENGTH));
        }

        let has_lowercase = password.chars().any(|c| c.is_lowercase());
        let has_uppercase = password.chars().any(|c| c.is_uppercase());
        let has_digit = password.chars().any(|c| c.is_numeric());
        let has_special = password.chars().any(|c| !c.is_alphanumeric());

        let complexity_count = [has_lowercase, has_uppercase, has_digit, has_special]
            .iter()
            .filter(|&&x| x)
            .count();

        if complexity_count < MIN_COMPLEXITY_TYPES {
            return Err(PasswordError::TooWeak {
                required_types: MIN_COMPLEXITY_TYPES,
                found_types: complexity_count,
            });
        }

        Ok(())
    }
}

/// Password 错误
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password is too short (minimum {0} characters)")]
    TooShort(usize),

    #[error("Password is too long (maximum {0} characters)")]
    TooLong(usize),

    #[error(
        "Password is too weak (requires {required_types} character types, found {found_types})"
    )]
    TooWeak {
        required_types: usize,
        found_types: usize,
    },

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

impl From<PasswordError> for souq_errors::AppError {
    fn from(err: PasswordError) -> Self {
        souq_errors::AppError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = HashedPassword::from_plain("Secure1234").unwrap();
        assert!(hashed.verify("Secure1234").unwrap());
        assert!(!hashed.verify("WrongPass1").unwrap());
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(matches!(
            Password::validate("Ab1"),
            Err(PasswordError::TooShort(_))
        ));
    }

    #[test]
    fn test_single_character_class_rejected() {
        assert!(matches!(
            Password::validate("alllowercase"),
            Err(PasswordError::TooWeak { .. })
        ));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = HashedPassword::from_plain("Secure1234").unwrap();
        let b = HashedPassword::from_plain("Secure1234").unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }
}
