//! 测试辅助：内存版基础设施
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use souq_adapter_email::EmailSender;
use souq_common::UserId;
use souq_errors::{AppError, AppResult};
use souq_ports::CachePort;

use auth_service::domain::otp::OtpCodeGenerator;
use auth_service::domain::repositories::UserRepository;
use auth_service::domain::user::User;
use auth_service::domain::value_objects::{Email, HashedPassword};

/// 可手动拨动的测试时钟（秒）
#[derive(Clone, Default)]
pub struct TestClock(Arc<Mutex<u64>>);

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, secs: u64) {
        *self.0.lock().unwrap() += secs;
    }

    fn now(&self) -> u64 {
        *self.0.lock().unwrap()
    }
}

/// 带 TTL 语义的内存缓存
///
/// 过期判定依赖注入的时钟，读取时惰性清除
pub struct MemoryCache {
    clock: TestClock,
    entries: Mutex<HashMap<String, (String, Option<u64>)>>,
}

impl MemoryCache {
    pub fn new(clock: TestClock) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires_at)) => {
                if expires_at.is_some_and(|at| self.clock.now() >= at) {
                    entries.remove(key);
                    None
                } else {
                    Some(value.clone())
                }
            }
            None => None,
        }
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.live_value(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let expires_at = ttl.map(|d| self.clock.now() + d.as_secs());
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[&str]) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.live_value(key).is_some())
    }

    async fn get_int(&self, key: &str) -> AppResult<Option<i64>> {
        Ok(self.live_value(key).and_then(|v| v.parse().ok()))
    }
}

/// 固定验证码生成器
pub struct FixedCodeGenerator(pub String);

impl OtpCodeGenerator for FixedCodeGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// 已发送邮件的记录
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub context: serde_json::Value,
}

/// 记录型邮件发送器
#[derive(Default)]
pub struct RecordingEmailSender {
    pub sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailSender {
    /// 最后一封邮件里的验证码
    pub fn last_otp(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .and_then(|mail| mail.context.get("otp"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_template_email(
        &self,
        to: &str,
        subject: &str,
        template_name: &str,
        context: &serde_json::Value,
    ) -> AppResult<()> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            template: template_name.to_string(),
            context: context.clone(),
        });
        Ok(())
    }
}

/// 始终失败的邮件发送器
pub struct FailingEmailSender;

#[async_trait]
impl EmailSender for FailingEmailSender {
    async fn send_template_email(
        &self,
        _to: &str,
        _subject: &str,
        _template_name: &str,
        _context: &serde_json::Value,
    ) -> AppResult<()> {
        Err(AppError::external_service("SMTP unavailable"))
    }
}

/// 内存用户存储
#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| &u.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::conflict("User already exists with this email"));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update_password(&self, id: &UserId, password_hash: &HashedPassword) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| &u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.clone();
                Ok(())
            }
            None => Err(AppError::not_found("User not found")),
        }
    }
}
