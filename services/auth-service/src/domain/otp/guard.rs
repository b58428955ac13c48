//! OTP 守卫
//!
//! 以共享缓存为临时状态，对验证码的签发与校验实施三级节流：
//! 冷却、请求封禁、错误锁定。所有键以邮箱为主体，到期自动清除。

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use souq_adapter_email::EmailSender;
use souq_config::OtpConfig;
use souq_ports::CachePort;
use tracing::{debug, info, warn};

use super::code::OtpCodeGenerator;
use super::error::OtpError;

fn otp_key(email: &str) -> String {
    format!("otp:{}", email)
}

fn cooldown_key(email: &str) -> String {
    format!("otp_cooldown:{}", email)
}

fn request_count_key(email: &str) -> String {
    format!("otp_request_count:{}", email)
}

fn spam_lock_key(email: &str) -> String {
    format!("otp_spam_lock:{}", email)
}

fn attempts_key(email: &str) -> String {
    format!("otp_attempts:{}", email)
}

fn lock_key(email: &str) -> String {
    format!("otp_lock:{}", email)
}

/// OTP 守卫
pub struct OtpGuard {
    cache: Arc<dyn CachePort>,
    email_sender: Arc<dyn EmailSender>,
    code_generator: Arc<dyn OtpCodeGenerator>,
    config: OtpConfig,
}

impl OtpGuard {
    pub fn new(
        cache: Arc<dyn CachePort>,
        email_sender: Arc<dyn EmailSender>,
        code_generator: Arc<dyn OtpCodeGenerator>,
        config: OtpConfig,
    ) -> Self {
        Self {
            cache,
            email_sender,
            code_generator,
            config,
        }
    }

    /// 检查当前限制（只读，不产生副作用）
    ///
    /// 优先级：错误锁定 > 请求封禁 > 冷却，命中即返回
    pub async fn check_restrictions(&self, email: &str) -> Result<(), OtpError> {
        if self.cache.exists(&lock_key(email)).await? {
            return Err(OtpError::Locked);
        }

        if self.cache.exists(&spam_lock_key(email)).await? {
            return Err(OtpError::SpamLocked);
        }

        if self.cache.exists(&cooldown_key(email)).await? {
            return Err(OtpError::Cooldown);
        }

        Ok(())
    }

    /// 记录一次签发请求
    ///
    /// 窗口内第三次及以后的请求触发请求封禁
    pub async fn track_request(&self, email: &str) -> Result<(), OtpError> {
        let count = self
            .cache
            .get_int(&request_count_key(email))
            .await?
            .unwrap_or(0);

        if count + 1 >= i64::from(self.config.max_requests_per_window) {
            self.cache
                .set(
                    &spam_lock_key(email),
                    "1",
                    Some(Duration::from_secs(self.config.spam_lock_secs)),
                )
                .await?;

            warn!(email = %email, count = count, "OTP request limit exceeded, spam lock set");
            return Err(OtpError::SpamLocked);
        }

        // 计数随每次递增整体重写，窗口 TTL 一并刷新
        self.cache
            .set(
                &request_count_key(email),
                &(count + 1).to_string(),
                Some(Duration::from_secs(self.config.request_window_secs)),
            )
            .await?;

        debug!(email = %email, count = count + 1, "OTP request tracked");
        Ok(())
    }

    /// 签发验证码并发送通知邮件
    ///
    /// 仅应在 `check_restrictions` 与 `track_request` 均放行后调用。
    /// 邮件发送失败时不写入任何键。
    pub async fn issue(
        &self,
        email: &str,
        user_name: &str,
        subject: &str,
        template_name: &str,
    ) -> Result<(), OtpError> {
        let code = self.code_generator.generate();

        let context = json!({
            "user_name": user_name,
            "otp": code,
            "expires_minutes": self.config.code_ttl_secs / 60,
        });

        self.email_sender
            .send_template_email(email, subject, template_name, &context)
            .await?;

        // 新验证码覆盖旧值，同一邮箱同一时刻只有一个待验证码
        self.cache
            .set(
                &otp_key(email),
                &code,
                Some(Duration::from_secs(self.config.code_ttl_secs)),
            )
            .await?;
        self.cache
            .set(
                &cooldown_key(email),
                "1",
                Some(Duration::from_secs(self.config.cooldown_secs)),
            )
            .await?;

        info!(email = %email, template = %template_name, "OTP issued");
        Ok(())
    }

    /// 校验提交的验证码
    ///
    /// 锁定与封禁状态下拒绝一切校验；连续第三次猜错升级为错误锁定，
    /// 同时删除待验证码与计数；校验成功同样删除两者。
    pub async fn verify(&self, email: &str, submitted_code: &str) -> Result<(), OtpError> {
        if self.cache.exists(&lock_key(email)).await? {
            return Err(OtpError::Locked);
        }

        if self.cache.exists(&spam_lock_key(email)).await? {
            return Err(OtpError::SpamLocked);
        }

        let stored = match self.cache.get(&otp_key(email)).await? {
            Some(code) => code,
            None => return Err(OtpError::Expired),
        };

        let attempts = self
            .cache
            .get_int(&attempts_key(email))
            .await?
            .unwrap_or(0);

        let otp_k = otp_key(email);
        let attempts_k = attempts_key(email);

        if submitted_code != stored {
            if attempts + 1 >= i64::from(self.config.max_verify_attempts) {
                self.cache
                    .set(
                        &lock_key(email),
                        "1",
                        Some(Duration::from_secs(self.config.attempt_lock_secs)),
                    )
                    .await?;
                self.cache
                    .delete_many(&[otp_k.as_str(), attempts_k.as_str()])
                    .await?;

                warn!(email = %email, "Too many failed OTP attempts, lock set");
                return Err(OtpError::Locked);
            }

            self.cache
                .set(
                    &attempts_k,
                    &(attempts + 1).to_string(),
                    Some(Duration::from_secs(self.config.code_ttl_secs)),
                )
                .await?;

            let remaining = (i64::from(self.config.max_verify_attempts) - 1 - attempts).max(0) as u32;
            warn!(email = %email, remaining = remaining, "OTP mismatch");
            return Err(OtpError::Mismatch { remaining });
        }

        self.cache
            .delete_many(&[otp_k.as_str(), attempts_k.as_str()])
            .await?;

        info!(email = %email, "OTP verified successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_patterns() {
        assert_eq!(otp_key("a@b.com"), "otp:a@b.com");
        assert_eq!(cooldown_key("a@b.com"), "otp_cooldown:a@b.com");
        assert_eq!(request_count_key("a@b.com"), "otp_request_count:a@b.com");
        assert_eq!(spam_lock_key("a@b.com"), "otp_spam_lock:a@b.com");
        assert_eq!(attempts_key("a@b.com"), "otp_attempts:a@b.com");
        assert_eq!(lock_key("a@b.com"), "otp_lock:a@b.com");
    }
}
