//! 认证服务业务指标

use metrics::counter;

/// 记录一次验证码签发
pub fn record_otp_issued() {
    counter!("auth_otp_issued_total").increment(1);
}

/// 记录一次被拒绝的验证码请求
pub fn record_otp_denied(reason: &'static str) {
    counter!("auth_otp_denied_total", "reason" => reason).increment(1);
}

/// 记录一次验证码校验
pub fn record_otp_verification(success: bool) {
    let labels = [("success", success.to_string())];
    counter!("auth_otp_verifications_total", &labels).increment(1);
}

/// 记录一次登录尝试
pub fn record_login_attempt(success: bool) {
    let labels = [("success", success.to_string())];
    counter!("auth_login_attempts_total", &labels).increment(1);
}
