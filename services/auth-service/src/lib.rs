//! Souq 认证服务
//!
//! 负责注册/登录/找回密码全流程，核心是基于共享缓存的
//! OTP 签发与校验守卫（见 `domain::otp`）

pub mod api;
pub mod domain;
pub mod error;
pub mod infrastructure;
