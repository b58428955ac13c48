//! OTP 错误定义

use souq_errors::AppError;
use thiserror::Error;

/// OTP 签发/校验失败
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Account locked due to multiple failed attempts. Try again after 30 minutes.")]
    Locked,

    #[error("Too many OTP requests. Please wait 1 hour before requesting again.")]
    SpamLocked,

    #[error("Please wait 1 minute before requesting a new OTP.")]
    Cooldown,

    #[error("Invalid or expired OTP. Please request a new one.")]
    Expired,

    #[error("Incorrect OTP. {remaining} attempt(s) remaining.")]
    Mismatch { remaining: u32 },

    #[error(transparent)]
    External(#[from] AppError),
}

impl OtpError {
    /// 用于指标标签的简短标识
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::SpamLocked => "spam_locked",
            Self::Cooldown => "cooldown",
            Self::Expired => "expired",
            Self::Mismatch { .. } => "mismatch",
            Self::External(_) => "external",
        }
    }
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        let msg = err.to_string();
        match err {
            OtpError::Locked => AppError::locked(msg),
            OtpError::SpamLocked | OtpError::Cooldown => AppError::resource_exhausted(msg),
            OtpError::Expired | OtpError::Mismatch { .. } => AppError::unauthenticated(msg),
            OtpError::External(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denials_map_to_client_errors() {
        assert_eq!(AppError::from(OtpError::Cooldown).status_code(), 429);
        assert_eq!(AppError::from(OtpError::SpamLocked).status_code(), 429);
        assert_eq!(AppError::from(OtpError::Locked).status_code(), 423);
        assert_eq!(AppError::from(OtpError::Expired).status_code(), 401);
        assert_eq!(
            AppError::from(OtpError::Mismatch { remaining: 1 }).status_code(),
            401
        );
    }

    #[test]
    fn test_external_error_passes_through() {
        let err = OtpError::External(AppError::external_service("SMTP unavailable"));
        assert_eq!(AppError::from(err).status_code(), 502);
    }
}
