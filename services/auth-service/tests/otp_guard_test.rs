//! OTP 守卫行为测试
//!
//! 使用内存缓存与可拨动时钟模拟 TTL 到期

mod support;

use std::sync::Arc;

use souq_config::OtpConfig;
use souq_ports::CachePort;

use auth_service::domain::otp::{OtpCodeGenerator, OtpError, OtpGuard, RandomOtpCodeGenerator};
use support::{FailingEmailSender, FixedCodeGenerator, MemoryCache, RecordingEmailSender, TestClock};

const EMAIL: &str = "amina@example.com";

struct Harness {
    cache: Arc<MemoryCache>,
    clock: TestClock,
    sender: Arc<RecordingEmailSender>,
    guard: OtpGuard,
}

fn harness_with_generator(generator: Arc<dyn OtpCodeGenerator>) -> Harness {
    let clock = TestClock::new();
    let cache = Arc::new(MemoryCache::new(clock.clone()));
    let sender = Arc::new(RecordingEmailSender::default());
    let guard = OtpGuard::new(
        cache.clone(),
        sender.clone(),
        generator,
        OtpConfig::default(),
    );

    Harness {
        cache,
        clock,
        sender,
        guard,
    }
}

fn harness() -> Harness {
    harness_with_generator(Arc::new(FixedCodeGenerator("1234".to_string())))
}

async fn issue(h: &Harness) {
    h.guard
        .issue(EMAIL, "Amina", "Verify your email", "user_activation.html")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_fresh_email_has_no_restrictions() {
    let h = harness();
    assert!(h.guard.check_restrictions(EMAIL).await.is_ok());
}

#[tokio::test]
async fn test_cooldown_blocks_until_it_expires() {
    let h = harness();
    issue(&h).await;

    assert!(matches!(
        h.guard.check_restrictions(EMAIL).await,
        Err(OtpError::Cooldown)
    ));

    h.clock.advance(59);
    assert!(matches!(
        h.guard.check_restrictions(EMAIL).await,
        Err(OtpError::Cooldown)
    ));

    h.clock.advance(1);
    assert!(h.guard.check_restrictions(EMAIL).await.is_ok());
}

#[tokio::test]
async fn test_third_request_sets_spam_lock() {
    let h = harness();

    assert!(h.guard.track_request(EMAIL).await.is_ok());
    assert!(h.guard.track_request(EMAIL).await.is_ok());
    assert_eq!(
        h.cache
            .get_int(&format!("otp_request_count:{}", EMAIL))
            .await
            .unwrap(),
        Some(2)
    );

    assert!(matches!(
        h.guard.track_request(EMAIL).await,
        Err(OtpError::SpamLocked)
    ));
    assert!(matches!(
        h.guard.check_restrictions(EMAIL).await,
        Err(OtpError::SpamLocked)
    ));
}

#[tokio::test]
async fn test_spam_lock_expires_after_an_hour() {
    let h = harness();

    h.guard.track_request(EMAIL).await.unwrap();
    h.guard.track_request(EMAIL).await.unwrap();
    let _ = h.guard.track_request(EMAIL).await;

    h.clock.advance(3600);
    assert!(h.guard.check_restrictions(EMAIL).await.is_ok());
}

#[tokio::test]
async fn test_request_window_refreshes_on_every_increment() {
    let h = harness();

    // 计数窗口随每次递增刷新，而不是固定在首个请求
    h.guard.track_request(EMAIL).await.unwrap();
    h.clock.advance(2000);
    h.guard.track_request(EMAIL).await.unwrap();

    // 距首个请求已超过一小时，但计数仍然存活
    h.clock.advance(2000);
    assert!(matches!(
        h.guard.track_request(EMAIL).await,
        Err(OtpError::SpamLocked)
    ));
}

#[tokio::test]
async fn test_verify_without_pending_code_is_expired() {
    let h = harness();
    assert!(matches!(
        h.guard.verify(EMAIL, "1234").await,
        Err(OtpError::Expired)
    ));
}

#[tokio::test]
async fn test_verify_after_code_ttl_is_expired() {
    let h = harness();
    issue(&h).await;

    h.clock.advance(300);
    assert!(matches!(
        h.guard.verify(EMAIL, "1234").await,
        Err(OtpError::Expired)
    ));
}

#[tokio::test]
async fn test_wrong_code_ladder_escalates_to_lock() {
    let h = harness();
    issue(&h).await;

    assert!(matches!(
        h.guard.verify(EMAIL, "4321").await,
        Err(OtpError::Mismatch { remaining: 2 })
    ));
    assert!(matches!(
        h.guard.verify(EMAIL, "4321").await,
        Err(OtpError::Mismatch { remaining: 1 })
    ));
    assert!(matches!(
        h.guard.verify(EMAIL, "4321").await,
        Err(OtpError::Locked)
    ));

    // 锁定后验证码与计数均已删除
    assert_eq!(h.cache.get(&format!("otp:{}", EMAIL)).await.unwrap(), None);
    assert_eq!(
        h.cache
            .get(&format!("otp_attempts:{}", EMAIL))
            .await
            .unwrap(),
        None
    );

    // 正确的验证码也无法通过
    assert!(matches!(
        h.guard.verify(EMAIL, "1234").await,
        Err(OtpError::Locked)
    ));
    assert!(matches!(
        h.guard.check_restrictions(EMAIL).await,
        Err(OtpError::Locked)
    ));
}

#[tokio::test]
async fn test_lock_expires_after_thirty_minutes() {
    let h = harness();
    issue(&h).await;

    for _ in 0..3 {
        let _ = h.guard.verify(EMAIL, "0000").await;
    }
    assert!(matches!(
        h.guard.check_restrictions(EMAIL).await,
        Err(OtpError::Locked)
    ));

    h.clock.advance(1800);
    assert!(h.guard.check_restrictions(EMAIL).await.is_ok());

    // 锁定期间验证码已删除，旧验证码不会复活
    assert!(matches!(
        h.guard.verify(EMAIL, "1234").await,
        Err(OtpError::Expired)
    ));
}

#[tokio::test]
async fn test_correct_code_clears_state_and_succeeds_once() {
    let h = harness();
    issue(&h).await;

    let _ = h.guard.verify(EMAIL, "9999").await;
    assert!(h.guard.verify(EMAIL, "1234").await.is_ok());

    assert_eq!(h.cache.get(&format!("otp:{}", EMAIL)).await.unwrap(), None);
    assert_eq!(
        h.cache
            .get(&format!("otp_attempts:{}", EMAIL))
            .await
            .unwrap(),
        None
    );

    // 幂等性：第二次校验报告已过期
    assert!(matches!(
        h.guard.verify(EMAIL, "1234").await,
        Err(OtpError::Expired)
    ));
}

#[tokio::test]
async fn test_issued_code_roundtrip_with_random_generator() {
    let h = harness_with_generator(Arc::new(RandomOtpCodeGenerator));
    issue(&h).await;

    let code = h.sender.last_otp().expect("OTP present in email context");
    assert_eq!(code.len(), 4);

    assert!(h.guard.verify(EMAIL, &code).await.is_ok());
    assert!(matches!(
        h.guard.verify(EMAIL, &code).await,
        Err(OtpError::Expired)
    ));
}

#[tokio::test]
async fn test_issue_overwrites_previous_code() {
    let h = harness_with_generator(Arc::new(RandomOtpCodeGenerator));
    issue(&h).await;
    let first = h.sender.last_otp().unwrap();

    h.clock.advance(60);
    issue(&h).await;
    let second = h.sender.last_otp().unwrap();
    assert_eq!(h.sender.sent_count(), 2);

    let stored = h
        .cache
        .get(&format!("otp:{}", EMAIL))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, second);
    if first != second {
        assert!(matches!(
            h.guard.verify(EMAIL, &first).await,
            Err(OtpError::Mismatch { .. })
        ));
    }
}

#[tokio::test]
async fn test_failed_dispatch_leaves_no_state() {
    let clock = TestClock::new();
    let cache = Arc::new(MemoryCache::new(clock.clone()));
    let guard = OtpGuard::new(
        cache.clone(),
        Arc::new(FailingEmailSender),
        Arc::new(FixedCodeGenerator("1234".to_string())),
        OtpConfig::default(),
    );

    assert!(matches!(
        guard
            .issue(EMAIL, "Amina", "Verify your email", "user_activation.html")
            .await,
        Err(OtpError::External(_))
    ));

    // 发送失败不应留下验证码或冷却标记
    assert_eq!(cache.get(&format!("otp:{}", EMAIL)).await.unwrap(), None);
    assert!(guard.check_restrictions(EMAIL).await.is_ok());
}

#[tokio::test]
async fn test_spam_lock_blocks_verification_of_pending_code() {
    let h = harness();
    issue(&h).await;

    h.guard.track_request(EMAIL).await.unwrap();
    h.guard.track_request(EMAIL).await.unwrap();
    let _ = h.guard.track_request(EMAIL).await;

    assert!(matches!(
        h.guard.verify(EMAIL, "1234").await,
        Err(OtpError::SpamLocked)
    ));
}
