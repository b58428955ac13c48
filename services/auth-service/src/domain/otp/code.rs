//! 验证码生成

use rand::Rng;

/// 验证码生成器
///
/// 抽象出随机源，便于在测试中固定验证码
pub trait OtpCodeGenerator: Send + Sync {
    /// 生成一个 4 位数字验证码（1000–9999）
    fn generate(&self) -> String;
}

/// 默认实现，使用线程本地 RNG
pub struct RandomOtpCodeGenerator;

impl OtpCodeGenerator for RandomOtpCodeGenerator {
    fn generate(&self) -> String {
        rand::thread_rng().gen_range(1000..=9999).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_always_four_digits() {
        let generator = RandomOtpCodeGenerator;
        for _ in 0..200 {
            let code = generator.generate();
            assert_eq!(code.len(), 4);
            let value: u32 = code.parse().unwrap();
            assert!((1000..=9999).contains(&value));
        }
    }
}
