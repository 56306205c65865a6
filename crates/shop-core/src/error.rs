//! 스토어프런트 코어의 에러 타입.
//!
//! 이 모듈은 설정 로딩, 키 처리 등 코어 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 스토어프런트 에러.
#[derive(Debug, Error)]
pub enum ShopError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 서명 키 에러
    #[error("키 에러: {0}")]
    Key(String),

    /// 암호화/해시 에러
    #[error("암호화 에러: {0}")]
    Crypto(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 코어 작업을 위한 Result 타입.
pub type ShopResult<T> = Result<T, ShopError>;

impl ShopError {
    /// 프로세스 시작을 중단해야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShopError::Config(_) | ShopError::Key(_))
    }
}

impl From<serde_json::Error> for ShopError {
    fn from(err: serde_json::Error) -> Self {
        ShopError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ShopError {
    fn from(err: config::ConfigError) -> Self {
        ShopError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ShopError {
    fn from(err: std::io::Error) -> Self {
        ShopError::Key(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_fatal() {
        let key_err = ShopError::Key("missing private key".to_string());
        assert!(key_err.is_fatal());

        let input_err = ShopError::InvalidInput("empty email".to_string());
        assert!(!input_err.is_fatal());
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let shop_err: ShopError = err.into();
        assert!(matches!(shop_err, ShopError::Serialization(_)));
    }
}
