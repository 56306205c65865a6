//! # 키 해시 모듈
//!
//! HMAC-SHA256 기반의 키 해시를 제공합니다. 파생 토큰(예: 디럭스 토큰)은
//! 서명 개인키를 HMAC 키로 사용해 계산하며, 비교에만 쓰이고 역산되지 않습니다.
//!
//! ## 보안 고려사항
//! - 키는 [`SecretString`]으로 보관하고 계산 시점에만 노출
//! - 검증은 `Mac::verify_slice`를 통한 상수 시간 비교

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 출력 크기 (바이트)
pub const DIGEST_SIZE: usize = 32;

/// 키 해시 에러
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid HMAC key")]
    InvalidKey,

    #[error("Invalid digest encoding")]
    InvalidDigest(#[from] hex::FromHexError),
}

/// 비밀 키로 초기화된 HMAC-SHA256 계산기.
pub struct KeyedDigest {
    key: SecretString,
}

impl KeyedDigest {
    /// 비밀 키로 생성.
    pub fn new(key: SecretString) -> Self {
        Self { key }
    }

    fn mac(&self) -> Result<HmacSha256, CryptoError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|_| CryptoError::InvalidKey)
    }

    /// 입력의 HMAC을 소문자 hex 문자열로 반환 (64자).
    pub fn hex_digest(&self, data: &str) -> Result<String, CryptoError> {
        let mut mac = self.mac()?;
        mac.update(data.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// hex 후보값이 입력의 HMAC과 일치하는지 상수 시간으로 확인.
    pub fn verify_hex(&self, data: &str, candidate: &str) -> Result<bool, CryptoError> {
        let candidate = hex::decode(candidate)?;
        if candidate.len() != DIGEST_SIZE {
            return Ok(false);
        }

        let mut mac = self.mac()?;
        mac.update(data.as_bytes());
        Ok(mac.verify_slice(&candidate).is_ok())
    }
}

impl std::fmt::Debug for KeyedDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedDigest").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> KeyedDigest {
        KeyedDigest::new(SecretString::new("unit-test-key".into()))
    }

    #[test]
    fn test_hex_digest_is_deterministic() {
        let d = digest();
        let a = d.hex_digest("alice@example.com").unwrap();
        let b = d.hex_digest("alice@example.com").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), DIGEST_SIZE * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_different_keys_different_digests() {
        let other = KeyedDigest::new(SecretString::new("another-key".into()));
        assert_ne!(
            digest().hex_digest("bob").unwrap(),
            other.hex_digest("bob").unwrap()
        );
    }

    #[test]
    fn test_verify_hex() {
        let d = digest();
        let tag = d.hex_digest("carol").unwrap();

        assert!(d.verify_hex("carol", &tag).unwrap());
        assert!(!d.verify_hex("mallory", &tag).unwrap());
        assert!(!d.verify_hex("carol", "abcd").unwrap());
        assert!(matches!(
            d.verify_hex("carol", "not-hex"),
            Err(CryptoError::InvalidDigest(_))
        ));
    }
}
