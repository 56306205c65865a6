//! 세션 토큰 발급/검증.
//!
//! RS256으로 서명된 `header.payload.signature` 형식의 토큰을 다룹니다.
//! 페이로드는 `{ status, data: { id, email, role, deluxeToken, .. }, bid, iat, exp }` 입니다.
//!
//! 검증([`TokenService::verify`])과 디코딩([`TokenService::decode`])은 분리되어 있습니다.
//! `decode`는 서명을 확인하지 않으므로, 진위가 중요한 호출부는 반드시 `verify`를 먼저 호출해야 합니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shop_core::config::AuthConfig;
use shop_core::crypto::KeyedDigest;
use shop_core::ShopError;

use super::Role;

/// 허용되는 유일한 서명 알고리즘.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::RS256;

/// 기본 토큰 유효 시간 (시간).
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 6;
/// 허용하는 최대 토큰 유효 시간 (1년).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

/// 로그인 시 외부 사용자 조회가 돌려주는 신원 정보.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: u64,
    pub email: String,
    pub role: Role,
    pub deluxe_token: Option<String>,
    pub last_login_ip: Option<String>,
    pub profile_image: Option<String>,
    pub basket_id: Option<u64>,
}

impl Identity {
    pub fn new(id: u64, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
            deluxe_token: None,
            last_login_ip: None,
            profile_image: None,
            basket_id: None,
        }
    }

    pub fn with_deluxe_token(mut self, token: impl Into<String>) -> Self {
        self.deluxe_token = Some(token.into());
        self
    }

    pub fn with_basket(mut self, basket_id: u64) -> Self {
        self.basket_id = Some(basket_id);
        self
    }
}

/// 토큰 페이로드의 `data` 객체.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Subject - 사용자 ID
    pub id: u64,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deluxe_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl From<&Identity> for SessionUser {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            deluxe_token: identity.deluxe_token.clone(),
            last_login_ip: identity.last_login_ip.clone(),
            profile_image: identity.profile_image.clone(),
        }
    }
}

/// 디코딩된 세션 레코드 (토큰 페이로드 전체).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub data: SessionUser,
    /// 장바구니 ID
    #[serde(rename = "bid", default, skip_serializing_if = "Option::is_none")]
    pub basket_id: Option<u64>,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl SessionRecord {
    pub fn subject_id(&self) -> u64 {
        self.data.id
    }

    pub fn email(&self) -> &str {
        &self.data.email
    }

    pub fn role(&self) -> Role {
        self.data.role
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// 주어진 시각 기준으로 만료되었는지 확인.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl From<&SessionRecord> for Identity {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.data.id,
            email: record.data.email.clone(),
            role: record.data.role,
            deluxe_token: record.data.deluxe_token.clone(),
            last_login_ip: record.data.last_login_ip.clone(),
            profile_image: record.data.profile_image.clone(),
            basket_id: record.basket_id,
        }
    }
}

/// 토큰 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error("서명이 유효하지 않습니다")]
    SignatureInvalid,
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("잘못된 토큰 형식")]
    Malformed,
    #[error("키 로드 실패: {0}")]
    Key(String),
    #[error("토큰 유효 시간은 1~{max}시간이어야 합니다: {0}", max = MAX_TOKEN_TTL_HOURS)]
    InvalidTtl(i64),
}

impl From<TokenError> for ShopError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Key(msg) => ShopError::Key(msg),
            TokenError::InvalidTtl(_) => ShopError::Config(err.to_string()),
            other => ShopError::Crypto(other.to_string()),
        }
    }
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    deluxe: KeyedDigest,
    ttl: Duration,
    /// 서명 + 알고리즘만 확인 (만료 무시)
    signature_only: Validation,
    /// 서명 + 알고리즘 + 만료
    full: Validation,
    /// 서명 확인 없이 페이로드만 추출
    unverified: Validation,
}

/// 세션 토큰 서비스.
///
/// 개인키로 서명하고 공개키로 검증합니다. 개인키는 디럭스 토큰 계산에도 쓰입니다.
/// 내부 상태는 `Arc`로 공유되므로 복제 비용이 작습니다.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<TokenKeys>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("ttl_hours", &self.keys.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// PEM 키 쌍으로 생성.
    ///
    /// # Arguments
    ///
    /// * `public_pem` - RSA 공개키 (SPKI 또는 PKCS#1)
    /// * `private_pem` - RSA 개인키 (PKCS#8 또는 PKCS#1)
    /// * `ttl_hours` - 토큰 유효 시간 (시간, 1 ~ [`MAX_TOKEN_TTL_HOURS`])
    pub fn from_pem(
        public_pem: &str,
        private_pem: SecretString,
        ttl_hours: i64,
    ) -> Result<Self, TokenError> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&ttl_hours) {
            return Err(TokenError::InvalidTtl(ttl_hours));
        }
        let encoding = EncodingKey::from_rsa_pem(private_pem.expose_secret().as_bytes())
            .map_err(|e| TokenError::Key(format!("private key: {}", e)))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| TokenError::Key(format!("public key: {}", e)))?;

        let mut signature_only = Validation::new(TOKEN_ALGORITHM);
        signature_only.validate_exp = false;
        signature_only.validate_aud = false;
        signature_only.required_spec_claims.clear();

        let mut full = Validation::new(TOKEN_ALGORITHM);
        full.validate_aud = false;

        let mut unverified = signature_only.clone();
        unverified.insecure_disable_signature_validation();

        Ok(Self {
            keys: Arc::new(TokenKeys {
                encoding,
                decoding,
                deluxe: KeyedDigest::new(private_pem),
                ttl: Duration::hours(ttl_hours),
                signature_only,
                full,
                unverified,
            }),
        })
    }

    /// 설정에서 키를 읽어 생성.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ShopError> {
        let keys = config.load_keys()?;
        Ok(Self::from_pem(
            &keys.public_pem,
            keys.private_pem,
            config.token_ttl_hours,
        )?)
    }

    /// 토큰 유효 시간.
    pub fn ttl(&self) -> Duration {
        self.keys.ttl
    }

    /// 신원으로 토큰을 발급합니다. 만료는 발급 시각 + TTL.
    ///
    /// 세션 캐시에는 넣지 않습니다.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// 지정한 발급 시각으로 토큰을 발급합니다.
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let record = SessionRecord {
            status: Some("success".to_string()),
            data: SessionUser::from(identity),
            basket_id: identity.basket_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.keys.ttl).timestamp(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &record, &self.keys.encoding)
            .map_err(TokenError::Encoding)
    }

    /// 서명과 알고리즘을 확인합니다. 만료는 확인하지 않습니다.
    ///
    /// 잘못된 입력에는 `false`를 반환하며 패닉하지 않습니다.
    pub fn verify(&self, token: &str) -> bool {
        let ok = !token.is_empty()
            && decode::<serde_json::Value>(token, &self.keys.decoding, &self.keys.signature_only)
                .is_ok();
        crate::metrics::record_verification(ok);
        ok
    }

    /// 서명 확인 없이 페이로드를 추출합니다.
    ///
    /// 진위가 필요하면 먼저 [`Self::verify`]를 호출하세요.
    pub fn decode(&self, token: &str) -> Option<SessionRecord> {
        // 서명 검증을 끈 경우 키는 사용되지 않는다.
        decode::<SessionRecord>(token, &DecodingKey::from_secret(&[]), &self.keys.unverified)
            .ok()
            .map(|data| data.claims)
    }

    /// 서명, 알고리즘, 만료를 모두 확인하고 레코드를 반환합니다.
    pub fn authenticate(&self, token: &str) -> Result<SessionRecord, TokenError> {
        let result = decode::<SessionRecord>(token, &self.keys.decoding, &self.keys.full)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            });

        crate::metrics::record_verification(result.is_ok());
        if let Err(e) = &result {
            tracing::debug!(error = %e, "Token authentication failed");
        }
        result
    }

    /// 이메일에서 디럭스 토큰을 계산합니다: HMAC-SHA256(개인키, email + "deluxe").
    pub fn derive_deluxe_token(&self, email: &str) -> Result<String, TokenError> {
        self.keys
            .deluxe
            .hex_digest(&deluxe_input(email))
            .map_err(|e| TokenError::Key(e.to_string()))
    }

    /// 후보 디럭스 토큰이 이메일에서 계산한 값과 일치하는지 상수 시간으로 비교.
    pub fn verify_deluxe_token(&self, email: &str, candidate: &str) -> bool {
        self.keys
            .deluxe
            .verify_hex(&deluxe_input(email), candidate)
            .unwrap_or(false)
    }
}

fn deluxe_input(email: &str) -> String {
    format!("{}{}", email, Role::Deluxe)
}

/// 테스트용 키 쌍과 서비스.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;

    pub const TEST_PUBLIC_KEY: &str = include_str!("../../testdata/jwt.pub");
    pub const TEST_PRIVATE_KEY: &str = include_str!("../../testdata/jwt.key");

    pub fn test_token_service() -> TokenService {
        TokenService::from_pem(
            TEST_PUBLIC_KEY,
            SecretString::new(TEST_PRIVATE_KEY.into()),
            DEFAULT_TOKEN_TTL_HOURS,
        )
        .expect("test key pair")
    }
}
