//! 인증 및 권한 부여.
//!
//! RS256 세션 토큰과 역할 기반 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`TokenService`]: 토큰 발급/검증/디코딩, 디럭스 토큰 계산
//! - [`SessionRecord`]: 토큰 페이로드
//! - [`Role`], [`Permission`]: 역할과 권한
//! - [`AccessPolicy`], [`authorize`]: 요청 단위 정책 검사
//! - [`SessionAuth`], [`DeluxeAuth`] 등: Axum 추출기
//! - [`AuthError`]: 요청 경계 에러 (401/403 변환)

mod error;
mod extractor;
mod policy;
mod roles;
mod token;

pub use error::{AuthError, FORBIDDEN_MESSAGE, UNAUTHORIZED_MESSAGE};
pub use extractor::{
    AccountingAuth, AdminAuth, CustomerAuth, DeluxeAuth, OptionalSessionAuth, SessionAuth,
};
pub use policy::{authorize, is_accounting, is_customer, is_deluxe, is_deluxe_record, AccessPolicy};
pub use roles::{Permission, Role};
pub use token::{
    Identity, SessionRecord, SessionUser, TokenError, TokenService, DEFAULT_TOKEN_TTL_HOURS,
    MAX_TOKEN_TTL_HOURS,
    TOKEN_ALGORITHM,
};

#[cfg(any(test, feature = "test-utils"))]
pub use token::testing;
