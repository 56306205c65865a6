//! Axum 인증 추출기.
//!
//! 핸들러 인자로 인증/인가 요구 사항을 선언합니다.
//!
//! ```rust,ignore
//! async fn deluxe_only(DeluxeAuth(record): DeluxeAuth) -> impl IntoResponse {
//!     format!("Welcome, {}", record.email())
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::policy::{authorize, AccessPolicy};
use super::{AuthError, SessionRecord, TokenService};
use crate::session::{Carrier, SessionCache};

/// 서명, 알고리즘, 만료를 모두 확인한 세션. 역할 무관.
#[derive(Debug, Clone)]
pub struct SessionAuth(pub SessionRecord);

impl<S> FromRequestParts<S> for SessionAuth
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);
        let token = Carrier::from_parts(parts).token()?;
        let record = tokens.authenticate(&token)?;
        Ok(SessionAuth(record))
    }
}

/// 세션 캐시에 있는 세션. 없으면 `None`이며 요청을 거부하지 않습니다.
#[derive(Debug, Clone)]
pub struct OptionalSessionAuth(pub Option<SessionRecord>);

impl<S> FromRequestParts<S> for OptionalSessionAuth
where
    SessionCache: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionCache::from_ref(state);
        let token = Carrier::from_parts(parts).token().ok();
        let record = match token {
            Some(token) => sessions.get(&token).await,
            None => None,
        };
        Ok(OptionalSessionAuth(record))
    }
}

macro_rules! policy_extractor {
    ($(#[$meta:meta])* $name:ident => $policy:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub SessionRecord);

        impl<S> FromRequestParts<S> for $name
        where
            TokenService: FromRef<S>,
            S: Send + Sync,
        {
            type Rejection = AuthError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                let tokens = TokenService::from_ref(state);
                authorize(&Carrier::from_parts(parts), &tokens, $policy).map($name)
            }
        }
    };
}

policy_extractor!(
    /// 고객 역할.
    CustomerAuth => AccessPolicy::Customer
);
policy_extractor!(
    /// 디럭스 역할 + 디럭스 토큰 교차 검증.
    DeluxeAuth => AccessPolicy::Deluxe
);
policy_extractor!(
    /// 회계 역할.
    AccountingAuth => AccessPolicy::Accounting
);
policy_extractor!(
    /// 관리자 역할.
    AdminAuth => AccessPolicy::Admin
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::test_token_service;
    use crate::auth::{Identity, Role};
    use axum::http::{header::AUTHORIZATION, Request};

    fn parts_with_token(token: &str) -> Parts {
        let (parts, _) = Request::builder()
            .uri("/")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[tokio::test]
    async fn test_session_auth() {
        let tokens = test_token_service();
        let token = tokens
            .issue(&Identity::new(1, "jim@juice-sh.op", Role::Customer))
            .unwrap();

        let mut parts = parts_with_token(&token);
        let SessionAuth(record) = SessionAuth::from_request_parts(&mut parts, &tokens)
            .await
            .unwrap();
        assert_eq!(record.subject_id(), 1);

        let mut parts = parts_with_token("garbage");
        assert_eq!(
            SessionAuth::from_request_parts(&mut parts, &tokens)
                .await
                .unwrap_err(),
            AuthError::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn test_role_extractors() {
        let tokens = test_token_service();
        let token = tokens
            .issue(&Identity::new(2, "accountant@juice-sh.op", Role::Accounting))
            .unwrap();

        let mut parts = parts_with_token(&token);
        assert!(AccountingAuth::from_request_parts(&mut parts, &tokens)
            .await
            .is_ok());
        assert_eq!(
            AdminAuth::from_request_parts(&mut parts, &tokens)
                .await
                .unwrap_err(),
            AuthError::RoleMismatch
        );
        assert_eq!(
            CustomerAuth::from_request_parts(&mut parts, &tokens)
                .await
                .unwrap_err(),
            AuthError::RoleMismatch
        );
        assert_eq!(
            DeluxeAuth::from_request_parts(&mut parts, &tokens)
                .await
                .unwrap_err(),
            AuthError::RoleMismatch
        );
        // 정책 추출기는 서명 실패도 역할 불일치와 같은 거부로 응답
        let mut parts = parts_with_token("garbage.token.value");
        assert_eq!(
            AccountingAuth::from_request_parts(&mut parts, &tokens)
                .await
                .unwrap_err(),
            AuthError::RoleMismatch
        );
    }

    #[tokio::test]
    async fn test_optional_session_auth_reads_cache() {
        let tokens = test_token_service();
        let sessions = SessionCache::with_defaults();
        let token = tokens
            .issue(&Identity::new(3, "amy@juice-sh.op", Role::Customer))
            .unwrap();

        let mut parts = parts_with_token(&token);
        let OptionalSessionAuth(before) =
            OptionalSessionAuth::from_request_parts(&mut parts, &sessions)
                .await
                .unwrap();
        assert!(before.is_none());

        sessions.put(&token, tokens.decode(&token).unwrap()).await;
        let OptionalSessionAuth(after) =
            OptionalSessionAuth::from_request_parts(&mut parts, &sessions)
                .await
                .unwrap();
        assert_eq!(after.map(|r| r.subject_id()), Some(3));
    }
}
