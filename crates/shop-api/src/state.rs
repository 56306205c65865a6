//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `Arc<AppState>`로 라우터에 주입되며, 인증 추출기는 [`FromRef`]로
//! 필요한 구성 요소만 꺼내 씁니다.

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::{DateTime, Utc};
use shop_core::RedirectAllowlist;

use crate::auth::TokenService;
use crate::session::SessionCache;

/// 애플리케이션 공유 상태.
#[derive(Debug, Clone)]
pub struct AppState {
    /// 토큰 발급/검증
    pub tokens: TokenService,

    /// 인증된 세션 캐시 (프로세스 수명 동안 하나)
    pub sessions: SessionCache,

    /// 외부 리다이렉트 허용 목록
    pub redirects: Arc<RedirectAllowlist>,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    pub fn new(tokens: TokenService, sessions: SessionCache, redirects: RedirectAllowlist) -> Self {
        Self {
            tokens,
            sessions,
            redirects: Arc::new(redirects),
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl FromRef<Arc<AppState>> for TokenService {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.tokens.clone()
    }
}

impl FromRef<Arc<AppState>> for SessionCache {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.sessions.clone()
    }
}

/// 테스트 키 쌍과 빈 세션 캐시로 상태를 만듭니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    AppState::new(
        crate::auth::testing::test_token_service(),
        SessionCache::with_defaults(),
        RedirectAllowlist::default(),
    )
}
