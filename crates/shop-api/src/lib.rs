//! 스토어프런트 세션 인증 API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - RS256 세션 토큰 발급/검증
//! - 인증된 세션 캐시
//! - 역할 기반 접근 정책과 Axum 추출기
//! - 세션 미들웨어와 시연용 라우트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`auth`]: 토큰 서비스, 역할, 접근 정책, 추출기
//! - [`session`]: 세션 캐시와 요청 토큰 추출
//! - [`middleware`]: 세션 파이프라인 미들웨어
//! - [`routes`]: REST 엔드포인트
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`metrics`]: Prometheus 메트릭 수집

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

pub use auth::{
    AccessPolicy, AuthError, Identity, Permission, Role, SessionAuth, SessionRecord, TokenError,
    TokenService,
};
pub use error::{ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use routes::create_api_router;
pub use session::{Carrier, SessionCache};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
