//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/rest/user/whoami` - 캐시된 현재 사용자
//! - `/rest/deluxe/status` - 디럭스 회원 확인 (DeluxeAuth)
//! - `/rest/basket/coupon/{code}` - 쿠폰 사용 (캐시된 세션 필요)
//! - `/rest/accounting/permissions` - 회계 권한 목록 (AccountingAuth)
//! - `/rest/admin/sessions` - 항상 401 (deny_all)
//! - `/redirect?to=` - 허용 목록 리다이렉트
//!
//! 모든 라우트는 [`update_authenticated_users`]를 거칩니다.

pub mod accounting;
pub mod coupon;
pub mod deluxe;
pub mod health;
pub mod redirect;
pub mod user;

use std::sync::Arc;

use axum::{http::StatusCode, middleware::from_fn_with_state, routing::get, Router};

pub use accounting::{accounting_router, PermissionsResponse};
pub use coupon::{coupon_router, CouponResponse};
pub use deluxe::{deluxe_router, DeluxeStatusResponse};
pub use health::{health_router, HealthResponse};
pub use redirect::redirect_router;
pub use user::{user_router, WhoamiResponse};

use crate::middleware::{append_user_id, deny_all, update_authenticated_users};
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 미들웨어에 상태가 필요하므로 `state`를 받습니다. 반환된 라우터에는 아직
/// 상태가 연결되지 않았으므로 호출부에서 `.with_state(state)`가 필요합니다.
pub fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let basket_router = Router::new()
        .nest("/coupon", coupon_router())
        .route_layer(from_fn_with_state(state.clone(), append_user_id));

    let locked_router = Router::new()
        .route("/sessions", get(|| async { StatusCode::NO_CONTENT }))
        .route_layer(from_fn_with_state(state.clone(), deny_all));

    Router::new()
        .merge(health_router())
        .merge(redirect_router())
        .nest("/rest/user", user_router())
        .nest("/rest/deluxe", deluxe_router())
        .nest("/rest/basket", basket_router)
        .nest("/rest/accounting", accounting_router())
        .nest("/rest/admin", locked_router)
        .layer(from_fn_with_state(state, update_authenticated_users))
}
