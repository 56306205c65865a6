//! 디럭스 회원 endpoint.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{DeluxeAuth, Permission, Role};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct DeluxeStatusResponse {
    pub status: String,
    pub email: String,
    /// 디럭스 전용 혜택 이용 가능 여부
    pub offers: bool,
}

/// GET /rest/deluxe/status
///
/// 디럭스 역할이며 디럭스 토큰이 검증된 세션만 200. 그 외 403.
pub async fn deluxe_status(DeluxeAuth(record): DeluxeAuth) -> Json<DeluxeStatusResponse> {
    Json(DeluxeStatusResponse {
        status: "success".to_string(),
        email: record.data.email,
        offers: Role::Deluxe.has_permission(Permission::DeluxeOffers),
    })
}

pub fn deluxe_router() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(deluxe_status))
}
