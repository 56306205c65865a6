//! 장바구니 쿠폰 endpoint.
//!
//! `GET /rest/basket/coupon/{code}?total=<금액>`
//!
//! 현재 달(UTC)에 유효한 쿠폰이면 할인율과, `total`이 주어진 경우 할인 후 금액을 돌려줍니다.
//! 쿠폰 코드는 URL에 안전하지 않은 문자를 포함할 수 있으므로 퍼센트 인코딩해서 보내야 합니다.

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_core::Coupon;
use tracing::debug;

use crate::error::{ApiErrorResponse, ApiResult};
use crate::middleware::CurrentUserId;
use crate::state::AppState;

pub const INVALID_COUPON_MESSAGE: &str = "Invalid coupon.";

#[derive(Debug, Default, Deserialize)]
pub struct CouponQuery {
    pub total: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CouponResponse {
    pub status: String,
    pub discount: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

/// GET /rest/basket/coupon/{code}
pub async fn redeem_coupon(
    Extension(CurrentUserId(user_id)): Extension<CurrentUserId>,
    Path(code): Path<String>,
    Query(query): Query<CouponQuery>,
) -> ApiResult<Json<CouponResponse>> {
    let today = Utc::now().date_naive();
    let coupon = Coupon::parse(&code)
        .filter(|c| c.is_valid_on(today))
        .ok_or_else(|| {
            debug!(user_id, "Coupon rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorResponse::error(INVALID_COUPON_MESSAGE)),
            )
        })?;

    debug!(user_id, discount = coupon.discount_percent, "Coupon redeemed");

    Ok(Json(CouponResponse {
        status: "success".to_string(),
        discount: coupon.discount_percent,
        total: query.total.map(|total| coupon.apply_to(total)),
    }))
}

pub fn coupon_router() -> Router<Arc<AppState>> {
    Router::new().route("/{code}", get(redeem_coupon))
}
