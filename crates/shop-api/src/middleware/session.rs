//! 세션 파이프라인 미들웨어.
//!
//! - [`update_authenticated_users`]: 유효한 토큰을 세션 캐시에 채움 (요청을 거부하지 않음)
//! - [`append_user_id`]: 캐시된 세션의 사용자 ID를 요청 확장에 저장
//! - [`deny_all`]: 모든 요청 거부

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Cookie;
use shop_core::logging::token_fingerprint;
use tracing::{debug, warn};

use crate::auth::AuthError;
use crate::session::{unquote, Carrier, TOKEN_COOKIE};
use crate::state::AppState;

/// 요청을 보낸 사용자 ID. [`append_user_id`]가 요청 확장에 넣습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUserId(pub u64);

/// 토큰이 완전히 검증되고 아직 캐시에 없으면 캐시에 넣고 `token` 쿠키를 설정합니다.
///
/// 토큰은 `token` 쿠키를 먼저 보고, 없으면 요청 토큰 우선순위를 따릅니다.
pub async fn update_authenticated_users(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let token = {
        let carrier = Carrier::from_request(&request);
        carrier.cookie().or_else(|| carrier.token().ok())
    };

    let mut issued_cookie = None;
    if let Some(token) = token {
        let token = unquote(&token).to_string();
        if let Ok(record) = state.tokens.authenticate(&token) {
            if state.sessions.put_if_absent(&token, record).await {
                issued_cookie = Some(token);
            }
        }
    }

    let mut response = next.run(request).await;

    if let Some(token) = issued_cookie {
        let cookie = Cookie::build((TOKEN_COOKIE, token.as_str())).path("/").build();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => {
                warn!(token = %token_fingerprint(&token), error = %e, "Token cookie not set");
            }
        }
    }

    response
}

/// 캐시된 세션의 사용자 ID를 [`CurrentUserId`]로 요청 확장에 넣습니다.
///
/// 캐시에 세션이 없으면 401.
pub async fn append_user_id(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = Carrier::from_request(&request).token().ok();
    let record = match token {
        Some(token) => state.sessions.get(&token).await,
        None => None,
    };
    let record = record.ok_or(AuthError::MissingSession)?;

    request
        .extensions_mut()
        .insert(CurrentUserId(record.subject_id()));
    Ok(next.run(request).await)
}

/// 모든 요청을 401로 거부합니다.
///
/// 거부 로그에는 서명 확인 없이 읽은 사용자 ID를 남깁니다. 이 값은 신뢰하지 않습니다.
pub async fn deny_all(
    State(state): State<Arc<AppState>>,
    request: Request,
    _next: Next,
) -> Response {
    let claimed = Carrier::from_request(&request)
        .token()
        .ok()
        .and_then(|token| state.tokens.decode(&token))
        .map(|record| record.subject_id());

    debug!(
        path = %request.uri().path(),
        claimed_subject = ?claimed,
        "Request denied"
    );
    AuthError::SignatureInvalid.into_response()
}
