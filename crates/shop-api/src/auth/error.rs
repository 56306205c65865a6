//! 요청 경계의 인증 에러.
//!
//! 컴포넌트별 에러([`TokenError`], [`CarrierError`])는 이 타입으로 모이고,
//! 여기서 한 번만 HTTP 상태 코드로 변환됩니다. 응답 본문은 상태 코드별 고정 문구이며
//! 어떤 검사가 실패했는지 드러내지 않습니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::TokenError;
use crate::error::ApiErrorResponse;
use crate::session::CarrierError;

/// 401 응답 문구.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
/// 403 응답 문구.
pub const FORBIDDEN_MESSAGE: &str = "Malicious activity detected";

/// 인증/인가 실패.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// 토큰 출처가 없거나 형식이 잘못됨
    #[error("인증 토큰이 없거나 형식이 잘못되었습니다")]
    MalformedCarrier,
    /// 서명 위조/불일치, 만료, 디코딩 실패
    #[error("유효하지 않은 토큰")]
    SignatureInvalid,
    /// 접근 정책 거부. 정책 검사에서는 서명/만료 실패도 이 값으로 응답합니다.
    #[error("권한이 부족합니다")]
    RoleMismatch,
    /// 세션 캐시에 항목이 없음
    #[error("세션을 찾을 수 없습니다")]
    MissingSession,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::RoleMismatch => StatusCode::FORBIDDEN,
            AuthError::MalformedCarrier
            | AuthError::SignatureInvalid
            | AuthError::MissingSession => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<CarrierError> for AuthError {
    fn from(_: CarrierError) -> Self {
        AuthError::MalformedCarrier
    }
}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        AuthError::SignatureInvalid
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::FORBIDDEN {
            FORBIDDEN_MESSAGE
        } else {
            UNAUTHORIZED_MESSAGE
        };

        tracing::debug!(reason = ?self, status = status.as_u16(), "Request rejected");

        (status, Json(ApiErrorResponse::error(message))).into_response()
    }
}
