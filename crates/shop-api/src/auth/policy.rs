//! 역할 기반 접근 정책.
//!
//! 각 정책 검사는 세션 캐시를 보지 않고 요청 토큰을 매번 직접 검증/디코딩합니다.
//! 캐시 항목이 오염되어도 결과가 달라지지 않습니다.
//!
//! 디럭스 정책은 역할 외에 토큰에 실린 디럭스 토큰이 이메일로부터 다시 계산한
//! 값과 일치해야 통과합니다. 서명 없이 `role`만 바꾼 토큰은 서명 검증에서,
//! 정상 서명된 디럭스 역할이라도 디럭스 토큰이 틀리면 이 교차 검사에서 거부됩니다.
//!
//! 토큰을 꺼낸 뒤의 실패(서명, 디코딩, 만료, 역할, 디럭스 토큰)는 모두
//! [`AuthError::RoleMismatch`] 하나로 응답합니다. 실제 원인은 디버그 로그에만 남습니다.

use super::{AuthError, Role, SessionRecord, TokenService};
use crate::metrics::record_access_denied;
use crate::session::Carrier;

/// 접근 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// 유효한 세션이면 역할 무관
    Authenticated,
    Customer,
    Deluxe,
    Accounting,
    Admin,
}

impl AccessPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPolicy::Authenticated => "authenticated",
            AccessPolicy::Customer => "customer",
            AccessPolicy::Deluxe => "deluxe",
            AccessPolicy::Accounting => "accounting",
            AccessPolicy::Admin => "admin",
        }
    }

    fn admits(&self, record: &SessionRecord, tokens: &TokenService) -> bool {
        match self {
            AccessPolicy::Authenticated => true,
            AccessPolicy::Customer => record.role() == Role::Customer,
            AccessPolicy::Deluxe => is_deluxe_record(record, tokens),
            AccessPolicy::Accounting => record.role() == Role::Accounting,
            AccessPolicy::Admin => record.role() == Role::Admin,
        }
    }
}

/// 요청 토큰을 검증하고 정책을 적용합니다.
///
/// 순서: 토큰 추출 → 서명 검증 → 디코딩 → 만료 확인 → 정책 확인.
/// 앞 단계가 실패하면 뒤 단계는 실행하지 않습니다.
///
/// 토큰이 없거나 형식이 잘못되면 [`AuthError::MalformedCarrier`],
/// 그 밖의 실패는 모두 [`AuthError::RoleMismatch`].
pub fn authorize(
    carrier: &Carrier<'_>,
    tokens: &TokenService,
    policy: AccessPolicy,
) -> Result<SessionRecord, AuthError> {
    check(carrier, tokens, policy).map_err(|reason| {
        record_access_denied(policy.as_str());
        tracing::debug!(policy = policy.as_str(), reason = ?reason, "Access denied");
        match reason {
            AuthError::MalformedCarrier => AuthError::MalformedCarrier,
            _ => AuthError::RoleMismatch,
        }
    })
}

fn check(
    carrier: &Carrier<'_>,
    tokens: &TokenService,
    policy: AccessPolicy,
) -> Result<SessionRecord, AuthError> {
    let token = carrier.token()?;
    if !tokens.verify(&token) {
        return Err(AuthError::SignatureInvalid);
    }
    let record = tokens.decode(&token).ok_or(AuthError::SignatureInvalid)?;
    if record.is_expired() {
        return Err(AuthError::SignatureInvalid);
    }

    if policy.admits(&record, tokens) {
        Ok(record)
    } else {
        Err(AuthError::RoleMismatch)
    }
}

/// 디럭스 역할이며 디럭스 토큰이 이메일에서 계산한 값과 일치하는지.
pub fn is_deluxe_record(record: &SessionRecord, tokens: &TokenService) -> bool {
    record.role() == Role::Deluxe
        && record
            .data
            .deluxe_token
            .as_deref()
            .is_some_and(|candidate| tokens.verify_deluxe_token(record.email(), candidate))
}

pub fn is_customer(carrier: &Carrier<'_>, tokens: &TokenService) -> bool {
    authorize(carrier, tokens, AccessPolicy::Customer).is_ok()
}

pub fn is_deluxe(carrier: &Carrier<'_>, tokens: &TokenService) -> bool {
    authorize(carrier, tokens, AccessPolicy::Deluxe).is_ok()
}

pub fn is_accounting(carrier: &Carrier<'_>, tokens: &TokenService) -> bool {
    authorize(carrier, tokens, AccessPolicy::Accounting).is_ok()
}
