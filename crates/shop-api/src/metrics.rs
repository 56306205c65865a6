//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! 인증/세션 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.
//! 레코더가 설치되지 않은 상태(테스트 등)에서는 기록이 무시됩니다.

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설치하고 핸들을 반환합니다.
///
/// # Errors
///
/// 레코더가 이미 설치되어 있으면 `BuildError`.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

// ============================================================================
// 인증 메트릭
// ============================================================================

/// 토큰 검증 결과 카운터.
pub fn record_verification(valid: bool) {
    let result = if valid { "valid" } else { "invalid" };
    counter!("auth_verifications_total", "result" => result).increment(1);
}

/// 접근 거부 카운터.
pub fn record_access_denied(policy: &str) {
    counter!("access_denied_total", "policy" => policy.to_string()).increment(1);
}

// ============================================================================
// 세션 캐시 메트릭
// ============================================================================

pub fn record_session_insert() {
    counter!("session_cache_inserts_total").increment(1);
}

pub fn record_session_evictions(count: usize) {
    counter!("session_cache_evictions_total").increment(count as u64);
}
