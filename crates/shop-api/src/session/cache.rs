//! 인증된 세션 캐시.
//!
//! 토큰 → 세션 레코드 정방향 맵과 사용자 ID → 토큰 역방향 맵을 가집니다.
//! 두 맵은 각자의 락을 쓰며, 한 연산이 두 맵을 원자적으로 갱신하지 않습니다.
//! 역방향 맵은 정방향 항목을 신뢰하는 전제 조건으로 쓰이지 않으므로
//! 짧은 불일치 구간은 허용됩니다.
//!
//! # 만료
//!
//! 각 항목은 `min(record.exp, 삽입 시각 + ttl)`에 만료됩니다. 만료된 항목은
//! [`SessionCache::get`]에서 없는 것으로 취급되고 [`SessionCache::purge_expired`]가
//! 실제로 제거합니다. 같은 사용자의 새 토큰이 들어와도 이전 항목은 즉시 지우지 않습니다.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shop_core::config::SessionConfig;
use shop_core::logging::token_fingerprint;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::carrier::{unquote, Carrier};
use crate::auth::{Identity, SessionRecord, TokenError, TokenService};
use crate::metrics::{record_session_evictions, record_session_insert};

/// 설정 가능한 최대 TTL (10년).
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone)]
struct CachedSession {
    record: SessionRecord,
    expires_at: DateTime<Utc>,
}

impl CachedSession {
    fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// 프로세스 시작 시 생성되어 요청 처리 경로에 주입되는 세션 캐시.
///
/// 복제하면 같은 저장소를 공유합니다.
#[derive(Debug, Clone)]
pub struct SessionCache {
    sessions: Arc<RwLock<HashMap<String, CachedSession>>>,
    tokens_by_subject: Arc<RwLock<HashMap<u64, String>>>,
    ttl: Option<Duration>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SessionCache {
    /// `ttl`이 `None`이면 토큰 자체의 만료 시각만 따릅니다.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            tokens_by_subject: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(None)
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let ttl = config
            .ttl_secs
            .map(|secs| Duration::seconds(secs.min(MAX_TTL_SECS) as i64));
        Self::new(ttl)
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn expiry_for(&self, record: &SessionRecord, now: DateTime<Utc>) -> DateTime<Utc> {
        let token_expiry = record.expires_at().unwrap_or(DateTime::<Utc>::MAX_UTC);
        match self.ttl.and_then(|ttl| now.checked_add_signed(ttl)) {
            Some(ttl_expiry) => token_expiry.min(ttl_expiry),
            None => token_expiry,
        }
    }

    /// 정방향 항목을 삽입/덮어쓰고 역방향 항목을 갱신합니다.
    pub async fn put(&self, token: &str, record: SessionRecord) {
        let token = unquote(token).to_string();
        let subject = record.subject_id();
        let expires_at = self.expiry_for(&record, Utc::now());

        self.sessions
            .write()
            .await
            .insert(token.clone(), CachedSession { record, expires_at });
        self.tokens_by_subject
            .write()
            .await
            .insert(subject, token.clone());

        record_session_insert();
        debug!(token = %token_fingerprint(&token), subject, "Session cached");
    }

    /// 살아 있는 항목이 없을 때만 삽입합니다. 삽입했으면 `true`.
    ///
    /// 같은 토큰에 대한 동시 첫 요청은 하나만 삽입에 성공합니다.
    pub async fn put_if_absent(&self, token: &str, record: SessionRecord) -> bool {
        let token = unquote(token).to_string();
        let subject = record.subject_id();
        let now = Utc::now();

        {
            let mut sessions = self.sessions.write().await;
            if sessions.get(&token).is_some_and(|s| s.is_live_at(now)) {
                return false;
            }
            let expires_at = self.expiry_for(&record, now);
            sessions.insert(token.clone(), CachedSession { record, expires_at });
        }

        self.tokens_by_subject
            .write()
            .await
            .insert(subject, token.clone());

        record_session_insert();
        debug!(token = %token_fingerprint(&token), subject, "Session cached");
        true
    }

    /// 토큰으로 세션을 조회합니다. 감싸는 따옴표와 공백은 먼저 제거합니다.
    pub async fn get(&self, token: &str) -> Option<SessionRecord> {
        let token = unquote(token);
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .get(token)
            .filter(|s| s.is_live_at(now))
            .map(|s| s.record.clone())
    }

    /// 사용자 ID로 가장 최근 토큰을 찾습니다.
    pub async fn token_of(&self, subject_id: u64) -> Option<String> {
        self.tokens_by_subject.read().await.get(&subject_id).cloned()
    }

    /// 요청에서 토큰을 찾아 [`Self::get`]으로 조회합니다.
    pub async fn resolve_from_request(&self, carrier: &Carrier<'_>) -> Option<SessionRecord> {
        let token = carrier.token().ok()?;
        self.get(&token).await
    }

    /// 요청의 토큰을 재사용하거나 (없으면) 새로 발급해 `record`와 함께 저장합니다.
    ///
    /// 저장한 토큰을 반환합니다.
    pub async fn refresh_from_request(
        &self,
        carrier: &Carrier<'_>,
        record: SessionRecord,
        tokens: &TokenService,
    ) -> Result<String, TokenError> {
        let token = match carrier.token() {
            Ok(token) => unquote(&token).to_string(),
            Err(_) => tokens.issue(&Identity::from(&record))?,
        };
        self.put(&token, record).await;
        Ok(token)
    }

    /// 만료된 항목을 제거하고 제거한 수를 반환합니다.
    ///
    /// 역방향 항목은 제거된 토큰을 가리키고, 그 토큰이 그 사이에 다시 삽입되지
    /// 않았을 때만 지웁니다.
    pub async fn purge_expired(&self) -> usize {
        let purged = self.evict_expired(Utc::now()).await;
        if purged.is_empty() {
            return 0;
        }

        self.prune_subjects(&purged).await;

        record_session_evictions(purged.len());
        info!(evicted = purged.len(), "Expired sessions purged");
        purged.len()
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> HashSet<String> {
        let mut sessions = self.sessions.write().await;
        let expired: HashSet<String> = sessions
            .iter()
            .filter(|(_, s)| !s.is_live_at(now))
            .map(|(token, _)| token.clone())
            .collect();
        sessions.retain(|token, _| !expired.contains(token));
        expired
    }

    /// 락 순서: 정방향 → 역방향.
    async fn prune_subjects(&self, purged: &HashSet<String>) {
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        self.tokens_by_subject.write().await.retain(|_, token| {
            !purged.contains(token) || sessions.get(token).is_some_and(|s| s.is_live_at(now))
        });
    }

    /// 정방향 항목 수 (만료되었지만 아직 정리되지 않은 항목 포함).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// 주기적으로 [`Self::purge_expired`]를 호출하는 백그라운드 태스크를 시작합니다.
    pub fn spawn_sweeper(
        &self,
        interval: std::time::Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 첫 tick은 즉시 완료된다
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Session sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.purge_expired().await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::test_token_service;
    use crate::auth::Role;
    use axum::http::{header::AUTHORIZATION, Request};

    fn record_for(service: &TokenService, id: u64) -> (String, SessionRecord) {
        let identity = Identity::new(id, format!("user{}@juice-sh.op", id), Role::Customer);
        let token = service.issue(&identity).unwrap();
        let record = service.decode(&token).unwrap();
        (token, record)
    }

    #[tokio::test]
    async fn test_put_and_token_of() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let (t1, r1) = record_for(&service, 1);

        cache.put(&t1, r1.clone()).await;
        assert_eq!(cache.get(&t1).await, Some(r1.clone()));
        assert_eq!(cache.token_of(1).await.as_deref(), Some(t1.as_str()));

        // 같은 사용자의 두 번째 토큰이 역방향 매핑을 덮어쓴다
        let t2 = format!("{}x", t1);
        cache.put(&t2, r1.clone()).await;
        assert_eq!(cache.token_of(1).await.as_deref(), Some(t2.as_str()));
        // 이전 토큰의 항목은 남아 있다
        assert!(cache.get(&t1).await.is_some());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_get_unquotes() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let (token, record) = record_for(&service, 2);

        cache.put(&token, record).await;
        assert!(cache.get(&format!("\"{}\"", token)).await.is_some());
        assert!(cache.get(&format!("  {} ", token)).await.is_some());
        assert!(cache.get("unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_put_if_absent() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let (token, record) = record_for(&service, 3);

        assert!(cache.put_if_absent(&token, record.clone()).await);
        assert!(!cache.put_if_absent(&token, record).await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_put_if_absent() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let (token, record) = record_for(&service, 4);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let token = token.clone();
                let record = record.clone();
                tokio::spawn(async move { cache.put_if_absent(&token, record).await })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&token).await, Some(record));
        assert_eq!(cache.token_of(4).await, Some(token));
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let service = test_token_service();
        let cache = SessionCache::new(Some(Duration::zero()));
        let (token, record) = record_for(&service, 5);

        cache.put(&token, record.clone()).await;
        assert!(cache.get(&token).await.is_none());
        // 만료된 항목은 put_if_absent가 교체할 수 있다
        assert!(cache.put_if_absent(&token, record).await);
    }

    #[tokio::test]
    async fn test_expired_token_record_is_absent() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let identity = Identity::new(6, "old@juice-sh.op", Role::Customer);
        let token = service
            .issue_at(&identity, Utc::now() - Duration::hours(7))
            .unwrap();
        let record = service.decode(&token).unwrap();

        cache.put(&token, record).await;
        assert!(cache.get(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let service = test_token_service();
        let short = SessionCache::new(Some(Duration::zero()));
        let (t1, r1) = record_for(&service, 7);
        let (t2, r2) = record_for(&service, 8);

        short.put(&t1, r1).await;
        short.put(&t2, r2).await;
        assert_eq!(short.len().await, 2);

        assert_eq!(short.purge_expired().await, 2);
        assert!(short.is_empty().await);
        assert!(short.token_of(7).await.is_none());
        assert_eq!(short.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_purge_keeps_newer_reverse_entry() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let identity = Identity::new(9, "amy@juice-sh.op", Role::Customer);
        let stale = service
            .issue_at(&identity, Utc::now() - Duration::hours(7))
            .unwrap();
        let fresh = service.issue(&identity).unwrap();

        cache.put(&stale, service.decode(&stale).unwrap()).await;
        cache.put(&fresh, service.decode(&fresh).unwrap()).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.token_of(9).await, Some(fresh));
    }

    #[tokio::test]
    async fn test_resolve_and_refresh_from_request() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let (token, record) = record_for(&service, 10);

        let req = Request::builder()
            .uri("/")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(())
            .unwrap();
        let carrier = Carrier::from_request(&req);

        assert!(cache.resolve_from_request(&carrier).await.is_none());
        let stored = cache
            .refresh_from_request(&carrier, record.clone(), &service)
            .await
            .unwrap();
        assert_eq!(stored, token);
        assert_eq!(cache.resolve_from_request(&carrier).await, Some(record));
    }

    #[tokio::test]
    async fn test_refresh_without_token_issues_new() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let (_, record) = record_for(&service, 11);

        let req = Request::builder().uri("/").body(()).unwrap();
        let carrier = Carrier::from_request(&req);

        let issued = cache
            .refresh_from_request(&carrier, record, &service)
            .await
            .unwrap();
        assert!(service.verify(&issued));
        assert_eq!(cache.token_of(11).await, Some(issued));
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = SessionConfig {
            ttl_secs: Some(60),
            sweep_interval_secs: 5,
        };
        assert_eq!(SessionCache::from_config(&config).ttl(), Some(Duration::seconds(60)));
        assert_eq!(SessionCache::from_config(&SessionConfig::default()).ttl(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_cancel() {
        let cache = SessionCache::new(Some(Duration::zero()));
        let shutdown = CancellationToken::new();
        let handle = cache.spawn_sweeper(std::time::Duration::from_secs(1), shutdown.clone());

        tokio::time::advance(std::time::Duration::from_secs(3)).await;
        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_keeps_reverse_entry_of_reinserted_token() {
        let service = test_token_service();
        let cache = SessionCache::with_defaults();
        let identity = Identity::new(60, "late@juice-sh.op", Role::Customer);
        let stale = service
            .issue_at(&identity, Utc::now() - Duration::hours(7))
            .unwrap();
        let stale_record = service.decode(&stale).unwrap();
        let (_, live_record) = record_for(&service, 60);

        cache.put(&stale, stale_record).await;
        let purged = cache.evict_expired(Utc::now()).await;
        assert!(purged.contains(&stale));

        // 정리 도중 같은 키가 다시 삽입됨
        assert!(cache.put_if_absent(&stale, live_record).await);
        cache.prune_subjects(&purged).await;

        assert_eq!(cache.token_of(60).await, Some(stale.clone()));
        assert!(cache.get(&stale).await.is_some());
    }
}
