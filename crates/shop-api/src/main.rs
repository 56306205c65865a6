//! 스토어프런트 인증 API 서버.
//!
//! 설정 로드 → 로깅 → 메트릭 → 토큰 서비스/세션 캐시 구성 → 세션 정리 태스크 → HTTP 서버 순으로 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use shop_api::metrics::setup_metrics_recorder;
use shop_api::routes::create_api_router;
use shop_api::session::SessionCache;
use shop_api::state::AppState;
use shop_api::TokenService;
use shop_core::{init_logging, AppConfig, LogConfig, RedirectAllowlist};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from(&config.logging)).context("failed to initialize logging")?;

    info!("Starting storefront auth API server...");

    let metrics_handle = setup_metrics_recorder().context("failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let tokens = TokenService::from_config(&config.auth).context("failed to load signing keys")?;
    let sessions = SessionCache::from_config(&config.session);
    let redirects = RedirectAllowlist::new(config.redirect.allowlist.iter().cloned());
    info!(
        ttl_hours = tokens.ttl().num_hours(),
        session_ttl_secs = ?config.session.ttl_secs,
        allowlist = redirects.len(),
        "Auth components initialized"
    );

    let state = Arc::new(AppState::new(tokens, sessions, redirects));

    // 전역 종료 토큰 (세션 정리 태스크에 전파)
    let shutdown_token = CancellationToken::new();
    let sweeper = state.sessions.spawn_sweeper(
        Duration::from_secs(config.session.sweep_interval_secs.max(1)),
        shutdown_token.clone(),
    );

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = config
        .server
        .bind_addr()
        .parse()
        .context("invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();

    if tokio::time::timeout(Duration::from_secs(10), sweeper)
        .await
        .is_err()
    {
        warn!("Cleanup timeout, forcing shutdown");
    }

    info!("Server stopped gracefully");
    Ok(())
}

fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    // 메트릭 라우터 (별도 상태)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router(state.clone()).with_state(state))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// Ctrl+C 또는 SIGTERM을 기다린 뒤 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
}
