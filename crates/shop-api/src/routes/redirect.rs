//! 외부 링크 리다이렉트.
//!
//! `GET /redirect?to=<url>`: 허용 목록의 URL을 포함하면 302, 아니면 406.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::ApiErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub to: Option<String>,
}

/// GET /redirect
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let target = query.to.unwrap_or_default();

    if state.redirects.is_redirect_allowed(&target) {
        if let Ok(location) = HeaderValue::from_str(&target) {
            return (StatusCode::FOUND, [(LOCATION, location)]).into_response();
        }
    }

    tracing::debug!(url = %target, "Redirect target rejected");
    ApiErrorResponse::error(format!("Unrecognized target URL for redirect: {}", target))
        .into_response_with(StatusCode::NOT_ACCEPTABLE)
}

pub fn redirect_router() -> Router<Arc<AppState>> {
    Router::new().route("/redirect", get(redirect))
}
