//! 사용자 endpoint.
//!
//! `GET /rest/user/whoami`: 세션 캐시에 있는 현재 사용자.
//! 세션이 없어도 200이며 `user`가 빈 객체입니다.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{OptionalSessionAuth, SessionRecord};
use crate::state::AppState;

/// whoami 사용자 정보.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoamiUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl From<SessionRecord> for WhoamiUser {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: Some(record.data.id),
            email: Some(record.data.email),
            last_login_ip: record.data.last_login_ip,
            profile_image: record.data.profile_image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub user: WhoamiUser,
}

/// GET /rest/user/whoami
pub async fn whoami(OptionalSessionAuth(record): OptionalSessionAuth) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        user: record.map(WhoamiUser::from).unwrap_or_default(),
    })
}

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new().route("/whoami", get(whoami))
}
