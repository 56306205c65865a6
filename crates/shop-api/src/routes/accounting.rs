//! 회계 담당 endpoint.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::auth::{AccountingAuth, Permission, Role};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PermissionEntry {
    pub name: Permission,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub role: Role,
    pub permissions: Vec<PermissionEntry>,
}

/// GET /rest/accounting/permissions
pub async fn list_permissions(AccountingAuth(record): AccountingAuth) -> Json<PermissionsResponse> {
    let role = record.role();
    Json(PermissionsResponse {
        role,
        permissions: role
            .permissions()
            .into_iter()
            .map(|name| PermissionEntry {
                name,
                description: name.description(),
            })
            .collect(),
    })
}

pub fn accounting_router() -> Router<Arc<AppState>> {
    Router::new().route("/permissions", get(list_permissions))
}
