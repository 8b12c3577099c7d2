//! Role table and permission checks for the calling principal.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app::AppState;
use crate::authz::{can_manage_user, Permission, PermissionContext, Role};
use crate::errors::{AppError, AppResult};
use crate::events::SecurityEvent;
use crate::jwt::AuthUser;
use crate::models::authz::{
    CanManageRequest, CanManageResponse, PermissionCheckRequest, PermissionCheckResponse, RoleSummary,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/check", post(check))
        .route("/can-manage", post(can_manage))
}

#[utoipa::path(
    get,
    path = "/authz/roles",
    tag = "Authz",
    responses((status = 200, description = "Roles, highest rank first", body = Vec<RoleSummary>))
)]
pub async fn list_roles() -> Json<Vec<RoleSummary>> {
    let mut roles: Vec<RoleSummary> = Role::ALL.into_iter().map(RoleSummary::from).collect();
    roles.sort_by(|a, b| b.level.cmp(&a.level));
    Json(roles)
}

/// Denials are `allowed: false` with status 200.
#[utoipa::path(
    post,
    path = "/authz/check",
    tag = "Authz",
    request_body = PermissionCheckRequest,
    responses(
        (status = 200, description = "Decision", body = PermissionCheckResponse),
        (status = 400, description = "Unknown permission"),
        (status = 401, description = "Missing, invalid or revoked token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn check(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PermissionCheckRequest>,
) -> AppResult<Json<PermissionCheckResponse>> {
    let permission: Permission = payload
        .permission
        .parse()
        .map_err(|err: crate::authz::UnknownPermission| AppError::bad_request(err.to_string()))?;

    let principal = &auth.principal;
    let mut ctx = PermissionContext::new(principal);
    if let Some(resource) = payload.resource.as_ref() {
        ctx = ctx.with_resource(resource);
    }

    let allowed = state
        .evaluator
        .can(&ctx, permission, payload.options.unwrap_or_default());

    if !allowed {
        state.events.publish(SecurityEvent::access_denied(
            state.clock.now(),
            &principal.id,
            &principal.workspace_id,
            permission.as_str(),
        ));
    }

    Ok(Json(PermissionCheckResponse { permission, allowed }))
}

#[utoipa::path(
    post,
    path = "/authz/can-manage",
    tag = "Authz",
    request_body = CanManageRequest,
    responses(
        (status = 200, description = "Whether the caller may manage accounts of the target role", body = CanManageResponse),
        (status = 401, description = "Missing, invalid or revoked token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn can_manage(auth: AuthUser, Json(payload): Json<CanManageRequest>) -> Json<CanManageResponse> {
    Json(CanManageResponse {
        target_role: payload.target_role,
        allowed: can_manage_user(auth.principal.role, payload.target_role),
    })
}
