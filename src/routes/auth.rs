use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app::AppState;
use crate::authz::{CheckOptions, Permission};
use crate::errors::{AppError, AppResult};
use crate::events::SecurityEvent;
use crate::jwt::{AuthUser, SESSION_COOKIE};
use crate::models::auth::{
    LogoutResponse, MeResponse, RevokeTokenRequest, RevokeTokenResponse, VerifyTokenRequest, VerifyTokenResponse,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/verify", post(verify))
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route("/revoke", post(revoke))
}

#[utoipa::path(
    post,
    path = "/auth/verify",
    tag = "Auth",
    request_body = VerifyTokenRequest,
    responses(
        (status = 200, description = "Verification outcome", body = VerifyTokenResponse),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyTokenRequest>,
) -> Json<VerifyTokenResponse> {
    let claims = state
        .jwt
        .verify_access_token(&payload.token)
        .filter(|claims| !state.blacklist.is_revoked(&claims.jti));

    Json(VerifyTokenResponse {
        valid: claims.is_some(),
        claims,
    })
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "Missing, invalid or revoked token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(auth: AuthUser) -> AppResult<Json<MeResponse>> {
    let principal = auth.principal;
    let permissions = principal
        .effective_permissions()
        .into_iter()
        .map(str::to_string)
        .collect();
    let divergent_grants = principal
        .divergent_grants()
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(Json(MeResponse {
        permissions,
        divergent_grants,
        expires_at: auth.claims.expires_at(),
        principal,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Token revoked", body = LogoutResponse),
        (status = 401, description = "Missing, invalid or revoked token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    state.blacklist.revoke(&auth.claims.jti);
    state.events.publish(SecurityEvent::token_revoked(
        state.clock.now(),
        &auth.principal.id,
        &auth.principal.workspace_id,
        &auth.claims.jti,
    ));

    let clear_cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict");

    (
        [(SET_COOKIE, clear_cookie)],
        Json(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// Revokes any token by `jti`. Requires `admin.users`.
#[utoipa::path(
    post,
    path = "/auth/revoke",
    tag = "Auth",
    request_body = RevokeTokenRequest,
    responses(
        (status = 200, description = "Token revoked", body = RevokeTokenResponse),
        (status = 400, description = "Empty jti"),
        (status = 401, description = "Missing, invalid or revoked token"),
        (status = 403, description = "Insufficient permissions")
    ),
    security(("bearerAuth" = []))
)]
pub async fn revoke(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RevokeTokenRequest>,
) -> AppResult<Json<RevokeTokenResponse>> {
    let principal = &auth.principal;
    if let Err(err) = auth.require(state.evaluator.as_ref(), Permission::AdminUsers, CheckOptions::default()) {
        state.events.publish(SecurityEvent::access_denied(
            state.clock.now(),
            &principal.id,
            &principal.workspace_id,
            Permission::AdminUsers.as_str(),
        ));
        return Err(err);
    }

    let jti = payload.jti.trim();
    if jti.is_empty() {
        return Err(AppError::bad_request("jti is required"));
    }

    state.blacklist.revoke(jti);
    state.events.publish(SecurityEvent::token_revoked(
        state.clock.now(),
        &principal.id,
        &principal.workspace_id,
        jti,
    ));

    Ok(Json(RevokeTokenResponse {
        jti: jti.to_string(),
        revoked: true,
    }))
}
