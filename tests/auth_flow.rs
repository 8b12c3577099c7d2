use std::sync::Arc;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Duration;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use shopfloor_auth::authz::{Principal, Role};
use shopfloor_auth::clock::{Clock, ManualClock};
use shopfloor_auth::events::SecurityEventKind;
use shopfloor_auth::jwt::JwtConfig;
use shopfloor_auth::password::PasswordPolicy;
use shopfloor_auth::ratelimit::RateLimitConfig;
use shopfloor_auth::{create_app, AppState};

fn setup() -> Result<(Arc<ManualClock>, AppState, Router)> {
    let clock = Arc::new(ManualClock::default());
    let jwt = JwtConfig::new("auth-flow-secret", clock.clone())?;
    let state = AppState::new(jwt, RateLimitConfig::api_general(), PasswordPolicy::default(), clock.clone());
    let app = create_app(state.clone());
    Ok((clock, state, app))
}

fn inspector() -> Principal {
    Principal::new("user-7", Role::QcInspector, "ws-acme")
        .with_permissions(vec!["qc.inspect".to_string(), "payroll.process".to_string()])
        .with_brands(vec!["brand-north".to_string()])
}

async fn json_body(resp: Response) -> Result<Value> {
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn me_with_bearer(token: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("GET")
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?)
}

fn verify_request(token: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/auth/verify")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "token": token }).to_string()))?)
}

#[tokio::test]
async fn verify_reports_valid_and_invalid_tokens() -> Result<()> {
    let (_, state, app) = setup()?;
    let token = state.jwt.generate_access_token(&inspector())?;

    let resp = app.clone().oneshot(verify_request(&token)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await?;
    assert_eq!(v["valid"], true);
    assert_eq!(v["claims"]["sub"], "user-7");
    assert_eq!(v["claims"]["role"], "QC_INSPECTOR");
    assert_eq!(v["claims"]["iss"], "shopfloor-erp");

    let resp = app.oneshot(verify_request("not-a-jwt")?).await?;
    assert_eq!(resp.status(), StatusCode::OK, "invalid tokens are not request errors");
    let v = json_body(resp).await?;
    assert_eq!(v["valid"], false);
    assert!(v.get("claims").is_none());

    Ok(())
}

#[tokio::test]
async fn me_resolves_permissions_from_role_table() -> Result<()> {
    let (_, state, app) = setup()?;
    let token = state.jwt.generate_access_token(&inspector())?;

    let resp = app.oneshot(me_with_bearer(&token)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await?;
    assert_eq!(v["principal"]["id"], "user-7");
    assert_eq!(v["principal"]["workspace_id"], "ws-acme");

    let permissions: Vec<&str> = v["permissions"]
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    assert!(permissions.contains(&"qc.approve"));
    assert!(!permissions.contains(&"payroll.process"));
    assert_eq!(v["divergent_grants"], json!(["payroll.process"]));

    Ok(())
}

#[tokio::test]
async fn me_accepts_session_cookie() -> Result<()> {
    let (_, state, app) = setup()?;
    let token = state.jwt.generate_access_token(&inspector())?;

    let req = Request::builder()
        .method("GET")
        .uri("/auth/me")
        .header(header::COOKIE, format!("theme=dark; auth_token={token}"))
        .body(Body::empty())?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn me_requires_a_token() -> Result<()> {
    let (_, _, app) = setup()?;

    let req = Request::builder()
        .method("GET")
        .uri("/auth/me")
        .body(Body::empty())?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let v = json_body(resp).await?;
    assert_eq!(v["error"], "unauthorized");

    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_presented_token() -> Result<()> {
    let (_, state, app) = setup()?;
    let mut events = state.events.subscribe();
    let token = state.jwt.generate_access_token(&inspector())?;

    let req = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("auth_token=;"), "unexpected cookie: {cookie}");

    let event = events.recv().await?;
    assert_eq!(event.kind, SecurityEventKind::TokenRevoked);
    assert_eq!(event.actor_id.as_deref(), Some("user-7"));

    let resp = app.clone().oneshot(me_with_bearer(&token)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.oneshot(verify_request(&token)?).await?;
    let v = json_body(resp).await?;
    assert_eq!(v["valid"], false);

    // a fresh token for the same user is unaffected
    let fresh = state.jwt.generate_access_token(&inspector())?;
    assert!(!state.blacklist.is_revoked(&state.jwt.decode(&fresh)?.jti));

    Ok(())
}

#[tokio::test]
async fn tokens_expire_after_an_hour() -> Result<()> {
    let (clock, state, app) = setup()?;
    let token = state.jwt.generate_access_token(&inspector())?;

    clock.advance(Duration::minutes(59));
    let resp = app.clone().oneshot(me_with_bearer(&token)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    clock.advance(Duration::minutes(1));
    let resp = app.oneshot(me_with_bearer(&token)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn token_from_another_secret_is_rejected() -> Result<()> {
    let (clock, _, app) = setup()?;
    let other = JwtConfig::new("some-other-secret", clock)?;
    let token = other.generate_access_token(&inspector())?;

    let resp = app.oneshot(me_with_bearer(&token)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

fn revoke_request(token: &str, jti: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/auth/revoke")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "jti": jti }).to_string()))?)
}

#[tokio::test]
async fn forced_revocation_requires_admin_users() -> Result<()> {
    let (clock, state, app) = setup()?;
    clock.advance(Duration::minutes(5));
    let mut events = state.events.subscribe();

    let (victim_token, victim_claims) = state.jwt.issue(&inspector())?;
    let csr = state
        .jwt
        .generate_access_token(&Principal::new("user-9", Role::Csr, "ws-acme"))?;

    let resp = app.clone().oneshot(revoke_request(&csr, &victim_claims.jti)?).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let v = json_body(resp).await?;
    assert_eq!(v["error"], "forbidden");
    assert_eq!(v["message"], "Insufficient permissions");

    let event = events.recv().await?;
    assert_eq!(event.kind, SecurityEventKind::AccessDenied);
    // stamped by the injected clock
    assert_eq!(event.occurred_at, clock.now());
    assert!(!state.blacklist.is_revoked(&victim_claims.jti));

    let admin = state
        .jwt
        .generate_access_token(&Principal::new("user-1", Role::Admin, "ws-acme"))?;
    let resp = app.clone().oneshot(revoke_request(&admin, &victim_claims.jti)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await?;
    assert_eq!(v["revoked"], true);
    assert_eq!(v["jti"], Value::from(victim_claims.jti.clone()));

    let resp = app.oneshot(me_with_bearer(&victim_token)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
