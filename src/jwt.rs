use std::fmt;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{
    has_all_permissions, has_any_permission, CheckOptions, Permission, PermissionContext, PolicyEvaluator,
    Principal, Role,
};
use crate::clock::{SharedClock, SystemClock};
use crate::errors::{AppError, AppResult};
use crate::events::SecurityEvent;

pub const ISSUER: &str = "shopfloor-erp";
pub const AUDIENCE: &str = "shopfloor-erp-api";
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;
pub const SESSION_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct JwtConfig {
    secret: Arc<Vec<u8>>,
    clock: SharedClock,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"<redacted>").finish()
    }
}

impl JwtConfig {
    /// Reads `JWT_SECRET`. A missing or empty secret is a deployment error.
    pub fn from_env(clock: SharedClock) -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        Self::new(secret, clock)
    }

    pub fn new(secret: impl Into<Vec<u8>>, clock: SharedClock) -> Result<Self, AppError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AppError::configuration("JWT_SECRET must not be empty"));
        }

        Ok(Self {
            secret: Arc::new(secret),
            clock,
        })
    }

    pub fn with_system_clock(secret: impl Into<Vec<u8>>) -> Result<Self, AppError> {
        Self::new(secret, Arc::new(SystemClock))
    }

    pub fn generate_access_token(&self, principal: &Principal) -> Result<String, AppError> {
        self.issue(principal).map(|(token, _)| token)
    }

    /// Signs a fresh one-hour token for `principal` and returns it with its claims.
    pub fn issue(&self, principal: &Principal) -> Result<(String, AccessClaims), AppError> {
        let now = self.clock.now();
        let exp = now + Duration::seconds(ACCESS_TOKEN_TTL_SECS);

        let claims = AccessClaims {
            sub: principal.id.clone(),
            role: principal.role,
            workspace_id: principal.workspace_id.clone(),
            permissions: principal.permissions.clone(),
            brand_ids: principal.brand_ids.clone(),
            requires_2fa: principal.requires_2fa,
            email: principal.email.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.encode_claims(&claims)?;
        Ok((token, claims))
    }

    /// Signs `claims` as given. No defaults are filled in.
    pub fn encode_claims(&self, claims: &AccessClaims) -> Result<String, AppError> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|err| AppError::token(err.to_string()))
    }

    /// Full verification with the failure reason. Expiry is judged by the
    /// injected clock, not by the host time.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = false;

        let claims = jsonwebtoken::decode::<AccessClaims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| AppError::token(err.to_string()))?;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(AppError::token("token expired"));
        }

        Ok(claims)
    }

    /// Fails closed: any problem with the token yields `None`.
    pub fn verify_access_token(&self, token: &str) -> Option<AccessClaims> {
        match self.decode(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                tracing::debug!(
                    token = %token_fingerprint(token),
                    error = %err,
                    "access token rejected"
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessClaims {
    pub sub: String,
    pub role: Role,
    pub workspace_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub brand_ids: Vec<String>,
    #[serde(default)]
    pub requires_2fa: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
}

impl AccessClaims {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub.clone(),
            role: self.role,
            workspace_id: self.workspace_id.clone(),
            permissions: self.permissions.clone(),
            brand_ids: self.brand_ids.clone(),
            requires_2fa: self.requires_2fa,
            email: self.email.clone(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Short, non-reversible token identifier for logs.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}

pub fn extract_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Bearer header first, then the session cookie.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer);

    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    parts
        .headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| cookie_value(header, SESSION_COOKIE))
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
    pub claims: AccessClaims,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        let Some(claims) = state.jwt.verify_access_token(&token) else {
            state
                .events
                .publish(SecurityEvent::token_rejected(state.clock.now(), token_fingerprint(&token)));
            return Err(AppError::unauthorized("invalid or expired token"));
        };

        if state.blacklist.is_revoked(&claims.jti) {
            tracing::warn!(user_id = %claims.sub, jti = %claims.jti, "revoked token presented");
            state
                .events
                .publish(SecurityEvent::token_rejected(state.clock.now(), token_fingerprint(&token)));
            return Err(AppError::unauthorized("token has been revoked"));
        }

        Ok(AuthUser {
            principal: claims.principal(),
            claims,
        })
    }
}

/// Route guards. Authentication already happened in the extractor, so a
/// failure here is always `403 Insufficient permissions`.
impl AuthUser {
    pub fn require(
        &self,
        evaluator: &dyn PolicyEvaluator,
        permission: Permission,
        options: CheckOptions,
    ) -> AppResult<()> {
        let ctx = PermissionContext::new(&self.principal);
        if evaluator.can(&ctx, permission, options) {
            return Ok(());
        }

        tracing::warn!(
            user_id = %self.principal.id,
            role = %self.principal.role,
            permission = %permission,
            "unauthorized request"
        );
        Err(AppError::forbidden("Insufficient permissions"))
    }

    pub fn require_any(&self, permissions: &[Permission]) -> AppResult<()> {
        if has_any_permission(self.principal.role, permissions) {
            return Ok(());
        }

        tracing::warn!(
            user_id = %self.principal.id,
            role = %self.principal.role,
            required = ?permissions,
            "unauthorized request: missing any permission"
        );
        Err(AppError::forbidden("Insufficient permissions"))
    }

    pub fn require_all(&self, permissions: &[Permission]) -> AppResult<()> {
        if has_all_permissions(self.principal.role, permissions) {
            return Ok(());
        }

        tracing::warn!(
            user_id = %self.principal.id,
            role = %self.principal.role,
            required = ?permissions,
            "unauthorized request: missing all permissions"
        );
        Err(AppError::forbidden("Insufficient permissions"))
    }

    pub fn require_role(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.principal.role) {
            return Ok(());
        }

        tracing::warn!(
            user_id = %self.principal.id,
            role = %self.principal.role,
            required = ?roles,
            "unauthorized request: invalid role"
        );
        Err(AppError::forbidden("Insufficient permissions"))
    }
}
