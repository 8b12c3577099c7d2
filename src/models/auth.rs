use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::Principal;
use crate::jwt::AccessClaims;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyTokenRequest {
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub token: String,
}

/// Verification never fails the request: an invalid token is `valid: false`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<AccessClaims>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub principal: Principal,
    /// Grants resolved from the role table.
    pub permissions: Vec<String>,
    /// Grants on the account that the role table does not back.
    pub divergent_grants: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Forced revocation of another session's token, by `jti`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RevokeTokenRequest {
    #[schema(example = "6f1c2a4e-8d1b-4f0e-9a57-3b2f0c7d9e11")]
    pub jti: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeTokenResponse {
    pub jti: String,
    pub revoked: bool,
}
