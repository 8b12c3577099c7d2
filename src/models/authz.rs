use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::{permissions_for, CheckOptions, Permission, ResourceRef, Role};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleSummary {
    pub role: Role,
    pub level: u8,
    pub display_name: String,
    pub permissions: Vec<Permission>,
}

impl From<Role> for RoleSummary {
    fn from(role: Role) -> Self {
        Self {
            role,
            level: role.level(),
            display_name: role.display_name().to_string(),
            permissions: permissions_for(role).to_vec(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionCheckRequest {
    #[schema(example = "orders.update")]
    pub permission: String,
    #[serde(default)]
    pub resource: Option<ResourceRef>,
    #[serde(default)]
    pub options: Option<CheckOptions>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub permission: Permission,
    pub allowed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CanManageRequest {
    pub target_role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CanManageResponse {
    pub target_role: Role,
    pub allowed: bool,
}
