use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::permissions::{permissions_for, Permission};
use super::roles::Role;

/// Principal represents the authenticated user for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub workspace_id: String,
    /// Grants recorded on the account. Informational: decisions use the role table.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Brands this user belongs to, consulted by brand-scoped checks.
    #[serde(default)]
    pub brand_ids: Vec<String>,
    #[serde(default)]
    pub requires_2fa: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role, workspace_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            workspace_id: workspace_id.into(),
            permissions: Vec::new(),
            brand_ids: Vec::new(),
            requires_2fa: false,
            email: None,
        }
    }

    pub fn with_permissions(mut self, perms: impl IntoIterator<Item = String>) -> Self {
        self.permissions = perms.into_iter().collect();
        self
    }

    pub fn with_brands(mut self, brands: impl IntoIterator<Item = String>) -> Self {
        self.brand_ids = brands.into_iter().collect();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_2fa(mut self, required: bool) -> Self {
        self.requires_2fa = required;
        self
    }

    /// Role-derived permissions as tags.
    pub fn effective_permissions(&self) -> Vec<&'static str> {
        permissions_for(self.role).iter().map(|perm| perm.as_str()).collect()
    }

    pub fn has_explicit_grant(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| granted == permission)
    }

    /// Explicit grants that the role table does not back up.
    pub fn divergent_grants(&self) -> Vec<&str> {
        self.permissions
            .iter()
            .filter(|granted| {
                granted
                    .parse::<Permission>()
                    .map(|perm| !permissions_for(self.role).contains(&perm))
                    .unwrap_or(true)
            })
            .map(String::as_str)
            .collect()
    }

    pub fn is_member_of_brand(&self, brand_id: &str) -> bool {
        self.brand_ids.iter().any(|brand| brand == brand_id)
    }
}

/// The thing being acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResourceRef {
    pub workspace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
}

impl ResourceRef {
    pub fn in_workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn for_brand(mut self, brand_id: impl Into<String>) -> Self {
        self.brand_id = Some(brand_id.into());
        self
    }
}

/// Per-check input to the evaluator. Built per request, never stored.
#[derive(Debug, Clone, Copy)]
pub struct PermissionContext<'a> {
    pub principal: &'a Principal,
    pub resource: Option<&'a ResourceRef>,
}

impl<'a> PermissionContext<'a> {
    pub fn new(principal: &'a Principal) -> Self {
        Self {
            principal,
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: &'a ResourceRef) -> Self {
        self.resource = Some(resource);
        self
    }
}

/// Which contextual checks run after the base permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CheckOptions {
    /// Workspace isolation. On unless explicitly switched off.
    pub require_same_workspace: bool,
    pub require_ownership: bool,
    pub require_same_brand: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            require_same_workspace: true,
            require_ownership: false,
            require_same_brand: false,
        }
    }
}

impl CheckOptions {
    pub fn owner_only() -> Self {
        Self {
            require_ownership: true,
            ..Self::default()
        }
    }

    pub fn brand_scoped() -> Self {
        Self {
            require_same_brand: true,
            ..Self::default()
        }
    }
}
