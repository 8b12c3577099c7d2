use super::permissions::{has_permission, Permission};
use super::principal::{CheckOptions, PermissionContext};

/// Policy evaluator trait for pluggable authorization logic
pub trait PolicyEvaluator: Send + Sync {
    /// Decide whether the principal in `ctx` may exercise `permission`.
    /// Denial is `false`, never an error.
    fn can(&self, ctx: &PermissionContext<'_>, permission: Permission, options: CheckOptions) -> bool;
}

/// Default policy evaluator with standard RBAC logic
///
/// Evaluation order (first failure denies):
/// 1. role grants the permission
/// 2. resource lives in the principal's workspace (unless switched off)
/// 3. principal owns the resource, if required (admin/manager bypass)
/// 4. principal belongs to the resource's brand, if required (admin/manager bypass)
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicyEvaluator;

impl DefaultPolicyEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl PolicyEvaluator for DefaultPolicyEvaluator {
    fn can(&self, ctx: &PermissionContext<'_>, permission: Permission, options: CheckOptions) -> bool {
        let principal = ctx.principal;

        // 1. Role grant
        if !has_permission(principal.role, permission) {
            tracing::debug!(
                user_id = %principal.id,
                role = %principal.role,
                permission = %permission,
                "permission denied: role lacks grant"
            );
            return false;
        }

        // 2. Workspace isolation
        if options.require_same_workspace {
            if let Some(resource) = ctx.resource {
                if resource.workspace_id != principal.workspace_id {
                    tracing::debug!(
                        user_id = %principal.id,
                        permission = %permission,
                        workspace_id = %principal.workspace_id,
                        resource_workspace_id = %resource.workspace_id,
                        "permission denied: cross-workspace access"
                    );
                    return false;
                }
            }
        }

        // 3. Ownership
        if options.require_ownership && !principal.role.is_privileged() {
            let owns = ctx
                .resource
                .and_then(|resource| resource.owner_id.as_deref())
                .map(|owner| owner == principal.id)
                .unwrap_or(false);

            if !owns {
                tracing::debug!(
                    user_id = %principal.id,
                    permission = %permission,
                    "permission denied: not the resource owner"
                );
                return false;
            }
        }

        // 4. Brand scoping
        if options.require_same_brand && !principal.role.is_privileged() {
            if let Some(brand_id) = ctx.resource.and_then(|resource| resource.brand_id.as_deref()) {
                if !principal.is_member_of_brand(brand_id) {
                    tracing::debug!(
                        user_id = %principal.id,
                        permission = %permission,
                        brand_id = %brand_id,
                        "permission denied: not a member of the brand"
                    );
                    return false;
                }
            }
        }

        tracing::debug!(
            user_id = %principal.id,
            permission = %permission,
            "permission granted"
        );
        true
    }
}

/// Contextual check with the default policy.
pub fn check_permission(ctx: &PermissionContext<'_>, permission: Permission, options: CheckOptions) -> bool {
    DefaultPolicyEvaluator.can(ctx, permission, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{Principal, ResourceRef, Role};

    fn principal(role: Role) -> Principal {
        Principal::new("user-1", role, "ws-1")
    }

    #[test]
    fn test_denial_when_role_lacks_permission() {
        let p = principal(Role::GraphicArtist);
        let ctx = PermissionContext::new(&p);

        assert!(!check_permission(&ctx, Permission::PayrollProcess, CheckOptions::default()));
        assert!(check_permission(&ctx, Permission::DesignUpload, CheckOptions::default()));
    }

    #[test]
    fn test_cross_workspace_denied_even_for_admin() {
        let p = principal(Role::Admin);
        let resource = ResourceRef::in_workspace("ws-2").owned_by("user-1");
        let ctx = PermissionContext::new(&p).with_resource(&resource);

        assert!(!check_permission(&ctx, Permission::OrdersRead, CheckOptions::default()));
        assert!(!check_permission(&ctx, Permission::OrdersRead, CheckOptions::owner_only()));
    }

    #[test]
    fn test_workspace_check_can_be_switched_off() {
        let p = principal(Role::Admin);
        let resource = ResourceRef::in_workspace("ws-2");
        let ctx = PermissionContext::new(&p).with_resource(&resource);
        let opts = CheckOptions {
            require_same_workspace: false,
            ..CheckOptions::default()
        };

        assert!(check_permission(&ctx, Permission::OrdersRead, opts));
    }

    #[test]
    fn test_ownership_required_for_client() {
        let resource = ResourceRef::in_workspace("ws-1").owned_by("someone-else");

        let client = principal(Role::Client);
        let ctx = PermissionContext::new(&client).with_resource(&resource);
        assert!(!check_permission(&ctx, Permission::OrdersRead, CheckOptions::owner_only()));

        let admin = principal(Role::Admin);
        let ctx = PermissionContext::new(&admin).with_resource(&resource);
        assert!(check_permission(&ctx, Permission::OrdersRead, CheckOptions::owner_only()));

        let manager = principal(Role::Manager);
        let ctx = PermissionContext::new(&manager).with_resource(&resource);
        assert!(check_permission(&ctx, Permission::OrdersRead, CheckOptions::owner_only()));
    }

    #[test]
    fn test_owner_passes_ownership_check() {
        let client = principal(Role::Client);
        let resource = ResourceRef::in_workspace("ws-1").owned_by("user-1");
        let ctx = PermissionContext::new(&client).with_resource(&resource);

        assert!(check_permission(&ctx, Permission::OrdersRead, CheckOptions::owner_only()));
    }

    #[test]
    fn test_ownership_without_owner_denies_non_privileged() {
        let csr = principal(Role::Csr);
        let resource = ResourceRef::in_workspace("ws-1");
        let ctx = PermissionContext::new(&csr).with_resource(&resource);
        assert!(!check_permission(&ctx, Permission::OrdersRead, CheckOptions::owner_only()));

        let ctx = PermissionContext::new(&csr);
        assert!(!check_permission(&ctx, Permission::OrdersRead, CheckOptions::owner_only()));
    }

    #[test]
    fn test_brand_scope_checks_membership() {
        let resource = ResourceRef::in_workspace("ws-1").for_brand("brand-a");

        let member = principal(Role::Csr).with_brands(vec!["brand-a".to_string()]);
        let ctx = PermissionContext::new(&member).with_resource(&resource);
        assert!(check_permission(&ctx, Permission::OrdersRead, CheckOptions::brand_scoped()));

        let outsider = principal(Role::Csr).with_brands(vec!["brand-b".to_string()]);
        let ctx = PermissionContext::new(&outsider).with_resource(&resource);
        assert!(!check_permission(&ctx, Permission::OrdersRead, CheckOptions::brand_scoped()));
        // Not requested, so not enforced.
        assert!(check_permission(&ctx, Permission::OrdersRead, CheckOptions::default()));

        let manager = principal(Role::Manager);
        let ctx = PermissionContext::new(&manager).with_resource(&resource);
        assert!(check_permission(&ctx, Permission::OrdersRead, CheckOptions::brand_scoped()));
    }

    #[test]
    fn test_brand_scope_ignores_unbranded_resources() {
        let csr = principal(Role::Csr);
        let resource = ResourceRef::in_workspace("ws-1");
        let ctx = PermissionContext::new(&csr).with_resource(&resource);

        assert!(check_permission(&ctx, Permission::OrdersRead, CheckOptions::brand_scoped()));
    }

    #[test]
    fn test_base_check_runs_before_privileged_bypass() {
        let manager = principal(Role::Manager);
        let resource = ResourceRef::in_workspace("ws-1");
        let ctx = PermissionContext::new(&manager).with_resource(&resource);

        assert!(!check_permission(&ctx, Permission::AdminSettings, CheckOptions::owner_only()));
    }
}
