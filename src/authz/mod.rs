//! Authorization module - role table and contextual policy evaluation
//!
//! This module implements the RBAC layer with support for:
//! - A fixed role hierarchy used for account-management decisions
//! - A static, exhaustive role → permission table
//! - Contextual checks: workspace isolation, ownership, brand membership

mod evaluator;
mod permissions;
mod principal;
mod roles;

pub use evaluator::{check_permission, DefaultPolicyEvaluator, PolicyEvaluator};
pub use permissions::{
    has_all_permissions, has_any_permission, has_permission, has_permission_str, permissions_for,
    Permission, UnknownPermission,
};
pub use principal::{CheckOptions, PermissionContext, Principal, ResourceRef};
pub use roles::{can_manage_user, is_higher_role, Role, UnknownRole};
