//! Permission vocabulary and the static role → permission table.
//!
//! The vocabulary is closed: every tag the application can ask about is a
//! variant here. The table is an exhaustive `match` on [`Role`], so adding a
//! role without deciding its grants does not compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    // Orders
    #[serde(rename = "orders.read")]
    OrdersRead,
    #[serde(rename = "orders.create")]
    OrdersCreate,
    #[serde(rename = "orders.update")]
    OrdersUpdate,
    #[serde(rename = "orders.delete")]
    OrdersDelete,
    #[serde(rename = "orders.approve")]
    OrdersApprove,

    // Routing
    #[serde(rename = "routing.read")]
    RoutingRead,
    #[serde(rename = "routing.manage")]
    RoutingManage,

    // Clients
    #[serde(rename = "clients.read")]
    ClientsRead,
    #[serde(rename = "clients.create")]
    ClientsCreate,
    #[serde(rename = "clients.update")]
    ClientsUpdate,
    #[serde(rename = "clients.delete")]
    ClientsDelete,

    // Design
    #[serde(rename = "design.read")]
    DesignRead,
    #[serde(rename = "design.upload")]
    DesignUpload,
    #[serde(rename = "design.approve")]
    DesignApprove,

    // Production
    #[serde(rename = "production.read")]
    ProductionRead,
    #[serde(rename = "production.update")]
    ProductionUpdate,
    #[serde(rename = "production.execute")]
    ProductionExecute,

    // Quality control
    #[serde(rename = "qc.read")]
    QcRead,
    #[serde(rename = "qc.inspect")]
    QcInspect,
    #[serde(rename = "qc.approve")]
    QcApprove,

    // HR
    #[serde(rename = "hr.read")]
    HrRead,
    #[serde(rename = "hr.manage")]
    HrManage,

    // Payroll
    #[serde(rename = "payroll.read")]
    PayrollRead,
    #[serde(rename = "payroll.process")]
    PayrollProcess,

    // Maintenance
    #[serde(rename = "maintenance.read")]
    MaintenanceRead,
    #[serde(rename = "maintenance.manage")]
    MaintenanceManage,

    // Administration
    #[serde(rename = "admin.users")]
    AdminUsers,
    #[serde(rename = "admin.settings")]
    AdminSettings,
    #[serde(rename = "admin.audit")]
    AdminAudit,
}

impl Permission {
    pub const ALL: [Permission; 29] = [
        Permission::OrdersRead,
        Permission::OrdersCreate,
        Permission::OrdersUpdate,
        Permission::OrdersDelete,
        Permission::OrdersApprove,
        Permission::RoutingRead,
        Permission::RoutingManage,
        Permission::ClientsRead,
        Permission::ClientsCreate,
        Permission::ClientsUpdate,
        Permission::ClientsDelete,
        Permission::DesignRead,
        Permission::DesignUpload,
        Permission::DesignApprove,
        Permission::ProductionRead,
        Permission::ProductionUpdate,
        Permission::ProductionExecute,
        Permission::QcRead,
        Permission::QcInspect,
        Permission::QcApprove,
        Permission::HrRead,
        Permission::HrManage,
        Permission::PayrollRead,
        Permission::PayrollProcess,
        Permission::MaintenanceRead,
        Permission::MaintenanceManage,
        Permission::AdminUsers,
        Permission::AdminSettings,
        Permission::AdminAudit,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::OrdersRead => "orders.read",
            Permission::OrdersCreate => "orders.create",
            Permission::OrdersUpdate => "orders.update",
            Permission::OrdersDelete => "orders.delete",
            Permission::OrdersApprove => "orders.approve",
            Permission::RoutingRead => "routing.read",
            Permission::RoutingManage => "routing.manage",
            Permission::ClientsRead => "clients.read",
            Permission::ClientsCreate => "clients.create",
            Permission::ClientsUpdate => "clients.update",
            Permission::ClientsDelete => "clients.delete",
            Permission::DesignRead => "design.read",
            Permission::DesignUpload => "design.upload",
            Permission::DesignApprove => "design.approve",
            Permission::ProductionRead => "production.read",
            Permission::ProductionUpdate => "production.update",
            Permission::ProductionExecute => "production.execute",
            Permission::QcRead => "qc.read",
            Permission::QcInspect => "qc.inspect",
            Permission::QcApprove => "qc.approve",
            Permission::HrRead => "hr.read",
            Permission::HrManage => "hr.manage",
            Permission::PayrollRead => "payroll.read",
            Permission::PayrollProcess => "payroll.process",
            Permission::MaintenanceRead => "maintenance.read",
            Permission::MaintenanceManage => "maintenance.manage",
            Permission::AdminUsers => "admin.users",
            Permission::AdminSettings => "admin.settings",
            Permission::AdminAudit => "admin.audit",
        }
    }

    /// Domain prefix, e.g. `"orders"` for `orders.read`.
    pub fn domain(self) -> &'static str {
        let tag = self.as_str();
        tag.split_once('.').map(|(domain, _)| domain).unwrap_or(tag)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    /// Exact tag match only; no wildcards, no case folding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|perm| perm.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

use Permission::*;

const ADMIN_GRANTS: &[Permission] = &Permission::ALL;

const MANAGER_GRANTS: &[Permission] = &[
    OrdersRead,
    OrdersCreate,
    OrdersUpdate,
    OrdersDelete,
    OrdersApprove,
    RoutingRead,
    RoutingManage,
    ClientsRead,
    ClientsCreate,
    ClientsUpdate,
    ClientsDelete,
    DesignRead,
    DesignUpload,
    DesignApprove,
    ProductionRead,
    ProductionUpdate,
    ProductionExecute,
    QcRead,
    QcInspect,
    QcApprove,
    HrRead,
    HrManage,
    PayrollRead,
    MaintenanceRead,
    MaintenanceManage,
    AdminUsers,
];

const CSR_GRANTS: &[Permission] = &[
    OrdersRead,
    OrdersCreate,
    OrdersUpdate,
    RoutingRead,
    ClientsRead,
    ClientsCreate,
    ClientsUpdate,
    DesignRead,
    ProductionRead,
];

const GRAPHIC_ARTIST_GRANTS: &[Permission] = &[OrdersRead, DesignRead, DesignUpload];

const PRODUCTION_OPERATOR_GRANTS: &[Permission] = &[
    OrdersRead,
    RoutingRead,
    ProductionRead,
    ProductionExecute,
];

const QC_INSPECTOR_GRANTS: &[Permission] = &[
    OrdersRead,
    ProductionRead,
    QcRead,
    QcInspect,
    QcApprove,
];

const WAREHOUSE_STAFF_GRANTS: &[Permission] = &[OrdersRead, ProductionRead, MaintenanceRead];

// Clients approve artwork through the portal, so they hold design.approve
// even though CSRs do not.
const CLIENT_GRANTS: &[Permission] = &[OrdersRead, DesignRead, DesignApprove];

/// Every permission `role` grants.
pub const fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_GRANTS,
        Role::Manager => MANAGER_GRANTS,
        Role::Csr => CSR_GRANTS,
        Role::GraphicArtist => GRAPHIC_ARTIST_GRANTS,
        Role::ProductionOperator => PRODUCTION_OPERATOR_GRANTS,
        Role::QcInspector => QC_INSPECTOR_GRANTS,
        Role::WarehouseStaff => WAREHOUSE_STAFF_GRANTS,
        Role::Client => CLIENT_GRANTS,
    }
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}

/// String form of [`has_permission`]. Tags outside the vocabulary are never granted.
pub fn has_permission_str(role: Role, permission: &str) -> bool {
    permission
        .parse::<Permission>()
        .map(|perm| has_permission(role, perm))
        .unwrap_or(false)
}

/// `false` for an empty list.
pub fn has_any_permission(role: Role, permissions: &[Permission]) -> bool {
    permissions.iter().any(|perm| has_permission(role, *perm))
}

/// `true` for an empty list.
pub fn has_all_permissions(role: Role, permissions: &[Permission]) -> bool {
    permissions.iter().all(|perm| has_permission(role, *perm))
}
