use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Workspace role. Every principal carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Csr,
    GraphicArtist,
    ProductionOperator,
    QcInspector,
    WarehouseStaff,
    Client,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Admin,
        Role::Manager,
        Role::Csr,
        Role::GraphicArtist,
        Role::ProductionOperator,
        Role::QcInspector,
        Role::WarehouseStaff,
        Role::Client,
    ];

    /// Rank used for "who outranks whom" questions only. Permissions are
    /// listed per role in the permission table and never derived from this.
    pub const fn level(self) -> u8 {
        match self {
            Role::Admin => 10,
            Role::Manager => 8,
            Role::Csr => 6,
            Role::GraphicArtist => 4,
            Role::QcInspector => 4,
            Role::ProductionOperator => 3,
            Role::WarehouseStaff => 2,
            Role::Client => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Csr => "CSR",
            Role::GraphicArtist => "GRAPHIC_ARTIST",
            Role::ProductionOperator => "PRODUCTION_OPERATOR",
            Role::QcInspector => "QC_INSPECTOR",
            Role::WarehouseStaff => "WAREHOUSE_STAFF",
            Role::Client => "CLIENT",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Manager => "Manager",
            Role::Csr => "Customer Service Representative",
            Role::GraphicArtist => "Graphic Artist",
            Role::ProductionOperator => "Production Operator",
            Role::QcInspector => "QC Inspector",
            Role::WarehouseStaff => "Warehouse Staff",
            Role::Client => "Client",
        }
    }

    /// Roles that bypass ownership and brand scoping in contextual checks.
    pub const fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Strict rank comparison: `a` outranks `b`.
pub fn is_higher_role(a: Role, b: Role) -> bool {
    a.level() > b.level()
}

/// Whether `manager` may administer accounts holding `target`.
///
/// This is an explicit allow-list, not a rank comparison: admins manage
/// everyone except other admins, managers manage everyone below manager,
/// nobody else manages anyone.
pub fn can_manage_user(manager: Role, target: Role) -> bool {
    match manager {
        Role::Admin => target != Role::Admin,
        Role::Manager => !matches!(target, Role::Admin | Role::Manager),
        Role::Csr
        | Role::GraphicArtist
        | Role::ProductionOperator
        | Role::QcInspector
        | Role::WarehouseStaff
        | Role::Client => false,
    }
}
