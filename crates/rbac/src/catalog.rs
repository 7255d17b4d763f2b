//! Seed data for roles, permissions and sidebars.
//!
//! Plain immutable configuration: the service receives a [`SeedCatalog`] and
//! never mutates it.

use civic_models::{is_valid_group_action, is_valid_permission_key};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct RoleSeed {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct PermissionSeed {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct PermissionGroupSeed {
    pub action: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub action_url: Option<&'static str>,
    pub permissions: &'static [PermissionSeed],
}

#[derive(Debug, Clone, Copy)]
pub struct SidebarSeed {
    pub name: &'static str,
    pub screen: &'static str,
    pub icon: &'static str,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct RoleSidebarSeed {
    pub role: &'static str,
    pub sidebars: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct SeedCatalog {
    pub roles: &'static [RoleSeed],
    pub permission_groups: &'static [PermissionGroupSeed],
    pub sidebars: &'static [SidebarSeed],
    /// Roles granted every permission in the catalog
    pub full_access_roles: &'static [&'static str],
    pub role_sidebars: &'static [RoleSidebarSeed],
}

impl SeedCatalog {
    /// Check the catalog before anything is written.
    pub fn validate(&self) -> Result<(), String> {
        let mut role_names = HashSet::new();
        for role in self.roles {
            if !role_names.insert(role.name) {
                return Err(format!("duplicate role {}", role.name));
            }
        }

        let mut permission_names = HashSet::new();
        let mut actions = HashSet::new();
        for group in self.permission_groups {
            if !is_valid_group_action(group.action) {
                return Err(format!("malformed group action {}", group.action));
            }
            if !actions.insert(group.action) {
                return Err(format!("duplicate group action {}", group.action));
            }
            let prefix = group.action.trim_end_matches('*');
            for permission in group.permissions {
                if !is_valid_permission_key(permission.name) {
                    return Err(format!("malformed permission key {}", permission.name));
                }
                if !permission.name.starts_with(prefix) {
                    return Err(format!(
                        "permission {} does not belong under {}",
                        permission.name, group.action
                    ));
                }
                if !permission_names.insert(permission.name) {
                    return Err(format!("duplicate permission {}", permission.name));
                }
            }
        }

        let sidebar_names: HashSet<_> = self.sidebars.iter().map(|s| s.name).collect();
        if sidebar_names.len() != self.sidebars.len() {
            return Err("duplicate sidebar name".to_string());
        }

        for role in self.full_access_roles {
            if !role_names.contains(role) {
                return Err(format!("full-access role {} is not in the catalog", role));
            }
        }
        for grant in self.role_sidebars {
            if !role_names.contains(grant.role) {
                return Err(format!("sidebar grant names unknown role {}", grant.role));
            }
            if let Some(missing) = grant.sidebars.iter().find(|s| !sidebar_names.contains(*s)) {
                return Err(format!("sidebar grant names unknown sidebar {}", missing));
            }
        }

        Ok(())
    }

    pub fn permission_count(&self) -> usize {
        self.permission_groups.iter().map(|g| g.permissions.len()).sum()
    }
}

pub const SUPER_ADMIN: &str = "Super Admin";
pub const ADMIN: &str = "Admin";

static ROLES: &[RoleSeed] = &[
    RoleSeed { name: SUPER_ADMIN, description: "Unrestricted platform access" },
    RoleSeed { name: ADMIN, description: "Administers users, content and lookup tables" },
    RoleSeed { name: "State Coordinator", description: "Coordinates activity across a state" },
    RoleSeed { name: "District Coordinator", description: "Coordinates activity within a district" },
    RoleSeed { name: "Constituency Coordinator", description: "Coordinates an assembly constituency" },
    RoleSeed { name: "Booth Coordinator", description: "Coordinates a single polling booth" },
    RoleSeed { name: "Volunteer", description: "Field volunteer" },
    RoleSeed { name: "Member", description: "Registered community member" },
];

static PERMISSION_GROUPS: &[PermissionGroupSeed] = &[
    PermissionGroupSeed {
        action: "users:*",
        label: "Users",
        description: "Manage user accounts",
        action_url: Some("/users"),
        permissions: &[
            PermissionSeed { name: "users:create", description: "Create users" },
            PermissionSeed { name: "users:read", description: "View users" },
            PermissionSeed { name: "users:update", description: "Edit users" },
            PermissionSeed { name: "users:disable", description: "Enable or disable users" },
        ],
    },
    PermissionGroupSeed {
        action: "roles:*",
        label: "Roles",
        description: "Manage roles and their assignments",
        action_url: Some("/roles"),
        permissions: &[
            PermissionSeed { name: "roles:create", description: "Create roles" },
            PermissionSeed { name: "roles:read", description: "View roles" },
            PermissionSeed { name: "roles:update", description: "Edit roles" },
            PermissionSeed { name: "roles:assign", description: "Assign roles to users" },
        ],
    },
    PermissionGroupSeed {
        action: "permissions:*",
        label: "Permissions",
        description: "Grant and revoke permissions",
        action_url: Some("/permissions"),
        permissions: &[
            PermissionSeed { name: "permissions:read", description: "View permissions" },
            PermissionSeed { name: "permissions:grant", description: "Grant permissions to roles" },
            PermissionSeed { name: "permissions:revoke", description: "Revoke permissions from roles" },
        ],
    },
    PermissionGroupSeed {
        action: "posts:*",
        label: "Posts",
        description: "Community posts and media",
        action_url: Some("/posts"),
        permissions: &[
            PermissionSeed { name: "posts:create", description: "Publish posts" },
            PermissionSeed { name: "posts:read", description: "View posts" },
            PermissionSeed { name: "posts:update", description: "Edit posts" },
            PermissionSeed { name: "posts:moderate", description: "Hide or restore posts" },
        ],
    },
    PermissionGroupSeed {
        action: "jobs:*",
        label: "Jobs",
        description: "Job applications",
        action_url: Some("/jobs"),
        permissions: &[
            PermissionSeed { name: "jobs:create", description: "Submit job applications" },
            PermissionSeed { name: "jobs:read", description: "View job applications" },
            PermissionSeed { name: "jobs:review", description: "Review job applications" },
        ],
    },
    PermissionGroupSeed {
        action: "meta:*",
        label: "Lookup Tables",
        description: "Reference data such as booths and wards",
        action_url: Some("/meta"),
        permissions: &[
            PermissionSeed { name: "meta:read", description: "View lookup tables" },
            PermissionSeed { name: "meta:create", description: "Add lookup values" },
            PermissionSeed { name: "meta:update", description: "Edit lookup values" },
        ],
    },
    PermissionGroupSeed {
        action: "sidebars:*",
        label: "Navigation",
        description: "Sidebar menu configuration",
        action_url: None,
        permissions: &[
            PermissionSeed { name: "sidebars:read", description: "View menu configuration" },
            PermissionSeed { name: "sidebars:assign", description: "Attach menu entries to roles" },
        ],
    },
];

static SIDEBARS: &[SidebarSeed] = &[
    SidebarSeed { name: "Dashboard", screen: "DashboardScreen", icon: "home", sort_order: 0 },
    SidebarSeed { name: "Users", screen: "UserListScreen", icon: "users", sort_order: 1 },
    SidebarSeed { name: "Roles", screen: "RoleListScreen", icon: "shield", sort_order: 2 },
    SidebarSeed { name: "Posts", screen: "PostListScreen", icon: "image", sort_order: 3 },
    SidebarSeed { name: "Jobs", screen: "JobListScreen", icon: "briefcase", sort_order: 4 },
    SidebarSeed { name: "Lookup Tables", screen: "MetaTableScreen", icon: "list", sort_order: 5 },
];

static ROLE_SIDEBARS: &[RoleSidebarSeed] = &[
    RoleSidebarSeed {
        role: SUPER_ADMIN,
        sidebars: &["Dashboard", "Users", "Roles", "Posts", "Jobs", "Lookup Tables"],
    },
    RoleSidebarSeed {
        role: ADMIN,
        sidebars: &["Dashboard", "Users", "Roles", "Posts", "Jobs", "Lookup Tables"],
    },
    RoleSidebarSeed {
        role: "Booth Coordinator",
        sidebars: &["Dashboard", "Posts", "Jobs"],
    },
    RoleSidebarSeed {
        role: "Member",
        sidebars: &["Dashboard", "Posts"],
    },
];

pub static DEFAULT_CATALOG: SeedCatalog = SeedCatalog {
    roles: ROLES,
    permission_groups: PERMISSION_GROUPS,
    sidebars: SIDEBARS,
    full_access_roles: &[SUPER_ADMIN, ADMIN],
    role_sidebars: ROLE_SIDEBARS,
};
