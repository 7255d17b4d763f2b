// Core modules
pub mod status;
pub mod user;
pub mod role;
pub mod permission;
pub mod sidebar;

// Content modules (share the status/audit convention, no RBAC interaction)
pub mod post;
pub mod job;

// Generic lookup tables
pub mod registry;

// Re-export commonly used types
pub use status::{StatusFilter, UpdateStatus, STATUS_ACTIVE, STATUS_INACTIVE, SYSTEM_ACTOR_ID};
pub use user::{NewUser, User, UserOtp};
pub use role::{AssignRoles, NewRole, Role, UpdateRole};
pub use permission::{
    GrantPermissions, Permission, PermissionGroup,
    is_valid_group_action, is_valid_permission_key,
};
pub use sidebar::Sidebar;
pub use post::{MediaType, NewPost, NewPostMedia, Post, PostMedia, PostWithMedia};
pub use job::{Job, NewJob, SubmittedFor};
pub use registry::{
    ColumnDef, ColumnKind, CustomInclude, FieldValue, LookupFilter, LookupListParams,
    MetaRegistry, MetaTableDescriptor, RegistryError, SearchFilter, ValidatedPayload,
};
