pub mod connection;
pub mod error;
pub mod repositories;

pub use connection::{Database, DatabaseConfig, MIGRATOR};
pub use error::{DatabaseError, Result};
pub use repositories::{
    jobs::JobRepository,
    lookup::LookupRepository,
    permissions::PermissionRepository,
    posts::PostRepository,
    roles::RoleRepository,
    sidebars::SidebarRepository,
    users::UserRepository,
};
