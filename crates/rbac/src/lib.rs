pub mod catalog;
pub mod error;
pub mod service;
pub mod upsert;

pub use catalog::{
    PermissionGroupSeed, PermissionSeed, RoleSeed, RoleSidebarSeed, SeedCatalog, SidebarSeed,
    DEFAULT_CATALOG,
};
pub use error::{RbacError, Result};
pub use service::{RbacService, SeedRecord, SeedReport, SkipReason};
pub use upsert::{upsert_row, SeedValue, UpsertOutcome, UpsertSpec, Upserted};
