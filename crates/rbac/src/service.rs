//! Transactional seeding and assignment batches.
//!
//! Each public operation is one batch: it opens a transaction, converges
//! every row through [`upsert_row`], and either commits as a whole or rolls
//! back and reports [`RbacError::TransactionAborted`].

use crate::catalog::SeedCatalog;
use crate::error::{RbacError, Result};
use crate::upsert::{upsert_row, UpsertOutcome, UpsertSpec};
use civic_models::STATUS_ACTIVE;
use serde::Serialize;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct SeedRecord {
    pub table: &'static str,
    pub key: String,
    pub id: i64,
    pub outcome: UpsertOutcome,
}

impl std::fmt::Display for SeedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} (id {}): {}", self.table, self.key, self.id, self.outcome)
    }
}

/// Why a bulk grant wrote nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    RoleMissing(String),
    NoActivePermissions,
    SidebarsMissing(Vec<String>),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::RoleMissing(role) => write!(f, "role {} does not exist or is inactive", role),
            SkipReason::NoActivePermissions => write!(f, "no active permissions"),
            SkipReason::SidebarsMissing(names) => {
                write!(f, "sidebars not found: {}", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub batch: String,
    pub records: Vec<SeedRecord>,
    pub skipped: Option<SkipReason>,
}

impl SeedReport {
    fn new(batch: impl Into<String>) -> Self {
        Self {
            batch: batch.into(),
            records: Vec::new(),
            skipped: None,
        }
    }

    fn skip(batch: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::new(batch)
        }
    }

    pub fn count(&self, outcome: UpsertOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }
}

#[derive(Clone)]
pub struct RbacService {
    pool: PgPool,
    actor_id: i64,
}

impl RbacService {
    /// `actor_id` is written to `created_by` / `updated_by` on every row
    pub fn new(pool: PgPool, actor_id: i64) -> Self {
        Self { pool, actor_id }
    }

    pub fn actor_id(&self) -> i64 {
        self.actor_id
    }

    pub async fn seed_roles(&self, catalog: &SeedCatalog) -> Result<SeedReport> {
        let mut tx = self.pool.begin().await?;
        let result = self.seed_roles_in(&mut tx, catalog).await;
        finish("roles", tx, result).await
    }

    pub async fn seed_permission_catalog(&self, catalog: &SeedCatalog) -> Result<SeedReport> {
        catalog.validate().map_err(RbacError::InvalidCatalog)?;

        let mut tx = self.pool.begin().await?;
        let result = self.seed_permissions_in(&mut tx, catalog).await;
        finish("permissions", tx, result).await
    }

    pub async fn seed_sidebars(&self, catalog: &SeedCatalog) -> Result<SeedReport> {
        let mut tx = self.pool.begin().await?;
        let result = self.seed_sidebars_in(&mut tx, catalog).await;
        finish("sidebars", tx, result).await
    }

    /// Grant every active permission to the named role.
    pub async fn grant_all_permissions(&self, role_name: &str) -> Result<SeedReport> {
        let batch = format!("grant-all {}", role_name);
        let mut tx = self.pool.begin().await?;
        let result = self.grant_all_in(&mut tx, &batch, role_name).await;
        finish(&batch, tx, result).await
    }

    /// Grant specific permissions to a role by id.
    pub async fn grant_permissions(&self, role_id: i64, permission_ids: &[i64]) -> Result<SeedReport> {
        let batch = format!("grant role {}", role_id);
        let mut tx = self.pool.begin().await?;
        let result = self.grant_permissions_in(&mut tx, &batch, role_id, permission_ids).await;
        finish(&batch, tx, result).await
    }

    pub async fn grant_sidebars(&self, role_name: &str, sidebar_names: &[&str]) -> Result<SeedReport> {
        let batch = format!("grant-sidebars {}", role_name);
        let mut tx = self.pool.begin().await?;
        let result = self.grant_sidebars_in(&mut tx, &batch, role_name, sidebar_names).await;
        finish(&batch, tx, result).await
    }

    pub async fn assign_roles_to_user(&self, user_id: i64, role_ids: &[i64]) -> Result<SeedReport> {
        let batch = format!("assign user {}", user_id);
        let mut tx = self.pool.begin().await?;
        let result = self.assign_roles_in(&mut tx, &batch, user_id, role_ids).await;
        finish(&batch, tx, result).await
    }

    /// Assign roles, looked up by name, to the user with this contact number.
    pub async fn assign_roles_by_name(&self, contact_number: &str, role_names: &[String]) -> Result<SeedReport> {
        let batch = format!("assign {}", contact_number);
        let mut tx = self.pool.begin().await?;
        let result = async {
            let user_id = find_user_by_contact(&mut tx, contact_number).await?;
            let mut role_ids = Vec::with_capacity(role_names.len());
            for name in role_names {
                let id = find_role_id(&mut tx, name)
                    .await?
                    .ok_or_else(|| RbacError::NotFound(format!("Role {} not found", name)))?;
                role_ids.push(id);
            }
            self.assign_roles_in(&mut tx, &batch, user_id, &role_ids).await
        }
        .await;
        finish(&batch, tx, result).await
    }

    /// Roles, permission catalog, sidebars, then the catalog's grants; each
    /// step commits on its own.
    pub async fn seed_all(&self, catalog: &SeedCatalog) -> Result<Vec<SeedReport>> {
        catalog.validate().map_err(RbacError::InvalidCatalog)?;

        let mut reports = vec![
            self.seed_roles(catalog).await?,
            self.seed_permission_catalog(catalog).await?,
            self.seed_sidebars(catalog).await?,
        ];
        for role in catalog.full_access_roles {
            reports.push(self.grant_all_permissions(role).await?);
        }
        for grant in catalog.role_sidebars {
            reports.push(self.grant_sidebars(grant.role, grant.sidebars).await?);
        }

        Ok(reports)
    }

    async fn upsert(&self, conn: &mut PgConnection, report: &mut SeedReport, spec: UpsertSpec) -> Result<i64> {
        let upserted = upsert_row(conn, &spec, self.actor_id).await?;
        report.records.push(SeedRecord {
            table: spec.table,
            key: spec.key_label(),
            id: upserted.id,
            outcome: upserted.outcome,
        });
        Ok(upserted.id)
    }

    async fn seed_roles_in(&self, conn: &mut PgConnection, catalog: &SeedCatalog) -> Result<SeedReport> {
        let mut report = SeedReport::new("roles");
        for role in catalog.roles {
            let spec = UpsertSpec::new("tbl_role")
                .key("name", role.name)
                .attr("description", Some(role.description));
            self.upsert(conn, &mut report, spec).await?;
        }
        Ok(report)
    }

    async fn seed_permissions_in(&self, conn: &mut PgConnection, catalog: &SeedCatalog) -> Result<SeedReport> {
        let mut report = SeedReport::new("permissions");
        for group in catalog.permission_groups {
            let spec = UpsertSpec::new("tbl_permission_group")
                .key("action", group.action)
                .attr("label", group.label)
                .attr("description", Some(group.description))
                .attr("action_url", group.action_url);
            self.upsert(conn, &mut report, spec).await?;

            let group_id: Option<(i64,)> = sqlx::query_as(
                "SELECT id FROM tbl_permission_group WHERE action = $1 AND status = $2",
            )
            .bind(group.action)
            .bind(STATUS_ACTIVE)
            .fetch_optional(&mut *conn)
            .await?;
            let (group_id,) = group_id.ok_or_else(|| {
                RbacError::ValidationConflict(format!(
                    "Permission group {} could not be resolved after upsert",
                    group.action
                ))
            })?;

            for permission in group.permissions {
                let spec = UpsertSpec::new("tbl_permission")
                    .key("name", permission.name)
                    .attr("permission_group_id", group_id)
                    .attr("description", Some(permission.description));
                self.upsert(conn, &mut report, spec).await?;
            }
        }
        Ok(report)
    }

    async fn seed_sidebars_in(&self, conn: &mut PgConnection, catalog: &SeedCatalog) -> Result<SeedReport> {
        let mut report = SeedReport::new("sidebars");
        for sidebar in catalog.sidebars {
            let spec = UpsertSpec::new("tbl_sidebar")
                .key("name", sidebar.name)
                .attr("screen", sidebar.screen)
                .attr("icon", Some(sidebar.icon))
                .attr("sort_order", sidebar.sort_order);
            self.upsert(conn, &mut report, spec).await?;
        }
        Ok(report)
    }

    async fn grant_all_in(&self, conn: &mut PgConnection, batch: &str, role_name: &str) -> Result<SeedReport> {
        let Some(role_id) = find_role_id(conn, role_name).await? else {
            tracing::warn!("Skipping {}: role {} not found", batch, role_name);
            return Ok(SeedReport::skip(batch, SkipReason::RoleMissing(role_name.to_string())));
        };

        let permission_ids: Vec<(i64,)> =
            sqlx::query_as("SELECT id FROM tbl_permission WHERE status = $1 ORDER BY id")
                .bind(STATUS_ACTIVE)
                .fetch_all(&mut *conn)
                .await?;
        if permission_ids.is_empty() {
            tracing::warn!("Skipping {}: no active permissions", batch);
            return Ok(SeedReport::skip(batch, SkipReason::NoActivePermissions));
        }

        let mut report = SeedReport::new(batch);
        for (permission_id,) in permission_ids {
            let spec = UpsertSpec::new("tbl_role_permission")
                .key("role_id", role_id)
                .key("permission_id", permission_id);
            self.upsert(conn, &mut report, spec).await?;
        }
        Ok(report)
    }

    async fn grant_permissions_in(
        &self,
        conn: &mut PgConnection,
        batch: &str,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<SeedReport> {
        ensure_exists(conn, "tbl_role", "Role", role_id).await?;

        let mut report = SeedReport::new(batch);
        for &permission_id in permission_ids {
            ensure_exists(conn, "tbl_permission", "Permission", permission_id).await?;
            let spec = UpsertSpec::new("tbl_role_permission")
                .key("role_id", role_id)
                .key("permission_id", permission_id);
            self.upsert(conn, &mut report, spec).await?;
        }
        Ok(report)
    }

    async fn grant_sidebars_in(
        &self,
        conn: &mut PgConnection,
        batch: &str,
        role_name: &str,
        sidebar_names: &[&str],
    ) -> Result<SeedReport> {
        let Some(role_id) = find_role_id(conn, role_name).await? else {
            tracing::warn!("Skipping {}: role {} not found", batch, role_name);
            return Ok(SeedReport::skip(batch, SkipReason::RoleMissing(role_name.to_string())));
        };

        let names: Vec<String> = sidebar_names.iter().map(|s| s.to_string()).collect();
        let sidebars: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, name FROM tbl_sidebar WHERE name = ANY($1) AND status = $2 ORDER BY sort_order, id",
        )
        .bind(&names)
        .bind(STATUS_ACTIVE)
        .fetch_all(&mut *conn)
        .await?;

        let found: HashSet<&str> = sidebars.iter().map(|(_, name)| name.as_str()).collect();
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !found.contains(name.as_str()))
            .cloned()
            .collect();
        if sidebars.is_empty() || !missing.is_empty() {
            tracing::warn!("Skipping {}: sidebars not found {:?}", batch, missing);
            return Ok(SeedReport::skip(batch, SkipReason::SidebarsMissing(missing)));
        }

        let mut report = SeedReport::new(batch);
        for (sidebar_id, _) in sidebars {
            let spec = UpsertSpec::new("tbl_role_sidebar")
                .key("role_id", role_id)
                .key("sidebar_id", sidebar_id);
            self.upsert(conn, &mut report, spec).await?;
        }
        Ok(report)
    }

    async fn assign_roles_in(
        &self,
        conn: &mut PgConnection,
        batch: &str,
        user_id: i64,
        role_ids: &[i64],
    ) -> Result<SeedReport> {
        ensure_exists(conn, "tbl_user", "User", user_id).await?;

        let mut report = SeedReport::new(batch);
        for &role_id in role_ids {
            ensure_exists(conn, "tbl_role", "Role", role_id).await?;
            let spec = UpsertSpec::new("tbl_user_role")
                .key("user_id", user_id)
                .key("role_id", role_id);
            self.upsert(conn, &mut report, spec).await?;
        }
        Ok(report)
    }
}

/// Commit on success; otherwise roll back and wrap the error with the batch name.
async fn finish<T>(batch: &str, tx: Transaction<'_, Postgres>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| RbacError::aborted(batch, e.into()))?;
            tracing::info!("Batch '{}' committed", batch);
            Ok(value)
        }
        Err(err) => {
            tracing::error!("Batch '{}' failed, rolling back: {}", batch, err);
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback of '{}' failed: {}", batch, rollback_err);
            }
            Err(RbacError::aborted(batch, err))
        }
    }
}

async fn find_role_id(conn: &mut PgConnection, name: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM tbl_role WHERE name = $1 AND status = $2")
        .bind(name)
        .bind(STATUS_ACTIVE)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|(id,)| id))
}

async fn find_user_by_contact(conn: &mut PgConnection, contact_number: &str) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM tbl_user WHERE contact_number = $1")
        .bind(contact_number)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|(id,)| id)
        .ok_or_else(|| RbacError::NotFound(format!("User with contact number {} not found", contact_number)))
}

async fn ensure_exists(conn: &mut PgConnection, table: &'static str, entity: &str, id: i64) -> Result<()> {
    let (exists,): (bool,) = sqlx::query_as(&format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(RbacError::NotFound(format!("{} {} not found", entity, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_CATALOG;
    use civic_database::{Database, DatabaseConfig, PermissionRepository, RoleRepository};
    use civic_models::{NewUser, SYSTEM_ACTOR_ID};

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::SidebarsMissing(vec!["Jobs".to_string()]).to_string(),
            "sidebars not found: Jobs"
        );
        assert_eq!(
            SkipReason::RoleMissing("Root".to_string()).to_string(),
            "role Root does not exist or is inactive"
        );
    }

    #[test]
    fn test_report_counts_outcomes() {
        let mut report = SeedReport::new("roles");
        for (id, outcome) in [
            (1, UpsertOutcome::Created),
            (2, UpsertOutcome::Refreshed),
            (3, UpsertOutcome::Created),
        ] {
            report.records.push(SeedRecord {
                table: "tbl_role",
                key: format!("role-{}", id),
                id,
                outcome,
            });
        }

        assert_eq!(report.count(UpsertOutcome::Created), 2);
        assert_eq!(report.count(UpsertOutcome::Reactivated), 0);
        assert_eq!(report.records[1].to_string(), "tbl_role role-2 (id 2): unchanged");
    }

    async fn seeded_service() -> (Database, RbacService) {
        let db = Database::new(DatabaseConfig::from_env())
            .await
            .expect("Failed to connect to database");
        db.migrate().await.expect("Failed to migrate");
        let service = RbacService::new(db.pool().clone(), SYSTEM_ACTOR_ID);
        service.seed_all(&DEFAULT_CATALOG).await.expect("Seeding failed");
        (db, service)
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_reseed_is_idempotent_and_reactivates() {
        let (db, service) = seeded_service().await;

        sqlx::query("UPDATE tbl_role SET status = 0 WHERE name = 'Volunteer'")
            .execute(db.pool())
            .await
            .unwrap();

        let report = service.seed_roles(&DEFAULT_CATALOG).await.unwrap();
        assert_eq!(report.count(UpsertOutcome::Created), 0);
        assert_eq!(report.count(UpsertOutcome::Reactivated), 1);

        let (duplicates,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM (SELECT name FROM tbl_role GROUP BY name HAVING COUNT(*) > 1) d",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(duplicates, 0);
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_posts_group_lists_posts_create() {
        let (db, _service) = seeded_service().await;
        let permissions = PermissionRepository::new(db.pool().clone());

        let listed = permissions.list_by_group_action("posts:*").await.unwrap();
        assert!(listed.iter().any(|p| p.name == "posts:create"));

        let group = permissions.find_group_by_action("posts:*").await.unwrap();
        let create = permissions.find_by_name("posts:create").await.unwrap();
        assert_eq!(create.permission_group_id, group.id);
        assert!(permissions.find_orphans().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_grant_all_twice_keeps_count() {
        let (db, service) = seeded_service().await;
        let roles = RoleRepository::new(db.pool().clone());
        let admin = roles.find_by_name("Admin").await.unwrap();

        let before = roles.count_permission_rows(admin.id).await.unwrap();
        let report = service.grant_all_permissions("Admin").await.unwrap();
        let after = roles.count_permission_rows(admin.id).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(report.count(UpsertOutcome::Created), 0);
    }

    async fn ensure_user(db: &Database, contact_number: &str) -> i64 {
        let users = civic_database::UserRepository::new(db.pool().clone());
        match users.find_by_contact_number(contact_number).await {
            Ok(user) => user.id,
            Err(_) => {
                users
                    .create(
                        &NewUser {
                            name: "Seed Tester".to_string(),
                            contact_number: contact_number.to_string(),
                            email: None,
                        },
                        SYSTEM_ACTOR_ID,
                    )
                    .await
                    .unwrap()
                    .id
            }
        }
    }

    async fn user_role_rows(db: &Database, user_id: i64, role_id: i64) -> Vec<i16> {
        sqlx::query_as::<_, (i16,)>("SELECT status FROM tbl_user_role WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .fetch_all(db.pool())
            .await
            .unwrap()
            .into_iter()
            .map(|(status,)| status)
            .collect()
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_assigning_role_twice_leaves_one_row() {
        let (db, service) = seeded_service().await;
        let user_id = ensure_user(&db, "+919800000001").await;
        let member = RoleRepository::new(db.pool().clone())
            .find_by_name("Member")
            .await
            .unwrap();

        service.assign_roles_to_user(user_id, &[member.id]).await.unwrap();
        service.assign_roles_to_user(user_id, &[member.id]).await.unwrap();

        assert_eq!(user_role_rows(&db, user_id, member.id).await, vec![STATUS_ACTIVE]);
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_reassigning_revoked_role_reactivates_it() {
        let (db, service) = seeded_service().await;
        let roles = RoleRepository::new(db.pool().clone());
        let user_id = ensure_user(&db, "+919800000002").await;
        let volunteer = roles.find_by_name("Volunteer").await.unwrap();

        service.assign_roles_to_user(user_id, &[volunteer.id]).await.unwrap();
        roles
            .revoke_from_user(user_id, volunteer.id, SYSTEM_ACTOR_ID)
            .await
            .unwrap();
        assert_eq!(user_role_rows(&db, user_id, volunteer.id).await, vec![0]);

        let report = service.assign_roles_to_user(user_id, &[volunteer.id]).await.unwrap();
        assert_eq!(report.count(UpsertOutcome::Reactivated), 1);
        assert_eq!(report.count(UpsertOutcome::Created), 0);
        assert_eq!(user_role_rows(&db, user_id, volunteer.id).await, vec![STATUS_ACTIVE]);
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_regranting_revoked_permission_reactivates_it() {
        let (db, service) = seeded_service().await;
        let roles = RoleRepository::new(db.pool().clone());
        let admin = roles.find_by_name("Admin").await.unwrap();
        let create = PermissionRepository::new(db.pool().clone())
            .find_by_name("posts:create")
            .await
            .unwrap();

        roles
            .revoke_permission(admin.id, create.id, SYSTEM_ACTOR_ID)
            .await
            .unwrap();
        let before = roles.count_permission_rows(admin.id).await.unwrap();

        let report = service.grant_permissions(admin.id, &[create.id]).await.unwrap();
        assert_eq!(report.count(UpsertOutcome::Reactivated), 1);
        assert_eq!(roles.count_permission_rows(admin.id).await.unwrap(), before);

        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tbl_role_permission WHERE role_id = $1 AND permission_id = $2 AND status = 1",
        )
        .bind(admin.id)
        .bind(create.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(active, 1);
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_unknown_role_aborts_assignment() {
        let (db, service) = seeded_service().await;
        ensure_user(&db, "+919800000003").await;

        let err = service
            .assign_roles_by_name("+919800000003", &["No Such Role".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::TransactionAborted { .. }));
        assert!(matches!(err.root_cause(), RbacError::NotFound(_)));
        assert!(err.root_cause().to_string().contains("No Such Role"));
    }
}
