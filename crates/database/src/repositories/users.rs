use crate::error::{DatabaseError, Result};
use civic_models::{NewUser, User};
use sqlx::PgPool;

/// Users are never hard-deleted; disabling flips `status`.
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the pending (NULL) state
    pub async fn create(&self, new_user: &NewUser, actor_id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO tbl_user (name, contact_number, email, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.contact_number)
        .bind(&new_user.email)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::DuplicateEntry(_) => {
                DatabaseError::duplicate("User", &format!("contact number {}", new_user.contact_number))
            }
            other => other,
        })?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM tbl_user WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", &id.to_string()))?;

        Ok(user)
    }

    /// Find user by contact number
    pub async fn find_by_contact_number(&self, contact_number: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM tbl_user WHERE contact_number = $1")
            .bind(contact_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User with contact number {} not found", contact_number)))?;

        Ok(user)
    }

    /// List users (paginated), optionally restricted to one status
    pub async fn list(&self, status: Option<i16>, limit: i64, offset: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM tbl_user
            WHERE ($1::SMALLINT IS NULL OR status = $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Enable or disable a user
    pub async fn set_status(&self, id: i64, status: i16, actor_id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE tbl_user SET status = $1, updated_by = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(actor_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", &id.to_string()))?;

        Ok(user)
    }
}
