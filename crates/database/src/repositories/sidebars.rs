use crate::error::Result;
use civic_models::Sidebar;
use sqlx::PgPool;

pub struct SidebarRepository {
    pool: PgPool,
}

impl SidebarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Sidebar>> {
        let sidebars = sqlx::query_as::<_, Sidebar>(
            "SELECT * FROM tbl_sidebar WHERE status = 1 ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sidebars)
    }

    /// Sidebars attached to a role
    pub async fn get_role_sidebars(&self, role_id: i64) -> Result<Vec<Sidebar>> {
        let sidebars = sqlx::query_as::<_, Sidebar>(
            r#"
            SELECT s.* FROM tbl_sidebar s
            JOIN tbl_role_sidebar rs ON s.id = rs.sidebar_id
            WHERE rs.role_id = $1 AND rs.status = 1 AND s.status = 1
            ORDER BY s.sort_order, s.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sidebars)
    }

    /// Menu for a user: union of the sidebars of all their active roles
    pub async fn get_user_sidebars(&self, user_id: i64) -> Result<Vec<Sidebar>> {
        let sidebars = sqlx::query_as::<_, Sidebar>(
            r#"
            SELECT DISTINCT s.* FROM tbl_sidebar s
            JOIN tbl_role_sidebar rs ON s.id = rs.sidebar_id AND rs.status = 1
            JOIN tbl_user_role ur ON rs.role_id = ur.role_id AND ur.status = 1
            JOIN tbl_role r ON r.id = ur.role_id AND r.status = 1
            WHERE ur.user_id = $1 AND s.status = 1
            ORDER BY s.sort_order, s.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sidebars)
    }
}
