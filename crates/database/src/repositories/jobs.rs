use crate::error::{DatabaseError, Result};
use civic_models::{Job, NewJob};
use sqlx::PgPool;

pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a job application, filed for the submitter or on someone's behalf
    pub async fn create(&self, new_job: &NewJob, actor_id: i64) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO tbl_job (
                user_id, job_category_id, submitted_for, applicant_name,
                applicant_contact_number, qualification, description, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(new_job.user_id)
        .bind(new_job.job_category_id)
        .bind(new_job.submitted_for)
        .bind(&new_job.applicant_name)
        .bind(&new_job.applicant_contact_number)
        .bind(&new_job.qualification)
        .bind(&new_job.description)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM tbl_job WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Job", &id.to_string()))?;

        Ok(job)
    }

    pub async fn list(
        &self,
        user_id: Option<i64>,
        status: Option<i16>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM tbl_job
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::SMALLINT IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    pub async fn set_status(&self, id: i64, status: i16, actor_id: i64) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(
            "UPDATE tbl_job SET status = $1, updated_by = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(actor_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Job", &id.to_string()))?;

        Ok(job)
    }
}
