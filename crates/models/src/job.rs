use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::user::CONTACT_NUMBER_REGEX;

/// Whether the application was filed by the applicant or on someone's behalf.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "submitted_for", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmittedFor {
    #[sqlx(rename = "self")]
    #[serde(rename = "self")]
    Myself,
    Others,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub user_id: i64,
    pub job_category_id: Option<i64>,
    pub submitted_for: SubmittedFor,
    pub applicant_name: String,
    pub applicant_contact_number: String,
    pub qualification: Option<String>,
    pub description: Option<String>,
    pub status: i16,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewJob {
    pub user_id: i64,

    pub job_category_id: Option<i64>,

    pub submitted_for: SubmittedFor,

    #[validate(length(min = 1, max = 255))]
    pub applicant_name: String,

    #[validate(regex(path = *CONTACT_NUMBER_REGEX))]
    pub applicant_contact_number: String,

    pub qualification: Option<String>,

    pub description: Option<String>,
}
