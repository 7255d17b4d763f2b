use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static! {
    /// Optional leading `+`, then 10 to 15 digits.
    pub static ref CONTACT_NUMBER_REGEX: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub contact_number: String,
    pub email: Option<String>,

    // NULL = pending, 0 = disabled, 1 = enabled
    pub status: Option<i16>,

    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_enabled(&self) -> bool {
        self.status == Some(crate::STATUS_ACTIVE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(regex(path = *CONTACT_NUMBER_REGEX))]
    pub contact_number: String,

    #[validate(email)]
    pub email: Option<String>,
}

/// One-time-code bookkeeping row, keyed by contact number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserOtp {
    pub id: i64,
    pub contact_number: String,
    pub otp_hash: String,
    pub expires_at: DateTime<Utc>,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_number_validation() {
        let user = NewUser {
            name: "Asha".to_string(),
            contact_number: "+919876543210".to_string(),
            email: None,
        };
        assert!(user.validate().is_ok());

        let bad = NewUser {
            contact_number: "98-76".to_string(),
            ..user
        };
        assert!(bad.validate().is_err());
    }
}
