use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Status value of an enabled row.
pub const STATUS_ACTIVE: i16 = 1;

/// Status value of a soft-disabled row. Rows are never removed.
pub const STATUS_INACTIVE: i16 = 0;

/// Actor id stamped into `created_by` / `updated_by` for script-originated writes.
pub const SYSTEM_ACTOR_ID: i64 = 999_999;

/// Body of every `PUT .../status` request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStatus {
    #[validate(range(min = 0, max = 1))]
    pub status: i16,
}

/// Which rows a list request wants to see on status-bearing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
    All,
}

impl StatusFilter {
    /// Status value to filter on, `None` meaning no filter.
    pub fn as_status(&self) -> Option<i16> {
        match self {
            StatusFilter::Active => Some(STATUS_ACTIVE),
            StatusFilter::Inactive => Some(STATUS_INACTIVE),
            StatusFilter::All => None,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "active" => Ok(StatusFilter::Active),
            "0" | "inactive" => Ok(StatusFilter::Inactive),
            "all" | "*" => Ok(StatusFilter::All),
            other => Err(format!("Invalid status filter: {}", other)),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::Active => write!(f, "1"),
            StatusFilter::Inactive => write!(f, "0"),
            StatusFilter::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("1".parse::<StatusFilter>(), Ok(StatusFilter::Active));
        assert_eq!("0".parse::<StatusFilter>(), Ok(StatusFilter::Inactive));
        assert_eq!("ALL".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert!("2".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_default_filter_is_active_only() {
        assert_eq!(StatusFilter::default().as_status(), Some(STATUS_ACTIVE));
        assert_eq!(StatusFilter::All.as_status(), None);
    }

    #[test]
    fn test_update_status_range() {
        assert!(UpdateStatus { status: 1 }.validate().is_ok());
        assert!(UpdateStatus { status: 2 }.validate().is_err());
        assert!(UpdateStatus { status: -1 }.validate().is_err());
    }
}
