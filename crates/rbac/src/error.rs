use thiserror::Error;

pub type Result<T> = std::result::Result<T, RbacError>;

#[derive(Debug, Error)]
pub enum RbacError {
    #[error("Database error: {0}")]
    Database(#[from] civic_database::DatabaseError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A row a dependent insert relies on could not be resolved
    #[error("Validation conflict: {0}")]
    ValidationConflict(String),

    #[error("Invalid seed catalog: {0}")]
    InvalidCatalog(String),

    /// The batch was rolled back; `source` is the error that caused it
    #[error("Batch '{batch}' rolled back: {source}")]
    TransactionAborted {
        batch: String,
        source: Box<RbacError>,
    },
}

impl RbacError {
    pub fn aborted(batch: &str, source: RbacError) -> Self {
        Self::TransactionAborted {
            batch: batch.to_string(),
            source: Box::new(source),
        }
    }

    /// The error that caused a rollback, or `self` for any other error
    pub fn root_cause(&self) -> &RbacError {
        match self {
            Self::TransactionAborted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<sqlx::Error> for RbacError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_aborted_preserves_original_error() {
        let err = RbacError::aborted(
            "permissions",
            RbacError::ValidationConflict("group posts:* missing".to_string()),
        );

        assert!(err.to_string().contains("permissions"));
        assert!(err.source().is_some());
        assert!(matches!(err.root_cause(), RbacError::ValidationConflict(_)));
    }
}
