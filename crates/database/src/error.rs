use civic_models::RegistryError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Other(String),
}

impl DatabaseError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} with id {} not found", entity, id))
    }

    pub fn duplicate(entity: &str, field: &str) -> Self {
        Self::DuplicateEntry(format!("{} with {} already exists", entity, field))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// Classify storage-level violations so callers can tell them apart from
// connectivity failures.
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some("23505") => {
                    return Self::DuplicateEntry(format!("{} ({})", db_err.message(), constraint))
                }
                Some("23503") | Some("23502") | Some("23514") => {
                    return Self::ConstraintViolation(format!(
                        "{} ({})",
                        db_err.message(),
                        constraint
                    ))
                }
                _ => {}
            }
        }
        Self::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(err.to_string())
    }
}

impl From<RegistryError> for DatabaseError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(key) => Self::NotFound(format!("Lookup table {}", key)),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_errors_map_to_kinds() {
        let not_found: DatabaseError = RegistryError::NotFound("nope".to_string()).into();
        assert!(not_found.is_not_found());

        let invalid: DatabaseError = RegistryError::UnsearchableField {
            table: "district".to_string(),
            field: "created_by".to_string(),
        }
        .into();
        assert!(matches!(invalid, DatabaseError::InvalidInput(_)));
    }

    #[test]
    fn test_row_not_found_is_not_a_violation() {
        let err: DatabaseError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DatabaseError::Sqlx(_)));
        assert!(!err.is_not_found());
    }
}
