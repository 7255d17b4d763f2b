use axum::{http::StatusCode, Json};
use civic_database::DatabaseError;
use civic_models::RegistryError;
use civic_rbac::RbacError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, error: &str, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(error, message)))
}

pub fn not_found(message: &str) -> ApiError {
    reject(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn bad_request(message: &str) -> ApiError {
    reject(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn validation_error(errors: validator::ValidationErrors) -> ApiError {
    bad_request(&errors.to_string())
}

pub fn registry_error(err: RegistryError) -> ApiError {
    if err.is_not_found() {
        not_found(&err.to_string())
    } else {
        bad_request(&err.to_string())
    }
}

/// Map a storage error, logging anything that is not the caller's fault.
pub fn database_error(context: &str, err: DatabaseError) -> ApiError {
    match &err {
        DatabaseError::NotFound(_) => not_found(&err.to_string()),
        DatabaseError::InvalidInput(_) => bad_request(&err.to_string()),
        DatabaseError::DuplicateEntry(_) | DatabaseError::ConstraintViolation(_) => {
            tracing::warn!("{}: {}", context, err);
            reject(StatusCode::CONFLICT, "constraint_violation", &err.to_string())
        }
        _ => {
            tracing::error!("{}: {}", context, err);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", context)
        }
    }
}

/// Batch errors are classified by what caused the rollback.
pub fn rbac_error(context: &str, err: RbacError) -> ApiError {
    let message = err.to_string();
    match err.root_cause() {
        RbacError::NotFound(_) => not_found(&message),
        RbacError::ValidationConflict(_) | RbacError::InvalidCatalog(_) => bad_request(&message),
        RbacError::Database(DatabaseError::NotFound(_)) => not_found(&message),
        RbacError::Database(DatabaseError::InvalidInput(_)) => bad_request(&message),
        RbacError::Database(DatabaseError::DuplicateEntry(_))
        | RbacError::Database(DatabaseError::ConstraintViolation(_)) => {
            tracing::warn!("{}: {}", context, message);
            reject(StatusCode::CONFLICT, "constraint_violation", &message)
        }
        _ => {
            tracing::error!("{}: {}", context, message);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_map_to_status_codes() {
        let cases = [
            (DatabaseError::not_found("Role", "9"), StatusCode::NOT_FOUND),
            (DatabaseError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (DatabaseError::duplicate("Role", "name Admin"), StatusCode::CONFLICT),
            (DatabaseError::ConstraintViolation("fk".into()), StatusCode::CONFLICT),
            (DatabaseError::Other("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(database_error("test", err).0, expected);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let (_, Json(body)) = database_error("Failed to list roles", DatabaseError::Other("secret".into()));
        assert_eq!(body.error, "internal_error");
        assert_eq!(body.message, "Failed to list roles");
    }

    #[test]
    fn test_aborted_batch_maps_by_root_cause() {
        let err = RbacError::aborted("assign user 4", RbacError::NotFound("Role 12 not found".into()));
        let (status, Json(body)) = rbac_error("Failed to assign roles", err);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.message.contains("Role 12 not found"));
    }

    #[test]
    fn test_registry_errors() {
        assert_eq!(registry_error(RegistryError::NotFound("nope".into())).0, StatusCode::NOT_FOUND);
        assert_eq!(registry_error(RegistryError::EmptyPayload).0, StatusCode::BAD_REQUEST);
    }
}
