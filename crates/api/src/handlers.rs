pub mod error;
pub mod health;
pub mod jobs;
pub mod lookup;
pub mod permissions;
pub mod posts;
pub mod roles;
pub mod users;

// Re-export common types
pub use error::{ApiError, ErrorResponse};
