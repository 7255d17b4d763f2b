use civic_database::DatabaseConfig;
use civic_models::SYSTEM_ACTOR_ID;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    /// Written to `created_by` / `updated_by` for writes made through the API
    pub actor_id: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database: DatabaseConfig::from_env(),
            actor_id: std::env::var("SYSTEM_ACTOR_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(SYSTEM_ACTOR_ID),
        }
    }
}
