// Civic Admin API Server
// REST surface over the RBAC model, lookup tables and community content

mod config;
mod handlers;
mod routes;

use anyhow::Context;
use civic_database::Database;
use civic_rbac::RbacService;
use config::Config;
use dotenvy::dotenv;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub struct AppState {
    pub db: Database,
    pub rbac: RbacService,
    pub actor_id: i64,
}

impl AppState {
    pub fn new(db: Database, actor_id: i64) -> Self {
        let rbac = RbacService::new(db.pool().clone(), actor_id);
        Self { db, rbac, actor_id }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,civic_api=debug,tower_http=debug".to_string()),
        )
        .init();

    tracing::info!("🚀 Starting Civic Admin API Server");
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    tracing::info!("🔌 Server: {}:{}", config.server_host, config.server_port);
    tracing::info!("👤 Acting as user {}", config.actor_id);

    tracing::info!("🗄️  Connecting to database...");
    let database = Database::new(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    database.ping().await.context("Database ping failed")?;
    tracing::info!("✅ Database connected");

    let state = Arc::new(AppState::new(database, config.actor_id));

    let app = routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!("📡 Routes configured:");
    tracing::info!("   GET  /health");
    tracing::info!("   GET  /api/meta/:key  (+ POST, GET/PUT /:id)");
    tracing::info!("   GET  /api/roles, /api/permission-groups, /api/users/:id/roles");
    tracing::info!("   GET  /api/posts, /api/jobs");

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("✅ Server ready at http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
