// Civic Admin maintenance scripts
// Migrations, RBAC seeding and one-off account fixes against the configured database

use anyhow::Context;
use civic_database::{Database, DatabaseConfig, UserRepository};
use civic_models::{STATUS_ACTIVE, STATUS_INACTIVE, SYSTEM_ACTOR_ID};
use civic_rbac::{RbacService, SeedReport, DEFAULT_CATALOG};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Civic Admin maintenance CLI
#[derive(Debug, Parser)]
#[command(name = "civic-admin", about = "Schema migrations and RBAC seeding")]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Actor id written to created_by / updated_by
    #[arg(long, env = "SYSTEM_ACTOR_ID", default_value_t = SYSTEM_ACTOR_ID)]
    actor_id: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations
    Migrate,
    /// Revert migrations newer than the target version
    MigrateUndo {
        #[arg(long)]
        target: i64,
    },
    /// Seed roles, permissions, sidebars and the default grants
    Seed,
    SeedRoles,
    SeedPermissions,
    SeedSidebars,
    /// Grant every active permission to a role
    GrantAll {
        #[arg(long)]
        role: String,
    },
    /// Grant the catalog's sidebars for a role
    GrantSidebars {
        #[arg(long)]
        role: String,
    },
    /// Assign roles to the user with this contact number
    AssignRole {
        #[arg(long)]
        contact: String,
        #[arg(long = "role", required = true, num_args = 1..)]
        roles: Vec<String>,
    },
    /// Enable (1) or disable (0) a user
    SetUserStatus {
        #[arg(long)]
        contact: String,
        #[arg(long, value_parser = clap::value_parser!(i16).range(0..=1))]
        status: i16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,civic_rbac=info,sqlx=warn".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = DatabaseConfig::from_env();
    if let Some(url) = cli.database_url {
        config.url = url;
    }
    config.min_connections = 0;
    config.max_connections = 2;

    let db = Database::new(config)
        .await
        .context("Failed to connect to database")?;
    let rbac = RbacService::new(db.pool().clone(), cli.actor_id);

    let result = execute(&db, &rbac, cli.command).await;
    db.close().await;
    result
}

async fn execute(db: &Database, rbac: &RbacService, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Migrate => {
            db.migrate().await.context("Migration failed")?;
            println!("migrations: up to date");
        }
        Command::MigrateUndo { target } => {
            db.undo_migrations(target)
                .await
                .with_context(|| format!("Reverting to version {} failed", target))?;
            println!("migrations: reverted to version {}", target);
        }
        Command::Seed => {
            for report in rbac.seed_all(&DEFAULT_CATALOG).await? {
                print_report(&report);
            }
        }
        Command::SeedRoles => print_report(&rbac.seed_roles(&DEFAULT_CATALOG).await?),
        Command::SeedPermissions => {
            print_report(&rbac.seed_permission_catalog(&DEFAULT_CATALOG).await?)
        }
        Command::SeedSidebars => print_report(&rbac.seed_sidebars(&DEFAULT_CATALOG).await?),
        Command::GrantAll { role } => print_report(&rbac.grant_all_permissions(&role).await?),
        Command::GrantSidebars { role } => {
            let grant = DEFAULT_CATALOG
                .role_sidebars
                .iter()
                .find(|g| g.role == role)
                .with_context(|| format!("No sidebar set is configured for role {}", role))?;
            print_report(&rbac.grant_sidebars(&role, grant.sidebars).await?);
        }
        Command::AssignRole { contact, roles } => {
            print_report(&rbac.assign_roles_by_name(&contact, &roles).await?)
        }
        Command::SetUserStatus { contact, status } => {
            let users = UserRepository::new(db.pool().clone());
            let user = users.find_by_contact_number(&contact).await?;
            let user = users.set_status(user.id, status, rbac.actor_id()).await?;
            println!(
                "tbl_user {} (id {}): {}",
                contact,
                user.id,
                status_label(status)
            );
        }
    }

    Ok(())
}

fn print_report(report: &SeedReport) {
    if let Some(reason) = &report.skipped {
        println!("{}: skipped ({})", report.batch, reason);
        return;
    }
    for record in &report.records {
        println!("{}", record);
    }
    tracing::info!("{}: {} records", report.batch, report.records.len());
}

fn status_label(status: i16) -> &'static str {
    match status {
        STATUS_ACTIVE => "enabled",
        STATUS_INACTIVE => "disabled",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_assign_role_accepts_several_roles() {
        let cli = Cli::try_parse_from([
            "civic-admin",
            "assign-role",
            "--contact",
            "+919876543210",
            "--role",
            "Volunteer",
            "Member",
        ])
        .unwrap();

        match cli.command {
            Command::AssignRole { contact, roles } => {
                assert_eq!(contact, "+919876543210");
                assert_eq!(roles, vec!["Volunteer", "Member"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_user_status_must_be_binary() {
        assert!(Cli::try_parse_from(["civic-admin", "set-user-status", "--contact", "1", "--status", "2"]).is_err());
        assert!(Cli::try_parse_from(["civic-admin", "set-user-status", "--contact", "1", "--status", "0"]).is_ok());
    }

    #[test]
    fn test_migrate_undo_needs_target() {
        assert!(Cli::try_parse_from(["civic-admin", "migrate-undo"]).is_err());
        let cli = Cli::try_parse_from(["civic-admin", "migrate-undo", "--target", "3"]).unwrap();
        assert!(matches!(cli.command, Command::MigrateUndo { target: 3 }));
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(1), "enabled");
        assert_eq!(status_label(0), "disabled");
    }
}
