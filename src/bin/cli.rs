use sqlx::Row;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use chrono::Utc;
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use site_cms::provision::provision_admin;
use site_cms::store::{SqliteIdentityStore, SqliteProfileStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "site-cms admin and migration tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create (or promote) an admin account. Safe to re-run.
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Display name stored on the profile
        #[arg(long)]
        name: Option<String>,
    },
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; when running in Docker the binary CWD may differ,
    // so fall back to the crate-local `.env` using CARGO_MANIFEST_DIR.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateAdmin { email, password, name } => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await.context("failed to run migrations")?;

            let identities = SqliteIdentityStore::new(pool.clone());
            let profiles = SqliteProfileStore::new(pool);
            let outcome = provision_admin(&identities, &profiles, &email, &password, name.as_deref())
                .await
                .context("failed to provision admin")?;

            if outcome.created_identity {
                println!("Created admin {} ({})", outcome.user.email, outcome.user.id);
            } else {
                println!("Existing user {} ({}) set to admin", outcome.user.email, outcome.user.id);
            }
        }
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            let applied = applied_versions_desc(&pool).await?;
            let Some(target) = rollback_target(&applied) else {
                anyhow::bail!("no applied migrations to roll back");
            };
            // undo() reverts every applied version above `target`
            migrator
                .undo(&pool, target)
                .await
                .context("failed to roll back migration")?;
            println!("Rolled back migration {}", applied[0]);
        }
    }

    Ok(())
}

/// Writes a reversible pair, matching the existing migrations.
fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let sanitized = sanitize_name(name);
    let up = Path::new("migrations").join(format!("{}_{}.up.sql", timestamp, sanitized));
    let down = Path::new("migrations").join(format!("{}_{}.down.sql", timestamp, sanitized));

    if up.exists() || down.exists() {
        anyhow::bail!("migration already exists: {}", up.display());
    }

    fs::write(&up, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", up.display()))?;
    fs::write(&down, "-- Revert the matching .up.sql here\n")
        .with_context(|| format!("failed to create migration at {}", down.display()))?;

    Ok(up)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let options = SqliteConnectOptions::from_str(&database_url)
        .context("invalid DATABASE_URL")?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let db_applied = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if db_applied.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter().filter(|m| m.migration_type.is_up_migration()) {
        let version = migration.version;
        let status = if applied_versions.contains(&version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if !desc.is_empty() { desc } else { "unknown" };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

async fn applied_versions_desc(pool: &SqlitePool) -> anyhow::Result<Vec<i64>> {
    let table = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    if table.is_none() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect())
}

/// Version to hand to `Migrator::undo` so only the newest applied migration
/// is reverted. `None` when nothing is applied.
fn rollback_target(applied_desc: &[i64]) -> Option<i64> {
    match applied_desc {
        [] => None,
        [_] => Some(0),
        [_, previous, ..] => Some(*previous),
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Try local ./migrations first (when running from repo root). If that
    // doesn't exist (common in containers where CWD differs), fall back to
    // the crate-local migrations folder determined by CARGO_MANIFEST_DIR.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
