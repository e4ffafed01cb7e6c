//! Database initialization
//!
//! Opens (or creates) the catalog database and brings the schema up to date.
//! Schema creation is idempotent; every statement is CREATE ... IF NOT EXISTS.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
///
/// Also used directly by tests against `sqlite::memory:` pools.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_companies_table(pool).await?;
    create_communities_table(pool).await?;
    create_plans_table(pool).await?;
    create_price_history_table(pool).await?;
    Ok(())
}

async fn create_companies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            website TEXT,
            headquarters TEXT,
            founded TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_communities_table(pool: &SqlitePool) -> Result<()> {
    // company_refs is a JSON array of strings. An element that parses as a
    // UUID is a stable company identifier; anything else is a legacy
    // free-text company name awaiting migration.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS communities (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            location TEXT,
            company_refs TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_communities_name ON communities(name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_plans_table(pool: &SqlitePool) -> Result<()> {
    // company and community are free-text names, not identifiers; the
    // (plan_name, company, community, plan_type) tuple is the upsert key.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            guid TEXT PRIMARY KEY,
            plan_name TEXT NOT NULL,
            price REAL NOT NULL,
            sqft INTEGER,
            stories TEXT,
            price_per_sqft REAL,
            last_updated TEXT NOT NULL,
            company TEXT NOT NULL,
            community TEXT NOT NULL,
            plan_type TEXT NOT NULL DEFAULT 'plan' CHECK (plan_type IN ('plan', 'now')),
            beds TEXT,
            baths TEXT,
            address TEXT,
            design_number TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (plan_name, company, community, plan_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_plans_company ON plans(company)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_plans_community ON plans(community)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_price_history_table(pool: &SqlitePool) -> Result<()> {
    // Append-only; rows are never updated or deleted by normal operation.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS price_history (
            guid TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES plans(guid),
            old_price REAL NOT NULL,
            new_price REAL NOT NULL,
            changed_at TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_price_history_plan ON price_history(plan_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_price_history_changed_at ON price_history(changed_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
