//! Connection pool and schema setup.

use std::time::Duration;

use log::{debug, info};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// SQLSTATE codes that mean a statement was already applied: duplicate column
/// and duplicate object.
const ALREADY_APPLIED: [&str; 2] = ["42701", "42710"];

/// Schema statements, applied in order on every start.
///
/// Fresh databases get the full tables from the `CREATE TABLE` statements; the
/// `ADD COLUMN` statements upgrade tables created before those columns existed.
const SCHEMA: &[&str] = &[
    "CREATE TYPE user_role AS ENUM ('admin', 'user')",
    "CREATE TYPE task_status AS ENUM ('created', 'in_progress', 'completed')",
    "CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high')",
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username VARCHAR(150) NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role user_role NOT NULL DEFAULT 'user',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title VARCHAR(200) NOT NULL,
        description VARCHAR(1000),
        status task_status NOT NULL DEFAULT 'created',
        priority task_priority NOT NULL DEFAULT 'medium',
        deadline TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "ALTER TABLE tasks ADD COLUMN priority task_priority NOT NULL DEFAULT 'medium'",
    "ALTER TABLE tasks ADD COLUMN deadline TIMESTAMPTZ",
    "ALTER TABLE tasks ADD COLUMN owner_id UUID REFERENCES users(id) ON DELETE CASCADE",
    "CREATE INDEX IF NOT EXISTS idx_tasks_owner_id ON tasks (owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status)",
];

/// Opens the Postgres pool described by `config`.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;
    info!(
        "Connected to database (max {} connections)",
        config.database_max_connections
    );
    Ok(pool)
}

fn already_applied(code: Option<&str>) -> bool {
    code.is_some_and(|code| ALREADY_APPLIED.contains(&code))
}

/// Applies [`SCHEMA`]. Safe to run repeatedly.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    for &statement in SCHEMA {
        match sqlx::query(statement).execute(pool).await {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if already_applied(db_err.code().as_deref()) => {
                debug!("Schema statement already applied: {}", db_err.message());
            }
            Err(e) => return Err(e),
        }
    }
    info!("Database schema is up to date");
    Ok(())
}
