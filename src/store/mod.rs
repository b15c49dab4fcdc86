//! Durable, transactional persistence of users, instruments, orders,
//! trades, and balances (spec §4.1, C1).
//!
//! There is no `Store` trait object: `matching::engine` opens one
//! `sqlx::Transaction<'_, Postgres>` per `submit`/`cancel` call, and every
//! helper in [`queries`] is generic over `sqlx::PgExecutor<'_>` so the same
//! query code serves both transactional writes and plain pool reads.

pub mod error;
pub mod queries;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    const MIGRATIONS: &[&str] = &[include_str!("../../migrations/0001_init.sql")];
    for migration in MIGRATIONS {
        sqlx::raw_sql(migration).execute(pool).await?;
    }
    Ok(())
}
