use std::sync::Arc;

use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod ledger;
mod matching;
mod models;
mod query;
mod store;

use crate::config::AppConfig;
use crate::ledger::BalanceLedger;
use crate::matching::MatchingEngine;
use crate::query::QuerySurface;

pub struct AppState {
    pub config: AppConfig,
    pub pool: PgPool,
    pub matching_engine: Arc<MatchingEngine>,
    pub query_surface: Arc<QuerySurface>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spot_exchange_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    tracing::info!(bind_addr = %config.bind_addr, "starting spot exchange matching core");

    let pool = store::create_pool(&config.database_url, config.max_connections()).await?;
    store::run_migrations(&pool).await?;

    let ledger = BalanceLedger::new(config.ledger_config());
    let matching_engine = Arc::new(MatchingEngine::new(pool.clone(), ledger));
    let query_surface = Arc::new(QuerySurface::new(pool.clone()));

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        config,
        pool,
        matching_engine,
        query_surface,
    });

    let router = api::routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind_addr = %bind_addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
