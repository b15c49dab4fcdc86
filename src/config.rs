//! Configuration (spec §10, C6): layered the way the `config` crate
//! composes over `dotenvy::dotenv()`.

use serde::Deserialize;

use crate::ledger::LedgerConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    #[serde(default)]
    pub max_db_connections: Option<u32>,
    #[serde(default)]
    pub ledger_max_retries: Option<u32>,
    #[serde(default)]
    pub ledger_base_delay_ms: Option<u64>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("max_db_connections", 10)?
            .set_default("ledger_max_retries", 3)?
            .set_default("ledger_base_delay_ms", 10)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let cfg: AppConfig = settings.try_deserialize()?;
        if cfg.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL must be set");
        }
        Ok(cfg)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_db_connections.unwrap_or(10)
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            max_retries: self.ledger_max_retries.unwrap_or(3),
            base_delay_ms: self.ledger_base_delay_ms.unwrap_or(10),
        }
    }
}
