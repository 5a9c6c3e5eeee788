// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{ChargeRepository, FinanceRepository, LoanRepository, TicketRepository},
    services::{ChargeService, FinanceService, LoanService, TicketService},
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let acquire_secs = match lookup("DB_ACQUIRE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_ACQUIRE_TIMEOUT_SECS inválido: {raw}"))?,
            None => DEFAULT_ACQUIRE_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: I18nStore,

    pub ticket_service: TicketService,
    pub finance_service: FinanceService,
    pub loan_service: LoanService,
    pub charge_service: ChargeService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let ticket_service = TicketService::new(Arc::new(TicketRepository::new(db_pool.clone())));
        let finance_service = FinanceService::new(Arc::new(FinanceRepository::new(db_pool.clone())));
        let loan_service = LoanService::new(Arc::new(LoanRepository::new(db_pool.clone())));
        let charge_service = ChargeService::new(Arc::new(ChargeRepository::new(db_pool.clone())));

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: I18nStore::new(),
            ticket_service,
            finance_service,
            loan_service,
            charge_service,
        })
    }
}
