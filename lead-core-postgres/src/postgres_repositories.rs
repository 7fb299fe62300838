use async_trait::async_trait;
use lead_core_db::repository::{UnitOfWork, UnitOfWorkSession};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use crate::executor::Executor;
use crate::repository::audit_entry_repository::AuditEntryRepositoryImpl;
use crate::repository::buyer_repository::BuyerRepositoryImpl;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    /// Reads `DATABASE_URL` (required) and `DATABASE_MAX_CONNECTIONS`
    pub fn from_env() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL is not set")?;
        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| format!("DATABASE_MAX_CONNECTIONS is not a number: {raw}"))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        Ok(Self {
            database_url,
            max_connections,
        })
    }

    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&self.database_url)
            .await
    }
}

pub struct PostgresUnitOfWork {
    pool: Arc<PgPool>,
}

impl PostgresUnitOfWork {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Repositories sharing a single transaction
pub struct PostgresSession {
    executor: Executor,
    buyers: BuyerRepositoryImpl,
    audits: AuditEntryRepositoryImpl,
}

impl PostgresSession {
    pub fn new(executor: Executor) -> Self {
        Self {
            buyers: BuyerRepositoryImpl::new(executor.clone()),
            audits: AuditEntryRepositoryImpl::new(executor.clone()),
            executor,
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Session = PostgresSession;

    async fn begin(&self) -> Result<Self::Session, Box<dyn Error + Send + Sync>> {
        let tx = self.pool.begin().await?;
        Ok(PostgresSession::new(Executor::new(tx)))
    }
}

#[async_trait]
impl UnitOfWorkSession for PostgresSession {
    type Buyers = BuyerRepositoryImpl;
    type Audits = AuditEntryRepositoryImpl;

    fn buyers(&self) -> &Self::Buyers {
        &self.buyers
    }

    fn audits(&self) -> &Self::Audits {
        &self.audits
    }

    async fn commit(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.executor.commit().await
    }

    async fn rollback(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.executor.rollback().await
    }
}
