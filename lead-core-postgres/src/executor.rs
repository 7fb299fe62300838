use sqlx::{Postgres, Transaction};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// One open transaction shared by every repository of a session.
///
/// The transaction is taken out on commit or rollback; afterwards every
/// repository call fails with "Transaction has been consumed". Dropping the
/// last clone without finishing rolls back.
#[derive(Clone)]
pub struct Executor {
    pub tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl Executor {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub async fn commit(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or("Transaction has been consumed")?;
        tx.commit().await?;
        debug!("transaction committed");
        Ok(())
    }

    pub async fn rollback(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or("Transaction has been consumed")?;
        tx.rollback().await?;
        debug!("transaction rolled back");
        Ok(())
    }
}
