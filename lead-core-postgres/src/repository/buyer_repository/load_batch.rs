use async_trait::async_trait;
use lead_core_db::repository::LoadBatch;
use lead_core_db::BuyerModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::BuyerRepositoryImpl;
use crate::utils::TryFromRow;

impl BuyerRepositoryImpl {
    pub(super) async fn load_batch_impl(
        repo: &BuyerRepositoryImpl,
        ids: &[Uuid],
    ) -> Result<Vec<Option<BuyerModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = r#"SELECT * FROM buyer WHERE id = ANY($1)"#;
        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query(query).bind(ids).fetch_all(&mut **transaction).await?
        };

        let mut item_map = std::collections::HashMap::new();
        for row in rows {
            let item = BuyerModel::try_from_row(&row)?;
            item_map.insert(item.id, item);
        }

        Ok(ids.iter().map(|id| item_map.remove(id)).collect())
    }
}

#[async_trait]
impl LoadBatch<BuyerModel> for BuyerRepositoryImpl {
    async fn load_batch(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Option<BuyerModel>>, Box<dyn Error + Send + Sync>> {
        Self::load_batch_impl(self, ids).await
    }
}
