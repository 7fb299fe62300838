use async_trait::async_trait;
use chrono::Utc;
use lead_core_db::repository::{ConcurrentUpdateError, UpdateBatch};
use lead_core_db::utils::next_revision;
use lead_core_db::BuyerModel;
use std::error::Error;

use super::repo_impl::BuyerRepositoryImpl;
use crate::utils::TryFromRow;

impl BuyerRepositoryImpl {
    /// Writes each item only if the stored `updated_at` still equals the
    /// item's. `owner_id` and `created_at` are never rewritten.
    pub(super) async fn update_batch_impl(
        &self,
        items: Vec<BuyerModel>,
    ) -> Result<Vec<BuyerModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut updated_items = Vec::with_capacity(items.len());
        {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

            for item in items {
                let previous = item.updated_at;
                let revision = next_revision(previous, Utc::now());
                let details = &item.details;

                let row = sqlx::query(
                    r#"
                    UPDATE buyer SET
                    full_name = $2, email = $3, phone = $4, city = $5, property_type = $6,
                    bhk = $7, purpose = $8, budget_min = $9, budget_max = $10,
                    timeline = $11, source = $12, notes = $13, tags = $14, status = $15,
                    updated_at = $16
                    WHERE id = $1 AND updated_at = $17
                    RETURNING *
                    "#,
                )
                .bind(item.id)
                .bind(details.full_name.as_str())
                .bind(details.email.as_deref())
                .bind(details.phone.as_str())
                .bind(details.city)
                .bind(details.property_type)
                .bind(details.bhk)
                .bind(details.purpose)
                .bind(details.budget_min)
                .bind(details.budget_max)
                .bind(details.timeline)
                .bind(details.source)
                .bind(details.notes.as_deref())
                .bind(&details.tags)
                .bind(details.status)
                .bind(revision)
                .bind(previous)
                .fetch_optional(&mut **transaction)
                .await?;

                match row {
                    Some(row) => updated_items.push(BuyerModel::try_from_row(&row)?),
                    None => return Err(ConcurrentUpdateError { entity_id: item.id }.into()),
                }
            }
        }

        Ok(updated_items)
    }
}

#[async_trait]
impl UpdateBatch<BuyerModel> for BuyerRepositoryImpl {
    async fn update_batch(
        &self,
        items: Vec<BuyerModel>,
    ) -> Result<Vec<BuyerModel>, Box<dyn Error + Send + Sync>> {
        Self::update_batch_impl(self, items).await
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::buyer_repository::test_utils::create_test_buyer;
    use crate::test_helper::setup_test_context;
    use lead_core_db::repository::{as_concurrent_update, CreateBatch, UnitOfWorkSession, UpdateBatch};
    use lead_core_db::BuyerStatus;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_update_batch() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let buyer_repo = ctx.session().buyers();

        let saved = buyer_repo
            .create_batch(vec![create_test_buyer("Asha Verma")])
            .await?;

        let mut changed = saved[0].clone();
        changed.details.status = BuyerStatus::Contacted;
        changed.owner_id = "someone-else".to_string();
        let updated = buyer_repo.update_batch(vec![changed]).await?;

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].details.status, BuyerStatus::Contacted);
        assert_eq!(updated[0].owner_id, saved[0].owner_id);
        assert_eq!(updated[0].created_at, saved[0].created_at);
        assert!(updated[0].updated_at > saved[0].updated_at);

        Ok(())
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_stale_update_is_rejected() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let buyer_repo = ctx.session().buyers();

        let saved = buyer_repo
            .create_batch(vec![create_test_buyer("Asha Verma")])
            .await?;
        buyer_repo.update_batch(saved.clone()).await?;

        let err = buyer_repo.update_batch(saved.clone()).await.unwrap_err();
        let conflict = as_concurrent_update(err.as_ref()).expect("typed conflict");
        assert_eq!(conflict.entity_id, saved[0].id);

        Ok(())
    }
}
