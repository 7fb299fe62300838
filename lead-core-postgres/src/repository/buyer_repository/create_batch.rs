use async_trait::async_trait;
use lead_core_db::repository::CreateBatch;
use lead_core_db::BuyerModel;
use std::error::Error;

use super::repo_impl::BuyerRepositoryImpl;

impl BuyerRepositoryImpl {
    pub(super) async fn create_batch_impl(
        &self,
        items: Vec<BuyerModel>,
    ) -> Result<Vec<BuyerModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut saved_items = Vec::with_capacity(items.len());
        {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

            for item in items {
                let details = &item.details;
                sqlx::query(
                    r#"
                    INSERT INTO buyer
                    (id, owner_id, full_name, email, phone, city, property_type, bhk, purpose,
                     budget_min, budget_max, timeline, source, notes, tags, status, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
                    "#,
                )
                .bind(item.id)
                .bind(item.owner_id.as_str())
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
                .bind(item.created_at)
                .bind(item.updated_at)
                .execute(&mut **transaction)
                .await?;

                saved_items.push(item);
            }
        }

        Ok(saved_items)
    }
}

#[async_trait]
impl CreateBatch<BuyerModel> for BuyerRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<BuyerModel>,
    ) -> Result<Vec<BuyerModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items).await
    }
}
