use async_trait::async_trait;
use lead_core_db::repository::CreateBatch;
use lead_core_db::AuditEntryModel;
use std::error::Error;

use super::repo_impl::AuditEntryRepositoryImpl;

impl AuditEntryRepositoryImpl {
    pub(super) async fn create_batch_impl(
        &self,
        items: Vec<AuditEntryModel>,
    ) -> Result<Vec<AuditEntryModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut saved_items = Vec::with_capacity(items.len());
        {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

            for item in items {
                let diff = serde_json::to_string(&item.diff)?;
                sqlx::query(
                    r#"
                    INSERT INTO buyer_audit_entry (id, buyer_id, changed_by, changed_at, diff, hash)
                    VALUES ($1, $2, $3, $4, $5::json, $6)
                    "#,
                )
                .bind(item.id)
                .bind(item.buyer_id)
                .bind(item.changed_by.as_str())
                .bind(item.changed_at)
                .bind(diff)
                .bind(item.hash)
                .execute(&mut **transaction)
                .await?;

                saved_items.push(item);
            }
        }

        Ok(saved_items)
    }
}

#[async_trait]
impl CreateBatch<AuditEntryModel> for AuditEntryRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<AuditEntryModel>,
    ) -> Result<Vec<AuditEntryModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items).await
    }
}
