use async_trait::async_trait;
use lead_core_db::repository::LockById;
use lead_core_db::BuyerModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::BuyerRepositoryImpl;
use crate::utils::TryFromRow;

#[async_trait]
impl LockById<BuyerModel> for BuyerRepositoryImpl {
    async fn lock_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<BuyerModel>, Box<dyn Error + Send + Sync>> {
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query(r#"SELECT * FROM buyer WHERE id = $1 FOR UPDATE"#)
                .bind(id)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(BuyerModel::try_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::buyer_repository::test_utils::create_test_buyer;
    use crate::test_helper::setup_test_context;
    use lead_core_db::repository::{CreateBatch, LockById, UnitOfWorkSession};
    use serial_test::serial;
    use uuid::Uuid;

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_lock_by_id() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let buyer_repo = ctx.session().buyers();

        let buyer = create_test_buyer("Asha Verma");
        buyer_repo.create_batch(vec![buyer.clone()]).await?;

        assert_eq!(buyer_repo.lock_by_id(buyer.id).await?, Some(buyer));
        assert_eq!(buyer_repo.lock_by_id(Uuid::new_v4()).await?, None);
        Ok(())
    }
}
