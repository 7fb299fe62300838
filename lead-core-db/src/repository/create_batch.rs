use async_trait::async_trait;

use crate::models::identifiable::Identifiable;

/// Generic repository trait for creating multiple entities in a batch
///
/// All creates go through the transaction of the owning unit-of-work session,
/// so a batch is either committed completely or not at all.
/// Returns saved items with any generated fields populated.
///
/// # Example
/// ```ignore
/// let saved = session.buyers().create_batch(vec![buyer]).await?;
/// session.audits().create_batch(vec![audit_entry]).await?;
/// session.commit().await?;
/// ```
#[async_trait]
pub trait CreateBatch<T: Identifiable>: Send + Sync {
    /// Insert multiple items in the session transaction
    ///
    /// # Arguments
    /// * `items` - A vector of entities to create
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - The created entities, in input order
    /// * `Err` - An error if any insert failed; the session must then be rolled back
    async fn create_batch(
        &self,
        items: Vec<T>,
    ) -> Result<Vec<T>, Box<dyn std::error::Error + Send + Sync>>;
}
