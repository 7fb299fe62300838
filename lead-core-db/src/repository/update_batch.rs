use async_trait::async_trait;

use crate::models::identifiable::Identifiable;

/// Generic repository trait for updating multiple entities in a batch
///
/// Each item carries the concurrency token it was loaded with. The write is a
/// compare-and-swap on that token: when the stored token has moved on, the
/// call fails with [`ConcurrentUpdateError`](super::ConcurrentUpdateError).
/// Implementations assign the next token and return it on the updated items.
#[async_trait]
pub trait UpdateBatch<T: Identifiable>: Send + Sync {
    /// Update multiple items in the session transaction
    ///
    /// # Arguments
    /// * `items` - Entities holding their new field values and their previous token
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - The updated entities carrying their new token
    /// * `Err` - [`ConcurrentUpdateError`](super::ConcurrentUpdateError) on a lost race, or a storage error
    async fn update_batch(
        &self,
        items: Vec<T>,
    ) -> Result<Vec<T>, Box<dyn std::error::Error + Send + Sync>>;
}
