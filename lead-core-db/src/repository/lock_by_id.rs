use async_trait::async_trait;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Loads one entity and holds a write lock on it until the session ends.
///
/// Used by read-check-write paths so no other session can change the row
/// between the check and the write.
#[async_trait]
pub trait LockById<T: Identifiable>: Send + Sync {
    async fn lock_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<T>, Box<dyn std::error::Error + Send + Sync>>;
}
