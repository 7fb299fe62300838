use thiserror::Error;
use uuid::Uuid;

/// A compare-and-swap write found a different concurrency token than expected.
///
/// Returned boxed from [`UpdateBatch`](super::UpdateBatch); callers detect it
/// with `downcast_ref`.
#[derive(Debug, Error)]
#[error("Concurrent update detected for {entity_id}")]
pub struct ConcurrentUpdateError {
    pub entity_id: Uuid,
}

/// Returns the concurrency error carried by a boxed repository error, if any
pub fn as_concurrent_update<'a>(
    err: &'a (dyn std::error::Error + Send + Sync + 'static),
) -> Option<&'a ConcurrentUpdateError> {
    err.downcast_ref::<ConcurrentUpdateError>()
}
