use async_trait::async_trait;

/// Repository trait for filtered, read-only listings
#[async_trait]
pub trait FindByFilter<T, F>: Send + Sync {
    /// Returns every entity matching `filter`, newest first
    async fn find_by_filter(
        &self,
        filter: &F,
    ) -> Result<Vec<T>, Box<dyn std::error::Error + Send + Sync>>;
}
