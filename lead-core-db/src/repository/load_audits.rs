use async_trait::async_trait;
use uuid::Uuid;

use crate::models::audit::AuditEntryModel;
use crate::repository::pagination::{Page, PageRequest};

/// Repository trait for reading the audit trail of an entity with pagination
///
/// # Example
/// ```ignore
/// use lead_core_db::repository::pagination::PageRequest;
///
/// let page = session.audits().load_audits(buyer_id, PageRequest::new(20, 0)).await?;
/// println!("Page {} of {}", page.page_number(), page.total_pages());
/// ```
#[async_trait]
pub trait LoadAudits: Send + Sync {
    /// Load audit entries of one entity, newest first
    ///
    /// # Arguments
    /// * `entity_id` - The UUID of the entity whose audit entries should be loaded
    /// * `page` - The pagination parameters (limit and offset)
    async fn load_audits(
        &self,
        entity_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<AuditEntryModel>, Box<dyn std::error::Error + Send + Sync>>;
}
