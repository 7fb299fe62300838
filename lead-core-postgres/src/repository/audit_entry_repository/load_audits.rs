use async_trait::async_trait;
use lead_core_db::repository::{LoadAudits, Page, PageRequest};
use lead_core_db::AuditEntryModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::AuditEntryRepositoryImpl;
use crate::utils::TryFromRow;

impl AuditEntryRepositoryImpl {
    pub(super) async fn load_audits_impl(
        repo: &AuditEntryRepositoryImpl,
        buyer_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<AuditEntryModel>, Box<dyn Error + Send + Sync>> {
        let count_query = r#"SELECT COUNT(*) as count FROM buyer_audit_entry WHERE buyer_id = $1"#;
        let query = r#"
            SELECT id, buyer_id, changed_by, changed_at, diff::text AS diff, hash
            FROM buyer_audit_entry
            WHERE buyer_id = $1
            ORDER BY changed_at DESC, seq DESC
            LIMIT $2 OFFSET $3
        "#;

        let (total, rows) = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            let total: i64 = sqlx::query_scalar(count_query)
                .bind(buyer_id)
                .fetch_one(&mut **transaction)
                .await?;
            let rows = sqlx::query(query)
                .bind(buyer_id)
                .bind(i64::try_from(page.limit)?)
                .bind(i64::try_from(page.offset)?)
                .fetch_all(&mut **transaction)
                .await?;
            (total, rows)
        };

        let items = rows
            .iter()
            .map(AuditEntryModel::try_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, usize::try_from(total)?, page))
    }
}

#[async_trait]
impl LoadAudits for AuditEntryRepositoryImpl {
    async fn load_audits(
        &self,
        entity_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<AuditEntryModel>, Box<dyn Error + Send + Sync>> {
        Self::load_audits_impl(self, entity_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::buyer_repository::test_utils::create_test_buyer;
    use crate::test_helper::setup_test_context;
    use chrono::{Duration, Utc};
    use lead_core_db::repository::{CreateBatch, LoadAudits, PageRequest, UnitOfWorkSession};
    use lead_core_db::{AuditDiff, AuditEntryModel, FieldChange, FieldValue, TrackedField};
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_load_audits() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let session = ctx.session();

        let buyer = create_test_buyer("Asha Verma");
        session.buyers().create_batch(vec![buyer.clone()]).await?;

        let start = Utc::now();
        let mut entries = vec![AuditEntryModel::new(buyer.id, "test-owner", start, AuditDiff::empty())?];
        for i in 1..=3 {
            let diff = AuditDiff::Changes(vec![
                (
                    TrackedField::Notes,
                    FieldChange {
                        before: FieldValue::Null,
                        after: FieldValue::text(&format!("note {i}")),
                    },
                ),
                (
                    TrackedField::Status,
                    FieldChange {
                        before: FieldValue::text("New"),
                        after: FieldValue::text("Contacted"),
                    },
                ),
            ]);
            entries.push(AuditEntryModel::new(
                buyer.id,
                "test-owner",
                start + Duration::seconds(i),
                diff,
            )?);
        }
        session.audits().create_batch(entries.clone()).await?;

        let page = session.audits().load_audits(buyer.id, PageRequest::new(2, 0)).await?;
        assert_eq!(page.total, 4);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages(), 2);
        assert!(page.has_more());
        assert_eq!(page.items[0], entries[3]);
        assert!(page.items[0].verify_hash());
        assert_eq!(
            page.items[0].diff.fields(),
            vec![TrackedField::Notes, TrackedField::Status]
        );

        let page2 = session.audits().load_audits(buyer.id, PageRequest::new(2, 2)).await?;
        assert_eq!(page2.items.len(), 2);
        assert_eq!(page2.items[1], entries[0]);
        assert!(!page2.has_more());

        Ok(())
    }
}
