use lead_core_db::{AuditDiff, AuditEntryModel};
use sqlx::{postgres::PgRow, Row};
use std::error::Error;

use crate::executor::Executor;
use crate::utils::TryFromRow;

/// Append-only store of buyer audit entries
pub struct AuditEntryRepositoryImpl {
    pub executor: Executor,
}

impl AuditEntryRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

/// Expects `diff` selected as text so the stored key order survives.
impl TryFromRow<PgRow> for AuditEntryModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let diff: String = row.try_get("diff")?;
        let diff: AuditDiff = serde_json::from_str(&diff)?;
        Ok(AuditEntryModel {
            id: row.try_get("id")?,
            buyer_id: row.try_get("buyer_id")?,
            changed_by: row.try_get("changed_by")?,
            changed_at: row.try_get("changed_at")?,
            diff,
            hash: row.try_get("hash")?,
        })
    }
}
