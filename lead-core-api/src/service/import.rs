use chrono::Utc;
use lead_core_db::repository::UnitOfWork;
use lead_core_db::{AuditDiff, AuditEntryModel, BuyerModel, TrackedField};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{ApiError, ApiResult, RowError};
use crate::rate_limit::{CounterStore, OperationClass};
use crate::service::context::RequestContext;
use crate::service::coordinator::MutationCoordinator;
use crate::validation::{BuyerInput, NumericInput};

/// Already tokenized tabular upload: declared headers and one key/value map
/// per data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl ImportBatch {
    pub fn new(headers: Vec<String>, rows: Vec<HashMap<String, String>>) -> Self {
        Self { headers, rows }
    }

    /// Takes the declared headers from the first row's keys
    pub fn from_rows(rows: Vec<HashMap<String, String>>) -> Self {
        let headers = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self { headers, rows }
    }

    /// Required columns absent from the declared headers, in column order
    pub fn missing_headers(&self) -> Vec<String> {
        TrackedField::ALL
            .iter()
            .map(TrackedField::as_str)
            .filter(|required| !self.headers.iter().any(|h| h.trim() == *required))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub inserted_count: usize,
}

/// Value of a column, matching headers after trimming like
/// [`ImportBatch::missing_headers`] does
fn cell<'a>(row: &'a HashMap<String, String>, field: TrackedField) -> Option<&'a str> {
    row.get(field.as_str())
        .or_else(|| {
            row.iter()
                .find(|(header, _)| header.trim() == field.as_str())
                .map(|(_, value)| value)
        })
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn shorthand_timeline(value: &str) -> &str {
    match value.to_ascii_lowercase().as_str() {
        "0-3m" => "ZERO_3M",
        "3-6m" => "THREE_6M",
        "6+m" => "GT_6M",
        "exploring" => "Exploring",
        _ => value,
    }
}

fn shorthand_bhk(value: &str) -> &str {
    match value.to_ascii_lowercase().as_str() {
        "1bhk" => "BHK1",
        "2bhk" => "BHK2",
        "3bhk" => "BHK3",
        "4bhk" => "BHK4",
        "studio" => "Studio",
        _ => value,
    }
}

/// Maps one raw row onto a [`BuyerInput`]: trims cells, expands shorthand
/// codes and splits the tag list. Budgets stay textual so the validator
/// can strip grouping separators.
pub fn normalize_row(row: &HashMap<String, String>) -> BuyerInput {
    let text = |field| cell(row, field).map(str::to_string);

    BuyerInput {
        full_name: text(TrackedField::FullName),
        email: text(TrackedField::Email),
        phone: text(TrackedField::Phone),
        city: text(TrackedField::City),
        property_type: text(TrackedField::PropertyType),
        bhk: cell(row, TrackedField::Bhk).map(|v| shorthand_bhk(v).to_string()),
        purpose: text(TrackedField::Purpose),
        budget_min: cell(row, TrackedField::BudgetMin).map(NumericInput::from),
        budget_max: cell(row, TrackedField::BudgetMax).map(NumericInput::from),
        timeline: cell(row, TrackedField::Timeline).map(|v| shorthand_timeline(v).to_string()),
        source: text(TrackedField::Source),
        notes: text(TrackedField::Notes),
        tags: Some(
            cell(row, TrackedField::Tags)
                .map(|tags| {
                    tags.split(',')
                        .map(str::trim)
                        .filter(|tag| !tag.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        ),
        status: text(TrackedField::Status),
    }
}

/// All-or-nothing bulk insert on top of the coordinator.
///
/// One import call consumes one unit of the import budget regardless of
/// row count. Either every row is inserted with an import audit entry, or
/// nothing is.
pub struct BatchImportPipeline<U, C>
where
    U: UnitOfWork,
    C: CounterStore,
{
    coordinator: Arc<MutationCoordinator<U, C>>,
}

impl<U, C> BatchImportPipeline<U, C>
where
    U: UnitOfWork,
    C: CounterStore,
{
    pub fn new(coordinator: Arc<MutationCoordinator<U, C>>) -> Self {
        Self { coordinator }
    }

    #[instrument(skip_all, fields(operation = "import", rows = batch.rows.len()))]
    pub async fn import_batch(
        &self,
        ctx: &RequestContext,
        batch: &ImportBatch,
    ) -> ApiResult<ImportSummary> {
        let user_id = ctx.require_user()?;
        self.coordinator
            .enforce_rate_limit(ctx, OperationClass::Import)
            .await?;
        self.check_shape(batch)?;

        let validator = self.coordinator.validator();
        let mut row_errors = Vec::new();
        let mut valid = Vec::with_capacity(batch.rows.len());
        for (idx, row) in batch.rows.iter().enumerate() {
            match validator.validate(&normalize_row(row)) {
                Ok(details) => valid.push(details),
                Err(errors) => row_errors.push(RowError {
                    row: idx + 2,
                    errors,
                }),
            }
        }

        if !row_errors.is_empty() {
            warn!(
                invalid = row_errors.len(),
                valid = valid.len(),
                "import rejected: row validation errors"
            );
            return Err(ApiError::RowValidation {
                errors: row_errors,
                valid_count: valid.len(),
            });
        }

        let now = Utc::now();
        let buyers: Vec<BuyerModel> = valid
            .into_iter()
            .map(|details| BuyerModel::new(user_id, details, now))
            .collect();
        let entries = buyers
            .iter()
            .map(|buyer| {
                AuditEntryModel::new(buyer.id, user_id, buyer.created_at, AuditDiff::Imported)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::storage("hash audit entry", e))?;

        let inserted = self.coordinator.persist_new(buyers, entries).await?;
        info!(inserted = inserted.len(), "import committed");
        Ok(ImportSummary {
            inserted_count: inserted.len(),
        })
    }

    /// Batch-level checks, in order: empty, row cap, required headers
    fn check_shape(&self, batch: &ImportBatch) -> ApiResult<()> {
        if batch.rows.is_empty() {
            return Err(ApiError::invalid_request("CSV is empty"));
        }

        let max_rows = self.coordinator.pipeline().max_import_rows;
        if batch.rows.len() > max_rows {
            return Err(ApiError::InvalidRequest {
                message: format!("Max {max_rows} rows allowed"),
                missing: Vec::new(),
                count: Some(batch.rows.len()),
            });
        }

        let missing = batch.missing_headers();
        if !missing.is_empty() {
            return Err(ApiError::InvalidRequest {
                message: "Missing headers".to_string(),
                missing,
                count: None,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{csv_row, owner_ctx, test_coordinator};
    use lead_core_db::{Bhk, Timeline};

    fn pipeline() -> (
        BatchImportPipeline<lead_core_db::memory::InMemoryStore, crate::rate_limit::InMemoryCounterStore>,
        lead_core_db::memory::InMemoryStore,
    ) {
        let (coordinator, store) = test_coordinator();
        (BatchImportPipeline::new(coordinator), store)
    }

    #[test]
    fn test_normalize_row_expands_shorthand() {
        let mut row = csv_row("  Asha Verma ");
        row.insert("timeline".into(), "6+m".into());
        row.insert("bhk".into(), "3BHK".into());
        row.insert("tags".into(), "vip, ,callback ".into());
        row.insert("budgetMin".into(), "2,500,000".into());

        let input = normalize_row(&row);
        assert_eq!(input.full_name.as_deref(), Some("Asha Verma"));
        assert_eq!(input.timeline.as_deref(), Some("GT_6M"));
        assert_eq!(input.bhk.as_deref(), Some("BHK3"));
        assert_eq!(input.tags, Some(vec!["vip".to_string(), "callback".to_string()]));
        assert_eq!(input.budget_min, Some(NumericInput::from("2,500,000")));
    }

    #[tokio::test]
    async fn test_import_inserts_all_rows_with_import_entries() {
        let (pipeline, store) = pipeline();
        let mut second = csv_row("Ravi Kumar");
        second.insert("bhk".into(), "studio".into());
        second.insert("timeline".into(), "exploring".into());
        let batch = ImportBatch::from_rows(vec![csv_row("Asha Verma"), second]);

        let summary = pipeline.import_batch(&owner_ctx(), &batch).await.unwrap();
        assert_eq!(summary, ImportSummary { inserted_count: 2 });

        let buyers = store.committed_buyers().await;
        assert_eq!(buyers.len(), 2);
        let ravi = buyers
            .iter()
            .find(|b| b.details.full_name == "Ravi Kumar")
            .unwrap();
        assert_eq!(ravi.details.bhk, Some(Bhk::Studio));
        assert_eq!(ravi.details.timeline, Timeline::Exploring);
        assert_eq!(ravi.owner_id, "user-1");

        let entries = store.committed_audit_entries().await;
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.diff == AuditDiff::Imported));
    }

    #[tokio::test]
    async fn test_padded_headers_are_read() {
        let (pipeline, store) = pipeline();
        let row: HashMap<String, String> = csv_row("Asha Verma")
            .into_iter()
            .map(|(header, value)| match header.as_str() {
                "notes" => (" notes".to_string(), "prefers mornings".to_string()),
                "fullName" => ("fullName ".to_string(), value),
                _ => (header, value),
            })
            .collect();
        let batch = ImportBatch::from_rows(vec![row]);
        assert!(batch.missing_headers().is_empty());

        let summary = pipeline.import_batch(&owner_ctx(), &batch).await.unwrap();
        assert_eq!(summary.inserted_count, 1);

        let buyers = store.committed_buyers().await;
        assert_eq!(buyers[0].details.full_name, "Asha Verma");
        assert_eq!(buyers[0].details.notes.as_deref(), Some("prefers mornings"));
    }

    #[tokio::test]
    async fn test_one_invalid_row_rejects_whole_batch() {
        let (pipeline, store) = pipeline();
        let mut bad = csv_row("Bad Row");
        bad.insert("phone".into(), "12ab".into());
        let batch = ImportBatch::from_rows(vec![
            csv_row("Asha Verma"),
            csv_row("Ravi Kumar"),
            bad,
            csv_row("Meera Singh"),
        ]);

        let err = pipeline.import_batch(&owner_ctx(), &batch).await.unwrap_err();
        match err {
            ApiError::RowValidation { errors, valid_count } => {
                assert_eq!(valid_count, 3);
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].row, 4);
                assert_eq!(errors[0].errors[0].path, "phone");
            }
            other => panic!("expected row errors, got {other:?}"),
        }
        assert!(store.committed_buyers().await.is_empty());
        assert!(store.committed_audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_shape_checks() {
        let (pipeline, _) = pipeline();
        let ctx = owner_ctx();

        let err = pipeline.import_batch(&ctx, &ImportBatch::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "CSV is empty");

        let too_many = ImportBatch::from_rows(vec![csv_row("Asha Verma"); 201]);
        match pipeline.import_batch(&ctx, &too_many).await.unwrap_err() {
            ApiError::InvalidRequest { message, count, .. } => {
                assert_eq!(message, "Max 200 rows allowed");
                assert_eq!(count, Some(201));
            }
            other => panic!("expected invalid request, got {other:?}"),
        }

        let mut row = csv_row("Asha Verma");
        row.remove("notes");
        row.remove("status");
        match pipeline
            .import_batch(&ctx, &ImportBatch::from_rows(vec![row]))
            .await
            .unwrap_err()
        {
            ApiError::InvalidRequest { message, missing, .. } => {
                assert_eq!(message, "Missing headers");
                assert_eq!(missing, vec!["notes".to_string(), "status".to_string()]);
            }
            other => panic!("expected missing headers, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_import_budget_is_per_call() {
        let (pipeline, _) = pipeline();
        let ctx = owner_ctx();
        let batch = ImportBatch::from_rows(vec![csv_row("Asha Verma"); 10]);

        for _ in 0..3 {
            pipeline.import_batch(&ctx, &batch).await.unwrap();
        }
        let err = pipeline.import_batch(&ctx, &batch).await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(ref d) if d.limit == 3));
    }

    #[tokio::test]
    async fn test_failure_midway_rolls_back_batch() {
        let (pipeline, store) = pipeline();
        let batch = ImportBatch::from_rows(vec![csv_row("Asha Verma"); 5]);

        store.fail_on_write(4);
        let err = pipeline.import_batch(&owner_ctx(), &batch).await.unwrap_err();
        store.clear_faults();

        assert!(matches!(err, ApiError::Storage));
        assert!(store.committed_buyers().await.is_empty());
    }
}
