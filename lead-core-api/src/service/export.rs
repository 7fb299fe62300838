use lead_core_db::repository::{FindByFilter, UnitOfWork, UnitOfWorkSession};
use lead_core_db::{BuyerFilter, BuyerModel, FieldValue, TrackedField, TrackedFields};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::service::context::RequestContext;

pub const EXPORT_FILE_NAME: &str = "buyers.csv";
pub const EXPORT_CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

fn quote(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn cell_text(value: FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::Text(text) => text,
        FieldValue::List(items) => items.join(","),
    }
}

/// Renders buyers as CSV with the import column set as header
pub fn to_csv(buyers: &[BuyerModel]) -> String {
    let mut out = TrackedField::ALL
        .iter()
        .map(TrackedField::as_str)
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for buyer in buyers {
        let line = TrackedField::ALL
            .iter()
            .map(|field| quote(&cell_text(buyer.tracked_value(*field))).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Read-only filtered dump of buyers. Not rate limited.
pub struct BuyerExporter<U: UnitOfWork> {
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> BuyerExporter<U> {
    pub fn new(unit_of_work: Arc<U>) -> Self {
        Self { unit_of_work }
    }

    #[instrument(skip_all, fields(operation = "export"))]
    pub async fn export(&self, ctx: &RequestContext, filter: &BuyerFilter) -> ApiResult<ExportFile> {
        ctx.require_user()?;

        let session = self
            .unit_of_work
            .begin()
            .await
            .map_err(|e| ApiError::storage("begin transaction", e))?;
        let found = session.buyers().find_by_filter(filter).await;
        if let Err(err) = session.rollback().await {
            warn!(error = %err, "rollback of read session failed");
        }
        let buyers = found.map_err(|e| ApiError::storage("find buyers", e))?;

        info!(count = buyers.len(), "buyers exported");
        Ok(ExportFile {
            file_name: EXPORT_FILE_NAME,
            content_type: EXPORT_CONTENT_TYPE,
            body: to_csv(&buyers),
        })
    }
}
