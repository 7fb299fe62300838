use chrono::{DateTime, Utc};
use lead_core_db::repository::{
    as_concurrent_update, CreateBatch, LoadAudits, LoadBatch, LockById, Page, PageRequest,
    UnitOfWork, UnitOfWorkSession, UpdateBatch,
};
use lead_core_db::{AuditDiff, AuditEntryModel, BuyerDetails, BuyerModel, TrackedField};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::audit_diff;
use crate::config::PipelineConfig;
use crate::error::{ApiError, ApiResult, FieldError};
use crate::rate_limit::{CounterStore, OperationClass, RateDecision, RateGovernor};
use crate::service::context::RequestContext;
use crate::validation::{BuyerInput, SchemaValidator, UpdateBuyerRequest};

/// Single entry point for buyer mutations.
///
/// Every mutation runs authenticate, rate-limit and validate before any
/// storage work. Record writes and their audit entries share one unit of
/// work and are committed together or not at all.
pub struct MutationCoordinator<U, C>
where
    U: UnitOfWork,
    C: CounterStore,
{
    unit_of_work: Arc<U>,
    governor: RateGovernor<C>,
    validator: SchemaValidator,
    pipeline: PipelineConfig,
}

impl<U, C> MutationCoordinator<U, C>
where
    U: UnitOfWork,
    C: CounterStore,
{
    pub fn new(
        unit_of_work: Arc<U>,
        governor: RateGovernor<C>,
        validator: SchemaValidator,
        pipeline: PipelineConfig,
    ) -> Self {
        Self {
            unit_of_work,
            governor,
            validator,
            pipeline,
        }
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    pub fn unit_of_work(&self) -> &Arc<U> {
        &self.unit_of_work
    }

    #[instrument(skip_all, fields(operation = "create"))]
    pub async fn create(&self, ctx: &RequestContext, input: &BuyerInput) -> ApiResult<BuyerModel> {
        let user_id = ctx.require_user()?;
        self.enforce_rate_limit(ctx, OperationClass::Create).await?;
        let details = self.validator.validate(input).map_err(ApiError::Validation)?;

        let buyer = BuyerModel::new(user_id, details, Utc::now());
        let entry = AuditEntryModel::new(buyer.id, user_id, buyer.updated_at, AuditDiff::empty())
            .map_err(|e| ApiError::storage("hash audit entry", e))?;

        let created = self
            .persist_new(vec![buyer], vec![entry])
            .await?
            .pop()
            .ok_or_else(|| ApiError::storage("insert buyer", "no row returned"))?;

        info!(buyer_id = %created.id, "buyer created");
        Ok(created)
    }

    #[instrument(skip_all, fields(operation = "update", buyer_id = %request.id))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        request: &UpdateBuyerRequest,
    ) -> ApiResult<BuyerModel> {
        let user_id = ctx.require_user()?;
        self.enforce_rate_limit(ctx, OperationClass::Update).await?;
        let (details, token) = self.validate_update(request)?;
        let status_supplied = request
            .input
            .status
            .as_deref()
            .is_some_and(|status| !status.trim().is_empty());

        let session = self.begin().await?;
        let outcome = self
            .apply_update(&session, user_id, request.id, details, token, status_supplied)
            .await;
        let updated = Self::finish(session, outcome).await?;

        info!(buyer_id = %updated.id, updated_at = %updated.updated_at, "buyer updated");
        Ok(updated)
    }

    /// Audit history of one buyer, newest first
    #[instrument(skip_all, fields(operation = "history", buyer_id = %buyer_id))]
    pub async fn history(
        &self,
        ctx: &RequestContext,
        buyer_id: Uuid,
        page: PageRequest,
    ) -> ApiResult<Page<AuditEntryModel>> {
        ctx.require_user()?;
        let session = self.begin().await?;
        let outcome = async {
            let found = session
                .buyers()
                .load_batch(&[buyer_id])
                .await
                .map_err(|e| ApiError::storage("load buyer", e))?;
            if !matches!(found.first(), Some(Some(_))) {
                return Err(ApiError::NotFound(format!("buyer {buyer_id}")));
            }
            session
                .audits()
                .load_audits(buyer_id, page)
                .await
                .map_err(|e| ApiError::storage("load audit entries", e))
        }
        .await;

        // read-only: nothing to publish
        if let Err(err) = session.rollback().await {
            warn!(error = %err, "rollback of read session failed");
        }
        outcome
    }

    /// Consumes one unit of the class budget for the caller's identity
    pub(crate) async fn enforce_rate_limit(
        &self,
        ctx: &RequestContext,
        class: OperationClass,
    ) -> ApiResult<RateDecision> {
        let identity = ctx.rate_identity();
        let decision = self
            .governor
            .check(&identity, class)
            .await
            .map_err(|e| ApiError::storage("rate counter", e))?;

        if decision.allowed {
            Ok(decision)
        } else {
            warn!(%class, %identity, reset_at = %decision.reset_at, "rate limit exceeded");
            Err(ApiError::RateLimited(decision))
        }
    }

    /// Inserts new buyers with their audit entries in one unit of work
    pub(crate) async fn persist_new(
        &self,
        buyers: Vec<BuyerModel>,
        entries: Vec<AuditEntryModel>,
    ) -> ApiResult<Vec<BuyerModel>> {
        let session = self.begin().await?;
        let outcome = async {
            let saved = session
                .buyers()
                .create_batch(buyers)
                .await
                .map_err(|e| ApiError::storage("insert buyers", e))?;
            session
                .audits()
                .create_batch(entries)
                .await
                .map_err(|e| ApiError::storage("insert audit entries", e))?;
            Ok::<_, ApiError>(saved)
        }
        .await;
        Self::finish(session, outcome).await
    }

    fn validate_update(
        &self,
        request: &UpdateBuyerRequest,
    ) -> ApiResult<(BuyerDetails, DateTime<Utc>)> {
        let validated = self.validator.validate(&request.input);
        match (validated, request.updated_at) {
            (Ok(details), Some(token)) => Ok((details, token)),
            (result, token) => {
                let mut errors = result.err().unwrap_or_default();
                if token.is_none() {
                    errors.push(FieldError::new(
                        "updatedAt",
                        "updatedAt is required for concurrency check",
                    ));
                }
                Err(ApiError::Validation(errors))
            }
        }
    }

    /// Applies a validated update under the row lock. Without a submitted
    /// status the stored one is kept.
    async fn apply_update(
        &self,
        session: &U::Session,
        user_id: &str,
        id: Uuid,
        mut details: BuyerDetails,
        token: DateTime<Utc>,
        status_supplied: bool,
    ) -> ApiResult<BuyerModel> {
        let current = session
            .buyers()
            .lock_by_id(id)
            .await
            .map_err(|e| ApiError::storage("lock buyer", e))?
            .ok_or_else(|| ApiError::NotFound(format!("buyer {id}")))?;

        if current.owner_id != user_id {
            warn!(buyer_id = %id, "update rejected: not the owner");
            return Err(ApiError::Forbidden);
        }

        if !self.token_matches(current.updated_at, token) {
            warn!(buyer_id = %id, stored = %current.updated_at, submitted = %token, "stale update token");
            return Err(ApiError::Conflict(Box::new(current)));
        }

        if !status_supplied {
            details.status = current.details.status;
        }

        let changes = audit_diff::diff(&current, &details, &TrackedField::ALL);
        let mut next = current.clone();
        next.details = details;

        let updated = match session.buyers().update_batch(vec![next]).await {
            Ok(mut saved) => saved
                .pop()
                .ok_or_else(|| ApiError::storage("update buyer", "no row returned"))?,
            Err(err) if as_concurrent_update(err.as_ref()).is_some() => {
                warn!(buyer_id = %id, "lost compare-and-swap on update");
                let latest = session
                    .buyers()
                    .load_batch(&[id])
                    .await
                    .map_err(|e| ApiError::storage("reload buyer", e))?
                    .into_iter()
                    .flatten()
                    .next()
                    .unwrap_or(current);
                return Err(ApiError::Conflict(Box::new(latest)));
            }
            Err(err) => return Err(ApiError::storage("update buyer", err)),
        };

        let entry = AuditEntryModel::new(id, user_id, updated.updated_at, changes)
            .map_err(|e| ApiError::storage("hash audit entry", e))?;
        session
            .audits()
            .create_batch(vec![entry])
            .await
            .map_err(|e| ApiError::storage("insert audit entry", e))?;

        Ok(updated)
    }

    fn token_matches(&self, stored: DateTime<Utc>, submitted: DateTime<Utc>) -> bool {
        (stored - submitted).num_milliseconds().abs() <= self.pipeline.concurrency_skew_ms
    }

    async fn begin(&self) -> ApiResult<U::Session> {
        self.unit_of_work
            .begin()
            .await
            .map_err(|e| ApiError::storage("begin transaction", e))
    }

    /// Commits on success, rolls back on any rejection
    async fn finish<T>(session: U::Session, outcome: ApiResult<T>) -> ApiResult<T> {
        match outcome {
            Ok(value) => {
                session
                    .commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", e))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
