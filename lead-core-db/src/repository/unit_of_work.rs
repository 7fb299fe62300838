use async_trait::async_trait;

use crate::models::audit::AuditEntryModel;
use crate::models::buyer::{BuyerFilter, BuyerModel};
use crate::repository::{
    CreateBatch, FindByFilter, LoadAudits, LoadBatch, LockById, UpdateBatch,
};

/// Everything the mutation pipeline needs from buyer storage
pub trait BuyerRepository:
    CreateBatch<BuyerModel>
    + UpdateBatch<BuyerModel>
    + LoadBatch<BuyerModel>
    + LockById<BuyerModel>
    + FindByFilter<BuyerModel, BuyerFilter>
{
}

impl<R> BuyerRepository for R where
    R: CreateBatch<BuyerModel>
        + UpdateBatch<BuyerModel>
        + LoadBatch<BuyerModel>
        + LockById<BuyerModel>
        + FindByFilter<BuyerModel, BuyerFilter>
{
}

/// Append-only audit storage
pub trait AuditEntryRepository: CreateBatch<AuditEntryModel> + LoadAudits {}

impl<R> AuditEntryRepository for R where R: CreateBatch<AuditEntryModel> + LoadAudits {}

/// Source of transactional sessions.
///
/// Should be built once at startup and shared.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Session: UnitOfWorkSession;

    /// Open a session backed by a fresh transaction
    async fn begin(&self) -> Result<Self::Session, Box<dyn std::error::Error + Send + Sync>>;
}

/// One open transaction and the repositories bound to it.
///
/// # Documentation
/// - Every repository returned by a session writes through the same transaction
/// - `commit` publishes all writes at once; `rollback` discards them
/// - Dropping a session without committing discards its writes
/// - After `commit` or `rollback` the repositories fail with "Transaction has been consumed"
#[async_trait]
pub trait UnitOfWorkSession: Send + Sync {
    type Buyers: BuyerRepository;
    type Audits: AuditEntryRepository;

    fn buyers(&self) -> &Self::Buyers;

    fn audits(&self) -> &Self::Audits;

    async fn commit(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn rollback(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
