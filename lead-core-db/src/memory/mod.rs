//! In-memory storage backend
//!
//! Implements the unit-of-work contract without a database server. A session
//! holds the store lock for its whole lifetime and works on a staged copy of
//! the tables, which gives serializable isolation and all-or-nothing commits.

use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::audit::AuditEntryModel;
use crate::models::buyer::{BuyerFilter, BuyerModel};
use crate::repository::{
    ConcurrentUpdateError, CreateBatch, FindByFilter, LoadAudits, LoadBatch, LockById, Page,
    PageRequest, UnitOfWork, UnitOfWorkSession, UpdateBatch,
};
use crate::utils::next_revision;

#[derive(Debug, Clone, Default)]
struct Tables {
    buyers: HashMap<Uuid, BuyerModel>,
    audit_entries: Vec<AuditEntryModel>,
}

/// Shared in-memory store. Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    /// 1-based index of the write that fails in each new session; 0 disables
    fail_on_write: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`-th write of every subsequent session fail.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn fail_on_write(&self, n: usize) {
        self.fail_on_write.store(n, Ordering::SeqCst);
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn clear_faults(&self) {
        self.fail_on_write.store(0, Ordering::SeqCst);
    }

    /// Committed buyers, in no particular order
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn committed_buyers(&self) -> Vec<BuyerModel> {
        self.tables.lock().await.buyers.values().cloned().collect()
    }

    /// Committed audit entries, in write order
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn committed_audit_entries(&self) -> Vec<AuditEntryModel> {
        self.tables.lock().await.audit_entries.clone()
    }
}

struct SessionState {
    guard: ParkingMutex<Option<OwnedMutexGuard<Tables>>>,
    staged: ParkingMutex<Option<Tables>>,
    writes: AtomicUsize,
    fail_on_write: usize,
}

impl SessionState {
    fn with_tables<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<R, Box<dyn Error + Send + Sync>>,
    ) -> Result<R, Box<dyn Error + Send + Sync>> {
        let mut staged = self.staged.lock();
        let tables = staged.as_mut().ok_or("Transaction has been consumed")?;
        f(tables)
    }

    fn record_write(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on_write {
            return Err(format!("Injected storage failure on write {n}").into());
        }
        Ok(())
    }

    fn finish(&self, publish: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
        let staged = self
            .staged
            .lock()
            .take()
            .ok_or("Transaction has been consumed")?;
        let mut guard = self.guard.lock().take().ok_or("Transaction has been consumed")?;
        if publish {
            *guard = staged;
        }
        Ok(())
    }
}

pub struct InMemorySession {
    buyers: InMemoryBuyerRepository,
    audits: InMemoryAuditEntryRepository,
    state: Arc<SessionState>,
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    type Session = InMemorySession;

    async fn begin(&self) -> Result<Self::Session, Box<dyn Error + Send + Sync>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        let state = Arc::new(SessionState {
            guard: ParkingMutex::new(Some(guard)),
            staged: ParkingMutex::new(Some(staged)),
            writes: AtomicUsize::new(0),
            fail_on_write: self.fail_on_write.load(Ordering::SeqCst),
        });
        Ok(InMemorySession {
            buyers: InMemoryBuyerRepository {
                state: state.clone(),
            },
            audits: InMemoryAuditEntryRepository {
                state: state.clone(),
            },
            state,
        })
    }
}

#[async_trait]
impl UnitOfWorkSession for InMemorySession {
    type Buyers = InMemoryBuyerRepository;
    type Audits = InMemoryAuditEntryRepository;

    fn buyers(&self) -> &Self::Buyers {
        &self.buyers
    }

    fn audits(&self) -> &Self::Audits {
        &self.audits
    }

    async fn commit(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.state.finish(true)
    }

    async fn rollback(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.state.finish(false)
    }
}

pub struct InMemoryBuyerRepository {
    state: Arc<SessionState>,
}

#[async_trait]
impl CreateBatch<BuyerModel> for InMemoryBuyerRepository {
    async fn create_batch(
        &self,
        items: Vec<BuyerModel>,
    ) -> Result<Vec<BuyerModel>, Box<dyn Error + Send + Sync>> {
        let mut saved_items = Vec::with_capacity(items.len());
        for item in items {
            self.state.record_write()?;
            self.state.with_tables(|tables| {
                if tables.buyers.contains_key(&item.id) {
                    return Err(format!("Duplicate buyer id {}", item.id).into());
                }
                tables.buyers.insert(item.id, item.clone());
                Ok(())
            })?;
            saved_items.push(item);
        }
        Ok(saved_items)
    }
}

#[async_trait]
impl UpdateBatch<BuyerModel> for InMemoryBuyerRepository {
    async fn update_batch(
        &self,
        items: Vec<BuyerModel>,
    ) -> Result<Vec<BuyerModel>, Box<dyn Error + Send + Sync>> {
        let mut updated_items = Vec::with_capacity(items.len());
        for item in items {
            self.state.record_write()?;
            let updated = self.state.with_tables(|tables| {
                let stored = tables
                    .buyers
                    .get_mut(&item.id)
                    .ok_or_else(|| format!("Buyer {} not found", item.id))?;
                if stored.updated_at != item.updated_at {
                    return Err(Box::new(ConcurrentUpdateError { entity_id: item.id }) as _);
                }
                // owner_id and created_at are never rewritten
                stored.details = item.details.clone();
                stored.updated_at = next_revision(stored.updated_at, chrono::Utc::now());
                Ok(stored.clone())
            })?;
            updated_items.push(updated);
        }
        Ok(updated_items)
    }
}

#[async_trait]
impl LoadBatch<BuyerModel> for InMemoryBuyerRepository {
    async fn load_batch(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Option<BuyerModel>>, Box<dyn Error + Send + Sync>> {
        self.state
            .with_tables(|tables| Ok(ids.iter().map(|id| tables.buyers.get(id).cloned()).collect()))
    }
}

#[async_trait]
impl LockById<BuyerModel> for InMemoryBuyerRepository {
    async fn lock_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<BuyerModel>, Box<dyn Error + Send + Sync>> {
        // The session already holds the store lock.
        self.state.with_tables(|tables| Ok(tables.buyers.get(&id).cloned()))
    }
}

#[async_trait]
impl FindByFilter<BuyerModel, BuyerFilter> for InMemoryBuyerRepository {
    async fn find_by_filter(
        &self,
        filter: &BuyerFilter,
    ) -> Result<Vec<BuyerModel>, Box<dyn Error + Send + Sync>> {
        self.state.with_tables(|tables| {
            let mut found: Vec<BuyerModel> = tables
                .buyers
                .values()
                .filter(|buyer| filter.matches(buyer))
                .cloned()
                .collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            Ok(found)
        })
    }
}

pub struct InMemoryAuditEntryRepository {
    state: Arc<SessionState>,
}

#[async_trait]
impl CreateBatch<AuditEntryModel> for InMemoryAuditEntryRepository {
    async fn create_batch(
        &self,
        items: Vec<AuditEntryModel>,
    ) -> Result<Vec<AuditEntryModel>, Box<dyn Error + Send + Sync>> {
        let mut saved_items = Vec::with_capacity(items.len());
        for item in items {
            self.state.record_write()?;
            self.state.with_tables(|tables| {
                if !tables.buyers.contains_key(&item.buyer_id) {
                    return Err(format!("Audit entry references unknown buyer {}", item.buyer_id).into());
                }
                tables.audit_entries.push(item.clone());
                Ok(())
            })?;
            saved_items.push(item);
        }
        Ok(saved_items)
    }
}

#[async_trait]
impl LoadAudits for InMemoryAuditEntryRepository {
    async fn load_audits(
        &self,
        entity_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<AuditEntryModel>, Box<dyn Error + Send + Sync>> {
        self.state.with_tables(|tables| {
            // Newest first; entries written later win ties on changed_at.
            let mut entries: Vec<&AuditEntryModel> = tables
                .audit_entries
                .iter()
                .filter(|entry| entry.buyer_id == entity_id)
                .collect();
            entries.reverse();
            entries.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));

            let total = entries.len();
            let items = entries
                .into_iter()
                .skip(page.offset)
                .take(page.limit)
                .cloned()
                .collect();
            Ok(Page::new(items, total, page))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::AuditDiff;
    use crate::models::buyer::test_utils::sample_details;
    use crate::repository::as_concurrent_update;
    use chrono::Utc;
    use tokio_test::{assert_err, assert_ok};

    fn new_buyer(name: &str) -> BuyerModel {
        BuyerModel::new("owner-1", sample_details(name), Utc::now())
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() -> Result<(), Box<dyn Error + Send + Sync>> {
        let store = InMemoryStore::new();
        let buyer = new_buyer("Asha Verma");

        let session = store.begin().await?;
        session.buyers().create_batch(vec![buyer.clone()]).await?;
        let entry = AuditEntryModel::new(buyer.id, "owner-1", Utc::now(), AuditDiff::empty())?;
        session.audits().create_batch(vec![entry]).await?;
        session.commit().await?;

        assert_eq!(store.committed_buyers().await, vec![buyer]);
        assert_eq!(store.committed_audit_entries().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() -> Result<(), Box<dyn Error + Send + Sync>> {
        let store = InMemoryStore::new();

        let session = store.begin().await?;
        session.buyers().create_batch(vec![new_buyer("Rolled Back")]).await?;
        session.rollback().await?;

        {
            let session = store.begin().await?;
            session.buyers().create_batch(vec![new_buyer("Dropped")]).await?;
        }

        assert!(store.committed_buyers().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_consumed_session_rejects_work() -> Result<(), Box<dyn Error + Send + Sync>> {
        let store = InMemoryStore::new();
        let session = store.begin().await?;
        session.commit().await?;

        let err = assert_err!(session.buyers().load_batch(&[Uuid::new_v4()]).await);
        assert_eq!(err.to_string(), "Transaction has been consumed");
        assert_err!(session.commit().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_is_compare_and_swap() -> Result<(), Box<dyn Error + Send + Sync>> {
        let store = InMemoryStore::new();
        let buyer = new_buyer("Asha Verma");

        let session = store.begin().await?;
        session.buyers().create_batch(vec![buyer.clone()]).await?;
        session.commit().await?;

        let session = store.begin().await?;
        let mut edited = buyer.clone();
        edited.details.full_name = "Asha V.".to_string();
        edited.owner_id = "intruder".to_string();
        let updated = session.buyers().update_batch(vec![edited]).await?;
        assert!(updated[0].updated_at > buyer.updated_at);
        assert_eq!(updated[0].owner_id, "owner-1");

        // The original token is now stale.
        let err = assert_err!(session.buyers().update_batch(vec![buyer.clone()]).await);
        let conflict = as_concurrent_update(err.as_ref()).expect("concurrency error");
        assert_eq!(conflict.entity_id, buyer.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_failure() -> Result<(), Box<dyn Error + Send + Sync>> {
        let store = InMemoryStore::new();
        store.fail_on_write(2);

        let session = store.begin().await?;
        let result = session
            .buyers()
            .create_batch(vec![new_buyer("One"), new_buyer("Two")])
            .await;
        assert_err!(result);
        assert_ok!(session.rollback().await);

        store.clear_faults();
        assert!(store.committed_buyers().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_audits_newest_first() -> Result<(), Box<dyn Error + Send + Sync>> {
        let store = InMemoryStore::new();
        let buyer = new_buyer("Asha Verma");
        let session = store.begin().await?;
        session.buyers().create_batch(vec![buyer.clone()]).await?;

        let start = Utc::now();
        let entries: Vec<AuditEntryModel> = (0..3)
            .map(|i| {
                AuditEntryModel::new(
                    buyer.id,
                    "owner-1",
                    start + chrono::Duration::seconds(i),
                    AuditDiff::empty(),
                )
                .unwrap()
            })
            .collect();
        session.audits().create_batch(entries.clone()).await?;

        let page = session.audits().load_audits(buyer.id, PageRequest::new(2, 0)).await?;
        assert_eq!(page.total, 3);
        assert_eq!(page.items, vec![entries[2].clone(), entries[1].clone()]);
        assert!(page.has_more());
        Ok(())
    }
}
