use async_trait::async_trait;
use lead_core_db::repository::FindByFilter;
use lead_core_db::{BuyerFilter, BuyerModel};
use sqlx::{Postgres, QueryBuilder};
use std::error::Error;

use super::repo_impl::BuyerRepositoryImpl;
use crate::utils::{like_pattern, TryFromRow};

fn filter_query(filter: &BuyerFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM buyer WHERE TRUE");
    if let Some(city) = filter.city {
        builder.push(" AND city = ").push_bind(city);
    }
    if let Some(property_type) = filter.property_type {
        builder.push(" AND property_type = ").push_bind(property_type);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(timeline) = filter.timeline {
        builder.push(" AND timeline = ").push_bind(timeline);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR notes ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    builder.push(" ORDER BY created_at DESC, id");
    builder
}

#[async_trait]
impl FindByFilter<BuyerModel, BuyerFilter> for BuyerRepositoryImpl {
    async fn find_by_filter(
        &self,
        filter: &BuyerFilter,
    ) -> Result<Vec<BuyerModel>, Box<dyn Error + Send + Sync>> {
        let mut builder = filter_query(filter);
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            builder.build().fetch_all(&mut **transaction).await?
        };

        rows.iter().map(BuyerModel::try_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::buyer_repository::test_utils::create_test_buyer;
    use crate::test_helper::setup_test_context;
    use lead_core_db::repository::{CreateBatch, UnitOfWorkSession};
    use lead_core_db::{BuyerStatus, City};
    use serial_test::serial;

    #[test]
    fn test_filter_query_sql() {
        let filter = BuyerFilter {
            city: Some(City::Mohali),
            status: Some(BuyerStatus::New),
            search: Some(" asha ".to_string()),
            ..Default::default()
        };
        let builder = filter_query(&filter);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM buyer WHERE TRUE AND city = $1 AND status = $2 \
             AND (full_name ILIKE $3 OR email ILIKE $4 OR notes ILIKE $5 OR phone LIKE $6) \
             ORDER BY created_at DESC, id"
        );
        assert_eq!(
            filter_query(&BuyerFilter::default()).sql(),
            "SELECT * FROM buyer WHERE TRUE ORDER BY created_at DESC, id"
        );
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_find_by_filter() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let buyer_repo = ctx.session().buyers();

        let marker = uuid::Uuid::new_v4().simple().to_string();
        let mut tagged = create_test_buyer("Asha Verma");
        tagged.details.notes = Some(format!("ref {marker}"));
        buyer_repo
            .create_batch(vec![tagged.clone(), create_test_buyer("Ravi Kumar")])
            .await?;

        let filter = BuyerFilter {
            search: Some(marker.to_uppercase()),
            ..Default::default()
        };
        let found = buyer_repo.find_by_filter(&filter).await?;
        assert_eq!(found, vec![tagged]);

        Ok(())
    }
}
