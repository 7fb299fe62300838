use lead_core_db::{BuyerDetails, BuyerModel};
use sqlx::{postgres::PgRow, Row};
use std::error::Error;

use crate::executor::Executor;
use crate::utils::{get_heapless_string, TryFromRow};

pub struct BuyerRepositoryImpl {
    pub executor: Executor,
}

impl BuyerRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for BuyerModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(BuyerModel {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            details: BuyerDetails {
                full_name: row.try_get("full_name")?,
                email: row.try_get("email")?,
                phone: get_heapless_string(row, "phone")?,
                city: row.try_get("city")?,
                property_type: row.try_get("property_type")?,
                bhk: row.try_get("bhk")?,
                purpose: row.try_get("purpose")?,
                budget_min: row.try_get("budget_min")?,
                budget_max: row.try_get("budget_max")?,
                timeline: row.try_get("timeline")?,
                source: row.try_get("source")?,
                notes: row.try_get("notes")?,
                tags: row.try_get("tags")?,
                status: row.try_get("status")?,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
