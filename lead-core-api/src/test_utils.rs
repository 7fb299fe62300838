use heapless::String as HeaplessString;
use lead_core_db::memory::InMemoryStore;
use lead_core_db::repository::UnitOfWork;
use lead_core_db::{
    Bhk, BuyerDetails, BuyerStatus, City, LeadSource, PropertyType, Purpose, Timeline,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LeadCoreConfig;
use crate::rate_limit::{InMemoryCounterStore, RateGovernor};
use crate::service::{MutationCoordinator, RequestContext};
use crate::validation::{BuyerInput, NumericInput, SchemaValidator};

pub type TestCoordinator = MutationCoordinator<InMemoryStore, InMemoryCounterStore>;

pub fn test_coordinator() -> (Arc<TestCoordinator>, InMemoryStore) {
    let store = InMemoryStore::new();
    (coordinator_over(store.clone()), store)
}

/// Coordinator with default config over any unit of work
pub fn coordinator_over<U: UnitOfWork>(
    unit_of_work: U,
) -> Arc<MutationCoordinator<U, InMemoryCounterStore>> {
    let config = LeadCoreConfig::default();
    let governor = RateGovernor::new(Arc::new(InMemoryCounterStore::new()), config.rate_limits);
    Arc::new(MutationCoordinator::new(
        Arc::new(unit_of_work),
        governor,
        SchemaValidator::new(),
        config.pipeline,
    ))
}

pub fn owner_ctx() -> RequestContext {
    RequestContext::authenticated("user-1")
}

pub fn valid_input(full_name: &str) -> BuyerInput {
    BuyerInput {
        full_name: Some(full_name.to_string()),
        email: Some("lead@example.com".to_string()),
        phone: Some("9876543210".to_string()),
        city: Some("Chandigarh".to_string()),
        property_type: Some("Apartment".to_string()),
        bhk: Some("BHK2".to_string()),
        purpose: Some("Buy".to_string()),
        budget_min: Some(NumericInput::from(2_500_000_i64)),
        budget_max: Some(NumericInput::from(3_500_000_i64)),
        timeline: Some("ZERO_3M".to_string()),
        source: Some("Website".to_string()),
        notes: None,
        tags: Some(vec!["hot-lead".to_string()]),
        status: None,
    }
}

pub fn sample_details(full_name: &str) -> BuyerDetails {
    BuyerDetails {
        full_name: full_name.to_string(),
        email: Some("lead@example.com".to_string()),
        phone: HeaplessString::try_from("9876543210").unwrap(),
        city: City::Chandigarh,
        property_type: PropertyType::Apartment,
        bhk: Some(Bhk::Two),
        purpose: Purpose::Buy,
        budget_min: Some(2_500_000),
        budget_max: Some(3_500_000),
        timeline: Timeline::ZeroToThreeMonths,
        source: LeadSource::Website,
        notes: None,
        tags: vec!["hot-lead".to_string()],
        status: BuyerStatus::New,
    }
}

/// Import row with every required column present
pub fn csv_row(full_name: &str) -> HashMap<String, String> {
    [
        ("fullName", full_name),
        ("email", "lead@example.com"),
        ("phone", "9876543210"),
        ("city", "Chandigarh"),
        ("propertyType", "Apartment"),
        ("bhk", "2bhk"),
        ("purpose", "Buy"),
        ("budgetMin", "2500000"),
        ("budgetMax", "3,500,000"),
        ("timeline", "0-3m"),
        ("source", "Website"),
        ("notes", ""),
        ("tags", "hot-lead"),
        ("status", "New"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
