use chrono::Utc;
use heapless::String as HeaplessString;
use lead_core_db::{
    Bhk, BuyerDetails, BuyerModel, BuyerStatus, City, LeadSource, PropertyType, Purpose, Timeline,
};

pub fn create_test_buyer(full_name: &str) -> BuyerModel {
    BuyerModel::new(
        "test-owner",
        BuyerDetails {
            full_name: full_name.to_string(),
            email: Some("lead@example.com".to_string()),
            phone: HeaplessString::try_from("9876543210").unwrap(),
            city: City::Zirakpur,
            property_type: PropertyType::Villa,
            bhk: Some(Bhk::Three),
            purpose: Purpose::Buy,
            budget_min: Some(7_500_000),
            budget_max: None,
            timeline: Timeline::ThreeToSixMonths,
            source: LeadSource::Referral,
            notes: None,
            tags: vec!["weekend".to_string()],
            status: BuyerStatus::New,
        },
        Utc::now(),
    )
}
