use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::audit::{FieldValue, TrackedField, TrackedFields};
use crate::models::common_enums::{
    Bhk, BuyerStatus, City, ClosedEnum, LeadSource, PropertyType, Purpose, Timeline,
};
use crate::models::identifiable::Identifiable;

/// Maximum number of digits accepted for a phone number.
pub const PHONE_MAX_DIGITS: usize = 15;

/// Validated business fields of a buyer lead.
///
/// This is everything a client can edit. Identity, ownership and timestamps
/// live on [`BuyerModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerDetails {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: HeaplessString<PHONE_MAX_DIGITS>,
    pub city: City,
    pub property_type: PropertyType,
    /// Only set for property types where [`PropertyType::requires_bhk`] holds
    pub bhk: Option<Bhk>,
    pub purpose: Purpose,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: Timeline,
    pub source: LeadSource,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub status: BuyerStatus,
}

impl TrackedFields for BuyerDetails {
    fn tracked_value(&self, field: TrackedField) -> FieldValue {
        match field {
            TrackedField::FullName => FieldValue::text(&self.full_name),
            TrackedField::Email => FieldValue::optional_text(self.email.as_deref()),
            TrackedField::Phone => FieldValue::text(self.phone.as_str()),
            TrackedField::City => FieldValue::text(self.city.code()),
            TrackedField::PropertyType => FieldValue::text(self.property_type.code()),
            TrackedField::Bhk => FieldValue::optional_text(self.bhk.as_ref().map(|b| b.code())),
            TrackedField::Purpose => FieldValue::text(self.purpose.code()),
            TrackedField::BudgetMin => FieldValue::optional_integer(self.budget_min),
            TrackedField::BudgetMax => FieldValue::optional_integer(self.budget_max),
            TrackedField::Timeline => FieldValue::text(self.timeline.code()),
            TrackedField::Source => FieldValue::text(self.source.code()),
            TrackedField::Notes => FieldValue::optional_text(self.notes.as_deref()),
            TrackedField::Tags => FieldValue::List(self.tags.clone()),
            TrackedField::Status => FieldValue::text(self.status.code()),
        }
    }
}

/// Database model for a buyer lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerModel {
    pub id: Uuid,

    /// Identity of the authenticated creator. Set once at creation.
    pub owner_id: String,

    #[serde(flatten)]
    pub details: BuyerDetails,

    pub created_at: DateTime<Utc>,

    /// Concurrency token
    /// - Clients echo the value they last observed on update
    /// - Every successful write moves it strictly forward
    pub updated_at: DateTime<Utc>,
}

impl BuyerModel {
    pub fn new(owner_id: impl Into<String>, details: BuyerDetails, now: DateTime<Utc>) -> Self {
        let now = crate::utils::storage_timestamp(now);
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            details,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Identifiable for BuyerModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl TrackedFields for BuyerModel {
    fn tracked_value(&self, field: TrackedField) -> FieldValue {
        self.details.tracked_value(field)
    }
}

/// Read filter for listing and exporting buyers.
///
/// All criteria are optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerFilter {
    pub city: Option<City>,
    pub property_type: Option<PropertyType>,
    pub status: Option<BuyerStatus>,
    pub timeline: Option<Timeline>,
    /// Case-insensitive match on name, email and notes; plain match on phone
    pub search: Option<String>,
}

impl BuyerFilter {
    pub fn matches(&self, buyer: &BuyerModel) -> bool {
        let details = &buyer.details;
        if self.city.is_some_and(|city| city != details.city) {
            return false;
        }
        if self.property_type.is_some_and(|t| t != details.property_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != details.status) {
            return false;
        }
        if self.timeline.is_some_and(|t| t != details.timeline) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let needle = term.to_lowercase();
                let contains = |value: Option<&str>| {
                    value.is_some_and(|v| v.to_lowercase().contains(&needle))
                };
                contains(Some(&details.full_name))
                    || contains(details.email.as_deref())
                    || contains(details.notes.as_deref())
                    || details.phone.as_str().contains(term)
            }
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;

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
}

#[cfg(test)]
mod tests {
    use super::test_utils::sample_details;
    use super::*;

    #[test]
    fn test_serializes_flat_camel_case() {
        let buyer = BuyerModel::new("user-1", sample_details("Asha Verma"), Utc::now());
        let json = serde_json::to_value(&buyer).unwrap();

        assert_eq!(json["ownerId"], "user-1");
        assert_eq!(json["fullName"], "Asha Verma");
        assert_eq!(json["propertyType"], "Apartment");
        assert_eq!(json["bhk"], "BHK2");
        assert_eq!(json["timeline"], "ZERO_3M");
        assert!(json.get("details").is_none());

        let back: BuyerModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, buyer);
    }

    #[test]
    fn test_filter_matches_search_and_enums() {
        let mut details = sample_details("Asha Verma");
        details.notes = Some("Prefers SECTOR 22".to_string());
        let buyer = BuyerModel::new("user-1", details, Utc::now());

        let by_note = BuyerFilter {
            search: Some("sector".to_string()),
            ..Default::default()
        };
        assert!(by_note.matches(&buyer));

        let by_phone = BuyerFilter {
            search: Some("98765".to_string()),
            city: Some(City::Chandigarh),
            ..Default::default()
        };
        assert!(by_phone.matches(&buyer));

        let wrong_city = BuyerFilter {
            city: Some(City::Mohali),
            ..Default::default()
        };
        assert!(!wrong_city.matches(&buyer));
    }
}
