use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Business fields eligible for audit comparison.
///
/// Declaration order is the canonical field order: audit diffs, validation
/// error lists and the flat export columns all follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedField {
    FullName,
    Email,
    Phone,
    City,
    PropertyType,
    Bhk,
    Purpose,
    BudgetMin,
    BudgetMax,
    Timeline,
    Source,
    Notes,
    Tags,
    Status,
}

impl TrackedField {
    pub const ALL: [TrackedField; 14] = [
        TrackedField::FullName,
        TrackedField::Email,
        TrackedField::Phone,
        TrackedField::City,
        TrackedField::PropertyType,
        TrackedField::Bhk,
        TrackedField::Purpose,
        TrackedField::BudgetMin,
        TrackedField::BudgetMax,
        TrackedField::Timeline,
        TrackedField::Source,
        TrackedField::Notes,
        TrackedField::Tags,
        TrackedField::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedField::FullName => "fullName",
            TrackedField::Email => "email",
            TrackedField::Phone => "phone",
            TrackedField::City => "city",
            TrackedField::PropertyType => "propertyType",
            TrackedField::Bhk => "bhk",
            TrackedField::Purpose => "purpose",
            TrackedField::BudgetMin => "budgetMin",
            TrackedField::BudgetMax => "budgetMax",
            TrackedField::Timeline => "timeline",
            TrackedField::Source => "source",
            TrackedField::Notes => "notes",
            TrackedField::Tags => "tags",
            TrackedField::Status => "status",
        }
    }

    /// Position in the canonical field order
    pub fn position(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackedField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackedField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or(())
    }
}

/// Comparable value of one tracked field.
///
/// Empty text normalizes to `Null`, so an absent email and an empty email
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: &str) -> Self {
        Self::optional_text(Some(value))
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => FieldValue::Text(v.to_string()),
            _ => FieldValue::Null,
        }
    }

    pub fn optional_integer(value: Option<i64>) -> Self {
        value.map(FieldValue::Integer).unwrap_or(FieldValue::Null)
    }
}

/// Read access to tracked fields for diffing.
pub trait TrackedFields {
    fn tracked_value(&self, field: TrackedField) -> FieldValue;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: FieldValue,
    pub after: FieldValue,
}

/// Payload of an audit entry.
///
/// # Documentation
/// - `Changes` serializes as a JSON object keyed by field name, in tracked-field order
/// - `Imported` serializes as `{"imported": true}` and marks rows created by a bulk import
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditDiff {
    Changes(Vec<(TrackedField, FieldChange)>),
    Imported,
}

impl AuditDiff {
    pub fn empty() -> Self {
        AuditDiff::Changes(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AuditDiff::Changes(changes) if changes.is_empty())
    }

    pub fn change(&self, field: TrackedField) -> Option<&FieldChange> {
        match self {
            AuditDiff::Changes(changes) => changes
                .iter()
                .find(|(f, _)| *f == field)
                .map(|(_, change)| change),
            AuditDiff::Imported => None,
        }
    }

    pub fn fields(&self) -> Vec<TrackedField> {
        match self {
            AuditDiff::Changes(changes) => changes.iter().map(|(f, _)| *f).collect(),
            AuditDiff::Imported => Vec::new(),
        }
    }
}

impl Serialize for AuditDiff {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            AuditDiff::Changes(changes) => {
                let mut map = serializer.serialize_map(Some(changes.len()))?;
                for (field, change) in changes {
                    map.serialize_entry(field.as_str(), change)?;
                }
                map.end()
            }
            AuditDiff::Imported => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("imported", &true)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for AuditDiff {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AuditDiffVisitor;

        impl<'de> Visitor<'de> for AuditDiffVisitor {
            type Value = AuditDiff;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field changes or an import marker")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut changes = Vec::new();
                while let Some(key) = access.next_key::<String>()? {
                    if key == "imported" {
                        let _: bool = access.next_value()?;
                        return Ok(AuditDiff::Imported);
                    }
                    let field = TrackedField::from_str(&key).map_err(|_| {
                        serde::de::Error::custom(format!("Unknown tracked field: {key}"))
                    })?;
                    changes.push((field, access.next_value::<FieldChange>()?));
                }
                Ok(AuditDiff::Changes(changes))
            }
        }

        deserializer.deserialize_map(AuditDiffVisitor)
    }
}

/// # Documentation
/// - One entry per successful create, update or imported row
/// - Written in the same transaction as the buyer row it describes
/// - Never updated or deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryModel {
    pub id: Uuid,

    /// References BuyerModel.id (non-owning)
    pub buyer_id: Uuid,

    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub diff: AuditDiff,

    /// Hash of the entry with hash field set to 0
    pub hash: i64,
}

impl AuditEntryModel {
    pub fn new(
        buyer_id: Uuid,
        changed_by: impl Into<String>,
        changed_at: DateTime<Utc>,
        diff: AuditDiff,
    ) -> Result<Self, String> {
        let mut entry = Self {
            id: Uuid::new_v4(),
            buyer_id,
            changed_by: changed_by.into(),
            changed_at: crate::utils::storage_timestamp(changed_at),
            diff,
            hash: 0,
        };
        entry.hash = entry.compute_hash()?;
        Ok(entry)
    }

    pub fn compute_hash(&self) -> Result<i64, String> {
        let mut entity_for_hashing = self.clone();
        entity_for_hashing.hash = 0;
        crate::utils::hash_as_i64(&entity_for_hashing)
    }

    /// True when the stored hash still matches the entry content
    pub fn verify_hash(&self) -> bool {
        self.compute_hash().is_ok_and(|hash| hash == self.hash)
    }
}

impl Identifiable for AuditEntryModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
