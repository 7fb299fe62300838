use heapless::String as HeaplessString;
use lead_core_db::{
    Bhk, BuyerDetails, BuyerStatus, City, ClosedEnum, LeadSource, PropertyType, Purpose,
    Timeline, TrackedField,
};
use regex::Regex;
use std::sync::LazyLock;
use validator::Validate;

use crate::error::FieldError;
use crate::validation::input::{BuyerInput, NumericInput};

pub const MAX_TAG_LENGTH: usize = 32;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,15}$").expect("phone pattern compiles"));

/// Free-text checks delegated to the `validator` derive. Blank values are
/// filtered out before these run.
#[derive(Debug, Validate)]
struct TextChecks {
    #[validate(length(min = 2, max = 80, message = "fullName must be between 2 and 80 characters"))]
    full_name: Option<String>,

    #[validate(email(message = "email must be a valid email address"))]
    email: Option<String>,

    #[validate(regex(path = *PHONE_PATTERN, message = "phone must be 10-15 digits"))]
    phone: Option<String>,

    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    notes: Option<String>,
}

fn text_check_field(name: &str) -> TrackedField {
    match name {
        "full_name" => TrackedField::FullName,
        "email" => TrackedField::Email,
        "phone" => TrackedField::Phone,
        _ => TrackedField::Notes,
    }
}

/// Errors collected against tracked fields, plus the concurrency token
/// which is not a tracked field and always sorts last.
#[derive(Debug, Default)]
struct Collected {
    errors: Vec<(usize, FieldError)>,
}

impl Collected {
    fn push(&mut self, field: TrackedField, message: impl Into<String>) {
        self.errors
            .push((field.position(), FieldError::new(field.as_str(), message)));
    }

    fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_sorted(mut self) -> Vec<FieldError> {
        self.errors.sort_by_key(|(position, _)| *position);
        self.errors.into_iter().map(|(_, error)| error).collect()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn one_of_message<E: ClosedEnum>(field: TrackedField) -> String {
    format!("{field} must be one of: {}", E::CODES.join(", "))
}

fn parse_required<E: ClosedEnum>(
    value: &Option<String>,
    field: TrackedField,
    errors: &mut Collected,
) -> Option<E> {
    match present(value) {
        None => {
            errors.push(field, format!("{field} is required"));
            None
        }
        Some(raw) => match raw.parse::<E>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(field, one_of_message::<E>(field));
                None
            }
        },
    }
}

/// `Ok(None)` when absent, `Err(())` when present but not a valid code
fn parse_optional<E: ClosedEnum>(
    value: &Option<String>,
    field: TrackedField,
    errors: &mut Collected,
) -> Result<Option<E>, ()> {
    match present(value) {
        None => Ok(None),
        Some(raw) => raw.parse::<E>().map(Some).map_err(|_| {
            errors.push(field, one_of_message::<E>(field));
        }),
    }
}

fn positive_integer(value: &NumericInput) -> Result<Option<i64>, ()> {
    let from_float = |f: f64| {
        if f.is_finite() && f.fract() == 0.0 && f > 0.0 && f < i64::MAX as f64 {
            Ok(Some(f as i64))
        } else {
            Err(())
        }
    };

    match value {
        NumericInput::Number(number) => match number.as_i64() {
            Some(n) if n > 0 => Ok(Some(n)),
            Some(_) => Err(()),
            None if number.is_u64() => Err(()),
            None => number.as_f64().map_or(Err(()), from_float),
        },
        NumericInput::Text(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',' && *c != '_')
                .collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            match cleaned.parse::<i64>() {
                Ok(n) if n > 0 => Ok(Some(n)),
                Ok(_) => Err(()),
                Err(_) => cleaned.parse::<f64>().map_or(Err(()), from_float),
            }
        }
    }
}

fn parse_budget(
    value: &Option<NumericInput>,
    field: TrackedField,
    errors: &mut Collected,
) -> Result<Option<i64>, ()> {
    match value {
        None => Ok(None),
        Some(raw) => positive_integer(raw).map_err(|_| {
            errors.push(field, format!("{field} must be a positive integer"));
        }),
    }
}

fn normalize_tags(value: &Option<Vec<String>>, errors: &mut Collected) -> Vec<String> {
    let tags: Vec<String> = value
        .iter()
        .flatten()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();

    if tags.iter().any(|tag| tag.chars().count() > MAX_TAG_LENGTH) {
        errors.push(
            TrackedField::Tags,
            format!("tags must be at most {MAX_TAG_LENGTH} characters each"),
        );
    }
    tags
}

/// Turns an untrusted [`BuyerInput`] into validated [`BuyerDetails`].
///
/// Every check runs; the full error list is returned in tracked-field
/// order. Pure, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, input: &BuyerInput) -> Result<BuyerDetails, Vec<FieldError>> {
        let mut errors = Collected::default();

        let full_name = present(&input.full_name).map(str::to_string);
        let email = present(&input.email).map(str::to_string);
        let phone = present(&input.phone).map(str::to_string);
        let notes = present(&input.notes).map(str::to_string);

        if full_name.is_none() {
            errors.push(TrackedField::FullName, "fullName is required");
        }
        if phone.is_none() {
            errors.push(TrackedField::Phone, "phone is required");
        }

        let checks = TextChecks {
            full_name: full_name.clone(),
            email: email.clone(),
            phone: phone.clone(),
            notes: notes.clone(),
        };
        if let Err(report) = checks.validate() {
            for (name, failures) in report.field_errors() {
                let field = text_check_field(name.as_ref());
                for failure in failures {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid"));
                    errors.push(field, message);
                }
            }
        }

        let city = parse_required::<City>(&input.city, TrackedField::City, &mut errors);
        let property_type =
            parse_required::<PropertyType>(&input.property_type, TrackedField::PropertyType, &mut errors);
        let purpose = parse_required::<Purpose>(&input.purpose, TrackedField::Purpose, &mut errors);
        let timeline = parse_required::<Timeline>(&input.timeline, TrackedField::Timeline, &mut errors);
        let source = parse_required::<LeadSource>(&input.source, TrackedField::Source, &mut errors);
        let status = parse_optional::<BuyerStatus>(&input.status, TrackedField::Status, &mut errors)
            .ok()
            .flatten()
            .unwrap_or_default();

        // bhk is only meaningful for residential types and is dropped otherwise
        let bhk = match property_type {
            Some(kind) if kind.requires_bhk() => {
                let parsed = parse_optional::<Bhk>(&input.bhk, TrackedField::Bhk, &mut errors);
                if parsed == Ok(None) {
                    errors.push(TrackedField::Bhk, "bhk required for Apartment/Villa");
                }
                parsed.ok().flatten()
            }
            _ => None,
        };

        let budget_min = parse_budget(&input.budget_min, TrackedField::BudgetMin, &mut errors);
        let budget_max = parse_budget(&input.budget_max, TrackedField::BudgetMax, &mut errors);
        if let (Ok(Some(min)), Ok(Some(max))) = (budget_min, budget_max) {
            if max < min {
                errors.push(TrackedField::BudgetMax, "budgetMax must be >= budgetMin");
            }
        }

        let tags = normalize_tags(&input.tags, &mut errors);

        if !errors.is_empty() {
            return Err(errors.into_sorted());
        }

        let (Some(full_name), Some(phone), Some(city), Some(property_type), Some(purpose), Some(timeline), Some(source)) =
            (full_name, phone, city, property_type, purpose, timeline, source)
        else {
            return Err(errors.into_sorted());
        };
        let Ok(phone) = HeaplessString::try_from(phone.as_str()) else {
            let mut errors = Collected::default();
            errors.push(TrackedField::Phone, "phone must be 10-15 digits");
            return Err(errors.into_sorted());
        };

        Ok(BuyerDetails {
            full_name,
            email,
            phone,
            city,
            property_type,
            bhk,
            purpose,
            budget_min: budget_min.ok().flatten(),
            budget_max: budget_max.ok().flatten(),
            timeline,
            source,
            notes,
            tags,
            status,
        })
    }
}
