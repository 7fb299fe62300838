use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed set of values with a canonical text code.
///
/// `CODES` lists the canonical codes in declaration order and is used to
/// build "must be one of" messages.
pub trait ClosedEnum: Sized + Copy + FromStr {
    const CODES: &'static [&'static str];

    fn code(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "city", rename_all = "PascalCase")]
pub enum City {
    Chandigarh,
    Mohali,
    Zirakpur,
    Panchkula,
    Other,
}

impl ClosedEnum for City {
    const CODES: &'static [&'static str] = &["Chandigarh", "Mohali", "Zirakpur", "Panchkula", "Other"];

    fn code(&self) -> &'static str {
        match self {
            City::Chandigarh => "Chandigarh",
            City::Mohali => "Mohali",
            City::Zirakpur => "Zirakpur",
            City::Panchkula => "Panchkula",
            City::Other => "Other",
        }
    }
}

impl FromStr for City {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Chandigarh" => Ok(City::Chandigarh),
            "Mohali" => Ok(City::Mohali),
            "Zirakpur" => Ok(City::Zirakpur),
            "Panchkula" => Ok(City::Panchkula),
            "Other" => Ok(City::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "property_type", rename_all = "PascalCase")]
pub enum PropertyType {
    Apartment,
    Villa,
    Plot,
    Office,
    Retail,
}

impl PropertyType {
    /// Residential types carry a bedroom configuration.
    pub fn requires_bhk(&self) -> bool {
        matches!(self, PropertyType::Apartment | PropertyType::Villa)
    }
}

impl ClosedEnum for PropertyType {
    const CODES: &'static [&'static str] = &["Apartment", "Villa", "Plot", "Office", "Retail"];

    fn code(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::Villa => "Villa",
            PropertyType::Plot => "Plot",
            PropertyType::Office => "Office",
            PropertyType::Retail => "Retail",
        }
    }
}

impl FromStr for PropertyType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Apartment" => Ok(PropertyType::Apartment),
            "Villa" => Ok(PropertyType::Villa),
            "Plot" => Ok(PropertyType::Plot),
            "Office" => Ok(PropertyType::Office),
            "Retail" => Ok(PropertyType::Retail),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bhk")]
pub enum Bhk {
    #[serde(rename = "BHK1")]
    #[sqlx(rename = "BHK1")]
    One,
    #[serde(rename = "BHK2")]
    #[sqlx(rename = "BHK2")]
    Two,
    #[serde(rename = "BHK3")]
    #[sqlx(rename = "BHK3")]
    Three,
    #[serde(rename = "BHK4")]
    #[sqlx(rename = "BHK4")]
    Four,
    Studio,
}

impl ClosedEnum for Bhk {
    const CODES: &'static [&'static str] = &["BHK1", "BHK2", "BHK3", "BHK4", "Studio"];

    fn code(&self) -> &'static str {
        match self {
            Bhk::One => "BHK1",
            Bhk::Two => "BHK2",
            Bhk::Three => "BHK3",
            Bhk::Four => "BHK4",
            Bhk::Studio => "Studio",
        }
    }
}

impl FromStr for Bhk {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BHK1" => Ok(Bhk::One),
            "BHK2" => Ok(Bhk::Two),
            "BHK3" => Ok(Bhk::Three),
            "BHK4" => Ok(Bhk::Four),
            "Studio" => Ok(Bhk::Studio),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "purpose", rename_all = "PascalCase")]
pub enum Purpose {
    Buy,
    Rent,
}

impl ClosedEnum for Purpose {
    const CODES: &'static [&'static str] = &["Buy", "Rent"];

    fn code(&self) -> &'static str {
        match self {
            Purpose::Buy => "Buy",
            Purpose::Rent => "Rent",
        }
    }
}

impl FromStr for Purpose {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buy" => Ok(Purpose::Buy),
            "Rent" => Ok(Purpose::Rent),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "timeline")]
pub enum Timeline {
    #[serde(rename = "ZERO_3M")]
    #[sqlx(rename = "ZERO_3M")]
    ZeroToThreeMonths,
    #[serde(rename = "THREE_6M")]
    #[sqlx(rename = "THREE_6M")]
    ThreeToSixMonths,
    #[serde(rename = "GT_6M")]
    #[sqlx(rename = "GT_6M")]
    MoreThanSixMonths,
    Exploring,
}

impl ClosedEnum for Timeline {
    const CODES: &'static [&'static str] = &["ZERO_3M", "THREE_6M", "GT_6M", "Exploring"];

    fn code(&self) -> &'static str {
        match self {
            Timeline::ZeroToThreeMonths => "ZERO_3M",
            Timeline::ThreeToSixMonths => "THREE_6M",
            Timeline::MoreThanSixMonths => "GT_6M",
            Timeline::Exploring => "Exploring",
        }
    }
}

impl FromStr for Timeline {
    type Err = ();

    /// Accepts the canonical codes and the display labels shown in forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ZERO_3M" | "0-3m" => Ok(Timeline::ZeroToThreeMonths),
            "THREE_6M" | "3-6m" => Ok(Timeline::ThreeToSixMonths),
            "GT_6M" | ">6m" => Ok(Timeline::MoreThanSixMonths),
            "Exploring" => Ok(Timeline::Exploring),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_source")]
pub enum LeadSource {
    Website,
    Referral,
    #[serde(rename = "Walk_in")]
    #[sqlx(rename = "Walk_in")]
    WalkIn,
    Call,
    Other,
}

impl ClosedEnum for LeadSource {
    const CODES: &'static [&'static str] = &["Website", "Referral", "Walk_in", "Call", "Other"];

    fn code(&self) -> &'static str {
        match self {
            LeadSource::Website => "Website",
            LeadSource::Referral => "Referral",
            LeadSource::WalkIn => "Walk_in",
            LeadSource::Call => "Call",
            LeadSource::Other => "Other",
        }
    }
}

impl FromStr for LeadSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Website" => Ok(LeadSource::Website),
            "Referral" => Ok(LeadSource::Referral),
            "Walk_in" | "Walk-in" => Ok(LeadSource::WalkIn),
            "Call" => Ok(LeadSource::Call),
            "Other" => Ok(LeadSource::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "buyer_status", rename_all = "PascalCase")]
pub enum BuyerStatus {
    #[default]
    New,
    Qualified,
    Contacted,
    Visited,
    Negotiation,
    Converted,
    Dropped,
}

impl ClosedEnum for BuyerStatus {
    const CODES: &'static [&'static str] = &[
        "New",
        "Qualified",
        "Contacted",
        "Visited",
        "Negotiation",
        "Converted",
        "Dropped",
    ];

    fn code(&self) -> &'static str {
        match self {
            BuyerStatus::New => "New",
            BuyerStatus::Qualified => "Qualified",
            BuyerStatus::Contacted => "Contacted",
            BuyerStatus::Visited => "Visited",
            BuyerStatus::Negotiation => "Negotiation",
            BuyerStatus::Converted => "Converted",
            BuyerStatus::Dropped => "Dropped",
        }
    }
}

impl FromStr for BuyerStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(BuyerStatus::New),
            "Qualified" => Ok(BuyerStatus::Qualified),
            "Contacted" => Ok(BuyerStatus::Contacted),
            "Visited" => Ok(BuyerStatus::Visited),
            "Negotiation" => Ok(BuyerStatus::Negotiation),
            "Converted" => Ok(BuyerStatus::Converted),
            "Dropped" => Ok(BuyerStatus::Dropped),
            _ => Err(()),
        }
    }
}

macro_rules! display_by_code {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.code())
                }
            }
        )*
    };
}

display_by_code!(City, PropertyType, Bhk, Purpose, Timeline, LeadSource, BuyerStatus);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_str() {
        for code in Timeline::CODES {
            let parsed: Timeline = code.parse().unwrap();
            assert_eq!(parsed.code(), *code);
        }
        for code in LeadSource::CODES {
            let parsed: LeadSource = code.parse().unwrap();
            assert_eq!(parsed.to_string(), *code);
        }
    }

    #[test]
    fn test_display_labels_are_accepted_as_aliases() {
        assert_eq!("0-3m".parse::<Timeline>(), Ok(Timeline::ZeroToThreeMonths));
        assert_eq!(">6m".parse::<Timeline>(), Ok(Timeline::MoreThanSixMonths));
        assert_eq!("Walk-in".parse::<LeadSource>(), Ok(LeadSource::WalkIn));
        assert!("apartment".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_codes() {
        assert_eq!(serde_json::to_string(&Bhk::Two).unwrap(), "\"BHK2\"");
        assert_eq!(
            serde_json::to_string(&Timeline::ThreeToSixMonths).unwrap(),
            "\"THREE_6M\""
        );
        assert_eq!(BuyerStatus::default(), BuyerStatus::New);
    }

    #[test]
    fn test_requires_bhk() {
        assert!(PropertyType::Apartment.requires_bhk());
        assert!(PropertyType::Villa.requires_bhk());
        assert!(!PropertyType::Plot.requires_bhk());
    }
}
