pub mod audit;
pub mod buyer;
pub mod common_enums;
pub mod identifiable;

pub use audit::{AuditDiff, AuditEntryModel, FieldChange, FieldValue, TrackedField, TrackedFields};
pub use buyer::{BuyerDetails, BuyerFilter, BuyerModel};
pub use common_enums::*;
pub use identifiable::Identifiable;
