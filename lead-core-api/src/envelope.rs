use lead_core_db::BuyerModel;
use serde::Serialize;

use crate::error::{ApiError, FieldError, RowError};
use crate::rate_limit::RateDecision;

/// Failure body returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_errors: Option<Vec<RowError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<BuyerModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateDecision>,
}

impl ErrorEnvelope {
    fn message(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
            row_errors: None,
            valid_count: None,
            missing: None,
            count: None,
            current: None,
            rate_limit: None,
        }
    }
}

impl From<&ApiError> for ErrorEnvelope {
    fn from(err: &ApiError) -> Self {
        let mut envelope = ErrorEnvelope::message(err.to_string());
        match err {
            ApiError::Validation(errors) => envelope.errors = Some(errors.clone()),
            ApiError::InvalidRequest { missing, count, .. } => {
                envelope.missing = (!missing.is_empty()).then(|| missing.clone());
                envelope.count = *count;
            }
            ApiError::RowValidation { errors, valid_count } => {
                envelope.row_errors = Some(errors.clone());
                envelope.valid_count = Some(*valid_count);
            }
            ApiError::RateLimited(decision) => envelope.rate_limit = Some(decision.clone()),
            ApiError::Conflict(current) => envelope.current = Some(current.as_ref().clone()),
            ApiError::Unauthenticated
            | ApiError::Forbidden
            | ApiError::NotFound(_)
            | ApiError::Storage => {}
        }
        envelope
    }
}

impl ApiError {
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::from(self)
    }

    /// Extra response headers; only rate limit denials carry any
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            ApiError::RateLimited(decision) => decision.headers().to_vec(),
            _ => Vec::new(),
        }
    }
}

/// Success body wrapping an operation result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessEnvelope<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> SuccessEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}
