use lead_core_db::BuyerModel;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::rate_limit::RateDecision;

/// One failed check, addressed by the camelCase field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validation failures of one import row. `row` is 1-based and counts the
/// header line, so the first data row is row 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub errors: Vec<FieldError>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Batch-level rejection of an import (empty, too large, missing headers)
    #[error("{message}")]
    InvalidRequest {
        message: String,
        missing: Vec<String>,
        count: Option<usize>,
    },

    #[error("Row validation errors")]
    RowValidation {
        errors: Vec<RowError>,
        valid_count: usize,
    },

    #[error("Rate limit exceeded")]
    RateLimited(RateDecision),

    /// Carries the current stored record so the client can refresh
    #[error("Record changed, please refresh")]
    Conflict(Box<BuyerModel>),

    #[error("Internal server error")]
    Storage,
}

impl ApiError {
    /// Logs the underlying failure and returns the generic storage error.
    /// Callers never see the storage detail.
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        error!(context, error = %err, "storage failure");
        ApiError::Storage
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::InvalidRequest {
            message: message.into(),
            missing: Vec::new(),
            count: None,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthenticated => 401,
            ApiError::Forbidden => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Validation(_)
            | ApiError::InvalidRequest { .. }
            | ApiError::RowValidation { .. } => 400,
            ApiError::RateLimited(_) => 429,
            ApiError::Conflict(_) => 409,
            ApiError::Storage => 500,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthenticated.status_code(), 401);
        assert_eq!(ApiError::Forbidden.status_code(), 403);
        assert_eq!(ApiError::NotFound("buyer".into()).status_code(), 404);
        assert_eq!(ApiError::Validation(vec![]).status_code(), 400);
        assert_eq!(ApiError::invalid_request("CSV is empty").status_code(), 400);
        assert_eq!(ApiError::Storage.status_code(), 500);
    }

    #[test]
    fn test_storage_hides_detail() {
        let err = ApiError::storage("insert buyers", "relation \"buyer\" does not exist");
        assert_eq!(err.to_string(), "Internal server error");
    }
}
