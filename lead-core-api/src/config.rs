use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rate_limit::{OperationClass, RateBudget};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitConfig {
    pub create: RateBudget,
    pub update: RateBudget,
    pub import: RateBudget,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            create: RateBudget::new(5, 60),
            update: RateBudget::new(10, 60),
            import: RateBudget::new(3, 300),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rateLimits.{class}.windowSecs must be between 1 and {max}, got {window_secs}")]
    InvalidWindow {
        class: &'static str,
        window_secs: u64,
        max: u64,
    },
}

impl RateLimitConfig {
    /// Rejects budgets whose window is empty or longer than
    /// [`RateBudget::MAX_WINDOW_SECS`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (class, budget) in [("create", self.create), ("update", self.update), ("import", self.import)] {
            if budget.window_secs == 0 || budget.window_secs > RateBudget::MAX_WINDOW_SECS {
                return Err(ConfigError::InvalidWindow {
                    class,
                    window_secs: budget.window_secs,
                    max: RateBudget::MAX_WINDOW_SECS,
                });
            }
        }
        Ok(())
    }

    pub fn budget_for(&self, class: OperationClass) -> RateBudget {
        match class {
            OperationClass::Create => self.create,
            OperationClass::Update => self.update,
            OperationClass::Import => self.import,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Upper bound on data rows per import batch
    pub max_import_rows: usize,

    /// Tolerated difference between the client token and the stored
    /// `updatedAt`, in milliseconds
    pub concurrency_skew_ms: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_import_rows: 200,
            concurrency_skew_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadCoreConfig {
    pub rate_limits: RateLimitConfig,
    pub pipeline: PipelineConfig,
}

impl LeadCoreConfig {
    /// Parses and validates a JSON document. Missing sections and keys keep
    /// their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.rate_limits.validate()?;
        Ok(config)
    }
}
