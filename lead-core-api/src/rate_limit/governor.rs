use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::config::RateLimitConfig;
use crate::rate_limit::counter_store::{CounterStore, RateDecision};

/// Mutating operation classes, each with its own budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationClass {
    Create,
    Update,
    Import,
}

impl OperationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationClass::Create => "create",
            OperationClass::Update => "update",
            OperationClass::Import => "import",
        }
    }
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admits or denies mutating requests per (class, identity).
///
/// Admitted requests are counted, denied ones are not.
pub struct RateGovernor<C: CounterStore> {
    store: Arc<C>,
    budgets: RateLimitConfig,
}

impl<C: CounterStore> RateGovernor<C> {
    pub fn new(store: Arc<C>, budgets: RateLimitConfig) -> Self {
        Self { store, budgets }
    }

    pub fn budgets(&self) -> &RateLimitConfig {
        &self.budgets
    }

    pub async fn check(
        &self,
        identity: &str,
        class: OperationClass,
    ) -> Result<RateDecision, Box<dyn Error + Send + Sync>> {
        self.check_at(identity, class, Utc::now()).await
    }

    pub async fn check_at(
        &self,
        identity: &str,
        class: OperationClass,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, Box<dyn Error + Send + Sync>> {
        let key = format!("{class}:{identity}");
        self.store
            .record_hit(&key, self.budgets.budget_for(class), now)
            .await
    }
}
