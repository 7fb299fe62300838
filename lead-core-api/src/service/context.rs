use crate::error::{ApiError, ApiResult};
use crate::rate_limit::{resolve_identity, ClientHeaders};

/// Caller identity resolved by the surrounding transport layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub client: ClientHeaders,
}

impl RequestContext {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            client: ClientHeaders::default(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: ClientHeaders) -> Self {
        self.client = client;
        self
    }

    pub fn require_user(&self) -> ApiResult<&str> {
        self.user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::Unauthenticated)
    }

    pub fn rate_identity(&self) -> String {
        resolve_identity(self.user_id.as_deref(), &self.client)
    }
}
