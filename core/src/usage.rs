//! API usage reporting.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Transport, UreqTransport};
use crate::types::{serialize_bool, Usage};

pub struct UsageClient {
    inner: ApiClient,
}

impl UsageClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(UreqTransport::new(config.timeout)))
    }

    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: ApiClient::new(config, "usage", transport),
        }
    }

    pub fn set_api_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.inner.set_api_endpoint(endpoint);
        self
    }

    /// Current usage, with the per-period history when `get_history` is set.
    pub fn get_usage(&mut self, get_history: bool) -> Result<Usage, ApiError> {
        self.inner.begin_operation();
        self.inner.set_header("Accept", "text/json");
        if get_history {
            self.inner.set_param("get_history", serialize_bool(true));
        }
        let body = self.inner.post_sync()?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}
