//! Lookup of element positions recorded during an HTML to PDF conversion.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Transport, UreqTransport};
use crate::types::WebElement;

/// Retrieves the web elements matched by the selectors given to a conversion.
pub struct WebElementsClient {
    inner: ApiClient,
}

impl WebElementsClient {
    pub fn new(config: &ClientConfig, job_id: &str) -> Self {
        Self::with_transport(config, job_id, Arc::new(UreqTransport::new(config.timeout)))
    }

    pub fn with_transport(config: &ClientConfig, job_id: &str, transport: Arc<dyn Transport>) -> Self {
        let mut inner = ApiClient::new(config, "webelements", transport);
        inner.set_option("job_id", job_id);
        Self { inner }
    }

    pub(crate) fn for_job(api_key: &str, endpoint: &str, job_id: &str, transport: Arc<dyn Transport>) -> Self {
        let mut inner = ApiClient::from_parts(api_key, endpoint, transport);
        inner.set_option("job_id", job_id);
        Self { inner }
    }

    pub fn set_api_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.inner.set_api_endpoint(endpoint);
        self
    }

    /// An empty answer means no element matched and yields an empty list.
    pub fn get_web_elements(&mut self) -> Result<Vec<WebElement>, ApiError> {
        self.inner.begin_operation();
        let body = self.inner.post_sync()?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}
