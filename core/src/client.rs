//! Shared request machinery behind every operation client.
//!
//! # Design
//! `ApiClient` owns what one logical operation needs: endpoints, the
//! configured options (always including `key`), the per-operation
//! parameters and attachments, and the transport. A POST is always
//! encode → execute → interpret, in one place, so every operation sees the
//! same status handling. Operation clients wrap an `ApiClient`, translate
//! their option setters into `set_option` calls, and call
//! [`begin_operation`](ApiClient::begin_operation) before assembling a
//! request so nothing leaks from the previous call on the same instance.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::encode;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport, CLIENT_HEADER, CLIENT_IDENTITY};
use crate::job::{wait_for_job, AsyncJobClient, AsyncJobHandle, PollSettings};
use crate::response::{interpret, HttpOutcome};
use crate::types::{serialize_bool, BinaryAttachment, FileAttachment, ParameterSet};

/// Whether an assembled operation runs in one request or as a server job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Sync,
    Async,
}

pub struct ApiClient {
    endpoint: String,
    async_endpoint: String,
    web_elements_endpoint: String,
    options: ParameterSet,
    request: ParameterSet,
    files: Vec<FileAttachment>,
    blobs: Vec<BinaryAttachment>,
    headers: Vec<(String, String)>,
    poll: PollSettings,
    transport: Arc<dyn Transport>,
    job_id: Option<String>,
    pages: u32,
}

impl ApiClient {
    /// Client for `operation` (the path segment under the API base URL).
    pub fn new(config: &ClientConfig, operation: &str, transport: Arc<dyn Transport>) -> Self {
        let mut client = Self::from_parts(&config.api_key, &config.endpoint(operation), transport);
        client.async_endpoint = config.endpoint("asyncjob");
        client.web_elements_endpoint = config.endpoint("webelements");
        client.poll = PollSettings {
            interval: config.ping_interval,
            max_pings: config.max_pings,
        };
        client
    }

    pub(crate) fn from_parts(api_key: &str, endpoint: &str, transport: Arc<dyn Transport>) -> Self {
        let mut options = ParameterSet::new();
        options.set("key", api_key);
        Self {
            endpoint: endpoint.to_string(),
            async_endpoint: endpoint.to_string(),
            web_elements_endpoint: endpoint.to_string(),
            options,
            request: ParameterSet::new(),
            files: Vec::new(),
            blobs: Vec::new(),
            headers: Vec::new(),
            poll: PollSettings::default(),
            transport,
            job_id: None,
            pages: 0,
        }
    }

    pub fn api_key(&self) -> &str {
        self.options.get("key").unwrap_or_default()
    }

    /// Options that will be sent with every operation.
    pub fn options(&self) -> &ParameterSet {
        &self.options
    }

    pub fn set_api_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    pub fn set_api_async_endpoint(&mut self, endpoint: impl Into<String>) {
        self.async_endpoint = endpoint.into();
    }

    pub fn set_api_web_elements_endpoint(&mut self, endpoint: impl Into<String>) {
        self.web_elements_endpoint = endpoint.into();
    }

    pub fn web_elements_endpoint(&self) -> &str {
        &self.web_elements_endpoint
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub fn set_poll_settings(&mut self, poll: PollSettings) {
        self.poll = poll;
    }

    pub fn poll_settings(&self) -> PollSettings {
        self.poll
    }

    pub fn set_option(&mut self, key: &str, value: impl Into<String>) {
        self.options.set(key, value);
    }

    pub fn set_bool_option(&mut self, key: &str, value: bool) {
        self.options.set(key, serialize_bool(value));
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Parameter that only applies to the current operation.
    pub fn set_param(&mut self, key: &str, value: impl Into<String>) {
        self.request.set(key, value);
    }

    pub fn add_file(&mut self, attachment: FileAttachment) {
        self.files.push(attachment);
    }

    pub fn add_blob(&mut self, field: &str, bytes: Vec<u8>) {
        self.blobs.push(BinaryAttachment {
            field: field.to_string(),
            bytes,
        });
    }

    /// Forget everything the previous operation sent or received.
    pub fn begin_operation(&mut self) {
        self.request.clear();
        self.files.clear();
        self.blobs.clear();
        self.job_id = None;
        self.pages = 0;
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn number_of_pages(&self) -> u32 {
        self.pages
    }

    /// Send one POST to the primary endpoint and interpret the answer.
    pub fn post(&mut self) -> Result<HttpOutcome, ApiError> {
        let mut params = self.options.clone();
        params.extend(&self.request);
        let body = encode::encode(&params, &self.files, &self.blobs)?;

        let mut headers = vec![
            ("Content-Type".to_string(), body.content_type),
            (CLIENT_HEADER.to_string(), CLIENT_IDENTITY.to_string()),
        ];
        headers.extend(self.headers.iter().cloned());

        let request = HttpRequest {
            url: self.endpoint.clone(),
            headers,
            body: body.bytes,
        };
        debug!(
            "Sending {} parameters, {} files, {} blobs to {}",
            params.len(),
            self.files.len(),
            self.blobs.len(),
            request.url
        );

        let outcome = interpret(self.transport.execute(&request)?)?;
        if outcome.job_id.is_some() {
            self.job_id = outcome.job_id.clone();
        }
        self.pages = outcome.pages;
        Ok(outcome)
    }

    /// POST and require a completed (200) answer.
    pub fn post_sync(&mut self) -> Result<Vec<u8>, ApiError> {
        let outcome = self.post()?;
        if outcome.is_running() {
            return Err(ApiError::Remote {
                status: outcome.status,
                message: "Unexpected 202 response to a synchronous call".to_string(),
            });
        }
        Ok(outcome.body)
    }

    /// Run the assembled operation synchronously and return the result body.
    pub fn run_sync(&mut self) -> Result<Vec<u8>, ApiError> {
        self.set_param("async", serialize_bool(false));
        self.post_sync()
    }

    /// Launch the assembled operation as a server-side job.
    pub fn start_async_job(&mut self) -> Result<AsyncJobHandle, ApiError> {
        self.set_param("async", serialize_bool(true));
        let outcome = self.post()?;
        let job_id = match (outcome.is_running(), outcome.job_id) {
            (true, Some(job_id)) => job_id,
            _ => {
                return Err(ApiError::AsyncLaunch(
                    "An error occurred launching the asynchronous call.".to_string(),
                ))
            }
        };
        info!("Started async job {}", job_id);
        Ok(AsyncJobHandle {
            job_id,
            api_key: self.api_key().to_string(),
            endpoint: self.async_endpoint.clone(),
        })
    }

    /// Start the assembled operation as a job and wait for its result.
    pub fn run_async(&mut self) -> Result<Vec<u8>, ApiError> {
        let handle = self.start_async_job()?;
        let mut poller = AsyncJobClient::for_handle(&handle, self.transport());
        let result = wait_for_job(&mut poller, &handle, self.poll)?;
        self.pages = result.pages;
        Ok(result.body)
    }

    pub(crate) fn run(&mut self, mode: Mode) -> Result<Vec<u8>, ApiError> {
        match mode {
            Mode::Sync => self.run_sync(),
            Mode::Async => self.run_async(),
        }
    }
}
