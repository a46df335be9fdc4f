//! Asynchronous job protocol.
//!
//! # Design
//! An async call is started by POSTing the operation with `async=True`; the
//! server answers 202 and a job id. From then on the job is polled on the
//! async endpoint: 202 means "still running", 200 carries the result, and
//! any other status is an error that ends polling. Polls are sequential and
//! each one is preceded by the full ping interval.
//!
//! The loop lives in [`wait_for_job`] and only talks to a [`JobPoller`], so
//! every operation client shares one implementation of the state machine.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Transport, UreqTransport};

pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_PINGS: u32 = 1000;

/// A server-side job that was accepted and can be polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncJobHandle {
    pub job_id: String,
    pub api_key: String,
    /// Endpoint answering status checks for this job.
    pub endpoint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_pings: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PING_INTERVAL,
            max_pings: DEFAULT_MAX_PINGS,
        }
    }
}

/// The finished job's payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobResult {
    pub body: Vec<u8>,
    pub pages: u32,
}

/// What a single status check reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Finished(JobResult),
}

/// One status check against a job. Errors end the polling loop.
pub trait JobPoller {
    fn poll_once(&mut self, handle: &AsyncJobHandle) -> Result<JobStatus, ApiError>;
}

/// Poll `handle` until it finishes, fails, or `settings.max_pings` checks
/// have been spent.
pub fn wait_for_job<P: JobPoller + ?Sized>(
    poller: &mut P,
    handle: &AsyncJobHandle,
    settings: PollSettings,
) -> Result<JobResult, ApiError> {
    let mut pings = 0;
    while pings < settings.max_pings {
        thread::sleep(settings.interval);
        pings += 1;
        debug!("Job {}: ping {}/{}", handle.job_id, pings, settings.max_pings);

        if let JobStatus::Finished(result) = poller.poll_once(handle)? {
            info!(
                "Job {} finished after {} pings ({} pages)",
                handle.job_id, pings, result.pages
            );
            return Ok(result);
        }
    }
    warn!("Job {} still running after {} pings", handle.job_id, pings);
    Err(ApiError::AsyncTimeout { pings })
}

/// Retrieves the result of an asynchronous job.
pub struct AsyncJobClient {
    inner: ApiClient,
    finished: bool,
}

impl AsyncJobClient {
    pub fn new(config: &ClientConfig, job_id: &str) -> Self {
        Self::with_transport(config, job_id, Arc::new(UreqTransport::new(config.timeout)))
    }

    pub fn with_transport(config: &ClientConfig, job_id: &str, transport: Arc<dyn Transport>) -> Self {
        let mut inner = ApiClient::new(config, "asyncjob", transport);
        inner.set_option("job_id", job_id);
        Self {
            inner,
            finished: false,
        }
    }

    pub(crate) fn for_handle(handle: &AsyncJobHandle, transport: Arc<dyn Transport>) -> Self {
        let mut inner = ApiClient::from_parts(&handle.api_key, &handle.endpoint, transport);
        inner.set_option("job_id", handle.job_id.as_str());
        Self {
            inner,
            finished: false,
        }
    }

    pub fn set_api_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.inner.set_api_endpoint(endpoint);
        self
    }

    /// Check the job once. Returns `None` while it is still running.
    pub fn get_result(&mut self) -> Result<Option<Vec<u8>>, ApiError> {
        self.inner.begin_operation();
        let outcome = self.inner.post()?;
        self.finished = !outcome.is_running();
        Ok(self.finished.then_some(outcome.body))
    }

    /// Whether the last [`get_result`](Self::get_result) saw the job complete.
    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn number_of_pages(&self) -> u32 {
        self.inner.number_of_pages()
    }
}

impl JobPoller for AsyncJobClient {
    fn poll_once(&mut self, handle: &AsyncJobHandle) -> Result<JobStatus, ApiError> {
        self.inner.set_option("job_id", handle.job_id.as_str());
        match self.get_result()? {
            Some(body) => Ok(JobStatus::Finished(JobResult {
                body,
                pages: self.number_of_pages(),
            })),
            None => Ok(JobStatus::Running),
        }
    }
}
