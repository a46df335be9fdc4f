//! Interpretation of raw responses.
//!
//! Every transport call site funnels its `HttpResponse` through [`interpret`],
//! which maps the status code and the two SelectPdf headers to an
//! [`HttpOutcome`] or an error.

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Response header carrying the id of an asynchronous job.
pub const JOB_ID_HEADER: &str = "selectpdf-api-jobid";

/// Response header carrying the number of pages of the result.
pub const PAGES_HEADER: &str = "selectpdf-api-pages";

/// Structured view of a 200 or 202 response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpOutcome {
    pub status: u16,
    pub job_id: Option<String>,
    pub pages: u32,
    /// Empty for 202 responses.
    pub body: Vec<u8>,
}

impl HttpOutcome {
    /// Whether the server reported the job as still in progress.
    pub fn is_running(&self) -> bool {
        self.status == 202
    }
}

/// Map a response to an outcome. Statuses other than 200 and 202 are errors.
pub fn interpret(response: HttpResponse) -> Result<HttpOutcome, ApiError> {
    let job_id = response
        .header(JOB_ID_HEADER)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let pages = response
        .header(PAGES_HEADER)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);

    match response.status {
        200 => Ok(HttpOutcome {
            status: 200,
            job_id,
            pages,
            body: response.body,
        }),
        202 => Ok(HttpOutcome {
            status: 202,
            job_id,
            pages,
            body: Vec::new(),
        }),
        status => {
            let text = String::from_utf8_lossy(&response.body).trim().to_string();
            let message = if text.is_empty() {
                format!("HTTP status {status}")
            } else {
                text
            };
            Err(ApiError::Remote { status, message })
        }
    }
}
