//! Canned transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::response::{JOB_ID_HEADER, PAGES_HEADER};

/// Replays scripted responses in order and records every request it sees.
pub(crate) struct CannedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl CannedTransport {
    pub(crate) fn new(responses: Vec<Result<HttpResponse, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn ok(body: &[u8], pages: u32) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse {
            status: 200,
            headers: vec![(PAGES_HEADER.to_string(), pages.to_string())],
            body: body.to_vec(),
        })
    }

    pub(crate) fn accepted(job_id: &str) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse {
            status: 202,
            headers: vec![(JOB_ID_HEADER.to_string(), job_id.to_string())],
            body: Vec::new(),
        })
    }

    pub(crate) fn running() -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse {
            status: 202,
            headers: Vec::new(),
            body: Vec::new(),
        })
    }

    pub(crate) fn failed(status: u16, body: &str) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for CannedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no canned response left")
    }
}

/// Decode a urlencoded request body.
pub(crate) fn form(request: &HttpRequest) -> HashMap<String, String> {
    std::str::from_utf8(&request.body)
        .expect("form body is not utf-8")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').expect("malformed pair");
            (
                urlencoding::decode(k).unwrap().into_owned(),
                urlencoding::decode(v).unwrap().into_owned(),
            )
        })
        .collect()
}

/// Text of a multipart body, for substring assertions.
pub(crate) fn multipart_text(request: &HttpRequest) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}
