//! In-process stand-in for the SelectPdf API, used by the SDK's
//! integration tests and runnable on its own for manual checks.
//!
//! Every endpoint takes a urlencoded or multipart POST, like the real
//! service. Results are small fake documents that echo what was asked for,
//! which keeps assertions in tests simple.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const CLIENT_HEADER: &str = "selectpdf-api-client";
pub const JOB_ID_HEADER: &str = "selectpdf-api-jobid";
pub const PAGES_HEADER: &str = "selectpdf-api-pages";

/// Key accepted by [`app`].
pub const TEST_API_KEY: &str = "test-key";

#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Required `key` parameter. `None` accepts any non-empty key.
    pub api_key: Option<String>,
    /// How many polls of an async job answer 202 before the result is served.
    pub polls_before_done: u32,
    /// Conversions available before any request is made.
    pub credits: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: Some(TEST_API_KEY.to_string()),
            polls_before_done: 2,
            credits: 100,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebElement {
    pub page_index: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub selector: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextMatch {
    pub text_found: String,
    pub page_number: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug)]
struct Output {
    body: Vec<u8>,
    pages: u32,
}

#[derive(Debug)]
struct Job {
    polls_left: u32,
    output: Output,
}

type Jobs = Arc<RwLock<HashMap<Uuid, Job>>>;

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    jobs: Jobs,
    elements: Arc<RwLock<HashMap<Uuid, Vec<WebElement>>>>,
    used: Arc<AtomicU32>,
}

type ApiResult = Result<Response, (StatusCode, String)>;

/// Parameters and uploaded files of one API call.
#[derive(Debug, Default)]
pub struct ApiRequest {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Vec<u8>>,
}

impl ApiRequest {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn flag(&self, name: &str) -> bool {
        self.field(name).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn require(&self, name: &str) -> Result<&str, (StatusCode, String)> {
        self.field(name)
            .ok_or_else(|| bad_request(format!("Parameter '{name}' is required.")))
    }
}

impl<S: Send + Sync> FromRequest<S> for ApiRequest {
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(CLIENT_HEADER) {
            return Err(bad_request("Missing client identification header."));
        }
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| bad_request(e.body_text()))?;
            return Ok(Self {
                fields,
                files: HashMap::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        let mut parsed = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if field.file_name().is_some() {
                let bytes = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
                parsed.files.insert(name, bytes.to_vec());
            } else {
                let text = field.text().await.map_err(|e| bad_request(e.body_text()))?;
                parsed.fields.insert(name, text);
            }
        }
        Ok(parsed)
    }
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        jobs: Arc::new(RwLock::new(HashMap::new())),
        elements: Arc::new(RwLock::new(HashMap::new())),
        used: Arc::new(AtomicU32::new(0)),
    };
    let api = Router::new()
        .route("/convert/", post(convert))
        .route("/asyncjob/", post(async_job))
        .route("/webelements/", post(web_elements))
        .route("/pdfmerge/", post(pdf_merge))
        .route("/pdftotext/", post(pdf_to_text))
        .route("/usage/", post(usage))
        .with_state(state);
    Router::new().nest("/api2", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

fn authorize(state: &AppState, req: &ApiRequest) -> Result<(), (StatusCode, String)> {
    let Some(key) = req.field("key") else {
        return Err((StatusCode::UNAUTHORIZED, "API key is missing.".to_string()));
    };
    match &state.config.api_key {
        Some(expected) if expected != key => {
            Err((StatusCode::UNAUTHORIZED, "Invalid API key.".to_string()))
        }
        _ => Ok(()),
    }
}

fn finished(job_id: Uuid, output: Output) -> Response {
    (
        StatusCode::OK,
        [
            (JOB_ID_HEADER, job_id.to_string()),
            (PAGES_HEADER, output.pages.to_string()),
        ],
        output.body,
    )
        .into_response()
}

/// Answer now, or park the output as a job when the caller asked for `async`.
async fn respond(state: &AppState, req: &ApiRequest, job_id: Uuid, output: Output) -> Response {
    if !req.flag("async") {
        return finished(job_id, output);
    }
    info!("job {} started", job_id);
    state.jobs.write().await.insert(
        job_id,
        Job {
            polls_left: state.config.polls_before_done,
            output,
        },
    );
    (StatusCode::ACCEPTED, [(JOB_ID_HEADER, job_id.to_string())]).into_response()
}

fn fake_pdf(description: &str, pages: u32) -> Output {
    Output {
        body: format!("%PDF-1.4\n% {description}\n%%EOF\n").into_bytes(),
        pages,
    }
}

async fn convert(State(state): State<AppState>, req: ApiRequest) -> ApiResult {
    authorize(&state, &req)?;
    let description = match (req.field("url"), req.field("html")) {
        (Some(url), _) => format!("converted {url}"),
        (None, Some(html)) => format!("converted html ({} bytes)", html.len()),
        (None, None) => return Err(bad_request("Either url or html must be specified.")),
    };
    state.used.fetch_add(1, Ordering::SeqCst);

    let job_id = Uuid::new_v4();
    if let Some(selectors) = req.field("web_elements_selectors") {
        let elements = (0u32..)
            .zip(selectors.split(',').map(str::trim).filter(|s| !s.is_empty()))
            .map(|(i, selector)| WebElement {
                page_index: 0,
                x: 10.0,
                y: 10.0 + 40.0 * f64::from(i),
                width: 200.0,
                height: 30.0,
                selector: selector.to_string(),
            })
            .collect();
        state.elements.write().await.insert(job_id, elements);
    }

    debug!("convert: {}", description);
    Ok(respond(&state, &req, job_id, fake_pdf(&description, 1)).await)
}

async fn async_job(State(state): State<AppState>, req: ApiRequest) -> ApiResult {
    authorize(&state, &req)?;
    let job_id: Uuid = req
        .require("job_id")?
        .parse()
        .map_err(|_| bad_request("Malformed job id."))?;

    let mut jobs = state.jobs.write().await;
    let job = jobs
        .get_mut(&job_id)
        .ok_or((StatusCode::NOT_FOUND, "Job not found.".to_string()))?;
    if job.polls_left > 0 {
        job.polls_left -= 1;
        debug!("job {} still running, {} polls left", job_id, job.polls_left);
        return Ok((StatusCode::ACCEPTED, [(JOB_ID_HEADER, job_id.to_string())]).into_response());
    }
    let job = jobs
        .remove(&job_id)
        .ok_or((StatusCode::NOT_FOUND, "Job not found.".to_string()))?;
    info!("job {} finished", job_id);
    Ok(finished(job_id, job.output))
}

async fn web_elements(State(state): State<AppState>, req: ApiRequest) -> ApiResult {
    authorize(&state, &req)?;
    let job_id: Uuid = req
        .require("job_id")?
        .parse()
        .map_err(|_| bad_request("Malformed job id."))?;
    match state.elements.read().await.get(&job_id) {
        Some(elements) => Ok(Json(elements.clone()).into_response()),
        None => Ok(StatusCode::OK.into_response()),
    }
}

async fn pdf_merge(State(state): State<AppState>, req: ApiRequest) -> ApiResult {
    authorize(&state, &req)?;
    let count: u32 = req
        .require("files_no")?
        .parse()
        .map_err(|_| bad_request("files_no must be a number."))?;
    if count == 0 {
        return Err(bad_request("No files to merge."));
    }

    let mut sources = Vec::new();
    for n in 1..=count {
        if let Some(bytes) = req.files.get(&format!("file_{n}")) {
            sources.push(format!("file_{n} ({} bytes)", bytes.len()));
        } else if let Some(url) = req.field(&format!("url_{n}")) {
            sources.push(url.to_string());
        } else {
            return Err(bad_request(format!("File {n} is missing.")));
        }
    }

    let output = fake_pdf(&format!("merged {}", sources.join(", ")), count);
    Ok(respond(&state, &req, Uuid::new_v4(), output).await)
}

async fn pdf_to_text(State(state): State<AppState>, req: ApiRequest) -> ApiResult {
    authorize(&state, &req)?;
    let text = match (req.files.get("inputPdf"), req.field("url")) {
        (Some(bytes), _) => String::from_utf8_lossy(bytes).into_owned(),
        (None, Some(url)) => format!("Text extracted from {url}"),
        (None, None) => return Err(bad_request("Either inputPdf or url must be specified.")),
    };

    let output = match req.field("action").unwrap_or("Convert") {
        "Convert" => {
            let body = if req.field("output_format") == Some("1") {
                format!("<html><body><pre>{text}</pre></body></html>")
            } else {
                text
            };
            Output {
                body: body.into_bytes(),
                pages: 1,
            }
        }
        "Search" => {
            let needle = req.require("search_text")?;
            let matches = find_matches(
                &text,
                needle,
                req.flag("case_sensitive"),
                req.flag("whole_words_only"),
            );
            let body = serde_json::to_vec(&matches)
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
            Output { body, pages: 1 }
        }
        other => return Err(bad_request(format!("Unknown action '{other}'."))),
    };
    Ok(respond(&state, &req, Uuid::new_v4(), output).await)
}

async fn usage(State(state): State<AppState>, req: ApiRequest) -> ApiResult {
    authorize(&state, &req)?;
    let used = state.used.load(Ordering::SeqCst);
    let mut report = serde_json::json!({
        "available": state.config.credits.saturating_sub(used),
    });
    if req.flag("get_history") {
        report["history"] = serde_json::json!([{ "Conversions": used }]);
    }
    Ok(Json(report).into_response())
}

/// Occurrences of `needle` in `haystack`, one fake position per match.
pub fn find_matches(haystack: &str, needle: &str, case_sensitive: bool, whole_words: bool) -> Vec<TextMatch> {
    let (hay, pattern) = if case_sensitive {
        (haystack.to_string(), needle.to_string())
    } else {
        (haystack.to_ascii_lowercase(), needle.to_ascii_lowercase())
    };
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';

    hay.match_indices(&pattern)
        .filter(|(start, _)| {
            if !whole_words {
                return true;
            }
            let before = hay[..*start].chars().next_back();
            let after = hay[start + pattern.len()..].chars().next();
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
        })
        .map(|(start, _)| TextMatch {
            text_found: haystack[start..start + needle.len()].to_string(),
            page_number: 1,
            x: 10.0 + 6.0 * start as f64,
            y: 20.0,
            width: 6.0 * needle.len() as f64,
            height: 12.0,
        })
        .collect()
}
