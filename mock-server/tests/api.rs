use axum::http::{self, Request, StatusCode};
use axum::body::Body;
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with, MockConfig, CLIENT_HEADER, JOB_ID_HEADER, PAGES_HEADER, TEST_API_KEY};
use tower::ServiceExt;

const BOUNDARY: &str = "------------SelectPdf_Api_Boundry_$";

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn form_request(path: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(CLIENT_HEADER, "rust-test")
        .body(body.to_string())
        .unwrap()
}

fn multipart_request(path: &str, fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    for (name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.pdf\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(CLIENT_HEADER, "rust-test")
        .body(Body::from(body))
        .unwrap()
}

fn header(response: &axum::response::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

// --- access ---

#[tokio::test]
async fn missing_client_header_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/api2/convert/")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!("key={TEST_API_KEY}&url=https%3A%2F%2Fa.test"))
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_key_is_401() {
    let resp = send(&app(), form_request("/api2/convert/", "url=https%3A%2F%2Fa.test")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_key_is_401_with_message() {
    let resp = send(&app(), form_request("/api2/usage/", "key=nope")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(resp).await, "Invalid API key.");
}

#[tokio::test]
async fn any_key_accepted_without_configured_key() {
    let config = MockConfig {
        api_key: None,
        ..MockConfig::default()
    };
    let resp = send(&app_with(config), form_request("/api2/usage/", "key=whatever")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- convert ---

#[tokio::test]
async fn sync_convert_returns_pdf_and_headers() {
    let body = format!("key={TEST_API_KEY}&url=https%3A%2F%2Fa.test&async=False");
    let resp = send(&app(), form_request("/api2/convert/", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, PAGES_HEADER).as_deref(), Some("1"));
    assert!(header(&resp, JOB_ID_HEADER).is_some());
    let pdf = body_bytes(resp).await;
    assert!(pdf.starts_with(b"%PDF"));
    assert!(String::from_utf8_lossy(&pdf).contains("https://a.test"));
}

#[tokio::test]
async fn convert_without_source_is_400() {
    let body = format!("key={TEST_API_KEY}");
    let resp = send(&app(), form_request("/api2/convert/", &body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn async_job_finishes_after_configured_polls() {
    let app = app();
    let body = format!("key={TEST_API_KEY}&html=%3Cp%3Ex%3C%2Fp%3E&async=True");
    let resp = send(&app, form_request("/api2/convert/", &body)).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let job_id = header(&resp, JOB_ID_HEADER).unwrap();

    let poll = format!("key={TEST_API_KEY}&job_id={job_id}");
    for _ in 0..2 {
        let resp = send(&app, form_request("/api2/asyncjob/", &poll)).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }
    let resp = send(&app, form_request("/api2/asyncjob/", &poll)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.starts_with(b"%PDF"));

    let resp = send(&app, form_request("/api2/asyncjob/", &poll)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn web_elements_recorded_per_job() {
    let app = app();
    let body = format!("key={TEST_API_KEY}&url=https%3A%2F%2Fa.test&web_elements_selectors=h1%2C+p");
    let resp = send(&app, form_request("/api2/convert/", &body)).await;
    let job_id = header(&resp, JOB_ID_HEADER).unwrap();

    let lookup = format!("key={TEST_API_KEY}&job_id={job_id}");
    let resp = send(&app, form_request("/api2/webelements/", &lookup)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let elements = body_json(resp).await;
    assert_eq!(elements.as_array().unwrap().len(), 2);
    assert_eq!(elements[1]["Selector"], "p");
}

#[tokio::test]
async fn web_elements_unknown_job_is_empty() {
    let lookup = format!("key={TEST_API_KEY}&job_id={}", uuid::Uuid::nil());
    let resp = send(&app(), form_request("/api2/webelements/", &lookup)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- merge ---

#[tokio::test]
async fn merge_mixes_files_and_urls() {
    let key = TEST_API_KEY;
    let request = multipart_request(
        "/api2/pdfmerge/",
        &[("key", key), ("files_no", "2"), ("url_2", "https://b.test/b.pdf")],
        &[("file_1", b"%PDF-one".as_slice())],
    );
    let resp = app().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, PAGES_HEADER).as_deref(), Some("2"));
    let pdf = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(pdf.contains("file_1 (8 bytes)"));
    assert!(pdf.contains("https://b.test/b.pdf"));
}

#[tokio::test]
async fn merge_with_gap_is_400() {
    let body = format!("key={TEST_API_KEY}&files_no=2&url_1=https%3A%2F%2Fa.test%2Fa.pdf");
    let resp = send(&app(), form_request("/api2/pdfmerge/", &body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- pdf to text ---

#[tokio::test]
async fn text_from_uploaded_file() {
    let request = multipart_request(
        "/api2/pdftotext/",
        &[("key", TEST_API_KEY), ("action", "Convert")],
        &[("inputPdf", b"plain words".as_slice())],
    );
    let resp = app().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "plain words");
}

#[tokio::test]
async fn search_returns_positions() {
    let request = multipart_request(
        "/api2/pdftotext/",
        &[
            ("key", TEST_API_KEY),
            ("action", "Search"),
            ("search_text", "pdf"),
            ("case_sensitive", "False"),
            ("whole_words_only", "True"),
        ],
        &[("inputPdf", b"PDF or pdf, not pdfs".as_slice())],
    );
    let resp = app().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let found = body_json(resp).await;
    assert_eq!(found.as_array().unwrap().len(), 2);
    assert_eq!(found[0]["TextFound"], "PDF");
    assert_eq!(found[0]["PageNumber"], 1);
}

#[tokio::test]
async fn unknown_action_is_400() {
    let body = format!("key={TEST_API_KEY}&url=https%3A%2F%2Fa.test&action=Shred");
    let resp = send(&app(), form_request("/api2/pdftotext/", &body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- usage ---

#[tokio::test]
async fn usage_counts_conversions() {
    let app = app();
    let convert = format!("key={TEST_API_KEY}&url=https%3A%2F%2Fa.test");
    send(&app, form_request("/api2/convert/", &convert)).await;

    let body = format!("key={TEST_API_KEY}&get_history=True");
    let resp = send(&app, form_request("/api2/usage/", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let usage = body_json(resp).await;
    assert_eq!(usage["available"], 99);
    assert_eq!(usage["history"][0]["Conversions"], 1);
}

#[tokio::test]
async fn usage_without_history() {
    let body = format!("key={TEST_API_KEY}");
    let resp = send(&app(), form_request("/api2/usage/", &body)).await;
    let usage = body_json(resp).await;
    assert_eq!(usage["available"], 100);
    assert!(usage.get("history").is_none());
}
