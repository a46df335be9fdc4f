//! Text extraction from PDF documents and text search inside them.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::client::{ApiClient, Mode};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Transport, UreqTransport};
use crate::job::PollSettings;
use crate::options::OutputFormat;
use crate::output;
use crate::types::{serialize_bool, FileAttachment, TextPosition};
use crate::validate;

const INPUT_FIELD: &str = "inputPdf";

#[derive(Debug, Clone, Copy)]
enum Input<'a> {
    File(&'a Path),
    Url(&'a str),
}

#[derive(Debug, Clone, Copy)]
enum Action<'a> {
    Convert,
    Search {
        text: &'a str,
        case_sensitive: bool,
        whole_words_only: bool,
    },
}

/// Extracts text (or simple HTML) from a PDF, or finds where a string occurs.
pub struct PdfToTextClient {
    inner: ApiClient,
}

impl PdfToTextClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(UreqTransport::new(config.timeout)))
    }

    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: ApiClient::new(config, "pdftotext", transport),
        }
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.inner
    }

    pub fn get_text_from_file(&mut self, path: impl AsRef<Path>) -> Result<String, ApiError> {
        let bytes = self.fetch(Input::File(path.as_ref()), Action::Convert, Mode::Sync)?;
        into_text(bytes)
    }

    pub fn get_text_from_file_to_writer<W: Write + ?Sized>(
        &mut self,
        path: impl AsRef<Path>,
        writer: &mut W,
    ) -> Result<(), ApiError> {
        let bytes = self.fetch(Input::File(path.as_ref()), Action::Convert, Mode::Sync)?;
        output::write_to_writer(writer, &bytes)
    }

    pub fn get_text_from_file_to_file(
        &mut self,
        path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<(), ApiError> {
        self.fetch_to_file(Input::File(path.as_ref()), Mode::Sync, output_path.as_ref())
    }

    pub fn get_text_from_file_async(&mut self, path: impl AsRef<Path>) -> Result<String, ApiError> {
        let bytes = self.fetch(Input::File(path.as_ref()), Action::Convert, Mode::Async)?;
        into_text(bytes)
    }

    pub fn get_text_from_file_to_writer_async<W: Write + ?Sized>(
        &mut self,
        path: impl AsRef<Path>,
        writer: &mut W,
    ) -> Result<(), ApiError> {
        let bytes = self.fetch(Input::File(path.as_ref()), Action::Convert, Mode::Async)?;
        output::write_to_writer(writer, &bytes)
    }

    pub fn get_text_from_file_to_file_async(
        &mut self,
        path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<(), ApiError> {
        self.fetch_to_file(Input::File(path.as_ref()), Mode::Async, output_path.as_ref())
    }

    /// Extract the text of a PDF available at a public url.
    pub fn get_text_from_url(&mut self, url: &str) -> Result<String, ApiError> {
        let bytes = self.fetch(Input::Url(url), Action::Convert, Mode::Sync)?;
        into_text(bytes)
    }

    pub fn get_text_from_url_to_writer<W: Write + ?Sized>(&mut self, url: &str, writer: &mut W) -> Result<(), ApiError> {
        let bytes = self.fetch(Input::Url(url), Action::Convert, Mode::Sync)?;
        output::write_to_writer(writer, &bytes)
    }

    pub fn get_text_from_url_to_file(&mut self, url: &str, output_path: impl AsRef<Path>) -> Result<(), ApiError> {
        self.fetch_to_file(Input::Url(url), Mode::Sync, output_path.as_ref())
    }

    pub fn get_text_from_url_async(&mut self, url: &str) -> Result<String, ApiError> {
        let bytes = self.fetch(Input::Url(url), Action::Convert, Mode::Async)?;
        into_text(bytes)
    }

    pub fn get_text_from_url_to_writer_async<W: Write + ?Sized>(
        &mut self,
        url: &str,
        writer: &mut W,
    ) -> Result<(), ApiError> {
        let bytes = self.fetch(Input::Url(url), Action::Convert, Mode::Async)?;
        output::write_to_writer(writer, &bytes)
    }

    pub fn get_text_from_url_to_file_async(
        &mut self,
        url: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<(), ApiError> {
        self.fetch_to_file(Input::Url(url), Mode::Async, output_path.as_ref())
    }

    /// Positions of every occurrence of `text` in a local PDF.
    pub fn search_file(
        &mut self,
        path: impl AsRef<Path>,
        text: &str,
        case_sensitive: bool,
        whole_words_only: bool,
    ) -> Result<Vec<TextPosition>, ApiError> {
        let action = Action::Search {
            text,
            case_sensitive,
            whole_words_only,
        };
        self.search(Input::File(path.as_ref()), action, Mode::Sync)
    }

    pub fn search_file_async(
        &mut self,
        path: impl AsRef<Path>,
        text: &str,
        case_sensitive: bool,
        whole_words_only: bool,
    ) -> Result<Vec<TextPosition>, ApiError> {
        let action = Action::Search {
            text,
            case_sensitive,
            whole_words_only,
        };
        self.search(Input::File(path.as_ref()), action, Mode::Async)
    }

    pub fn search_url(
        &mut self,
        url: &str,
        text: &str,
        case_sensitive: bool,
        whole_words_only: bool,
    ) -> Result<Vec<TextPosition>, ApiError> {
        let action = Action::Search {
            text,
            case_sensitive,
            whole_words_only,
        };
        self.search(Input::Url(url), action, Mode::Sync)
    }

    pub fn search_url_async(
        &mut self,
        url: &str,
        text: &str,
        case_sensitive: bool,
        whole_words_only: bool,
    ) -> Result<Vec<TextPosition>, ApiError> {
        let action = Action::Search {
            text,
            case_sensitive,
            whole_words_only,
        };
        self.search(Input::Url(url), action, Mode::Async)
    }

    pub fn number_of_pages(&self) -> u32 {
        self.inner.number_of_pages()
    }

    pub fn job_id(&self) -> Option<&str> {
        self.inner.job_id()
    }

    fn prepare(&mut self, input: Input<'_>, action: Action<'_>) -> Result<(), ApiError> {
        if let Input::Url(url) = input {
            validate::public_url(url, "url")?;
        }
        if let Action::Search { text, .. } = action {
            if text.is_empty() {
                return Err(ApiError::Validation("Search text cannot be empty.".to_string()));
            }
        }

        self.inner.begin_operation();
        match input {
            Input::File(path) => {
                info!("Reading text from {}", path.display());
                self.inner
                    .add_file(FileAttachment::new(INPUT_FIELD, PathBuf::from(path)));
            }
            Input::Url(url) => {
                info!("Reading text from {}", url);
                self.inner.set_param("url", url);
            }
        }
        match action {
            Action::Convert => self.inner.set_param("action", "Convert"),
            Action::Search {
                text,
                case_sensitive,
                whole_words_only,
            } => {
                self.inner.set_param("action", "Search");
                self.inner.set_param("search_text", text);
                self.inner
                    .set_param("case_sensitive", serialize_bool(case_sensitive));
                self.inner
                    .set_param("whole_words_only", serialize_bool(whole_words_only));
            }
        }
        Ok(())
    }

    fn fetch(&mut self, input: Input<'_>, action: Action<'_>, mode: Mode) -> Result<Vec<u8>, ApiError> {
        self.prepare(input, action)?;
        self.inner.run(mode)
    }

    fn fetch_to_file(&mut self, input: Input<'_>, mode: Mode, output_path: &Path) -> Result<(), ApiError> {
        self.prepare(input, Action::Convert)?;
        output::write_to_file(output_path, |file| {
            let bytes = self.inner.run(mode)?;
            output::write_to_writer(file, &bytes)
        })
    }

    fn search(&mut self, input: Input<'_>, action: Action<'_>, mode: Mode) -> Result<Vec<TextPosition>, ApiError> {
        let body = self.fetch(input, action, mode)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn set_api_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.inner.set_api_endpoint(endpoint);
        self
    }

    pub fn set_api_async_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.inner.set_api_async_endpoint(endpoint);
        self
    }

    pub fn set_async_calls_ping_interval(&mut self, interval: Duration) -> &mut Self {
        let poll = self.inner.poll_settings();
        self.inner.set_poll_settings(PollSettings { interval, ..poll });
        self
    }

    pub fn set_async_calls_max_pings(&mut self, max_pings: u32) -> &mut Self {
        let poll = self.inner.poll_settings();
        self.inner.set_poll_settings(PollSettings { max_pings, ..poll });
        self
    }

    /// First page to read, 1-based.
    pub fn set_start_page(&mut self, page: u32) -> &mut Self {
        self.inner.set_option("start_page", page.to_string());
        self
    }

    /// Last page to read. 0 means the last page of the document.
    pub fn set_end_page(&mut self, page: u32) -> &mut Self {
        self.inner.set_option("end_page", page.to_string());
        self
    }

    pub fn set_output_format(&mut self, format: OutputFormat) -> &mut Self {
        self.inner.set_option("output_format", format.as_param());
        self
    }

    /// Password of a protected input document.
    pub fn set_user_password(&mut self, password: &str) -> &mut Self {
        self.inner.set_option("user_password", password);
        self
    }
}

fn into_text(bytes: Vec<u8>) -> Result<String, ApiError> {
    String::from_utf8(bytes).map_err(|e| ApiError::Deserialization(format!("text is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{form, multipart_text, CannedTransport};

    fn client(transport: Arc<CannedTransport>) -> PdfToTextClient {
        let config = ClientConfig::new("k")
            .with_base_url("https://api.test/api2/")
            .with_ping_interval(Duration::ZERO);
        PdfToTextClient::with_transport(&config, transport)
    }

    #[test]
    fn text_from_url() {
        let transport = CannedTransport::new(vec![CannedTransport::ok("héllo".as_bytes(), 1)]);
        let mut c = client(transport.clone());
        c.set_start_page(2).set_end_page(0).set_output_format(OutputFormat::Html);
        assert_eq!(c.get_text_from_url("https://files.test/a.pdf").unwrap(), "héllo");

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://api.test/api2/pdftotext/");
        let params = form(request);
        assert_eq!(params["action"], "Convert");
        assert_eq!(params["url"], "https://files.test/a.pdf");
        assert_eq!(params["start_page"], "2");
        assert_eq!(params["end_page"], "0");
        assert_eq!(params["output_format"], "1");
    }

    #[test]
    fn text_from_file_uses_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, b"%PDF-input").unwrap();

        let transport = CannedTransport::new(vec![CannedTransport::ok(b"text", 1)]);
        let mut c = client(transport.clone());
        assert_eq!(c.get_text_from_file(&input).unwrap(), "text");

        let body = multipart_text(&transport.requests()[0]);
        assert!(body.contains("name=\"inputPdf\""));
        assert!(body.contains("%PDF-input"));
        assert!(body.contains("name=\"action\"\r\n\r\nConvert\r\n"));
        assert!(!body.contains("name=\"url\""));
    }

    #[test]
    fn search_parses_positions() {
        let transport = CannedTransport::new(vec![CannedTransport::ok(
            br#"[{"TextFound":"pdf","PageNumber":1,"X":10.5,"Y":20,"Width":15,"Height":8}]"#,
            1,
        )]);
        let mut c = client(transport.clone());
        let found = c
            .search_url("https://files.test/a.pdf", "pdf", false, true)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].page_number, 1);
        assert_eq!(found[0].x, 10.5);
        assert_eq!(found[0].extra["TextFound"], "pdf");

        let params = form(&transport.requests()[0]);
        assert_eq!(params["action"], "Search");
        assert_eq!(params["search_text"], "pdf");
        assert_eq!(params["case_sensitive"], "False");
        assert_eq!(params["whole_words_only"], "True");
    }

    #[test]
    fn search_then_convert_does_not_leak_search_text() {
        let transport = CannedTransport::new(vec![
            CannedTransport::ok(b"[]", 1),
            CannedTransport::ok(b"text", 1),
        ]);
        let mut c = client(transport.clone());
        assert!(c
            .search_url("https://files.test/a.pdf", "x", true, false)
            .unwrap()
            .is_empty());
        c.get_text_from_url("https://files.test/a.pdf").unwrap();

        let second = form(&transport.requests()[1]);
        assert_eq!(second["action"], "Convert");
        assert!(!second.contains_key("search_text"));
    }

    #[test]
    fn empty_search_text_is_rejected() {
        let transport = CannedTransport::new(Vec::new());
        let err = client(transport.clone())
            .search_url("https://files.test/a.pdf", "", false, false)
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn local_url_is_rejected() {
        let transport = CannedTransport::new(Vec::new());
        let err = client(transport.clone())
            .get_text_from_url("http://localhost/a.pdf")
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn async_text_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let transport = CannedTransport::new(vec![
            CannedTransport::accepted("T1"),
            CannedTransport::running(),
            CannedTransport::ok(b"async text", 3),
        ]);
        let mut c = client(transport);
        c.get_text_from_url_to_file_async("https://files.test/a.pdf", &out)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "async text");
        assert_eq!(c.number_of_pages(), 3);
    }

    #[test]
    fn non_utf8_text_is_deserialization_error() {
        let transport = CannedTransport::new(vec![CannedTransport::ok(&[0xff, 0xfe], 1)]);
        let err = client(transport)
            .get_text_from_url("https://files.test/a.pdf")
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
