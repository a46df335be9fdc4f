//! Merging of several PDF documents into one.

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
use crate::output;
use crate::types::FileAttachment;
use crate::validate;

#[derive(Debug, Clone)]
enum MergeInput {
    File(PathBuf),
    Url(String),
}

/// Merges local PDF files and public PDF urls, in the order they were added.
///
/// The list of inputs is consumed by every `save*` call, successful or not.
/// Options (document info, passwords) persist across saves.
pub struct PdfMergeClient {
    inner: ApiClient,
    inputs: Vec<(MergeInput, Option<String>)>,
}

impl PdfMergeClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(UreqTransport::new(config.timeout)))
    }

    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: ApiClient::new(config, "pdfmerge", transport),
            inputs: Vec::new(),
        }
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.inner
    }

    /// Queue a local PDF, with the password needed to open it if any.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, password: Option<&str>) -> &mut Self {
        self.inputs
            .push((MergeInput::File(path.into()), password.map(str::to_string)));
        self
    }

    /// Queue a PDF the service downloads itself.
    pub fn add_url_file(&mut self, url: &str, password: Option<&str>) -> Result<&mut Self, ApiError> {
        validate::public_url(url, "url")?;
        self.inputs
            .push((MergeInput::Url(url.to_string()), password.map(str::to_string)));
        Ok(self)
    }

    /// Number of documents queued for the next save.
    pub fn files_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn save(&mut self) -> Result<Vec<u8>, ApiError> {
        self.prepare()?;
        self.inner.run(Mode::Sync)
    }

    pub fn save_to_writer<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<(), ApiError> {
        let pdf = self.save()?;
        output::write_to_writer(writer, &pdf)
    }

    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> Result<(), ApiError> {
        self.prepare()?;
        output::write_to_file(path.as_ref(), |file| {
            let pdf = self.inner.run(Mode::Sync)?;
            output::write_to_writer(file, &pdf)
        })
    }

    pub fn save_async(&mut self) -> Result<Vec<u8>, ApiError> {
        self.prepare()?;
        self.inner.run(Mode::Async)
    }

    pub fn save_to_writer_async<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<(), ApiError> {
        let pdf = self.save_async()?;
        output::write_to_writer(writer, &pdf)
    }

    pub fn save_to_file_async(&mut self, path: impl AsRef<Path>) -> Result<(), ApiError> {
        self.prepare()?;
        output::write_to_file(path.as_ref(), |file| {
            let pdf = self.inner.run(Mode::Async)?;
            output::write_to_writer(file, &pdf)
        })
    }

    pub fn number_of_pages(&self) -> u32 {
        self.inner.number_of_pages()
    }

    pub fn job_id(&self) -> Option<&str> {
        self.inner.job_id()
    }

    fn prepare(&mut self) -> Result<(), ApiError> {
        let inputs = std::mem::take(&mut self.inputs);
        if inputs.is_empty() {
            return Err(ApiError::Validation(
                "No PDF documents were added for merging.".to_string(),
            ));
        }

        self.inner.begin_operation();
        info!("Merging {} documents", inputs.len());
        self.inner.set_param("files_no", inputs.len().to_string());
        for (n, (input, password)) in (1..).zip(inputs) {
            match input {
                MergeInput::File(path) => self
                    .inner
                    .add_file(FileAttachment::new(format!("file_{n}"), path)),
                MergeInput::Url(url) => self.inner.set_param(&format!("url_{n}"), url),
            }
            if let Some(password) = password {
                self.inner.set_param(&format!("password_{n}"), password);
            }
        }
        Ok(())
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

    pub fn set_doc_title(&mut self, title: &str) -> &mut Self {
        self.inner.set_option("doc_title", title);
        self
    }

    pub fn set_doc_subject(&mut self, subject: &str) -> &mut Self {
        self.inner.set_option("doc_subject", subject);
        self
    }

    pub fn set_doc_keywords(&mut self, keywords: &str) -> &mut Self {
        self.inner.set_option("doc_keywords", keywords);
        self
    }

    pub fn set_doc_author(&mut self, author: &str) -> &mut Self {
        self.inner.set_option("doc_author", author);
        self
    }

    pub fn set_doc_add_creation_date(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("doc_add_creation_date", value);
        self
    }

    /// Password required to open the merged document.
    pub fn set_user_password(&mut self, password: &str) -> &mut Self {
        self.inner.set_option("user_password", password);
        self
    }

    pub fn set_owner_password(&mut self, password: &str) -> &mut Self {
        self.inner.set_option("owner_password", password);
        self
    }
}
