//! Client SDK for the SelectPdf online API.
//!
//! # Overview
//! Each remote capability has its own client: HTML to PDF conversion,
//! PDF merge, PDF to text and text search, usage reporting, plus the
//! async-job and web-elements lookups. A client collects options through
//! setters, encodes them (urlencoded, or multipart when files are attached),
//! POSTs them to the service and either returns the result or drives a
//! server-side job until it finishes.
//!
//! # Design
//! - Every operation client wraps one [`ApiClient`], which owns the shared
//!   request path: encode, execute, interpret.
//! - Network I/O sits behind the [`Transport`] trait. [`UreqTransport`] is
//!   the blocking default; tests substitute canned transports.
//! - Results go to memory, to any `io::Write`, or to a file that is
//!   removed again when the operation fails.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod encode;
pub mod error;
pub mod html_to_pdf;
pub mod http;
pub mod job;
pub mod options;
pub mod output;
pub mod pdf_merge;
pub mod pdf_to_text;
pub mod response;
pub mod types;
pub mod usage;
pub mod validate;
pub mod web_elements;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use html_to_pdf::HtmlToPdfClient;
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use job::{AsyncJobClient, PollSettings};
pub use options::{
    OutputFormat, PageLayout, PageMode, PageNumbersAlignment, PageOrientation, PageSize,
    RenderingEngine, SecureProtocol, StartupMode,
};
pub use pdf_merge::PdfMergeClient;
pub use pdf_to_text::PdfToTextClient;
pub use types::{TextPosition, Usage, WebElement};
pub use usage::UsageClient;
pub use web_elements::WebElementsClient;
