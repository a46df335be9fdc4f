//! HTML to PDF conversion.
//!
//! # Design
//! A conversion source is either a public url or an HTML string (optionally
//! with a base url for relative resources). Every public `convert_*` method
//! goes through the same three steps: validate and assemble the source,
//! run the request synchronously or as an async job, then hand the bytes to
//! the requested sink. Option setters validate eagerly and store one named
//! parameter each, so a misconfigured client fails before any request.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::client::{ApiClient, Mode};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Transport, UreqTransport};
use crate::job::PollSettings;
use crate::options::{
    PageLayout, PageMode, PageNumbersAlignment, PageOrientation, PageSize, RenderingEngine,
    SecureProtocol, StartupMode,
};
use crate::output;
use crate::types::WebElement;
use crate::validate;
use crate::web_elements::WebElementsClient;

#[derive(Debug, Clone, Copy)]
enum Source<'a> {
    Url(&'a str),
    Html {
        html: &'a str,
        base_url: Option<&'a str>,
    },
}

/// Converts web pages and HTML strings to PDF.
pub struct HtmlToPdfClient {
    inner: ApiClient,
}

impl HtmlToPdfClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(UreqTransport::new(config.timeout)))
    }

    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: ApiClient::new(config, "convert", transport),
        }
    }

    /// The underlying request state (options, endpoints, last outcome).
    pub fn api_client(&self) -> &ApiClient {
        &self.inner
    }

    // ---------------------------------------------------------------------
    // Conversions
    // ---------------------------------------------------------------------

    /// Convert a public `http://` or `https://` page and return the PDF.
    pub fn convert_url(&mut self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.convert(Source::Url(url), Mode::Sync)
    }

    pub fn convert_url_to_writer<W: Write + ?Sized>(&mut self, url: &str, writer: &mut W) -> Result<(), ApiError> {
        self.convert_to_writer(Source::Url(url), Mode::Sync, writer)
    }

    /// Convert `url` into the file at `path`. The file is removed on failure.
    pub fn convert_url_to_file(&mut self, url: &str, path: impl AsRef<Path>) -> Result<(), ApiError> {
        self.convert_to_file(Source::Url(url), Mode::Sync, path.as_ref())
    }

    pub fn convert_url_async(&mut self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.convert(Source::Url(url), Mode::Async)
    }

    pub fn convert_url_to_writer_async<W: Write + ?Sized>(
        &mut self,
        url: &str,
        writer: &mut W,
    ) -> Result<(), ApiError> {
        self.convert_to_writer(Source::Url(url), Mode::Async, writer)
    }

    pub fn convert_url_to_file_async(&mut self, url: &str, path: impl AsRef<Path>) -> Result<(), ApiError> {
        self.convert_to_file(Source::Url(url), Mode::Async, path.as_ref())
    }

    pub fn convert_html_string(&mut self, html: &str) -> Result<Vec<u8>, ApiError> {
        self.convert(Source::Html { html, base_url: None }, Mode::Sync)
    }

    /// Convert `html`, resolving relative resources (css, images, scripts)
    /// against `base_url`, which must be a public `http://` or `https://` url.
    pub fn convert_html_string_with_base_url(&mut self, html: &str, base_url: &str) -> Result<Vec<u8>, ApiError> {
        let source = Source::Html {
            html,
            base_url: Some(base_url),
        };
        self.convert(source, Mode::Sync)
    }

    pub fn convert_html_string_to_writer<W: Write + ?Sized>(
        &mut self,
        html: &str,
        base_url: Option<&str>,
        writer: &mut W,
    ) -> Result<(), ApiError> {
        self.convert_to_writer(Source::Html { html, base_url }, Mode::Sync, writer)
    }

    pub fn convert_html_string_to_file(
        &mut self,
        html: &str,
        base_url: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<(), ApiError> {
        self.convert_to_file(Source::Html { html, base_url }, Mode::Sync, path.as_ref())
    }

    pub fn convert_html_string_async(&mut self, html: &str) -> Result<Vec<u8>, ApiError> {
        self.convert(Source::Html { html, base_url: None }, Mode::Async)
    }

    pub fn convert_html_string_with_base_url_async(
        &mut self,
        html: &str,
        base_url: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let source = Source::Html {
            html,
            base_url: Some(base_url),
        };
        self.convert(source, Mode::Async)
    }

    pub fn convert_html_string_to_writer_async<W: Write + ?Sized>(
        &mut self,
        html: &str,
        base_url: Option<&str>,
        writer: &mut W,
    ) -> Result<(), ApiError> {
        self.convert_to_writer(Source::Html { html, base_url }, Mode::Async, writer)
    }

    pub fn convert_html_string_to_file_async(
        &mut self,
        html: &str,
        base_url: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<(), ApiError> {
        self.convert_to_file(Source::Html { html, base_url }, Mode::Async, path.as_ref())
    }

    /// Pages in the last generated PDF.
    pub fn number_of_pages(&self) -> u32 {
        self.inner.number_of_pages()
    }

    /// Job id of the last conversion, if the server issued one.
    pub fn job_id(&self) -> Option<&str> {
        self.inner.job_id()
    }

    /// Positions of the elements matched by
    /// [`set_web_elements_selectors`](Self::set_web_elements_selectors) in
    /// the last conversion. Empty when nothing was converted yet or nothing
    /// matched.
    pub fn get_web_elements(&self) -> Result<Vec<WebElement>, ApiError> {
        let Some(job_id) = self.inner.job_id() else {
            return Ok(Vec::new());
        };
        WebElementsClient::for_job(
            self.inner.api_key(),
            self.inner.web_elements_endpoint(),
            job_id,
            self.inner.transport(),
        )
        .get_web_elements()
    }

    fn prepare(&mut self, source: Source<'_>) -> Result<(), ApiError> {
        match source {
            Source::Url(url) => validate::public_url(url, "converted webpage")?,
            Source::Html {
                base_url: Some(base_url),
                ..
            } => validate::public_url(base_url, "base url")?,
            Source::Html { .. } => {}
        }

        self.inner.begin_operation();
        match source {
            Source::Url(url) => {
                info!("Converting url {}", url);
                self.inner.set_param("url", url);
            }
            Source::Html { html, base_url } => {
                info!("Converting HTML string ({} bytes)", html.len());
                self.inner.set_param("html", html);
                if let Some(base_url) = base_url {
                    self.inner.set_param("base_url", base_url);
                }
            }
        }
        Ok(())
    }

    fn convert(&mut self, source: Source<'_>, mode: Mode) -> Result<Vec<u8>, ApiError> {
        self.prepare(source)?;
        self.inner.run(mode)
    }

    fn convert_to_writer<W: Write + ?Sized>(
        &mut self,
        source: Source<'_>,
        mode: Mode,
        writer: &mut W,
    ) -> Result<(), ApiError> {
        let pdf = self.convert(source, mode)?;
        output::write_to_writer(writer, &pdf)
    }

    fn convert_to_file(&mut self, source: Source<'_>, mode: Mode, path: &Path) -> Result<(), ApiError> {
        self.prepare(source)?;
        output::write_to_file(path, |file| {
            let pdf = self.inner.run(mode)?;
            output::write_to_writer(file, &pdf)
        })
    }

    // ---------------------------------------------------------------------
    // Endpoints and async behaviour
    // ---------------------------------------------------------------------

    pub fn set_api_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.inner.set_api_endpoint(endpoint);
        self
    }

    pub fn set_api_async_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.inner.set_api_async_endpoint(endpoint);
        self
    }

    pub fn set_api_web_elements_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.inner.set_api_web_elements_endpoint(endpoint);
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

    // ---------------------------------------------------------------------
    // Page setup
    // ---------------------------------------------------------------------

    pub fn set_page_size(&mut self, page_size: PageSize) -> &mut Self {
        self.inner.set_option("page_size", page_size.as_param());
        self
    }

    /// Page width in points. Only used with [`PageSize::Custom`].
    pub fn set_page_width(&mut self, width: u32) -> &mut Self {
        self.inner.set_option("page_width", width.to_string());
        self
    }

    /// Page height in points. Only used with [`PageSize::Custom`].
    pub fn set_page_height(&mut self, height: u32) -> &mut Self {
        self.inner.set_option("page_height", height.to_string());
        self
    }

    pub fn set_page_orientation(&mut self, orientation: PageOrientation) -> &mut Self {
        self.inner.set_option("page_orientation", orientation.as_param());
        self
    }

    pub fn set_margin_top(&mut self, margin: u32) -> &mut Self {
        self.inner.set_option("margin_top", margin.to_string());
        self
    }

    pub fn set_margin_right(&mut self, margin: u32) -> &mut Self {
        self.inner.set_option("margin_right", margin.to_string());
        self
    }

    pub fn set_margin_bottom(&mut self, margin: u32) -> &mut Self {
        self.inner.set_option("margin_bottom", margin.to_string());
        self
    }

    pub fn set_margin_left(&mut self, margin: u32) -> &mut Self {
        self.inner.set_option("margin_left", margin.to_string());
        self
    }

    /// Same margin, in points, on all four sides.
    pub fn set_margins(&mut self, margin: u32) -> &mut Self {
        self.set_margin_top(margin)
            .set_margin_right(margin)
            .set_margin_bottom(margin)
            .set_margin_left(margin)
    }

    pub fn set_pdf_name(&mut self, name: &str) -> &mut Self {
        self.inner.set_option("pdf_name", name);
        self
    }

    // ---------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------

    pub fn set_rendering_engine(&mut self, engine: RenderingEngine) -> &mut Self {
        self.inner.set_option("engine", engine.as_param());
        self
    }

    pub fn set_user_password(&mut self, password: &str) -> &mut Self {
        self.inner.set_option("user_password", password);
        self
    }

    pub fn set_owner_password(&mut self, password: &str) -> &mut Self {
        self.inner.set_option("owner_password", password);
        self
    }

    /// Width of the browser viewport in pixels. Default on the server: 1024.
    pub fn set_web_page_width(&mut self, width: u32) -> &mut Self {
        self.inner.set_option("web_page_width", width.to_string());
        self
    }

    /// Height of the browser viewport in pixels. 0 renders the whole page.
    pub fn set_web_page_height(&mut self, height: u32) -> &mut Self {
        self.inner.set_option("web_page_height", height.to_string());
        self
    }

    /// Seconds to wait after the page loads before rendering.
    pub fn set_min_load_time(&mut self, seconds: u32) -> &mut Self {
        self.inner.set_option("min_load_time", seconds.to_string());
        self
    }

    pub fn set_conversion_delay(&mut self, seconds: u32) -> &mut Self {
        self.set_min_load_time(seconds)
    }

    /// Seconds after which page loading is abandoned.
    pub fn set_max_load_time(&mut self, seconds: u32) -> &mut Self {
        self.inner.set_option("max_load_time", seconds.to_string());
        self
    }

    pub fn set_navigation_timeout(&mut self, seconds: u32) -> &mut Self {
        self.set_max_load_time(seconds)
    }

    pub fn set_secure_protocol(&mut self, protocol: SecureProtocol) -> &mut Self {
        self.inner.set_option("protocol", protocol.as_param());
        self
    }

    pub fn set_use_css_print(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("use_css_print", value);
        self
    }

    pub fn set_background_color(&mut self, color: &str) -> Result<&mut Self, ApiError> {
        validate::color(color)?;
        self.inner.set_option("background_color", color);
        Ok(self)
    }

    pub fn set_draw_html_background(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("draw_html_background", value);
        self
    }

    pub fn set_disable_javascript(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("disable_javascript", value);
        self
    }

    pub fn set_disable_internal_links(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("disable_internal_links", value);
        self
    }

    pub fn set_disable_external_links(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("disable_external_links", value);
        self
    }

    pub fn set_render_on_timeout(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("render_on_timeout", value);
        self
    }

    pub fn set_keep_images_together(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("keep_images_together", value);
        self
    }

    pub fn set_startup_mode(&mut self, mode: StartupMode) -> &mut Self {
        self.inner.set_option("startup_mode", mode.as_param());
        self
    }

    pub fn set_skip_decoding(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("skip_decoding", value);
        self
    }

    pub fn set_scale_images(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("scale_images", value);
        self
    }

    pub fn set_single_page_pdf(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("single_page_pdf", value);
        self
    }

    pub fn set_page_breaks_enhanced_algorithm(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("page_breaks_enhanced_algorithm", value);
        self
    }

    // ---------------------------------------------------------------------
    // Document information and viewer preferences
    // ---------------------------------------------------------------------

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

    pub fn set_viewer_page_layout(&mut self, layout: PageLayout) -> &mut Self {
        self.inner.set_option("viewer_page_layout", layout.as_param());
        self
    }

    pub fn set_viewer_page_mode(&mut self, mode: PageMode) -> &mut Self {
        self.inner.set_option("viewer_page_mode", mode.as_param());
        self
    }

    pub fn set_viewer_center_window(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("viewer_center_window", value);
        self
    }

    pub fn set_viewer_display_doc_title(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("viewer_display_doc_title", value);
        self
    }

    pub fn set_viewer_fit_window(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("viewer_fit_window", value);
        self
    }

    pub fn set_viewer_hide_menu_bar(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("viewer_hide_menu_bar", value);
        self
    }

    pub fn set_viewer_hide_toolbar(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("viewer_hide_toolbar", value);
        self
    }

    pub fn set_viewer_hide_window_ui(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("viewer_hide_window_ui", value);
        self
    }

    // ---------------------------------------------------------------------
    // Header and footer
    // ---------------------------------------------------------------------

    pub fn set_show_header(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("show_header", value);
        self
    }

    pub fn set_header_height(&mut self, height: u32) -> &mut Self {
        self.inner.set_option("header_height", height.to_string());
        self
    }

    pub fn set_header_url(&mut self, url: &str) -> Result<&mut Self, ApiError> {
        validate::public_url(url, "url")?;
        self.inner.set_option("header_url", url);
        Ok(self)
    }

    pub fn set_header_html(&mut self, html: &str) -> &mut Self {
        self.inner.set_option("header_html", html);
        self
    }

    pub fn set_header_base_url(&mut self, base_url: &str) -> Result<&mut Self, ApiError> {
        validate::public_url(base_url, "base url")?;
        self.inner.set_option("header_base_url", base_url);
        Ok(self)
    }

    pub fn set_header_display_on_first_page(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("header_display_on_first_page", value);
        self
    }

    pub fn set_header_display_on_odd_pages(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("header_display_on_odd_pages", value);
        self
    }

    pub fn set_header_display_on_even_pages(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("header_display_on_even_pages", value);
        self
    }

    pub fn set_show_footer(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("show_footer", value);
        self
    }

    pub fn set_footer_height(&mut self, height: u32) -> &mut Self {
        self.inner.set_option("footer_height", height.to_string());
        self
    }

    pub fn set_footer_url(&mut self, url: &str) -> Result<&mut Self, ApiError> {
        validate::public_url(url, "url")?;
        self.inner.set_option("footer_url", url);
        Ok(self)
    }

    pub fn set_footer_html(&mut self, html: &str) -> &mut Self {
        self.inner.set_option("footer_html", html);
        self
    }

    pub fn set_footer_base_url(&mut self, base_url: &str) -> Result<&mut Self, ApiError> {
        validate::public_url(base_url, "base url")?;
        self.inner.set_option("footer_base_url", base_url);
        Ok(self)
    }

    pub fn set_footer_display_on_first_page(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("footer_display_on_first_page", value);
        self
    }

    pub fn set_footer_display_on_odd_pages(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("footer_display_on_odd_pages", value);
        self
    }

    pub fn set_footer_display_on_even_pages(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("footer_display_on_even_pages", value);
        self
    }

    pub fn set_footer_display_on_last_page(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("footer_display_on_last_page", value);
        self
    }

    // ---------------------------------------------------------------------
    // Page numbers
    // ---------------------------------------------------------------------

    /// Page numbers are drawn in the footer, so they also need
    /// [`set_show_footer`](Self::set_show_footer).
    pub fn set_show_page_numbers(&mut self, value: bool) -> &mut Self {
        self.inner.set_bool_option("page_numbers", value);
        self
    }

    pub fn set_page_numbers_first(&mut self, first: i32) -> &mut Self {
        self.inner.set_option("page_numbers_first", first.to_string());
        self
    }

    pub fn set_page_numbers_offset(&mut self, offset: i32) -> &mut Self {
        self.inner.set_option("page_numbers_offset", offset.to_string());
        self
    }

    /// Template such as `"Page: {page_number} of {total_pages}"`.
    pub fn set_page_numbers_template(&mut self, template: &str) -> &mut Self {
        self.inner.set_option("page_numbers_template", template);
        self
    }

    pub fn set_page_numbers_font_name(&mut self, font_name: &str) -> &mut Self {
        self.inner.set_option("page_numbers_font_name", font_name);
        self
    }

    pub fn set_page_numbers_font_size(&mut self, font_size: u32) -> &mut Self {
        self.inner.set_option("page_numbers_font_size", font_size.to_string());
        self
    }

    pub fn set_page_numbers_alignment(&mut self, alignment: PageNumbersAlignment) -> &mut Self {
        self.inner.set_option("page_numbers_alignment", alignment.as_param());
        self
    }

    pub fn set_page_numbers_color(&mut self, color: &str) -> Result<&mut Self, ApiError> {
        validate::color(color)?;
        self.inner.set_option("page_numbers_color", color);
        Ok(self)
    }

    pub fn set_page_numbers_vertical_position(&mut self, position: i32) -> &mut Self {
        self.inner.set_option("page_numbers_pos_y", position.to_string());
        self
    }

    // ---------------------------------------------------------------------
    // Element selection
    // ---------------------------------------------------------------------

    /// CSS selectors of the elements that get a bookmark, e.g. `"H1, H2"`.
    pub fn set_pdf_bookmarks_selectors(&mut self, selectors: &str) -> &mut Self {
        self.inner.set_option("pdf_bookmarks_selectors", selectors);
        self
    }

    /// CSS selectors of the elements left out of the PDF.
    pub fn set_pdf_hide_elements(&mut self, selectors: &str) -> &mut Self {
        self.inner.set_option("pdf_hide_elements", selectors);
        self
    }

    pub fn set_pdf_show_only_element_id(&mut self, element_id: &str) -> &mut Self {
        self.inner.set_option("pdf_show_only_element_id", element_id);
        self
    }

    /// CSS selectors of the elements whose positions are recorded and later
    /// returned by [`get_web_elements`](Self::get_web_elements).
    pub fn set_web_elements_selectors(&mut self, selectors: &str) -> &mut Self {
        self.inner.set_option("web_elements_selectors", selectors);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{form, CannedTransport};

    fn client(transport: Arc<CannedTransport>) -> HtmlToPdfClient {
        let config = ClientConfig::new("k")
            .with_base_url("https://api.test/api2/")
            .with_ping_interval(Duration::ZERO);
        HtmlToPdfClient::with_transport(&config, transport)
    }

    #[test]
    fn rejects_non_http_scheme_without_network() {
        let transport = CannedTransport::new(Vec::new());
        let err = client(transport.clone()).convert_url("ftp://x").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn rejects_localhost_without_network() {
        let transport = CannedTransport::new(Vec::new());
        let mut c = client(transport.clone());
        assert!(matches!(
            c.convert_url("http://localhost/x"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            c.convert_url_async("http://localhost/x"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            c.convert_html_string_with_base_url("<p>x</p>", "file:///tmp"),
            Err(ApiError::Validation(_))
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn invalid_url_does_not_create_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let transport = CannedTransport::new(Vec::new());
        let err = client(transport).convert_url_to_file("ftp://x", &path).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(!path.exists());
    }

    #[test]
    fn convert_url_sends_options_and_reads_pages() {
        let transport = CannedTransport::new(vec![CannedTransport::ok(b"%PDF-1.4", 3)]);
        let mut c = client(transport.clone());
        c.set_page_size(PageSize::A4)
            .set_page_orientation(PageOrientation::Landscape)
            .set_margins(5)
            .set_show_page_numbers(false)
            .set_page_numbers_alignment(PageNumbersAlignment::Center);

        let pdf = c.convert_url("https://selectpdf.com").unwrap();
        assert_eq!(pdf, b"%PDF-1.4");
        assert_eq!(c.number_of_pages(), 3);

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://api.test/api2/convert/");
        let params = form(request);
        assert_eq!(params["key"], "k");
        assert_eq!(params["url"], "https://selectpdf.com");
        assert_eq!(params["page_size"], "A4");
        assert_eq!(params["page_orientation"], "Landscape");
        assert_eq!(params["margin_left"], "5");
        assert_eq!(params["page_numbers"], "False");
        assert_eq!(params["page_numbers_alignment"], "2");
        assert_eq!(params["async"], "False");
    }

    #[test]
    fn html_then_url_does_not_leak_html() {
        let transport = CannedTransport::new(vec![
            CannedTransport::ok(b"a", 1),
            CannedTransport::ok(b"b", 1),
        ]);
        let mut c = client(transport.clone());
        c.convert_html_string_with_base_url("<b>hi</b>", "https://base.test/")
            .unwrap();
        c.convert_url("https://selectpdf.com").unwrap();

        let requests = transport.requests();
        let first = form(&requests[0]);
        assert_eq!(first["html"], "<b>hi</b>");
        assert_eq!(first["base_url"], "https://base.test/");
        let second = form(&requests[1]);
        assert!(!second.contains_key("html"));
        assert!(!second.contains_key("base_url"));
    }

    #[test]
    fn async_conversion_polls_job() {
        let transport = CannedTransport::new(vec![
            CannedTransport::accepted("J1"),
            CannedTransport::running(),
            CannedTransport::ok(b"DONE", 2),
        ]);
        let mut c = client(transport.clone());
        let pdf = c.convert_html_string_async("<p>x</p>").unwrap();
        assert_eq!(pdf, b"DONE");
        assert_eq!(c.number_of_pages(), 2);
        assert_eq!(c.job_id(), Some("J1"));

        let requests = transport.requests();
        assert_eq!(form(&requests[0])["async"], "True");
        assert_eq!(requests[1].url, "https://api.test/api2/asyncjob/");
        assert_eq!(form(&requests[2])["job_id"], "J1");
    }

    #[test]
    fn async_timeout_removes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let transport = CannedTransport::new(vec![
            CannedTransport::accepted("J1"),
            CannedTransport::running(),
            CannedTransport::running(),
        ]);
        let mut c = client(transport.clone());
        c.set_async_calls_max_pings(2);
        let err = c.convert_url_to_file_async("https://selectpdf.com", &path).unwrap_err();
        assert!(matches!(err, ApiError::AsyncTimeout { pings: 2 }));
        assert!(!path.exists());
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn transport_failure_removes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let transport = CannedTransport::new(vec![Err(ApiError::Transport("reset".into()))]);
        let err = client(transport).convert_url_to_file("https://selectpdf.com", &path).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(!path.exists());
    }

    #[test]
    fn file_output_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let bytes = b"%PDF-1.4\n\x00\xffbinary".to_vec();
        let transport = CannedTransport::new(vec![CannedTransport::ok(&bytes, 1)]);
        client(transport)
            .convert_html_string_to_file("<p>x</p>", None, &path)
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn writer_output() {
        let transport = CannedTransport::new(vec![CannedTransport::ok(b"%PDF", 1)]);
        let mut sink = Vec::new();
        client(transport)
            .convert_url_to_writer("https://selectpdf.com", &mut sink)
            .unwrap();
        assert_eq!(sink, b"%PDF");
    }

    #[test]
    fn validated_setters() {
        let transport = CannedTransport::new(Vec::new());
        let mut c = client(transport);
        assert!(c.set_background_color("#FFFFFF").is_ok());
        assert!(c.set_page_numbers_color("blue").is_err());
        assert!(c.set_header_url("https://localhost/h").is_ok());
        assert!(c.set_footer_url("http://localhost/f").is_err());
        assert!(c.set_footer_base_url("ftp://f").is_err());
        let options = c.api_client().options();
        assert_eq!(options.get("background_color"), Some("#FFFFFF"));
        assert_eq!(options.get("header_url"), Some("https://localhost/h"));
        assert_eq!(options.get("page_numbers_color"), None);
        assert_eq!(options.get("footer_url"), None);
    }

    #[test]
    fn aliases_write_the_same_option() {
        let transport = CannedTransport::new(Vec::new());
        let mut c = client(transport);
        c.set_conversion_delay(2).set_navigation_timeout(40);
        let options = c.api_client().options();
        assert_eq!(options.get("min_load_time"), Some("2"));
        assert_eq!(options.get("max_load_time"), Some("40"));
    }

    #[test]
    fn web_elements_follow_conversion_job() {
        let transport = CannedTransport::new(vec![
            Ok(crate::http::HttpResponse {
                status: 200,
                headers: vec![
                    ("selectpdf-api-jobid".into(), "J7".into()),
                    ("selectpdf-api-pages".into(), "1".into()),
                ],
                body: b"%PDF".to_vec(),
            }),
            CannedTransport::ok(br#"[{"PageIndex":0,"X":1,"Y":2,"Width":3,"Height":4}]"#, 0),
        ]);
        let mut c = client(transport.clone());
        c.set_web_elements_selectors("h1");
        c.convert_url("https://selectpdf.com").unwrap();

        let elements = c.get_web_elements().unwrap();
        assert_eq!(elements.len(), 1);
        let request = &transport.requests()[1];
        assert_eq!(request.url, "https://api.test/api2/webelements/");
        assert_eq!(form(request)["job_id"], "J7");
    }

    #[test]
    fn web_elements_without_job_are_empty() {
        let transport = CannedTransport::new(Vec::new());
        let c = client(transport.clone());
        assert!(c.get_web_elements().unwrap().is_empty());
        assert_eq!(transport.calls(), 0);
    }
}
