//! Error types for the SelectPdf API client.
//!
//! # Design
//! Every failure surfaces synchronously to the caller as one `ApiError`.
//! Validation failures are raised before any request is built; transport and
//! remote failures carry what the server or the socket reported; the two
//! async variants describe the job protocol; `LocalIo` covers reading
//! attachments and writing results.

use std::io;

use thiserror::Error;

/// Errors returned by the SelectPdf API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A configured value failed a local constraint. No request was sent.
    #[error("{0}")]
    Validation(String),

    /// The connection itself failed (refused, reset, timed out).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a status other than 200 or 202.
    #[error("({status}) {message}")]
    Remote { status: u16, message: String },

    /// The initial async request did not yield a usable job id.
    #[error("{0}")]
    AsyncLaunch(String),

    /// The ping budget ran out while the job was still running.
    #[error("Asynchronous call did not finish in expected timeframe ({pings} pings).")]
    AsyncTimeout { pings: u32 },

    /// Reading an attachment or writing a result failed.
    #[error("{context}: {source}")]
    LocalIo {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    pub(crate) fn local_io(context: impl Into<String>, source: io::Error) -> Self {
        ApiError::LocalIo {
            context: context.into(),
            source,
        }
    }

    /// HTTP status attached to the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_display_includes_status() {
        let e = ApiError::Remote {
            status: 499,
            message: "Invalid API key".into(),
        };
        assert_eq!(e.to_string(), "(499) Invalid API key");
        assert_eq!(e.status(), Some(499));
    }

    #[test]
    fn timeout_display_mentions_pings() {
        let e = ApiError::AsyncTimeout { pings: 2 };
        assert!(e.to_string().contains("2 pings"), "got: {e}");
        assert_eq!(e.status(), None);
    }

    #[test]
    fn local_io_keeps_source() {
        let e = ApiError::local_io(
            "Error writing the PDF file to the specified path",
            io::Error::new(io::ErrorKind::WriteZero, "disk full"),
        );
        assert!(e.to_string().contains("disk full"));
        assert!(std::error::Error::source(&e).is_some());
    }
}
