//! Transport layer: the three network operations the review controller
//! depends on, behind a trait so the controller never touches HTTP directly.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use intake_core::{
    ConfirmReceipt, ContractId, DeleteReceipt, Extraction, Pin, Record, Rejected, UploadFile,
};
use thiserror::Error;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpTransport;

/// The network operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Confirm,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::Confirm => "confirm",
            Self::Delete => "delete",
        })
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// The service answered with `success: false`; the text is shown as-is.
    #[error("{0}")]
    Rejected(#[from] Rejected),
    /// `limit` prints in its `Debug` form so sub-second limits stay exact.
    #[error("{operation} timed out after {limit:?}")]
    TimedOut {
        operation: Operation,
        limit: Duration,
    },
    /// The caller dropped the request before it settled.
    #[error("{operation} was cancelled")]
    Cancelled { operation: Operation },
}

/// Network operations against the contract service.
///
/// Every call is a single attempt; retries are driven by the operator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Upload a contract file and receive the extracted record.
    async fn upload(&self, file: &UploadFile) -> Result<Extraction, TransportError>;

    /// Commit a reviewed record to billing, gated by `pin`.
    async fn confirm(
        &self,
        contract_id: &ContractId,
        record: &Record,
        pin: &Pin,
    ) -> Result<ConfirmReceipt, TransportError>;

    /// Delete every stored upload and extraction on the service.
    async fn delete_all(&self) -> Result<DeleteReceipt, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_text_is_verbatim() {
        let err = TransportError::from(Rejected("declined".into()));
        assert_eq!(err.to_string(), "declined");
    }

    #[test]
    fn timeout_text_names_operation() {
        let err = TransportError::TimedOut {
            operation: Operation::Confirm,
            limit: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "confirm timed out after 60s");
        let err = TransportError::TimedOut {
            operation: Operation::Upload,
            limit: Duration::from_millis(20),
        };
        assert_eq!(err.to_string(), "upload timed out after 20ms");
    }

    #[test]
    fn cancelled_text_names_operation() {
        let err = TransportError::Cancelled {
            operation: Operation::Delete,
        };
        assert_eq!(err.to_string(), "delete was cancelled");
    }

    #[test]
    fn server_error_text() {
        let err = TransportError::Server {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert_eq!(err.to_string(), "server returned 502: Bad Gateway");
    }
}
