//! JSON envelopes exchanged with the contract service, and the values the
//! review controller keeps once an envelope has been interpreted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Record;

/// Fallback text when an upload fails without an error message.
pub const EXTRACTION_FAILED: &str = "Extraction failed";
/// Fallback text when a confirmation fails without an error message.
pub const CONFIRMATION_FAILED: &str = "Confirmation failed";
/// Fallback text when a delete fails without a message.
pub const DELETE_FAILED: &str = "Unknown error";

/// Non-success answer from the service, carrying its literal text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct Rejected(pub String);

/// Opaque identifier the service assigns to an uploaded contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }

    /// Size in MiB with two decimals, e.g. `"2.00 MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.content.len() as f64 / (1024.0 * 1024.0))
    }
}

// ── Upload ──

/// Successful extraction: the new contract's id and its record.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub contract_id: ContractId,
    pub record: Record,
}

/// `POST /api/contracts/upload` response body.
///
/// Error responses omit `success`, so it defaults to `false`.
#[derive(Debug, Deserialize)]
pub struct UploadEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub extracted: Option<Record>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadEnvelope {
    pub fn into_result(self) -> Result<Extraction, Rejected> {
        match (self.success, self.contract_id, self.extracted) {
            (true, Some(id), Some(record)) => Ok(Extraction {
                contract_id: ContractId(id),
                record,
            }),
            (true, _, _) => Err(Rejected(
                self.error
                    .unwrap_or_else(|| "upload response missing contract_id or extracted".into()),
            )),
            (false, _, _) => Err(Rejected(
                self.error.unwrap_or_else(|| EXTRACTION_FAILED.into()),
            )),
        }
    }
}

// ── Confirm ──

/// `POST /api/contracts/confirm` request body.
#[derive(Debug, Serialize)]
pub struct ConfirmBody<'a> {
    pub contract_id: &'a str,
    pub extracted: &'a Record,
    pub pin: &'a str,
}

/// Billing outcome reported by the service after a commit.
///
/// When billing sync is disabled server-side the service answers
/// `{"skipped": true, "reason": ...}` and no subscription exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfirmReceipt {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub item_price_id: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ConfirmReceipt {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

/// `POST /api/contracts/confirm` response body.
#[derive(Debug, Deserialize)]
pub struct ConfirmEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub chargebee: Option<ConfirmReceipt>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ConfirmEnvelope {
    pub fn into_result(self) -> Result<ConfirmReceipt, Rejected> {
        if self.success {
            Ok(self.chargebee.unwrap_or_default())
        } else {
            Err(Rejected(
                self.error.unwrap_or_else(|| CONFIRMATION_FAILED.into()),
            ))
        }
    }
}

// ── Delete ──

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReceipt {
    pub message: Option<String>,
}

/// `DELETE /api/contracts/delete` response body.
#[derive(Debug, Deserialize)]
pub struct DeleteEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DeleteEnvelope {
    pub fn into_result(self) -> Result<DeleteReceipt, Rejected> {
        if self.success {
            Ok(DeleteReceipt {
                message: self.message,
            })
        } else {
            Err(Rejected(
                self.message
                    .or(self.error)
                    .unwrap_or_else(|| DELETE_FAILED.into()),
            ))
        }
    }
}
