//! Structured contract record returned by the extraction service.
//!
//! A [`Record`] carries twelve fixed scalar fields, an optional ramp schedule,
//! and every other key the service (or an operator editing raw JSON) put in
//! the object. Unknown keys are kept in insertion order so that a record
//! serialized to raw text and parsed back is identical to the original.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single scalar field value.
///
/// The extraction service is loose about types: prices arrive as strings,
/// `term_months` as an integer, `tax_percent` as a float. Form edits always
/// write [`Scalar::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Flag(bool),
    Integer(i64),
    /// Integers above `i64::MAX`; kept exact rather than widened to `f64`.
    Unsigned(u64),
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

// ── Field keys ──

/// The fixed, form-editable keys of a [`Record`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    PlanId,
    ItemPriceId,
    StartDate,
    TermMonths,
    BasePricePerMonth,
    TaxPercent,
    Currency,
    PoNumber,
    PaymentTerms,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown field key: {0}")]
pub struct UnknownFieldKey(pub String);

impl FieldKey {
    pub const ALL: [FieldKey; 12] = [
        Self::CustomerName,
        Self::CustomerEmail,
        Self::CustomerPhone,
        Self::PlanId,
        Self::ItemPriceId,
        Self::StartDate,
        Self::TermMonths,
        Self::BasePricePerMonth,
        Self::TaxPercent,
        Self::Currency,
        Self::PoNumber,
        Self::PaymentTerms,
    ];

    /// JSON key as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerName => "customer_name",
            Self::CustomerEmail => "customer_email",
            Self::CustomerPhone => "customer_phone",
            Self::PlanId => "plan_id",
            Self::ItemPriceId => "item_price_id",
            Self::StartDate => "start_date",
            Self::TermMonths => "term_months",
            Self::BasePricePerMonth => "base_price_per_month",
            Self::TaxPercent => "tax_percent",
            Self::Currency => "currency",
            Self::PoNumber => "po_number",
            Self::PaymentTerms => "payment_terms",
        }
    }

    /// Human label shown next to the form input.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CustomerName => "Customer Name",
            Self::CustomerEmail => "Customer Email",
            Self::CustomerPhone => "Customer Phone",
            Self::PlanId => "Plan ID",
            Self::ItemPriceId => "Item Price ID",
            Self::StartDate => "Start Date",
            Self::TermMonths => "Term (months)",
            Self::BasePricePerMonth => "Base Price/Month",
            Self::TaxPercent => "Tax %",
            Self::Currency => "Currency",
            Self::PoNumber => "PO Number",
            Self::PaymentTerms => "Payment Terms",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = UnknownFieldKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownFieldKey(s.to_string()))
    }
}

// ── Ramp schedule ──

/// One time-bounded pricing phase of a ramp schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RampPhase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_month: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_month: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_month: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

// ── Record ──

/// The contract data under review.
///
/// Absent and `null` fixed keys both read as `None` and are omitted when
/// serialized. Keys outside the fixed set land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_price_id: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_months: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price_per_month: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percent: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_number: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp: Option<Vec<RampPhase>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, key: FieldKey) -> Option<&Scalar> {
        match key {
            FieldKey::CustomerName => self.customer_name.as_ref(),
            FieldKey::CustomerEmail => self.customer_email.as_ref(),
            FieldKey::CustomerPhone => self.customer_phone.as_ref(),
            FieldKey::PlanId => self.plan_id.as_ref(),
            FieldKey::ItemPriceId => self.item_price_id.as_ref(),
            FieldKey::StartDate => self.start_date.as_ref(),
            FieldKey::TermMonths => self.term_months.as_ref(),
            FieldKey::BasePricePerMonth => self.base_price_per_month.as_ref(),
            FieldKey::TaxPercent => self.tax_percent.as_ref(),
            FieldKey::Currency => self.currency.as_ref(),
            FieldKey::PoNumber => self.po_number.as_ref(),
            FieldKey::PaymentTerms => self.payment_terms.as_ref(),
        }
    }

    fn slot_mut(&mut self, key: FieldKey) -> &mut Option<Scalar> {
        match key {
            FieldKey::CustomerName => &mut self.customer_name,
            FieldKey::CustomerEmail => &mut self.customer_email,
            FieldKey::CustomerPhone => &mut self.customer_phone,
            FieldKey::PlanId => &mut self.plan_id,
            FieldKey::ItemPriceId => &mut self.item_price_id,
            FieldKey::StartDate => &mut self.start_date,
            FieldKey::TermMonths => &mut self.term_months,
            FieldKey::BasePricePerMonth => &mut self.base_price_per_month,
            FieldKey::TaxPercent => &mut self.tax_percent,
            FieldKey::Currency => &mut self.currency,
            FieldKey::PoNumber => &mut self.po_number,
            FieldKey::PaymentTerms => &mut self.payment_terms,
        }
    }

    /// Assign one fixed field as text. Touches no other key.
    pub fn set_text(&mut self, key: FieldKey, value: impl Into<String>) {
        *self.slot_mut(key) = Some(Scalar::Text(value.into()));
    }

    /// Ramp phases, empty when the record has no schedule.
    pub fn ramp_phases(&self) -> &[RampPhase] {
        self.ramp.as_deref().unwrap_or_default()
    }

    /// Serialize to the raw-text representation: JSON with two-space indent.
    pub fn to_raw(&self) -> String {
        // String-keyed maps and JSON-sourced scalars always serialize.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Parse the raw-text representation. Only a JSON object of the record
    /// shape is accepted.
    pub fn from_raw(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
