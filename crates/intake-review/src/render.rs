//! View models for the form card, ramp schedule and result panels.
//!
//! Pure functions of the record and workflow state; front ends only print.

use intake_core::{ConfirmReceipt, FieldKey, RampPhase, Record, Scalar};

use crate::workflow::{Resolution, WorkflowState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub key: FieldKey,
    pub label: &'static str,
    /// Current value as text; empty when the key is absent.
    pub value: String,
}

/// One read-only ramp phase line, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RampBlock {
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub inputs: Vec<FormInput>,
    pub ramp: Vec<RampBlock>,
}

/// One input per fixed key in canonical order, then the ramp schedule.
/// Extra keys have no input.
pub fn form_view(record: &Record) -> FormView {
    let inputs = FieldKey::ALL
        .iter()
        .map(|&key| FormInput {
            key,
            label: key.label(),
            value: record.get(key).map(Scalar::to_string).unwrap_or_default(),
        })
        .collect();
    let ramp = record
        .ramp_phases()
        .iter()
        .enumerate()
        .map(|(i, phase)| RampBlock {
            number: i + 1,
            text: ramp_text(phase),
        })
        .collect();
    FormView { inputs, ramp }
}

fn month(value: Option<i64>) -> String {
    value.map_or_else(|| "?".to_string(), |m| m.to_string())
}

fn price_is_blank(price: &Scalar) -> bool {
    match price {
        Scalar::Flag(b) => !b,
        Scalar::Integer(n) => *n == 0,
        Scalar::Unsigned(n) => *n == 0,
        Scalar::Number(n) => *n == 0.0,
        Scalar::Text(s) => s.is_empty(),
    }
}

/// `Months S-E: PRICE (D% discount) - NOTES`. Price falls back to `N/A`;
/// a zero discount and empty notes are left out.
pub fn ramp_text(phase: &RampPhase) -> String {
    let price = phase
        .price_per_month
        .as_ref()
        .filter(|p| !price_is_blank(p))
        .map_or_else(|| "N/A".to_string(), Scalar::to_string);
    let mut text = format!(
        "Months {}-{}: {price}",
        month(phase.start_month),
        month(phase.end_month)
    );
    if let Some(d) = phase.discount_percent.filter(|d| *d != 0.0) {
        text.push_str(&format!(" ({d}% discount)"));
    }
    if let Some(notes) = phase.notes.as_deref().filter(|n| !n.is_empty()) {
        text.push_str(&format!(" - {notes}"));
    }
    text
}

impl RampBlock {
    pub fn line(&self) -> String {
        format!("Phase {}: {}", self.number, self.text)
    }
}

/// What the result area shows once a confirmation has resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPanel {
    Success { lines: Vec<String> },
    Failure { message: String },
}

impl ResultPanel {
    /// `None` until the workflow has resolved.
    pub fn for_state(state: &WorkflowState) -> Option<Self> {
        match state {
            WorkflowState::Resolved(Resolution::Success(receipt)) => Some(Self::Success {
                lines: receipt_lines(receipt),
            }),
            WorkflowState::Resolved(Resolution::Failure(message)) => Some(Self::Failure {
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

fn receipt_lines(receipt: &ConfirmReceipt) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(id) = &receipt.subscription_id {
        lines.push(format!("Subscription ID: {id}"));
    }
    if let Some(status) = &receipt.status {
        lines.push(format!("Status: {status}"));
    }
    if let Some(customer) = &receipt.customer_id {
        lines.push(format!("Customer ID: {customer}"));
    }
    if let Some(price) = &receipt.item_price_id {
        lines.push(format!("Item Price ID: {price}"));
    }
    if let Some(created) = receipt.created_at_utc() {
        lines.push(format!("Created: {}", created.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if receipt.skipped {
        let reason = receipt.reason.as_deref().unwrap_or("no reason given");
        lines.push(format!("Billing sync skipped: {reason}"));
    }
    lines
}
