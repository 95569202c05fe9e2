//! PIN-gated confirmation: collect the secret, build the one-shot commit
//! request, and turn the collaborator's answer into a [`Resolution`].

use intake_core::{ConfirmReceipt, ContractId, Pin, Record};
use intake_transport::{Operation, Transport, TransportError};

use crate::ReviewError;
use crate::store::RecordStore;
use crate::workflow::{Resolution, Stage};

const TIMEOUT_SUFFIX: &str = "the billing system may still have recorded this contract";

/// The PIN entry surface. Independent of the record editors.
#[derive(Debug, Default)]
pub struct PinPrompt {
    entry: Pin,
    error: Option<String>,
}

impl PinPrompt {
    pub fn entry_is_empty(&self) -> bool {
        self.entry.is_empty()
    }

    /// Inline message under the PIN field.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_entry(&mut self, value: &str) {
        self.entry.replace(value);
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Wipe the entry and any message: used on open, close, retry and reset.
    pub(crate) fn wipe(&mut self) {
        self.entry.replace("");
        self.error = None;
    }

    /// Only non-emptiness is checked; the service is the authority on
    /// whether the PIN is right.
    pub(crate) fn require_entry(&mut self) -> Result<(), ReviewError> {
        if self.entry.is_empty() {
            self.error = Some(ReviewError::PinRequired.to_string());
            return Err(ReviewError::PinRequired);
        }
        Ok(())
    }

    /// Validate and move the PIN out, leaving the entry empty.
    pub(crate) fn take_pin(&mut self) -> Result<Pin, ReviewError> {
        self.require_entry()?;
        self.error = None;
        Ok(self.entry.take())
    }
}

/// Record snapshot, contract identifier and PIN for exactly one commit call.
///
/// Consumed by [`dispatch`](Self::dispatch); the PIN is wiped when it drops.
#[derive(Debug)]
pub struct PendingConfirmation {
    contract_id: ContractId,
    record: Record,
    pin: Pin,
}

impl PendingConfirmation {
    pub(crate) fn assemble(store: &RecordStore, pin: Pin) -> Result<Self, ReviewError> {
        let (contract_id, record) = store.snapshot().ok_or(ReviewError::NotAllowed {
            action: "confirm",
            stage: Stage::Idle,
        })?;
        Ok(Self {
            contract_id,
            record,
            pin,
        })
    }

    pub fn contract_id(&self) -> &ContractId {
        &self.contract_id
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub async fn dispatch<T>(self, transport: &T) -> Result<ConfirmReceipt, TransportError>
    where
        T: Transport + ?Sized,
    {
        transport
            .confirm(&self.contract_id, &self.record, &self.pin)
            .await
    }
}

/// Map a settled commit call to the terminal outcome shown to the operator.
pub fn resolve(result: Result<ConfirmReceipt, TransportError>) -> Resolution {
    match result {
        Ok(receipt) => Resolution::Success(receipt),
        // The request may have reached the service before it was cut off.
        Err(
            e @ (TransportError::TimedOut {
                operation: Operation::Confirm,
                ..
            }
            | TransportError::Cancelled {
                operation: Operation::Confirm,
            }),
        ) => Resolution::Failure(format!("{e}; {TIMEOUT_SUFFIX}")),
        Err(e) => Resolution::Failure(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use intake_core::{Extraction, Rejected};

    #[test]
    fn blank_pin_is_refused_with_message() {
        let mut prompt = PinPrompt::default();
        assert!(matches!(prompt.take_pin(), Err(ReviewError::PinRequired)));
        assert_eq!(prompt.error(), Some("PIN is required"));
    }

    #[test]
    fn take_pin_empties_the_entry() {
        let mut prompt = PinPrompt::default();
        prompt.set_entry("1234");
        let pin = prompt.take_pin().unwrap();
        assert_eq!(pin.as_str(), "1234");
        assert!(prompt.entry_is_empty());
        assert!(prompt.error().is_none());
    }

    #[test]
    fn whitespace_pin_is_passed_through() {
        let mut prompt = PinPrompt::default();
        prompt.set_entry(" ");
        assert_eq!(prompt.take_pin().unwrap().as_str(), " ");
    }

    #[test]
    fn assemble_needs_a_loaded_record() {
        let store = RecordStore::default();
        assert!(PendingConfirmation::assemble(&store, Pin::new("1")).is_err());

        let mut store = RecordStore::default();
        store.load(Extraction {
            contract_id: ContractId::new("c1"),
            record: Record::default(),
        });
        let pending = PendingConfirmation::assemble(&store, Pin::new("1")).unwrap();
        assert_eq!(pending.contract_id().as_str(), "c1");
    }

    #[test]
    fn rejection_text_is_verbatim() {
        let res = resolve(Err(Rejected("declined".into()).into()));
        assert_eq!(res, Resolution::Failure("declined".into()));
    }

    #[test]
    fn confirm_timeout_warns_about_duplicates() {
        let res = resolve(Err(TransportError::TimedOut {
            operation: Operation::Confirm,
            limit: Duration::from_secs(60),
        }));
        let expected = format!("confirm timed out after 60s; {TIMEOUT_SUFFIX}");
        assert_eq!(res, Resolution::Failure(expected));
        assert_eq!(
            TIMEOUT_SUFFIX,
            "the billing system may still have recorded this contract"
        );
    }

    #[test]
    fn cancelled_confirm_warns_about_duplicates() {
        let res = resolve(Err(TransportError::Cancelled {
            operation: Operation::Confirm,
        }));
        let expected = format!("confirm was cancelled; {TIMEOUT_SUFFIX}");
        assert_eq!(res, Resolution::Failure(expected));
    }
}
