//! Shared types for the contract intake workspace: the record under review,
//! the confirmation PIN, and the service's JSON envelopes.

pub mod pin;
pub mod record;
pub mod wire;

pub use pin::Pin;
pub use record::{FieldKey, RampPhase, Record, Scalar, UnknownFieldKey};
pub use wire::{
    ConfirmBody, ConfirmEnvelope, ConfirmReceipt, ContractId, DeleteEnvelope, DeleteReceipt,
    Extraction, Rejected, UploadEnvelope, UploadFile,
};
