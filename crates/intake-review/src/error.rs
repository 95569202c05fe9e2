use intake_transport::{Operation, TransportError};
use thiserror::Error;

use crate::workflow::Stage;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("cannot {action} while {stage}")]
    NotAllowed { action: &'static str, stage: Stage },

    #[error("{0} already in flight")]
    Busy(Operation),

    #[error("no file selected")]
    NoFileSelected,

    #[error("PIN is required")]
    PinRequired,

    #[error("Invalid JSON. Please fix the format. ({0})")]
    InvalidRaw(String),

    #[error("field edits need the form view")]
    FormViewInactive,

    #[error("raw edits need the raw view")]
    RawViewInactive,

    #[error("delete-all was not requested")]
    DeleteNotRequested,

    #[error(transparent)]
    Transport(#[from] TransportError),
}
