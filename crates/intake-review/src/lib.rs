//! Review workflow for extracted contract records.
//!
//! One operator uploads a contract, reviews and edits the extracted record in
//! a form or raw JSON view, and commits it to billing behind a PIN. The
//! [`Session`] holds all state; the [`Controller`] runs the network calls.

pub mod controller;
pub mod error;
pub mod gate;
pub mod render;
pub mod session;
pub mod store;
pub mod sync;
pub mod workflow;

pub use controller::{Controller, ControllerConfig};
pub use error::ReviewError;
pub use gate::{PendingConfirmation, PinPrompt};
pub use render::{FormInput, FormView, RampBlock, ResultPanel, form_view, ramp_text};
pub use session::{Notice, NoticeKind, Session};
pub use store::RecordStore;
pub use sync::{RawBuffer, RawStatus, ViewMode};
pub use workflow::{Affordances, PinPhase, Resolution, Stage, Trigger, WorkflowState};
