//! The review session context.
//!
//! A [`Session`] owns everything one operator sees between selecting a file
//! and resolving (or discarding) a confirmation. Network calls are split in
//! two: a `begin_*` step validates, marks the operation in flight and hands
//! back what the transport needs; a `finish_*` step settles the outcome.
//! [`Controller`](crate::Controller) drives the transport between the two.

use intake_core::{
    ConfirmReceipt, ContractId, DeleteReceipt, Extraction, FieldKey, Record, UploadFile,
};
use intake_transport::{Operation, TransportError};
use tracing::{debug, info, warn};

use crate::ReviewError;
use crate::gate::{self, PendingConfirmation, PinPrompt};
use crate::store::RecordStore;
use crate::sync::{self, RawBuffer, ViewMode};
use crate::workflow::{Affordances, PinPhase, Stage, Trigger, WorkflowState};

const EXTRACTION_COMPLETE: &str = "Extraction complete! Review the data below.";
const ALL_FILES_DELETED: &str = "All files deleted successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// The single inline status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Per-operation in-flight flags. At most one is set at a time.
#[derive(Debug, Clone, Copy, Default)]
struct InFlight {
    upload: bool,
    confirm: bool,
    delete: bool,
}

impl InFlight {
    fn current(&self) -> Option<Operation> {
        if self.upload {
            Some(Operation::Upload)
        } else if self.confirm {
            Some(Operation::Confirm)
        } else if self.delete {
            Some(Operation::Delete)
        } else {
            None
        }
    }

    fn flag(&mut self, op: Operation) -> &mut bool {
        match op {
            Operation::Upload => &mut self.upload,
            Operation::Confirm => &mut self.confirm,
            Operation::Delete => &mut self.delete,
        }
    }

    fn idle(&self) -> Result<(), ReviewError> {
        match self.current() {
            Some(op) => Err(ReviewError::Busy(op)),
            None => Ok(()),
        }
    }

    fn try_begin(&mut self, op: Operation) -> Result<(), ReviewError> {
        self.idle()?;
        *self.flag(op) = true;
        Ok(())
    }

    fn end(&mut self, op: Operation) {
        *self.flag(op) = false;
    }
}

#[derive(Debug, Default)]
pub struct Session {
    state: WorkflowState,
    store: RecordStore,
    raw: RawBuffer,
    view: ViewMode,
    selected_file: Option<UploadFile>,
    prompt: PinPrompt,
    delete_prompt: bool,
    in_flight: InFlight,
    notice: Option<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accessors ──

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn record(&self) -> Option<&Record> {
        self.store.record()
    }

    pub fn contract_id(&self) -> Option<&ContractId> {
        self.store.contract_id()
    }

    pub fn raw(&self) -> &RawBuffer {
        &self.raw
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn selected_file(&self) -> Option<&UploadFile> {
        self.selected_file.as_ref()
    }

    pub fn prompt(&self) -> &PinPrompt {
        &self.prompt
    }

    pub fn delete_prompt_open(&self) -> bool {
        self.delete_prompt
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// The operation currently awaiting the network, if any.
    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight.current()
    }

    pub fn affordances(&self) -> Affordances {
        Affordances::derive(
            &self.state,
            self.selected_file.is_some(),
            self.in_flight.delete,
        )
    }

    /// Every transition closes the delete prompt; a `yes` only answers the
    /// prompt of the state it was asked in.
    fn commit(&mut self, next: WorkflowState) {
        debug!(from = %self.state.stage(), to = %next.stage(), "workflow transition");
        if self.delete_prompt {
            debug!("delete prompt closed by transition");
            self.delete_prompt = false;
        }
        self.state = next;
    }

    fn require_editable(&self, action: &'static str) -> Result<(), ReviewError> {
        if self.state.record_editable() {
            Ok(())
        } else {
            Err(ReviewError::NotAllowed {
                action,
                stage: self.stage(),
            })
        }
    }

    // ── Upload ──

    /// Choose (or clear) the file to extract. Only meaningful before upload.
    pub fn select_file(&mut self, file: Option<UploadFile>) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        if self.state != WorkflowState::Idle {
            return Err(ReviewError::NotAllowed {
                action: "select a file",
                stage: self.stage(),
            });
        }
        self.selected_file = file;
        Ok(())
    }

    pub fn begin_upload(&mut self) -> Result<UploadFile, ReviewError> {
        self.in_flight.idle()?;
        let next = self.state.next(Trigger::UploadSubmitted)?;
        let file = self
            .selected_file
            .clone()
            .ok_or(ReviewError::NoFileSelected)?;
        self.in_flight.try_begin(Operation::Upload)?;
        self.notice = Some(Notice::new(
            NoticeKind::Info,
            format!("Extracting {} ({})...", file.file_name, file.size_label()),
        ));
        self.commit(next);
        Ok(file)
    }

    pub fn finish_upload(
        &mut self,
        result: Result<Extraction, TransportError>,
    ) -> Result<(), ReviewError> {
        self.in_flight.end(Operation::Upload);
        match result {
            Ok(extraction) => {
                let next = self.state.next(Trigger::UploadSucceeded)?;
                debug!(contract_id = %extraction.contract_id, "record loaded for review");
                self.store.load(extraction);
                self.view = ViewMode::Form;
                sync::render_raw(&self.store, &mut self.raw);
                self.notice = Some(Notice::new(NoticeKind::Success, EXTRACTION_COMPLETE));
                self.commit(next);
            }
            Err(e) => {
                let next = self.state.next(Trigger::UploadFailed)?;
                warn!(error = %e, "upload failed");
                self.notice = Some(Notice::new(NoticeKind::Error, e.to_string()));
                self.commit(next);
            }
        }
        Ok(())
    }

    // ── Editing ──

    pub fn edit_field(&mut self, key: FieldKey, value: &str) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        self.require_editable("edit a field")?;
        if self.view != ViewMode::Form {
            return Err(ReviewError::FormViewInactive);
        }
        sync::apply_field_edit(&mut self.store, &mut self.raw, key, value)
    }

    pub fn edit_raw(&mut self, text: impl Into<String>) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        self.require_editable("edit the raw JSON")?;
        if self.view != ViewMode::Raw {
            return Err(ReviewError::RawViewInactive);
        }
        sync::apply_raw_edit(&mut self.raw, text);
        Ok(())
    }

    pub fn switch_view(&mut self, target: ViewMode) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        self.require_editable("switch views")?;
        if let Err(e) = sync::switch_view(&mut self.view, &mut self.store, &mut self.raw, target) {
            self.notice = Some(Notice::new(NoticeKind::Error, e.to_string()));
            return Err(e);
        }
        Ok(())
    }

    // ── Confirmation ──

    /// Open the PIN prompt. Pending raw edits must parse first.
    pub fn begin_confirm(&mut self) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        let next = self.state.next(Trigger::ConfirmInitiated)?;
        if let Err(e) = sync::reparse(&mut self.store, &mut self.raw) {
            self.notice = Some(Notice::new(NoticeKind::Error, e.to_string()));
            return Err(e);
        }
        self.prompt.wipe();
        self.commit(next);
        Ok(())
    }

    pub fn enter_pin(&mut self, value: &str) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        if self.state != WorkflowState::ConfirmPending(PinPhase::CollectingPin) {
            return Err(ReviewError::NotAllowed {
                action: "enter a PIN",
                stage: self.stage(),
            });
        }
        self.prompt.set_entry(value);
        Ok(())
    }

    pub fn cancel_pin(&mut self) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        let next = self.state.next(Trigger::PinCancelled)?;
        self.prompt.wipe();
        self.commit(next);
        Ok(())
    }

    /// Validate the PIN, take the last raw checkpoint and freeze the record.
    ///
    /// On success the confirm operation is in flight and the returned
    /// request must be dispatched and settled with [`finish_confirm`].
    ///
    /// [`finish_confirm`]: Self::finish_confirm
    pub fn submit_pin(&mut self) -> Result<PendingConfirmation, ReviewError> {
        self.in_flight.idle()?;
        let next = self.state.next(Trigger::PinAccepted)?;
        self.prompt.require_entry()?;
        if let Err(e) = sync::reparse(&mut self.store, &mut self.raw) {
            self.prompt.set_error(e.to_string());
            return Err(e);
        }
        let pin = self.prompt.take_pin()?;
        let pending = PendingConfirmation::assemble(&self.store, pin)?;
        self.in_flight.try_begin(Operation::Confirm)?;
        info!(contract_id = %pending.contract_id(), "confirmation dispatched");
        self.commit(next);
        Ok(pending)
    }

    pub fn finish_confirm(
        &mut self,
        result: Result<ConfirmReceipt, TransportError>,
    ) -> Result<(), ReviewError> {
        self.in_flight.end(Operation::Confirm);
        if let Err(e) = &result {
            warn!(error = %e, "confirmation failed");
        }
        let resolution = gate::resolve(result);
        let next = self.state.next(Trigger::ConfirmSettled(resolution))?;
        self.commit(next);
        info!(stage = %self.stage(), "confirmation settled");
        Ok(())
    }

    pub fn retry(&mut self) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        let next = self.state.next(Trigger::Retry)?;
        self.prompt.wipe();
        self.commit(next);
        Ok(())
    }

    // ── Leaving the session ──

    /// Discard everything, including the file selection.
    pub fn start_over(&mut self) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        let next = self.state.next(Trigger::StartOver)?;
        self.discard();
        self.commit(next);
        Ok(())
    }

    /// Discard the record and identifier; the file selection is kept.
    pub fn reset(&mut self) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        let next = self.state.next(Trigger::Reset)?;
        let file = self.selected_file.take();
        self.discard();
        self.selected_file = file;
        self.commit(next);
        Ok(())
    }

    fn discard(&mut self) {
        self.store.clear();
        self.raw.clear();
        self.view = ViewMode::Form;
        self.selected_file = None;
        self.prompt.wipe();
        self.delete_prompt = false;
        self.notice = None;
    }

    /// Settle an operation whose network call was dropped before it
    /// finished, so the session never stays busy.
    pub fn abandon(&mut self, operation: Operation) -> Result<(), ReviewError> {
        if self.in_flight.current() != Some(operation) {
            return Ok(());
        }
        warn!(operation = %operation, "in-flight call dropped");
        let cancelled = TransportError::Cancelled { operation };
        match operation {
            Operation::Upload => self.finish_upload(Err(cancelled)),
            Operation::Confirm => self.finish_confirm(Err(cancelled)),
            Operation::Delete => self.finish_delete(Err(cancelled)),
        }
    }

    // ── Delete-all ──

    /// Open the destructive confirmation prompt.
    pub fn request_delete(&mut self) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        self.state.next(Trigger::DeleteSucceeded).map_err(|_| ReviewError::NotAllowed {
            action: "delete all files",
            stage: self.stage(),
        })?;
        self.delete_prompt = true;
        Ok(())
    }

    pub fn decline_delete(&mut self) -> Result<(), ReviewError> {
        if !self.delete_prompt {
            return Err(ReviewError::DeleteNotRequested);
        }
        self.delete_prompt = false;
        Ok(())
    }

    /// The operator answered yes: close the prompt and mark delete in flight.
    pub fn begin_delete(&mut self) -> Result<(), ReviewError> {
        self.in_flight.idle()?;
        if !self.delete_prompt {
            return Err(ReviewError::DeleteNotRequested);
        }
        self.state.next(Trigger::DeleteSucceeded)?;
        self.in_flight.try_begin(Operation::Delete)?;
        self.delete_prompt = false;
        Ok(())
    }

    pub fn finish_delete(
        &mut self,
        result: Result<DeleteReceipt, TransportError>,
    ) -> Result<(), ReviewError> {
        self.in_flight.end(Operation::Delete);
        match result {
            Ok(receipt) => {
                let next = self.state.next(Trigger::DeleteSucceeded)?;
                info!("all files deleted");
                self.discard();
                self.notice = Some(Notice::new(
                    NoticeKind::Success,
                    receipt.message.unwrap_or_else(|| ALL_FILES_DELETED.into()),
                ));
                self.commit(next);
            }
            Err(e) => {
                warn!(error = %e, "delete-all failed");
                self.notice = Some(Notice::new(
                    NoticeKind::Error,
                    format!("Error deleting files: {e}"),
                ));
            }
        }
        Ok(())
    }
}
