//! Workflow state machine: Idle → Uploading → Reviewing → ConfirmPending →
//! Resolved, and the control affordances derived from it.

use std::fmt;

use intake_core::ConfirmReceipt;

use crate::ReviewError;

/// Sub-stage of a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinPhase {
    /// PIN prompt open; the record is still editable.
    CollectingPin,
    /// PIN accepted and the commit request is out; the record is frozen.
    Submitting,
}

/// Terminal outcome of one confirmation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Success(ConfirmReceipt),
    /// Failure text exactly as the collaborator reported it.
    Failure(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Idle,
    Uploading,
    Reviewing,
    ConfirmPending(PinPhase),
    Resolved(Resolution),
}

/// Data-free name of a [`WorkflowState`], for errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Uploading,
    Reviewing,
    CollectingPin,
    Submitting,
    Succeeded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Reviewing => "reviewing",
            Self::CollectingPin => "collecting the PIN",
            Self::Submitting => "submitting",
            Self::Succeeded => "resolved (success)",
            Self::Failed => "resolved (failure)",
        })
    }
}

/// Events that move the workflow between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    UploadSubmitted,
    UploadSucceeded,
    UploadFailed,
    ConfirmInitiated,
    PinAccepted,
    PinCancelled,
    ConfirmSettled(Resolution),
    Retry,
    StartOver,
    Reset,
    DeleteSucceeded,
}

impl Trigger {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UploadSubmitted => "upload",
            Self::UploadSucceeded | Self::UploadFailed => "settle an upload",
            Self::ConfirmInitiated => "confirm",
            Self::PinAccepted => "submit the PIN",
            Self::PinCancelled => "cancel the PIN prompt",
            Self::ConfirmSettled(_) => "settle a confirmation",
            Self::Retry => "retry",
            Self::StartOver => "start over",
            Self::Reset => "reset",
            Self::DeleteSucceeded => "clear after delete-all",
        }
    }
}

impl WorkflowState {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Idle => Stage::Idle,
            Self::Uploading => Stage::Uploading,
            Self::Reviewing => Stage::Reviewing,
            Self::ConfirmPending(PinPhase::CollectingPin) => Stage::CollectingPin,
            Self::ConfirmPending(PinPhase::Submitting) => Stage::Submitting,
            Self::Resolved(Resolution::Success(_)) => Stage::Succeeded,
            Self::Resolved(Resolution::Failure(_)) => Stage::Failed,
        }
    }

    /// The transition table. Anything not listed is rejected and the caller
    /// keeps the current state.
    pub fn next(&self, trigger: Trigger) -> Result<WorkflowState, ReviewError> {
        use PinPhase::{CollectingPin, Submitting};
        use WorkflowState::*;

        let next = match (self, trigger) {
            (Idle, Trigger::UploadSubmitted) => Uploading,
            (Uploading, Trigger::UploadSucceeded) => Reviewing,
            (Uploading, Trigger::UploadFailed) => Idle,
            (Reviewing, Trigger::ConfirmInitiated) => ConfirmPending(CollectingPin),
            (ConfirmPending(CollectingPin), Trigger::PinAccepted) => ConfirmPending(Submitting),
            (ConfirmPending(CollectingPin), Trigger::PinCancelled) => Reviewing,
            (ConfirmPending(Submitting), Trigger::ConfirmSettled(resolution)) => {
                Resolved(resolution)
            }
            (Resolved(Resolution::Failure(_)), Trigger::Retry) => ConfirmPending(CollectingPin),
            (Resolved(_), Trigger::StartOver) => Idle,
            (Reviewing | ConfirmPending(CollectingPin) | Resolved(_), Trigger::Reset) => Idle,
            (
                Idle | Reviewing | ConfirmPending(CollectingPin) | Resolved(_),
                Trigger::DeleteSucceeded,
            ) => Idle,
            (state, trigger) => {
                return Err(ReviewError::NotAllowed {
                    action: trigger.name(),
                    stage: state.stage(),
                });
            }
        };
        Ok(next)
    }

    /// Whether the record may be edited (form, raw, or view switch).
    pub fn record_editable(&self) -> bool {
        matches!(
            self,
            Self::Reviewing | Self::ConfirmPending(PinPhase::CollectingPin)
        )
    }

    /// A network call tied to the workflow itself is pending.
    pub fn awaiting_network(&self) -> bool {
        matches!(
            self,
            Self::Uploading | Self::ConfirmPending(PinPhase::Submitting)
        )
    }
}

/// Enabled/visible flags for every control on the review surface.
///
/// Derived from the workflow state alone, plus the file-selected guard on
/// extract and whether a delete-all call is pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    pub upload_section: bool,
    pub extract_enabled: bool,
    pub extract_busy: bool,
    pub review_panel: bool,
    pub view_toggle: bool,
    pub confirm_visible: bool,
    pub confirm_enabled: bool,
    pub confirm_busy: bool,
    pub pin_prompt: bool,
    pub pin_submit_enabled: bool,
    pub reset_enabled: bool,
    pub delete_enabled: bool,
    pub success_panel: bool,
    pub failure_panel: bool,
    pub retry_enabled: bool,
    pub start_over_enabled: bool,
}

impl Affordances {
    pub fn derive(state: &WorkflowState, file_selected: bool, delete_busy: bool) -> Self {
        use PinPhase::{CollectingPin, Submitting};
        use WorkflowState::*;

        let idle_hands = !delete_busy;
        let resolved = matches!(state, Resolved(_));
        let failed = matches!(state, Resolved(Resolution::Failure(_)));

        Self {
            upload_section: matches!(state, Idle | Uploading),
            extract_enabled: matches!(state, Idle) && file_selected && idle_hands,
            extract_busy: matches!(state, Uploading),
            review_panel: matches!(state, Reviewing | ConfirmPending(_)),
            view_toggle: state.record_editable() && idle_hands,
            confirm_visible: matches!(state, Reviewing | ConfirmPending(_)),
            confirm_enabled: matches!(state, Reviewing) && idle_hands,
            confirm_busy: matches!(state, ConfirmPending(Submitting)),
            pin_prompt: matches!(state, ConfirmPending(_)),
            pin_submit_enabled: matches!(state, ConfirmPending(CollectingPin)) && idle_hands,
            reset_enabled: (matches!(state, Reviewing | ConfirmPending(CollectingPin)) || resolved)
                && idle_hands,
            delete_enabled: !state.awaiting_network() && idle_hands,
            success_panel: matches!(state, Resolved(Resolution::Success(_))),
            failure_panel: failed,
            retry_enabled: failed && idle_hands,
            start_over_enabled: resolved && idle_hands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_states() -> Vec<WorkflowState> {
        vec![
            WorkflowState::Idle,
            WorkflowState::Uploading,
            WorkflowState::Reviewing,
            WorkflowState::ConfirmPending(PinPhase::CollectingPin),
            WorkflowState::ConfirmPending(PinPhase::Submitting),
            WorkflowState::Resolved(Resolution::Success(ConfirmReceipt::default())),
            WorkflowState::Resolved(Resolution::Failure("declined".into())),
        ]
    }

    #[test]
    fn happy_path() {
        let s = WorkflowState::Idle;
        let s = s.next(Trigger::UploadSubmitted).unwrap();
        let s = s.next(Trigger::UploadSucceeded).unwrap();
        assert_eq!(s, WorkflowState::Reviewing);
        let s = s.next(Trigger::ConfirmInitiated).unwrap();
        let s = s.next(Trigger::PinAccepted).unwrap();
        assert_eq!(s.stage(), Stage::Submitting);
        let s = s
            .next(Trigger::ConfirmSettled(Resolution::Success(
                ConfirmReceipt::default(),
            )))
            .unwrap();
        assert_eq!(s.stage(), Stage::Succeeded);
        assert_eq!(s.next(Trigger::StartOver).unwrap(), WorkflowState::Idle);
    }

    #[test]
    fn upload_failure_returns_to_idle() {
        let s = WorkflowState::Uploading.next(Trigger::UploadFailed).unwrap();
        assert_eq!(s, WorkflowState::Idle);
    }

    #[test]
    fn retry_only_after_failure() {
        let failed = WorkflowState::Resolved(Resolution::Failure("declined".into()));
        assert_eq!(
            failed.next(Trigger::Retry).unwrap(),
            WorkflowState::ConfirmPending(PinPhase::CollectingPin)
        );
        let ok = WorkflowState::Resolved(Resolution::Success(ConfirmReceipt::default()));
        let err = ok.next(Trigger::Retry).unwrap_err();
        assert_eq!(err.to_string(), "cannot retry while resolved (success)");
    }

    #[test]
    fn reset_rejected_while_busy_or_idle() {
        for state in [
            WorkflowState::Idle,
            WorkflowState::Uploading,
            WorkflowState::ConfirmPending(PinPhase::Submitting),
        ] {
            assert!(state.next(Trigger::Reset).is_err(), "{state:?}");
        }
    }

    #[test]
    fn confirm_settles_only_from_submitting() {
        for state in all_states() {
            let result = state.next(Trigger::ConfirmSettled(Resolution::Failure("x".into())));
            assert_eq!(
                result.is_ok(),
                state == WorkflowState::ConfirmPending(PinPhase::Submitting),
                "{state:?}"
            );
        }
    }

    #[test]
    fn delete_never_interrupts_network() {
        assert!(WorkflowState::Uploading.next(Trigger::DeleteSucceeded).is_err());
        assert!(WorkflowState::ConfirmPending(PinPhase::Submitting)
            .next(Trigger::DeleteSucceeded)
            .is_err());
        assert_eq!(
            WorkflowState::Reviewing.next(Trigger::DeleteSucceeded).unwrap(),
            WorkflowState::Idle
        );
    }

    #[test]
    fn never_both_result_panels() {
        for state in all_states() {
            for file in [false, true] {
                for busy in [false, true] {
                    let a = Affordances::derive(&state, file, busy);
                    assert!(!(a.success_panel && a.failure_panel), "{state:?}");
                }
            }
        }
    }

    #[test]
    fn extract_needs_file_in_idle() {
        assert!(!Affordances::derive(&WorkflowState::Idle, false, false).extract_enabled);
        assert!(Affordances::derive(&WorkflowState::Idle, true, false).extract_enabled);
        assert!(!Affordances::derive(&WorkflowState::Idle, true, true).extract_enabled);
        assert!(!Affordances::derive(&WorkflowState::Reviewing, true, false).extract_enabled);
    }

    #[test]
    fn affordances_follow_transition_table() {
        // An enabled control must correspond to an accepted trigger.
        for state in all_states() {
            let a = Affordances::derive(&state, true, false);
            assert_eq!(a.extract_enabled, state.next(Trigger::UploadSubmitted).is_ok());
            assert_eq!(a.confirm_enabled, state.next(Trigger::ConfirmInitiated).is_ok());
            assert_eq!(a.pin_submit_enabled, state.next(Trigger::PinAccepted).is_ok());
            assert_eq!(a.reset_enabled, state.next(Trigger::Reset).is_ok());
            assert_eq!(a.retry_enabled, state.next(Trigger::Retry).is_ok());
            assert_eq!(a.start_over_enabled, state.next(Trigger::StartOver).is_ok());
            assert_eq!(a.delete_enabled, state.next(Trigger::DeleteSucceeded).is_ok());
        }
    }

    #[test]
    fn busy_submit_keeps_prompt_but_disables_it() {
        let submitting = WorkflowState::ConfirmPending(PinPhase::Submitting);
        let a = Affordances::derive(&submitting, false, false);
        assert!(a.pin_prompt);
        assert!(!a.pin_submit_enabled);
        assert!(a.confirm_busy);
        assert!(!a.view_toggle);
    }
}
