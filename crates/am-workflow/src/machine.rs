//! Step transition table.
//!
//! `transition` is the single place the step graph lives; the controller in
//! `core.rs` layers gating and side effects on top. Events that do not match
//! a row leave the step untouched.

use am_api_types::WorkflowStep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// The start pane was confirmed.
    Started,
    /// A selection/bundle/transfer stage finished, optionally naming the
    /// next step (the back button and the bundle pane use the override).
    SelectionFinished { next: Option<WorkflowStep> },
    /// User-triggered reset; returns to `start` unconditionally.
    Reset,
    AdminOpened,
    AdminClosed,
    /// The wallet moved to another chain; the session restarts.
    ChainChanged,
    /// A resumable backup bundle was found for the account.
    BackupFound,
}

pub fn transition(current: WorkflowStep, event: &WorkflowEvent) -> Option<WorkflowStep> {
    use WorkflowStep::*;

    match (current, event) {
        (_, WorkflowEvent::Reset) => Some(Start),
        (_, WorkflowEvent::ChainChanged) => Some(Start),
        (_, WorkflowEvent::AdminOpened) => Some(Admin),
        (_, WorkflowEvent::AdminClosed) => Some(Start),
        (_, WorkflowEvent::BackupFound) => Some(Transfer),
        (Start, WorkflowEvent::Started) => Some(Tokens),
        (Tokens, WorkflowEvent::SelectionFinished { .. }) => Some(Nfts),
        (Nfts, WorkflowEvent::SelectionFinished { next }) => match next {
            Some(Tokens) => Some(Tokens),
            None | Some(Bundle) => Some(Bundle),
            _ => None,
        },
        (Bundle, WorkflowEvent::SelectionFinished { next }) => match next {
            Some(Nfts) => Some(Nfts),
            None | Some(Transfer) => Some(Transfer),
            _ => None,
        },
        (Transfer, WorkflowEvent::SelectionFinished { .. }) => Some(Done),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowState {
    step: WorkflowStep,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            step: WorkflowStep::Start,
        }
    }
}

impl WorkflowState {
    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    /// Apply an event; returns the new step, or `None` when the event does
    /// not transition from the current step.
    pub fn apply(&mut self, event: &WorkflowEvent) -> Option<WorkflowStep> {
        let next = transition(self.step, event)?;
        self.step = next;
        Some(next)
    }
}
