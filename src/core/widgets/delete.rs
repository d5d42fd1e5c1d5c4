//! Two-step delete control.
//!
//! ```text
//!            activate                 confirm
//!   Idle ─────────────▶ ConfirmPending ─────────▶ InFlight ──deleted──▶ Deleted
//!     ▲                   │      ▲                  │   │
//!     └─────activate──────┘      └────cancelled─────┘   └──other──▶ ConfirmError
//!     ▲                                                                │
//!     └───────────────────────────activate─────────────────────────────┘
//! ```
//!
//! While confirmation is pending the target is parked: `active_target()` is
//! `None`, so a second activation of the original control means "cancel",
//! never "delete again". `Deleted` is terminal.

use log::debug;

use crate::api::types::{ApiError, Reply};
use crate::core::request::{Outcome, RequestId, RequestIds, RequestKind};
use crate::core::verb::{Target, Verb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    ConfirmPending,
    InFlight(RequestId),
    Deleted,
    /// The confirmation control is inert; the original still reads `undo`.
    ConfirmError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteResult {
    Deleted,
    Failed(String),
    /// Cancelled mid-flight; confirmation is armed again.
    Rearmed,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteControl {
    target: Target,
    phase: DeletePhase,
}

impl DeleteControl {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            phase: DeletePhase::Idle,
        }
    }

    pub fn phase(&self) -> DeletePhase {
        self.phase
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The identifier a click would act on, or `None` while it is parked.
    pub fn active_target(&self) -> Option<&Target> {
        match self.phase {
            DeletePhase::Idle => Some(&self.target),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self.phase {
            DeletePhase::Idle => "delete",
            DeletePhase::ConfirmPending | DeletePhase::InFlight(_) | DeletePhase::ConfirmError => {
                "undo"
            }
            DeletePhase::Deleted => "deleted",
        }
    }

    /// Label of the sibling confirmation control, if it is shown.
    pub fn confirm_label(&self) -> Option<&'static str> {
        match self.phase {
            DeletePhase::ConfirmPending | DeletePhase::InFlight(_) => Some("yes"),
            DeletePhase::ConfirmError => Some("error"),
            DeletePhase::Idle | DeletePhase::Deleted => None,
        }
    }

    pub fn confirm_clickable(&self) -> bool {
        self.phase == DeletePhase::ConfirmPending
    }

    pub fn is_inert(&self) -> bool {
        matches!(self.phase, DeletePhase::Deleted | DeletePhase::InFlight(_))
    }

    /// Click on the original control. Never produces a request.
    pub fn activate(&mut self) {
        self.phase = match self.phase {
            DeletePhase::Idle => DeletePhase::ConfirmPending,
            DeletePhase::ConfirmPending | DeletePhase::ConfirmError => DeletePhase::Idle,
            other => {
                debug!("delete {} ignoring activation in {:?}", self.target, other);
                other
            }
        };
    }

    /// Click on the confirmation control.
    pub fn confirm(&mut self, ids: &mut RequestIds) -> Option<(RequestId, RequestKind)> {
        if self.phase != DeletePhase::ConfirmPending {
            debug!("delete {} confirm ignored in {:?}", self.target, self.phase);
            return None;
        }
        let id = ids.next();
        self.phase = DeletePhase::InFlight(id);
        Some((
            id,
            RequestKind::Action {
                verb: Verb::Delete,
                target: self.target.clone(),
            },
        ))
    }

    pub fn resolve(&mut self, id: RequestId, outcome: &Outcome) -> DeleteResult {
        if self.phase != DeletePhase::InFlight(id) {
            return DeleteResult::Stale;
        }

        match outcome {
            Ok(Reply::Status(reply)) if reply.status == Verb::Delete.success_status() => {
                self.phase = DeletePhase::Deleted;
                DeleteResult::Deleted
            }
            Err(ApiError::Cancelled) => {
                self.phase = DeletePhase::ConfirmPending;
                DeleteResult::Rearmed
            }
            Ok(Reply::Status(reply)) => {
                self.phase = DeletePhase::ConfirmError;
                DeleteResult::Failed(reply.parsed().feedback())
            }
            Ok(Reply::Html(_)) => {
                self.phase = DeletePhase::ConfirmError;
                DeleteResult::Failed("unexpected reply".to_string())
            }
            Err(e) => {
                self.phase = DeletePhase::ConfirmError;
                DeleteResult::Failed(e.to_string())
            }
        }
    }
}
