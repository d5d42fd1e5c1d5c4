//! Non-destructive toggle control (save/unsave, follow/unfollow, pin/unpin).
//!
//! The displayed verb *is* the state: a control showing `save` sends `save`
//! when activated, and flips to `unsave` once the server answers
//! `{status: "unsave"}`. Any other answer leaves the control as it was.

use log::debug;

use crate::api::types::Reply;
use crate::core::request::{Outcome, RequestId, RequestIds, RequestKind};
use crate::core::verb::{Target, Verb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TogglePhase {
    Idle,
    InFlight(RequestId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleResult {
    /// Success; the control now offers this verb.
    Flipped(Verb),
    /// The request finished but the control didn't change. Carries feedback.
    Unchanged(String),
    /// Not the request this control is waiting for.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleControl {
    target: Target,
    verb: Verb,
    phase: TogglePhase,
}

impl ToggleControl {
    /// `verb` is the verb currently displayed. Returns `None` for delete,
    /// which has its own two-step control.
    pub fn new(verb: Verb, target: Target) -> Option<Self> {
        verb.opposite()?;
        Some(Self {
            target,
            verb,
            phase: TogglePhase::Idle,
        })
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn phase(&self) -> TogglePhase {
        self.phase
    }

    pub fn label(&self) -> &'static str {
        self.verb.name()
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.phase, TogglePhase::InFlight(_))
    }

    /// Activation sends the displayed verb. Nothing is sent while a previous
    /// request is still in flight.
    pub fn activate(&mut self, ids: &mut RequestIds) -> Option<(RequestId, RequestKind)> {
        if self.is_in_flight() {
            debug!("{} {} already in flight, ignoring activation", self.verb, self.target);
            return None;
        }
        let id = ids.next();
        self.phase = TogglePhase::InFlight(id);
        Some((
            id,
            RequestKind::Action {
                verb: self.verb,
                target: self.target.clone(),
            },
        ))
    }

    pub fn resolve(&mut self, id: RequestId, outcome: &Outcome) -> ToggleResult {
        if self.phase != TogglePhase::InFlight(id) {
            return ToggleResult::Stale;
        }
        self.phase = TogglePhase::Idle;

        match outcome {
            Ok(Reply::Status(reply)) if reply.status == self.verb.success_status() => {
                // `new` guarantees a pair verb, so `opposite` is always Some here
                if let Some(next) = self.verb.opposite() {
                    self.verb = next;
                }
                ToggleResult::Flipped(self.verb)
            }
            Ok(Reply::Status(reply)) => ToggleResult::Unchanged(reply.parsed().feedback()),
            Ok(Reply::Html(_)) => ToggleResult::Unchanged("unexpected reply".to_string()),
            Err(e) => ToggleResult::Unchanged(e.to_string()),
        }
    }
}
