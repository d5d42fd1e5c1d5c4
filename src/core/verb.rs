//! # Verbs and Targets
//!
//! Every action control is bound to one verb and one target. The verb
//! decides the endpoint (`/api/{verb}/{target}`) and, for toggle pairs, what
//! a successful reply looks like: the server answers with the *opposite*
//! verb, which is what the control should offer next.
//!
//! ```text
//! save   ──{status:"unsave"}──▶  unsave
//! unsave ──{status:"save"}────▶  save
//! delete ──{status:"deleted"}─▶  (terminal)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Delete,
    Save,
    Unsave,
    Follow,
    Unfollow,
    Pin,
    Unpin,
}

impl Verb {
    /// Wire name, used both in the endpoint path and as the displayed label.
    pub fn name(self) -> &'static str {
        match self {
            Verb::Delete => "delete",
            Verb::Save => "save",
            Verb::Unsave => "unsave",
            Verb::Follow => "follow",
            Verb::Unfollow => "unfollow",
            Verb::Pin => "pin",
            Verb::Unpin => "unpin",
        }
    }

    pub fn parse(name: &str) -> Option<Verb> {
        match name.trim().to_ascii_lowercase().as_str() {
            "delete" => Some(Verb::Delete),
            "save" => Some(Verb::Save),
            "unsave" => Some(Verb::Unsave),
            "follow" => Some(Verb::Follow),
            "unfollow" => Some(Verb::Unfollow),
            "pin" => Some(Verb::Pin),
            "unpin" => Some(Verb::Unpin),
            _ => None,
        }
    }

    /// The other half of a toggle pair. `None` for delete.
    pub fn opposite(self) -> Option<Verb> {
        match self {
            Verb::Delete => None,
            Verb::Save => Some(Verb::Unsave),
            Verb::Unsave => Some(Verb::Save),
            Verb::Follow => Some(Verb::Unfollow),
            Verb::Unfollow => Some(Verb::Follow),
            Verb::Pin => Some(Verb::Unpin),
            Verb::Unpin => Some(Verb::Pin),
        }
    }

    pub fn is_destructive(self) -> bool {
        self == Verb::Delete
    }

    /// Follow/unfollow address users by name; everything else by post id.
    pub fn targets_user(self) -> bool {
        matches!(self, Verb::Follow | Verb::Unfollow)
    }

    /// The reply status that means this verb took effect.
    pub fn success_status(self) -> &'static str {
        match self.opposite() {
            Some(next) => next.name(),
            None => "deleted",
        }
    }

    /// Endpoint path for this verb applied to `target`.
    pub fn path(self, target: &Target) -> String {
        format!("/api/{}/{}", self.name(), target)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an action is applied to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Id(u64),
    Username(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Id(id) => write!(f, "{id}"),
            Target::Username(name) => f.write_str(name),
        }
    }
}

/// Reply statuses the server is known to send, parsed from `{status: ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyStatus {
    Deleted,
    /// A toggle took effect; the payload is the verb the control should offer next.
    Offer(Verb),
    NotAuth,
    NotFound,
    NotValid,
    AlreadyPinned,
    Other(String),
}

impl ReplyStatus {
    pub fn parse(status: &str) -> ReplyStatus {
        match status {
            "deleted" => ReplyStatus::Deleted,
            "not auth" => ReplyStatus::NotAuth,
            "not found" => ReplyStatus::NotFound,
            "not valid" => ReplyStatus::NotValid,
            "already pinned" => ReplyStatus::AlreadyPinned,
            other => match Verb::parse(other) {
                Some(verb) if verb != Verb::Delete => ReplyStatus::Offer(verb),
                _ => ReplyStatus::Other(other.to_string()),
            },
        }
    }

    /// Human-readable note for the status line.
    pub fn feedback(&self) -> String {
        match self {
            ReplyStatus::Deleted => "deleted".to_string(),
            ReplyStatus::Offer(verb) => format!("done ({verb} next)"),
            ReplyStatus::NotAuth => "you need to be logged in".to_string(),
            ReplyStatus::NotFound => "that no longer exists".to_string(),
            ReplyStatus::NotValid => "you can't do that here".to_string(),
            ReplyStatus::AlreadyPinned => "already pinned".to_string(),
            ReplyStatus::Other(s) => format!("unexpected reply: {s}"),
        }
    }
}
