//! # Requests
//!
//! The core never performs I/O. Widgets hand back a `Request` describing
//! what should be sent; the dispatcher runs it and the result comes back as
//! `Action::Resolved { request, outcome }`.
//!
//! `ControlKey` names the widget that owns a request. It is what the
//! single-flight guard keys on, and what a cancellation targets.

use std::fmt;

use crate::api::types::{ApiError, Reply};
use crate::core::verb::{Target, Verb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity of a list entry. Indices shift when loaders are replaced;
/// these don't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    /// The `slot`-th action control of an entry.
    Control { entry: EntryId, slot: usize },
    /// The pagination loader (there is at most one live loader).
    Loader,
    /// The compose box form.
    Composer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// `POST /api/{verb}/{target}`, JSON status reply.
    Action { verb: Verb, target: Target },
    /// `GET {path}?p={page}`, raw HTML fragment reply.
    Page { path: String, page: u32 },
    /// `POST {path}` with form fields, HTML reply (body unused).
    Submit {
        path: String,
        fields: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: RequestId,
    pub key: ControlKey,
    pub kind: RequestKind,
}

pub type Outcome = Result<Reply, ApiError>;

/// Hands out monotonically increasing request ids.
#[derive(Debug, Default)]
pub struct RequestIds {
    next: u64,
}

impl RequestIds {
    pub fn next(&mut self) -> RequestId {
        self.next += 1;
        RequestId(self.next)
    }
}
