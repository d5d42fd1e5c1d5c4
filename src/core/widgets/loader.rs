//! "Load more" pagination loader.
//!
//! A loader holds a page cursor. Triggering it fetches `{path}?p={cursor}`;
//! on success the list replaces the loader with the fetched nodes, on failure
//! the loader gets its label back and can be triggered again.
//!
//! A failed or cancelled loader only fires again on an explicit activation;
//! auto-loading skips it so an unreachable site isn't hammered.

use log::debug;

use crate::core::fragment::DEFAULT_LOADER_LABEL;
use crate::core::request::{RequestId, RequestIds, RequestKind};

pub const LOADING_LABEL: &str = "Loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
    Ready,
    Loading(RequestId),
    /// Last fetch failed or was cancelled; waits for an explicit retry.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loader {
    cursor: u32,
    label: String,
    phase: LoaderPhase,
}

impl Loader {
    pub fn new(cursor: u32, label: impl Into<String>) -> Self {
        Self {
            cursor,
            label: label.into(),
            phase: LoaderPhase::Ready,
        }
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    pub fn label(&self) -> &str {
        match self.phase {
            LoaderPhase::Ready | LoaderPhase::Failed => &self.label,
            LoaderPhase::Loading(_) => LOADING_LABEL,
        }
    }

    /// Not loading, so an explicit activation would fetch.
    pub fn is_ready(&self) -> bool {
        !matches!(self.phase, LoaderPhase::Loading(_))
    }

    /// Auto-loading only fires for an idle loader that still reads "Load more"
    /// and hasn't failed since it was last triggered by hand.
    pub fn is_auto_triggerable(&self) -> bool {
        self.phase == LoaderPhase::Ready && self.label == DEFAULT_LOADER_LABEL
    }

    pub fn owns(&self, id: RequestId) -> bool {
        self.phase == LoaderPhase::Loading(id)
    }

    pub fn trigger(&mut self, path: &str, ids: &mut RequestIds) -> Option<(RequestId, RequestKind)> {
        if !self.is_ready() {
            debug!("Loader for page {} already loading", self.cursor);
            return None;
        }
        let id = ids.next();
        self.phase = LoaderPhase::Loading(id);
        Some((
            id,
            RequestKind::Page {
                path: path.to_string(),
                page: self.cursor,
            },
        ))
    }

    /// Failed or cancelled fetch: back to the original label, retryable by hand.
    pub fn reset(&mut self) {
        self.phase = LoaderPhase::Failed;
    }
}
