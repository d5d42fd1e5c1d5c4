//! # Application State
//!
//! Core business state for Perch. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── base_url: String                    // site being browsed (display only)
//! ├── feed: Feed                          // entries + loader
//! ├── composer: Composer                  // compose box model
//! ├── lightbox: Lightbox                  // image overlay
//! ├── status_message: String              // status bar text
//! ├── requests: RequestIds                // id generator
//! └── pending: HashMap<RequestId, ControlKey>  // in-flight requests → owner
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use std::collections::HashMap;

use crate::core::config::ResolvedConfig;
use crate::core::request::{ControlKey, Request, RequestId, RequestIds};
use crate::core::widgets::composer::{Composer, ComposerSettings};
use crate::core::widgets::feed::Feed;
use crate::core::widgets::lightbox::Lightbox;

pub struct App {
    pub base_url: String,
    pub feed: Feed,
    pub composer: Composer,
    pub lightbox: Lightbox,
    pub status_message: String,
    pub requests: RequestIds,
    /// Requests handed to the dispatcher and not yet resolved.
    pub pending: HashMap<RequestId, ControlKey>,
    /// A refresh asked for while a page was loading; runs once that page settles.
    pub refresh_queued: bool,
}

impl App {
    pub fn new(base_url: String, path: String, composer: ComposerSettings) -> Self {
        Self {
            base_url,
            feed: Feed::new(path),
            composer: Composer::new(composer),
            lightbox: Lightbox::default(),
            status_message: String::from("Welcome to Perch!"),
            requests: RequestIds::default(),
            pending: HashMap::new(),
            refresh_queued: false,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.path.clone(),
            config.composer.clone(),
        )
    }

    /// Record a request as pending so its completion can be routed back.
    pub fn track(&mut self, request: &Request) {
        self.pending.insert(request.id, request.key);
    }

    pub fn is_pending(&self, key: ControlKey) -> bool {
        self.pending.values().any(|k| *k == key)
    }
}
