//! # Widgets
//!
//! One state machine per interactive control. Each exposes its transitions
//! as plain methods that mutate the widget and hand back the request to send
//! (if any). None of them perform I/O.
//!
//! - [`toggle`]: save/unsave, follow/unfollow, pin/unpin
//! - [`delete`]: two-step delete with inline confirmation
//! - [`loader`]: "load more" pagination trigger
//! - [`feed`]: the list container that owns entries and the loader
//! - [`composer`]: auto-growing compose box with counter and Enter-to-submit
//! - [`lightbox`]: image overlay

pub mod composer;
pub mod delete;
pub mod feed;
pub mod lightbox;
pub mod loader;
pub mod toggle;
