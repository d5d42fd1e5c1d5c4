//! # TUI Components
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as parameters:
//! - `TitleBar`: Top status bar showing the page, status and busy count
//! - `EntryCard`: One list entry with its action buttons
//! - `LightboxView`: Image overlay
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: The auto-growing compose box with its counter
//! - `FeedView`: Scrollable list with selection and layout caching
//!
//! Components receive external data as props, never by reaching into `App`:
//!
//! ```rust,ignore
//! // Good: Dependencies are explicit
//! TitleBar::new(&app.base_url, app.feed.path(), app.status_message.clone(), busy)
//!     .render(frame, area);
//! ```
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── entry_card.rs    (Single entry renderer)
//! ├── feed_view.rs     (Scrollable entry container)
//! ├── lightbox_view.rs (Image overlay)
//! └── input_box/       (Compose box)
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod entry_card;
pub mod feed_view;
pub mod input_box;
pub mod lightbox_view;

pub use feed_view::{FeedView, FeedViewState};
pub use input_box::{Counter, InputBox, InputEvent};
pub use lightbox_view::LightboxView;
