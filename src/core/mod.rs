//! # Core Application Logic
//!
//! This module contains Perch's business logic.
//! It knows nothing about any specific UI technology or HTTP client.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • Widgets (per control)│
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//!          ┌────────────┐                ┌────────────┐
//!          │    TUI     │   Request ──►  │    API     │
//!          │  Adapter   │                │ Dispatcher │
//!          │ (ratatui)  │  ◄── Resolved  │ (reqwest)  │
//!          └────────────┘                └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`widgets`]: One state machine per interactive control
//! - [`fragment`]: HTML fragment parsing into entries and loaders
//! - [`request`]: Request descriptions handed to the dispatcher
//! - [`verb`]: Action verbs, targets and reply statuses
//! - [`config`]: Config file and override resolution

pub mod action;
pub mod config;
pub mod fragment;
pub mod request;
pub mod state;
pub mod verb;
pub mod widgets;
