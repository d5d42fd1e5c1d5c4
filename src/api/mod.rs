//! # Site API
//!
//! Everything that talks to the site over HTTP.
//!
//! - [`client`]: the `SiteApi` trait and its reqwest implementation
//! - [`dispatch`]: runs requests on tokio tasks with single-flight, timeout and cancel
//! - [`types`]: reply payloads and `ApiError`

pub mod client;
pub mod dispatch;
pub mod types;

pub use client::{HttpSiteApi, SiteApi};
pub use dispatch::Dispatcher;
pub use types::{ApiError, Reply, StatusReply};
