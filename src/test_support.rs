//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiError, SiteApi, StatusReply};
use crate::core::state::App;
use crate::core::verb::{Target, Verb};
use crate::core::widgets::composer::ComposerSettings;

/// A `SiteApi` that answers from queues of canned replies and records calls.
/// An empty queue answers with a network error.
#[derive(Default)]
pub struct ScriptedApi {
    statuses: Mutex<VecDeque<Result<StatusReply, ApiError>>>,
    pages: Mutex<VecDeque<Result<String, ApiError>>>,
    forms: Mutex<VecDeque<Result<String, ApiError>>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

fn pop<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::Network("no scripted reply".into())))
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, status: &str) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(StatusReply::new(status)));
        self
    }

    pub fn with_page(self, html: &str) -> Self {
        self.pages.lock().unwrap().push_back(Ok(html.to_string()));
        self
    }

    pub fn with_form_reply(self, html: &str) -> Self {
        self.forms.lock().unwrap().push_back(Ok(html.to_string()));
        self
    }

    pub fn with_page_error(self, error: ApiError) -> Self {
        self.pages.lock().unwrap().push_back(Err(error));
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SiteApi for ScriptedApi {
    async fn post_action(&self, verb: Verb, target: &Target) -> Result<StatusReply, ApiError> {
        self.enter(format!("POST {}", verb.path(target))).await;
        pop(&self.statuses)
    }

    async fn fetch_page(&self, path: &str, page: u32) -> Result<String, ApiError> {
        self.enter(format!("GET {path}?p={page}")).await;
        pop(&self.pages)
    }

    async fn submit_form(&self, path: &str, fields: &[(String, String)]) -> Result<String, ApiError> {
        let body: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.enter(format!("POST {path} {}", body.join("&"))).await;
        pop(&self.forms)
    }
}

/// Creates a test App browsing `/feed` with default composer settings.
pub fn test_app() -> App {
    App::new(
        "http://localhost:8000".to_string(),
        "/feed".to_string(),
        ComposerSettings::default(),
    )
}
