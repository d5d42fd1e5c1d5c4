use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};

use super::types::{ApiError, Reply, StatusReply};
use crate::core::request::{Outcome, RequestKind};
use crate::core::verb::{Target, Verb};

/// The three kinds of call a page makes to its site.
#[async_trait]
pub trait SiteApi: Send + Sync {
    /// `POST /api/{verb}/{target}` and decode the JSON status reply.
    async fn post_action(&self, verb: Verb, target: &Target) -> Result<StatusReply, ApiError>;

    /// `GET {path}?p={page}`; the body is an HTML fragment.
    async fn fetch_page(&self, path: &str, page: u32) -> Result<String, ApiError>;

    /// `POST {path}` as a urlencoded form; the body is returned unparsed.
    async fn submit_form(&self, path: &str, fields: &[(String, String)]) -> Result<String, ApiError>;
}

/// Run one request description against an API.
pub async fn execute(api: &dyn SiteApi, kind: &RequestKind) -> Outcome {
    match kind {
        RequestKind::Action { verb, target } => {
            api.post_action(*verb, target).await.map(Reply::Status)
        }
        RequestKind::Page { path, page } => api.fetch_page(path, *page).await.map(Reply::Html),
        RequestKind::Submit { path, fields } => {
            api.submit_form(path, fields).await.map(Reply::Html)
        }
    }
}

// ============================================================================
// HTTP Implementation
// ============================================================================

pub struct HttpSiteApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSiteApi {
    pub fn new(
        base_url: impl Into<String>,
        session_cookie: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => warn!("Ignoring session cookie, not a valid header value: {}", e),
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Read the body of a response, turning a non-success status into `ApiError::Api`.
async fn body_text(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    debug!("Site response status: {}", status);

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("Site error: {} - {}", status.as_u16(), message);
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response.text().await.map_err(transport_error)
}

#[async_trait]
impl SiteApi for HttpSiteApi {
    async fn post_action(&self, verb: Verb, target: &Target) -> Result<StatusReply, ApiError> {
        let path = verb.path(target);
        info!("POST {}", path);

        let response = self
            .client
            .post(self.url(&path))
            .send()
            .await
            .map_err(transport_error)?;

        let body = body_text(response).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Unparseable reply to {}: {}", path, body);
            ApiError::Parse(e.to_string())
        })
    }

    async fn fetch_page(&self, path: &str, page: u32) -> Result<String, ApiError> {
        info!("GET {}?p={}", path, page);

        let response = self
            .client
            .get(self.url(path))
            .query(&[("p", page)])
            .send()
            .await
            .map_err(transport_error)?;

        body_text(response).await
    }

    async fn submit_form(&self, path: &str, fields: &[(String, String)]) -> Result<String, ApiError> {
        info!("POST {} ({} fields)", path, fields.len());

        let response = self
            .client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .map_err(transport_error)?;

        body_text(response).await
    }
}
