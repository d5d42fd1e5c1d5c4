//! # Dispatcher
//!
//! Runs `Request`s on tokio tasks and posts each completion back to the event
//! loop as `Action::Resolved`. Tasks never touch `App`.
//!
//! ```text
//! dispatch(req) ──► spawn ──► timeout(execute(api, kind)) ──► tx.send(Resolved)
//!        │                                                          │
//!        └── in_flight[key] = (id, abort)      complete(id) ◄───────┘
//! ```
//!
//! At most one task runs per `ControlKey`. `cancel(key)` aborts it and posts
//! `ApiError::Cancelled` in its place.

use std::collections::HashMap;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::AbortHandle;

use super::client::{SiteApi, execute};
use super::types::ApiError;
use crate::core::action::Action;
use crate::core::request::{ControlKey, Request, RequestId};

pub struct Dispatcher {
    api: Arc<dyn SiteApi>,
    tx: mpsc::Sender<Action>,
    timeout: Duration,
    in_flight: HashMap<ControlKey, (RequestId, AbortHandle)>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn SiteApi>, tx: mpsc::Sender<Action>, timeout: Duration) -> Self {
        Self {
            api,
            tx,
            timeout,
            in_flight: HashMap::new(),
        }
    }

    /// Spawn the request. Returns `false` if its control already has one running.
    pub fn dispatch(&mut self, request: Request) -> bool {
        if let Some((running, _)) = self.in_flight.get(&request.key) {
            warn!(
                "Refusing request {} for {:?}: {} still in flight",
                request.id, request.key, running
            );
            return false;
        }

        info!("Dispatching request {} for {:?}", request.id, request.key);

        let api = self.api.clone();
        let tx = self.tx.clone();
        let timeout = self.timeout;
        let Request { id, key, kind } = request;

        let handle = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, execute(api.as_ref(), &kind)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Request {} timed out after {:?}", id, timeout);
                    Err(ApiError::Timeout)
                }
            };
            if tx
                .send(Action::Resolved {
                    request: id,
                    outcome,
                })
                .is_err()
            {
                warn!("Failed to send completion for {}: receiver dropped", id);
            }
        });

        self.in_flight.insert(key, (id, handle.abort_handle()));
        true
    }

    /// Abort the request running for `key`, if any.
    pub fn cancel(&mut self, key: ControlKey) -> bool {
        let Some((id, handle)) = self.in_flight.remove(&key) else {
            debug!("Nothing in flight for {:?}", key);
            return false;
        };

        handle.abort();
        info!("Cancelled request {} for {:?}", id, key);
        if self
            .tx
            .send(Action::Resolved {
                request: id,
                outcome: Err(ApiError::Cancelled),
            })
            .is_err()
        {
            warn!("Failed to send cancellation for {}: receiver dropped", id);
        }
        true
    }

    /// A completion was consumed; free its control's slot.
    pub fn complete(&mut self, id: RequestId) {
        self.in_flight.retain(|_, (running, _)| *running != id);
    }

    pub fn is_busy(&self, key: ControlKey) -> bool {
        self.in_flight.contains_key(&key)
    }

    /// Abort everything; used on shutdown.
    pub fn abort_all(&mut self) {
        for (_, (id, handle)) in self.in_flight.drain() {
            debug!("Aborting request {} on shutdown", id);
            handle.abort();
        }
    }
}
