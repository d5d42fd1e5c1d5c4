//! # Actions
//!
//! Everything that can happen in Perch becomes an `Action`.
//! User activates a save control? That's `Action::Activate { entry, slot }`.
//! The site answers? That's `Action::Resolved { request, outcome }`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state and returns an `Effect` describing the I/O to perform.
//! No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! This makes everything testable without a network or a terminal.

use log::{debug, info, warn};

use crate::core::request::{ControlKey, EntryId, Outcome, Request, RequestId};
use crate::core::state::App;
use crate::core::widgets::composer::SubmitResult;
use crate::core::widgets::delete::DeleteResult;
use crate::core::widgets::feed::{Control, PageResult};
use crate::core::widgets::toggle::ToggleResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Click on an entry's `slot`-th control.
    Activate { entry: EntryId, slot: usize },
    /// Click on the confirmation control next to a delete.
    Confirm { entry: EntryId, slot: usize },
    LoadMore,
    /// Load the next page if the list ends in an idle "Load more" loader.
    CheckAutoLoad,
    Refresh,
    /// The compose box content changed; `scroll_height` is its natural content height.
    ComposerChanged { text: String, scroll_height: u16 },
    Submit,
    OpenImage { entry: EntryId, index: usize },
    DismissLightbox,
    Cancel(ControlKey),
    Resolved { request: RequestId, outcome: Outcome },
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Send(Request),
    Cancel(ControlKey),
    Quit,
}

fn send(app: &mut App, request: Option<Request>) -> Effect {
    match request {
        Some(request) => {
            app.track(&request);
            Effect::Send(request)
        }
        None => Effect::None,
    }
}

/// Reset the feed to page 1 and fetch it. While a page is still loading the
/// refresh is queued and runs when that page settles.
fn refresh(app: &mut App) -> Effect {
    if app.is_pending(ControlKey::Loader) {
        debug!("Refresh queued behind a page load");
        app.refresh_queued = true;
        return Effect::None;
    }
    app.refresh_queued = false;
    app.feed.reset();
    let request = app.feed.check_auto_load(&mut app.requests);
    send(app, request)
}

fn activate(app: &mut App, entry: EntryId, slot: usize) -> Effect {
    let Some(found) = app.feed.entry_mut(entry) else {
        debug!("Activate on missing entry {:?}", entry);
        return Effect::None;
    };
    if found.is_deleted() {
        return Effect::None;
    }

    let request = match found.controls.get_mut(slot) {
        Some(Control::Toggle(toggle)) => toggle.activate(&mut app.requests),
        Some(Control::Delete(delete)) => {
            delete.activate();
            None
        }
        None => None,
    };

    let request = request.map(|(id, kind)| Request {
        id,
        key: ControlKey::Control { entry, slot },
        kind,
    });
    send(app, request)
}

fn confirm(app: &mut App, entry: EntryId, slot: usize) -> Effect {
    let request = match app
        .feed
        .entry_mut(entry)
        .and_then(|e| e.controls.get_mut(slot))
    {
        Some(Control::Delete(delete)) => delete.confirm(&mut app.requests),
        _ => None,
    };

    let request = request.map(|(id, kind)| Request {
        id,
        key: ControlKey::Control { entry, slot },
        kind,
    });
    send(app, request)
}

fn resolve_control(app: &mut App, id: RequestId, entry: EntryId, slot: usize, outcome: &Outcome) {
    let Some(control) = app
        .feed
        .entry_mut(entry)
        .and_then(|e| e.controls.get_mut(slot))
    else {
        debug!("Completion {} for an entry that is gone", id);
        return;
    };

    match control {
        Control::Toggle(toggle) => match toggle.resolve(id, outcome) {
            ToggleResult::Flipped(next) => {
                info!("Toggle {} took effect, now offering {}", id, next);
                app.status_message = String::new();
            }
            ToggleResult::Unchanged(feedback) => {
                warn!("Toggle {} unchanged: {}", id, feedback);
                app.status_message = feedback;
            }
            ToggleResult::Stale => debug!("Stale toggle completion {}", id),
        },
        Control::Delete(delete) => match delete.resolve(id, outcome) {
            DeleteResult::Deleted => {
                info!("Delete {} confirmed", id);
                app.status_message = "Deleted".to_string();
            }
            DeleteResult::Failed(reason) => {
                warn!("Delete {} failed: {}", id, reason);
                app.status_message = format!("Delete failed: {reason}");
            }
            DeleteResult::Rearmed => {
                app.status_message = "Delete cancelled".to_string();
            }
            DeleteResult::Stale => debug!("Stale delete completion {}", id),
        },
    }
}

fn resolve(app: &mut App, id: RequestId, outcome: Outcome) -> Effect {
    let Some(key) = app.pending.remove(&id) else {
        warn!("Completion for unknown request {}", id);
        return Effect::None;
    };

    match key {
        ControlKey::Control { entry, slot } => {
            resolve_control(app, id, entry, slot, &outcome);
            Effect::None
        }
        ControlKey::Loader => {
            match app.feed.resolve_page(id, &outcome) {
                PageResult::Appended(_) => app.status_message = String::new(),
                PageResult::Failed(reason) => {
                    warn!("Page load {} failed: {}", id, reason);
                    app.status_message = format!("Loading failed: {reason}");
                }
                PageResult::Stale => debug!("Stale page completion {}", id),
            }
            if app.refresh_queued {
                refresh(app)
            } else {
                Effect::None
            }
        }
        ControlKey::Composer => match app.composer.resolve(id, &outcome) {
            SubmitResult::Posted => {
                info!("Post {} submitted", id);
                app.status_message = "Posted".to_string();
                refresh(app)
            }
            SubmitResult::Failed(reason) => {
                warn!("Post {} failed: {}", id, reason);
                app.status_message = format!("Post failed: {reason}");
                Effect::None
            }
            SubmitResult::Stale => Effect::None,
        },
    }
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Activate { entry, slot } => activate(app, entry, slot),
        Action::Confirm { entry, slot } => confirm(app, entry, slot),
        Action::LoadMore => {
            let request = app.feed.load_more(&mut app.requests);
            send(app, request)
        }
        Action::CheckAutoLoad => {
            let request = app.feed.check_auto_load(&mut app.requests);
            send(app, request)
        }
        Action::Refresh => refresh(app),
        Action::ComposerChanged {
            text,
            scroll_height,
        } => {
            app.composer.input(&text, scroll_height);
            Effect::None
        }
        Action::Submit => {
            let path = app.feed.path().to_string();
            let request = app
                .composer
                .submit(&path, &mut app.requests)
                .map(|(id, kind)| Request {
                    id,
                    key: ControlKey::Composer,
                    kind,
                });
            send(app, request)
        }
        Action::OpenImage { entry, index } => {
            if let Some(image) = app
                .feed
                .entry(entry)
                .and_then(|e| e.images.get(index))
                .cloned()
            {
                app.lightbox.open(image);
            }
            Effect::None
        }
        Action::DismissLightbox => {
            app.lightbox.dismiss();
            Effect::None
        }
        Action::Cancel(key) => {
            if app.is_pending(key) {
                Effect::Cancel(key)
            } else {
                Effect::None
            }
        }
        Action::Resolved { request, outcome } => resolve(app, request, outcome),
        Action::Quit => Effect::Quit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ApiError, Reply, StatusReply};
    use crate::core::request::RequestKind;
    use crate::core::verb::{Target, Verb};
    use crate::core::widgets::delete::DeletePhase;
    use crate::core::widgets::feed::Node;
    use crate::test_support::test_app;

    const PAGE: &str = r#"
        <li>first post
            <a data-action="delete" data-id="11">delete</a>
            <a data-action="save" data-id="11">save</a>
            <a data-action="follow" data-username="ann">follow</a>
            <img src="/t/11.jpg" data-full="/f/11.jpg">
        </li>
        <li>second post</li>
        <li data-page="2">Load more</li>
    "#;

    fn sent(effect: Effect) -> Request {
        match effect {
            Effect::Send(request) => request,
            other => panic!("expected Send, got {other:?}"),
        }
    }

    fn status(request: &Request, s: &str) -> Action {
        Action::Resolved {
            request: request.id,
            outcome: Ok(Reply::Status(StatusReply::new(s))),
        }
    }

    /// App with the first page loaded.
    fn loaded_app() -> (App, EntryId) {
        let mut app = test_app();
        let request = sent(update(&mut app, Action::CheckAutoLoad));
        update(
            &mut app,
            Action::Resolved {
                request: request.id,
                outcome: Ok(Reply::Html(PAGE.to_string())),
            },
        );
        let first = app.feed.entries().next().map(|e| e.id).unwrap();
        (app, first)
    }

    fn delete_phase(app: &App, entry: EntryId) -> DeletePhase {
        match &app.feed.entry(entry).unwrap().controls[0] {
            Control::Delete(d) => d.phase(),
            other => panic!("expected delete, got {other:?}"),
        }
    }

    #[test]
    fn test_startup_fetches_page_one() {
        let mut app = test_app();
        let request = sent(update(&mut app, Action::CheckAutoLoad));
        assert_eq!(request.key, ControlKey::Loader);
        assert_eq!(
            request.kind,
            RequestKind::Page {
                path: "/feed".into(),
                page: 1
            }
        );
        assert!(app.is_pending(ControlKey::Loader));
    }

    #[test]
    fn test_first_page_populates_feed() {
        let (app, _) = loaded_app();
        assert_eq!(app.feed.entries().count(), 2);
        assert!(matches!(app.feed.nodes().last(), Some(Node::Loader(l)) if l.cursor() == 2));
        assert!(app.pending.is_empty());
    }

    #[test]
    fn test_delete_first_click_sends_nothing() {
        let (mut app, first) = loaded_app();
        let effect = update(&mut app, Action::Activate { entry: first, slot: 0 });
        assert_eq!(effect, Effect::None);
        assert_eq!(delete_phase(&app, first), DeletePhase::ConfirmPending);
    }

    #[test]
    fn test_delete_confirm_round_trip_is_idempotent() {
        let (mut app, first) = loaded_app();
        update(&mut app, Action::Activate { entry: first, slot: 0 });
        let request = sent(update(&mut app, Action::Confirm { entry: first, slot: 0 }));
        assert_eq!(
            request.kind,
            RequestKind::Action {
                verb: Verb::Delete,
                target: Target::Id(11)
            }
        );

        update(&mut app, status(&request, "deleted"));
        assert!(app.feed.entry(first).unwrap().is_deleted());

        // Every control on a deleted entry is inert
        for slot in 0..3 {
            assert_eq!(update(&mut app, Action::Activate { entry: first, slot }), Effect::None);
            assert_eq!(update(&mut app, Action::Confirm { entry: first, slot }), Effect::None);
        }
    }

    #[test]
    fn test_delete_error_reply() {
        let (mut app, first) = loaded_app();
        update(&mut app, Action::Activate { entry: first, slot: 0 });
        let request = sent(update(&mut app, Action::Confirm { entry: first, slot: 0 }));
        update(&mut app, status(&request, "not found"));

        assert_eq!(delete_phase(&app, first), DeletePhase::ConfirmError);
        assert!(app.status_message.starts_with("Delete failed"));
        assert_eq!(update(&mut app, Action::Confirm { entry: first, slot: 0 }), Effect::None);
    }

    #[test]
    fn test_confirm_on_a_toggle_is_ignored() {
        let (mut app, first) = loaded_app();
        assert_eq!(update(&mut app, Action::Confirm { entry: first, slot: 1 }), Effect::None);
    }

    #[test]
    fn test_save_toggle_round_trip() {
        let (mut app, first) = loaded_app();
        let save = sent(update(&mut app, Action::Activate { entry: first, slot: 1 }));
        assert_eq!(save.key, ControlKey::Control { entry: first, slot: 1 });
        update(&mut app, status(&save, "unsave"));

        let unsave = sent(update(&mut app, Action::Activate { entry: first, slot: 1 }));
        assert_eq!(
            unsave.kind,
            RequestKind::Action {
                verb: Verb::Unsave,
                target: Target::Id(11)
            }
        );
    }

    #[test]
    fn test_toggle_failure_surfaces_feedback() {
        let (mut app, first) = loaded_app();
        let follow = sent(update(&mut app, Action::Activate { entry: first, slot: 2 }));
        update(&mut app, status(&follow, "not auth"));
        assert_eq!(app.status_message, "you need to be logged in");
        assert_eq!(app.feed.entry(first).unwrap().controls[2].label(), "follow");
    }

    #[test]
    fn test_unknown_completion_is_ignored() {
        let mut app = test_app();
        let effect = update(
            &mut app,
            Action::Resolved {
                request: RequestId(999),
                outcome: Err(ApiError::Timeout),
            },
        );
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn test_load_more_then_failure_allows_retry() {
        let (mut app, _) = loaded_app();
        let request = sent(update(&mut app, Action::LoadMore));
        assert_eq!(update(&mut app, Action::LoadMore), Effect::None);

        update(
            &mut app,
            Action::Resolved {
                request: request.id,
                outcome: Err(ApiError::Network("reset".into())),
            },
        );
        assert!(app.status_message.starts_with("Loading failed"));
        assert!(matches!(update(&mut app, Action::LoadMore), Effect::Send(_)));
    }

    #[test]
    fn test_lightbox_open_and_dismiss() {
        let (mut app, first) = loaded_app();
        update(&mut app, Action::OpenImage { entry: first, index: 0 });
        assert_eq!(app.lightbox.image().map(|i| i.full.as_str()), Some("/f/11.jpg"));
        update(&mut app, Action::DismissLightbox);
        assert!(!app.lightbox.is_open());

        update(&mut app, Action::OpenImage { entry: first, index: 5 });
        assert!(!app.lightbox.is_open());
    }

    #[test]
    fn test_submit_then_refresh() {
        let (mut app, _) = loaded_app();
        update(
            &mut app,
            Action::ComposerChanged {
                text: "hello".into(),
                scroll_height: 3,
            },
        );
        let post = sent(update(&mut app, Action::Submit));
        assert_eq!(post.key, ControlKey::Composer);

        let reload = sent(update(
            &mut app,
            Action::Resolved {
                request: post.id,
                outcome: Ok(Reply::Html(String::new())),
            },
        ));
        assert_eq!(app.status_message, "Posted");
        assert!(app.composer.text().is_empty());
        assert_eq!(
            reload.kind,
            RequestKind::Page {
                path: "/feed".into(),
                page: 1
            }
        );
        assert_eq!(app.feed.entries().count(), 0);
    }

    #[test]
    fn test_refresh_waits_for_pending_page() {
        let mut app = test_app();
        let page = sent(update(&mut app, Action::CheckAutoLoad));
        assert_eq!(update(&mut app, Action::Refresh), Effect::None);
        assert!(app.refresh_queued);

        // The page lands, then the queued refresh starts over from page 1
        let reload = sent(update(
            &mut app,
            Action::Resolved {
                request: page.id,
                outcome: Ok(Reply::Html(PAGE.to_string())),
            },
        ));
        assert_eq!(reload.key, ControlKey::Loader);
        assert!(!app.refresh_queued);
        assert_eq!(app.feed.entries().count(), 0);
    }

    #[test]
    fn test_post_during_page_load_reloads_afterwards() {
        let (mut app, _) = loaded_app();
        let page = sent(update(&mut app, Action::LoadMore));
        update(
            &mut app,
            Action::ComposerChanged {
                text: "hello".into(),
                scroll_height: 3,
            },
        );
        let post = sent(update(&mut app, Action::Submit));
        let effect = update(
            &mut app,
            Action::Resolved {
                request: post.id,
                outcome: Ok(Reply::Html(String::new())),
            },
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(app.status_message, "Posted");

        let reload = sent(update(
            &mut app,
            Action::Resolved {
                request: page.id,
                outcome: Err(ApiError::Network("reset".into())),
            },
        ));
        assert_eq!(
            reload.kind,
            RequestKind::Page {
                path: "/feed".into(),
                page: 1
            }
        );
    }

    #[test]
    fn test_failed_page_is_not_auto_loaded_again() {
        let mut app = test_app();
        let page = sent(update(&mut app, Action::CheckAutoLoad));
        update(
            &mut app,
            Action::Resolved {
                request: page.id,
                outcome: Err(ApiError::Api {
                    status: 500,
                    message: "boom".into(),
                }),
            },
        );
        assert_eq!(update(&mut app, Action::CheckAutoLoad), Effect::None);

        let retry = sent(update(&mut app, Action::LoadMore));
        assert_eq!(retry.key, ControlKey::Loader);
    }

    #[test]
    fn test_cancelled_page_stays_put_until_retried() {
        let mut app = test_app();
        let page = sent(update(&mut app, Action::CheckAutoLoad));
        assert_eq!(
            update(&mut app, Action::Cancel(ControlKey::Loader)),
            Effect::Cancel(ControlKey::Loader)
        );
        update(
            &mut app,
            Action::Resolved {
                request: page.id,
                outcome: Err(ApiError::Cancelled),
            },
        );
        assert_eq!(update(&mut app, Action::CheckAutoLoad), Effect::None);
        assert!(matches!(update(&mut app, Action::LoadMore), Effect::Send(_)));
    }

    #[test]
    fn test_cancel_only_for_pending_keys() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Cancel(ControlKey::Loader)), Effect::None);
        sent(update(&mut app, Action::CheckAutoLoad));
        assert_eq!(
            update(&mut app, Action::Cancel(ControlKey::Loader)),
            Effect::Cancel(ControlKey::Loader)
        );
    }

    #[test]
    fn test_cancelled_delete_rearms() {
        let (mut app, first) = loaded_app();
        update(&mut app, Action::Activate { entry: first, slot: 0 });
        let request = sent(update(&mut app, Action::Confirm { entry: first, slot: 0 }));
        update(
            &mut app,
            Action::Resolved {
                request: request.id,
                outcome: Err(ApiError::Cancelled),
            },
        );
        assert_eq!(delete_phase(&app, first), DeletePhase::ConfirmPending);
    }

    #[test]
    fn test_quit() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
