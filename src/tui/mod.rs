//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard and mouse events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Event Loop
//!
//! ```text
//! poll terminal ──► handle_event() ──► Action ──┐
//!                                               ├──► step(): update() ──► Effect ──► Dispatcher
//! rx (completions from tasks) ──────────────────┘
//! ```
//!
//! Redraws only happen when something changed: a terminal event or a
//! completion. After each draw, a loader row that is on screen gets a
//! `CheckAutoLoad`, which is how scrolling to the end loads the next page.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::layout::Rect;

use crate::api::{ApiError, Dispatcher, HttpSiteApi};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::request::{ControlKey, EntryId};
use crate::core::state::App;
use crate::core::widgets::composer::KeyOutcome;
use crate::core::widgets::feed::{Control, Node};
use crate::tui::component::EventHandler;
use crate::tui::components::{FeedViewState, InputBox, InputEvent};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Where keystrokes go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Arrow keys move through entries and buttons; letters are commands.
    Feed,
    /// Text editing in the compose box.
    Compose,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub feed_view: FeedViewState,
    pub input_box: InputBox,
    pub focus: Focus,
    /// Entry and image index shown in the lightbox
    pub lightbox_source: Option<(EntryId, usize)>,
    /// Last scroll height reported to the core composer
    pub reported_height: u16,
}

impl TuiState {
    pub fn new(app: &App) -> Self {
        Self {
            feed_view: FeedViewState::new(),
            input_box: InputBox::new(app.composer.settings().char_limit),
            focus: Focus::Feed,
            lightbox_source: None,
            reported_height: 0,
        }
    }

    fn composer_changed(&mut self) -> Action {
        self.reported_height = self.input_box.scroll_height();
        Action::ComposerChanged {
            text: self.input_box.buffer().to_string(),
            scroll_height: self.reported_height,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter be told apart from Enter;
        // terminals without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste
        );
    }
}

// ============================================================================
// Event → Action
// ============================================================================

fn selected_node<'a>(app: &'a App, tui: &TuiState) -> Option<&'a Node> {
    tui.feed_view.selected.and_then(|i| app.feed.nodes().get(i))
}

fn selected_entry(app: &App, tui: &TuiState) -> Option<EntryId> {
    match selected_node(app, tui) {
        Some(Node::Entry(entry)) => Some(entry.id),
        _ => None,
    }
}

fn handle_lightbox_event(event: &TuiEvent, app: &App, tui: &mut TuiState) -> Option<Action> {
    match event {
        TuiEvent::Escape
        | TuiEvent::Enter { .. }
        | TuiEvent::InputChar('q')
        | TuiEvent::MouseClick(..) => {
            tui.lightbox_source = None;
            Some(Action::DismissLightbox)
        }
        TuiEvent::CursorLeft | TuiEvent::CursorRight => {
            let (entry, index) = tui.lightbox_source?;
            let count = app.feed.entry(entry)?.images.len();
            let next = if matches!(event, TuiEvent::CursorLeft) {
                index.checked_sub(1)?
            } else {
                Some(index + 1).filter(|i| *i < count)?
            };
            tui.lightbox_source = Some((entry, next));
            Some(Action::OpenImage { entry, index: next })
        }
        // Feed commands don't reach through the overlay
        _ => None,
    }
}

fn handle_feed_event(event: &TuiEvent, app: &App, tui: &mut TuiState, frame_area: Rect) -> Option<Action> {
    let node_count = app.feed.nodes().len();
    match event {
        TuiEvent::CursorUp | TuiEvent::InputChar('k') => {
            tui.feed_view.select_prev(node_count);
            None
        }
        TuiEvent::CursorDown | TuiEvent::InputChar('j') => {
            tui.feed_view.select_next(node_count);
            None
        }
        TuiEvent::CursorLeft | TuiEvent::InputChar('h') => {
            tui.feed_view.prev_slot();
            None
        }
        TuiEvent::CursorRight | TuiEvent::InputChar('l') => {
            if let Some(Node::Entry(entry)) = selected_node(app, tui) {
                tui.feed_view.next_slot(entry.controls.len());
            }
            None
        }
        TuiEvent::Enter { .. } => match selected_node(app, tui) {
            Some(Node::Entry(entry)) if !entry.controls.is_empty() => Some(Action::Activate {
                entry: entry.id,
                slot: tui.feed_view.slot,
            }),
            Some(Node::Loader(_)) => Some(Action::LoadMore),
            Some(Node::Entry(_)) => None,
            None => {
                tui.feed_view.select_next(node_count);
                None
            }
        },
        TuiEvent::InputChar('y') => match selected_node(app, tui)? {
            Node::Entry(entry) => match entry.controls.get(tui.feed_view.slot)? {
                Control::Delete(delete) if delete.confirm_clickable() => Some(Action::Confirm {
                    entry: entry.id,
                    slot: tui.feed_view.slot,
                }),
                _ => None,
            },
            Node::Loader(_) => None,
        },
        TuiEvent::InputChar('i') => {
            let entry = selected_entry(app, tui)?;
            tui.lightbox_source = Some((entry, 0));
            Some(Action::OpenImage { entry, index: 0 })
        }
        TuiEvent::InputChar('r') => Some(Action::Refresh),
        TuiEvent::InputChar('c') => match selected_node(app, tui)? {
            Node::Entry(entry) => Some(Action::Cancel(ControlKey::Control {
                entry: entry.id,
                slot: tui.feed_view.slot,
            })),
            Node::Loader(_) => Some(Action::Cancel(ControlKey::Loader)),
        },
        TuiEvent::InputChar('q') => Some(Action::Quit),
        TuiEvent::Tab => {
            tui.focus = Focus::Compose;
            None
        }
        TuiEvent::Paste(_) => {
            tui.focus = Focus::Compose;
            handle_compose_event(event, app, tui)
        }
        TuiEvent::MouseClick(_, row) => {
            let height = ui::composer_height(app, frame_area.height);
            if ui::in_composer(*row, frame_area, height) {
                tui.focus = Focus::Compose;
            } else if let Some(index) = ui::hit_test_node(*row, frame_area, height, tui) {
                if tui.feed_view.selected != Some(index) {
                    tui.feed_view.slot = 0;
                }
                tui.feed_view.selected = Some(index);
            }
            None
        }
        _ => None,
    }
}

fn handle_compose_event(event: &TuiEvent, app: &App, tui: &mut TuiState) -> Option<Action> {
    match event {
        TuiEvent::Tab => {
            tui.focus = Focus::Feed;
            None
        }
        TuiEvent::Escape if app.is_pending(ControlKey::Composer) => {
            Some(Action::Cancel(ControlKey::Composer))
        }
        TuiEvent::Escape => {
            tui.focus = Focus::Feed;
            None
        }
        TuiEvent::MouseClick(..) => {
            tui.focus = Focus::Feed;
            None
        }
        _ => match tui.input_box.handle_event(event)? {
            InputEvent::Enter { shift } => match app.composer.on_enter(shift) {
                KeyOutcome::Submit => Some(Action::Submit),
                KeyOutcome::Newline => {
                    tui.input_box.insert_newline();
                    Some(tui.composer_changed())
                }
            },
            InputEvent::Edited => Some(tui.composer_changed()),
            InputEvent::Moved => None,
        },
    }
}

/// Translate one terminal event. May mutate presentation state directly.
fn handle_event(event: &TuiEvent, app: &App, tui: &mut TuiState, frame_area: Rect) -> Option<Action> {
    if matches!(event, TuiEvent::ForceQuit) {
        return Some(Action::Quit);
    }
    if matches!(
        event,
        TuiEvent::ScrollUp | TuiEvent::ScrollDown | TuiEvent::ScrollPageUp | TuiEvent::ScrollPageDown
    ) {
        if !app.lightbox.scroll_locked() {
            tui.feed_view.handle_event(event);
        }
        return None;
    }
    if app.lightbox.is_open() {
        return handle_lightbox_event(event, app, tui);
    }
    match tui.focus {
        Focus::Feed => handle_feed_event(event, app, tui, frame_area),
        Focus::Compose => {
            // A click in the compose box keeps focus there
            if let TuiEvent::MouseClick(_, row) = event {
                let height = ui::composer_height(app, frame_area.height);
                if ui::in_composer(*row, frame_area, height) {
                    return None;
                }
                tui.focus = Focus::Feed;
                return handle_feed_event(event, app, tui, frame_area);
            }
            handle_compose_event(event, app, tui)
        }
    }
}

// ============================================================================
// Action → Effect → Dispatcher
// ============================================================================

/// Run an action through the reducer and carry out its effect.
/// Returns `true` when the app should quit.
fn step(app: &mut App, tui: &mut TuiState, dispatcher: &mut Dispatcher, action: Action) -> bool {
    let mut queue = VecDeque::from([action]);

    while let Some(action) = queue.pop_front() {
        if let Action::Resolved { request, .. } = &action {
            dispatcher.complete(*request);
        }
        match update(app, action) {
            Effect::None => {}
            Effect::Send(request) => {
                let id = request.id;
                if !dispatcher.dispatch(request) {
                    // Never went out; release the widget
                    queue.push_back(Action::Resolved {
                        request: id,
                        outcome: Err(ApiError::Cancelled),
                    });
                }
            }
            Effect::Cancel(key) => {
                dispatcher.cancel(key);
            }
            Effect::Quit => return true,
        }
    }

    tui.input_box.sync(app.composer.text());
    false
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let api = HttpSiteApi::new(
        config.base_url.clone(),
        config.session_cookie.as_deref(),
        config.request_timeout,
    )
    .map_err(std::io::Error::other)?;

    let mut app = App::from_config(&config);
    let mut tui = TuiState::new(&app);

    // Channel for completions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut dispatcher = Dispatcher::new(Arc::new(api), tx, config.request_timeout);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let mut should_quit = step(&mut app, &mut tui, &mut dispatcher, Action::CheckAutoLoad);
    let mut needs_redraw = true;

    while !should_quit {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;

            // A loader on screen loads itself
            if tui.feed_view.loader_visible && !app.is_pending(ControlKey::Loader) {
                should_quit |= step(&mut app, &mut tui, &mut dispatcher, Action::CheckAutoLoad);
                needs_redraw |= app.is_pending(ControlKey::Loader);
            }

            // Width changes alter the compose box's natural height
            if tui.input_box.scroll_height() != tui.reported_height {
                let action = tui.composer_changed();
                should_quit |= step(&mut app, &mut tui, &mut dispatcher, action);
                needs_redraw = true;
            }
        }

        // Poll faster while replies are outstanding
        let timeout = if app.pending.is_empty() {
            Duration::from_millis(500)
        } else {
            Duration::from_millis(50)
        };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        let frame_area = terminal.get_frame().area();
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            needs_redraw = true;
            if let Some(action) = handle_event(&event, &app, &mut tui, frame_area) {
                should_quit |= step(&mut app, &mut tui, &mut dispatcher, action);
            }
        }

        // Completions from background tasks
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            should_quit |= step(&mut app, &mut tui, &mut dispatcher, action);
        }
    }

    if !app.pending.is_empty() {
        warn!("Quitting with {} requests in flight", app.pending.len());
    }
    dispatcher.abort_all();

    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Reply;
    use crate::core::request::{Request, RequestId, RequestKind};
    use crate::test_support::ScriptedApi;
    use crate::test_support::test_app;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 100,
        height: 24,
    };

    /// App with one entry holding a delete, a save and an image, then a loader.
    fn loaded() -> (App, TuiState) {
        let mut app = test_app();
        let request = match update(&mut app, Action::CheckAutoLoad) {
            Effect::Send(request) => request,
            other => panic!("expected Send, got {other:?}"),
        };
        update(
            &mut app,
            Action::Resolved {
                request: request.id,
                outcome: Ok(Reply::Html(
                    r#"<li>hi <a data-action="delete" data-id="3">delete</a>
                       <a data-action="save" data-id="3">save</a>
                       <img src="/t.jpg"><img src="/u.jpg"></li>
                       <li data-page="2">Load more</li>"#
                        .into(),
                )),
            },
        );
        let tui = TuiState::new(&app);
        (app, tui)
    }

    fn press(app: &App, tui: &mut TuiState, event: TuiEvent) -> Option<Action> {
        handle_event(&event, app, tui, AREA)
    }

    #[test]
    fn test_enter_activates_selected_button() {
        let (app, mut tui) = loaded();
        press(&app, &mut tui, TuiEvent::CursorDown);
        press(&app, &mut tui, TuiEvent::CursorRight);
        let entry = selected_entry(&app, &tui).unwrap();
        assert_eq!(
            press(&app, &mut tui, TuiEvent::Enter { shift: false }),
            Some(Action::Activate { entry, slot: 1 })
        );
        // A save has no confirmation step
        assert_eq!(press(&app, &mut tui, TuiEvent::InputChar('y')), None);
    }

    #[test]
    fn test_confirm_only_when_delete_is_armed() {
        let (mut app, mut tui) = loaded();
        press(&app, &mut tui, TuiEvent::CursorDown);
        let entry = selected_entry(&app, &tui).unwrap();
        assert_eq!(press(&app, &mut tui, TuiEvent::InputChar('y')), None);

        let action = press(&app, &mut tui, TuiEvent::Enter { shift: false }).unwrap();
        assert_eq!(update(&mut app, action), Effect::None);
        assert_eq!(
            press(&app, &mut tui, TuiEvent::InputChar('y')),
            Some(Action::Confirm { entry, slot: 0 })
        );

        // In flight: the confirmation is inert
        update(&mut app, Action::Confirm { entry, slot: 0 });
        assert_eq!(press(&app, &mut tui, TuiEvent::InputChar('y')), None);
    }

    #[test]
    fn test_overlay_locks_feed_scrolling() {
        let (mut app, mut tui) = loaded();
        tui.feed_view.heights = vec![30, 1];
        tui.feed_view.viewport_height = 10;
        press(&app, &mut tui, TuiEvent::CursorDown);
        let action = press(&app, &mut tui, TuiEvent::InputChar('i')).unwrap();
        update(&mut app, action);

        press(&app, &mut tui, TuiEvent::ScrollDown);
        assert_eq!(tui.feed_view.scroll_state.offset().y, 0);

        update(&mut app, Action::DismissLightbox);
        press(&app, &mut tui, TuiEvent::ScrollDown);
        assert!(tui.feed_view.scroll_state.offset().y > 0);
    }

    #[test]
    fn test_enter_on_loader_loads_more() {
        let (app, mut tui) = loaded();
        press(&app, &mut tui, TuiEvent::CursorDown);
        press(&app, &mut tui, TuiEvent::CursorDown);
        assert_eq!(
            press(&app, &mut tui, TuiEvent::Enter { shift: false }),
            Some(Action::LoadMore)
        );
        assert_eq!(
            press(&app, &mut tui, TuiEvent::InputChar('c')),
            Some(Action::Cancel(ControlKey::Loader))
        );
    }

    #[test]
    fn test_compose_enter_policy() {
        let (app, mut tui) = loaded();
        press(&app, &mut tui, TuiEvent::Tab);
        assert_eq!(tui.focus, Focus::Compose);

        assert!(matches!(
            press(&app, &mut tui, TuiEvent::InputChar('a')),
            Some(Action::ComposerChanged { ref text, .. }) if text == "a"
        ));
        assert_eq!(
            press(&app, &mut tui, TuiEvent::Enter { shift: false }),
            Some(Action::Submit)
        );
        assert!(matches!(
            press(&app, &mut tui, TuiEvent::Enter { shift: true }),
            Some(Action::ComposerChanged { ref text, .. }) if text == "a\n"
        ));
    }

    #[test]
    fn test_letters_type_in_compose_focus() {
        let (app, mut tui) = loaded();
        press(&app, &mut tui, TuiEvent::Tab);
        assert!(matches!(
            press(&app, &mut tui, TuiEvent::InputChar('q')),
            Some(Action::ComposerChanged { .. })
        ));
        press(&app, &mut tui, TuiEvent::Escape);
        assert_eq!(tui.focus, Focus::Feed);
        assert_eq!(press(&app, &mut tui, TuiEvent::InputChar('q')), Some(Action::Quit));
    }

    #[test]
    fn test_lightbox_navigation() {
        let (mut app, mut tui) = loaded();
        press(&app, &mut tui, TuiEvent::CursorDown);
        let action = press(&app, &mut tui, TuiEvent::InputChar('i')).unwrap();
        update(&mut app, action);
        assert!(app.lightbox.is_open());

        let entry = selected_entry(&app, &tui).unwrap();
        assert_eq!(
            press(&app, &mut tui, TuiEvent::CursorRight),
            Some(Action::OpenImage { entry, index: 1 })
        );
        assert_eq!(press(&app, &mut tui, TuiEvent::CursorRight), None);
        // Scrolling and feed commands are ignored under the overlay
        assert_eq!(press(&app, &mut tui, TuiEvent::ScrollDown), None);
        assert_eq!(press(&app, &mut tui, TuiEvent::InputChar('r')), None);
        assert_eq!(
            press(&app, &mut tui, TuiEvent::Escape),
            Some(Action::DismissLightbox)
        );
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let (app, mut tui) = loaded();
        press(&app, &mut tui, TuiEvent::Tab);
        assert_eq!(press(&app, &mut tui, TuiEvent::ForceQuit), Some(Action::Quit));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_step_dispatches_and_syncs_composer() {
        let (mut app, mut tui) = loaded();
        let (tx, rx) = mpsc::channel();
        let api = Arc::new(ScriptedApi::new().with_form_reply("<p>ok</p>").with_page("<li>new</li>"));
        let mut dispatcher = Dispatcher::new(api, tx, Duration::from_secs(5));

        step(
            &mut app,
            &mut tui,
            &mut dispatcher,
            Action::ComposerChanged {
                text: "hello".into(),
                scroll_height: 3,
            },
        );
        assert_eq!(tui.input_box.buffer(), "hello");
        assert!(!step(&mut app, &mut tui, &mut dispatcher, Action::Submit));
        assert!(dispatcher.is_busy(ControlKey::Composer));

        // Post completes, then the refresh it triggers
        for _ in 0..2 {
            let action = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            step(&mut app, &mut tui, &mut dispatcher, action);
        }
        assert_eq!(tui.input_box.buffer(), "");
        assert_eq!(app.feed.entries().count(), 1);
        assert!(app.pending.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_page_waits_for_explicit_retry() {
        let mut app = test_app();
        let mut tui = TuiState::new(&app);
        let (tx, rx) = mpsc::channel();
        let api = Arc::new(
            ScriptedApi::new()
                .with_page_error(ApiError::Api {
                    status: 502,
                    message: "bad gateway".into(),
                })
                .with_page("<li>back</li>"),
        );
        let mut dispatcher = Dispatcher::new(api.clone(), tx, Duration::from_secs(5));

        step(&mut app, &mut tui, &mut dispatcher, Action::CheckAutoLoad);
        let action = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        step(&mut app, &mut tui, &mut dispatcher, action);
        assert!(app.status_message.starts_with("Loading failed"));

        // What the loop does after each draw with the loader on screen
        step(&mut app, &mut tui, &mut dispatcher, Action::CheckAutoLoad);
        assert!(!app.is_pending(ControlKey::Loader));
        assert_eq!(api.calls().len(), 1);

        tui.feed_view.selected = Some(0);
        let action = press(&app, &mut tui, TuiEvent::Enter { shift: false }).unwrap();
        assert_eq!(action, Action::LoadMore);
        step(&mut app, &mut tui, &mut dispatcher, action);
        let action = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        step(&mut app, &mut tui, &mut dispatcher, action);
        assert_eq!(app.feed.entries().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_refused_dispatch_releases_widget() {
        let (mut app, mut tui) = loaded();
        let (tx, _rx) = mpsc::channel();
        let api = Arc::new(ScriptedApi::new().with_delay(Duration::from_secs(2)));
        let mut dispatcher = Dispatcher::new(api, tx, Duration::from_secs(5));

        // Occupy the loader slot behind the app's back
        dispatcher.dispatch(Request {
            id: RequestId(900),
            key: ControlKey::Loader,
            kind: RequestKind::Page {
                path: "/feed".into(),
                page: 9,
            },
        });
        step(&mut app, &mut tui, &mut dispatcher, Action::LoadMore);
        assert!(!app.is_pending(ControlKey::Loader));
        assert!(app.feed.loader().is_some_and(|l| l.is_ready()));
        dispatcher.abort_all();
    }
}
