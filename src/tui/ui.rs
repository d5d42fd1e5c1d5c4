use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Span;

use crate::core::state::App;
use crate::core::widgets::composer::ComposerPhase;
use crate::tui::component::Component;
use crate::tui::components::{Counter, FeedView, LightboxView, TitleBar};
use crate::tui::{Focus, TuiState};

/// Smallest compose box: one text line plus borders.
const MIN_COMPOSER_HEIGHT: u16 = 3;

const HINTS_FEED: &str =
    "↑↓ select  ←→ button  Enter activate  y confirm  i image  r refresh  c cancel  Tab compose  q quit";
const HINTS_COMPOSE: &str = "Enter post  Shift+Enter newline  Esc back  Ctrl+C quit";

/// Compose box height: the core's grown height, kept within half the screen.
pub fn composer_height(app: &App, frame_height: u16) -> u16 {
    app.composer
        .height()
        .min(frame_height / 2)
        .max(MIN_COMPOSER_HEIGHT)
}

/// `[title, feed, composer, hints]`
pub fn layout_areas(frame_area: Rect, composer_height: u16) -> [Rect; 4] {
    use Constraint::{Length, Min};
    Layout::vertical([Length(1), Min(0), Length(composer_height), Length(1)]).areas(frame_area)
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    let composer_height = composer_height(app, frame.area().height);
    let [title_area, feed_area, composer_area, hints_area] =
        layout_areas(frame.area(), composer_height);

    let in_flight = app.pending.len();
    TitleBar::new(
        &app.base_url,
        app.feed.path(),
        app.status_message.clone(),
        in_flight,
    )
    .render(frame, title_area);

    FeedView::new(&mut tui.feed_view, &app.feed).render(frame, feed_area);

    tui.input_box.counter = Counter {
        count: app.composer.char_count(),
        limit: app.composer.settings().char_limit,
        tone: app.composer.tone(),
    };
    tui.input_box.focused = tui.focus == Focus::Compose && !app.lightbox.is_open();
    tui.input_box.submitting = matches!(app.composer.phase(), ComposerPhase::Submitting(_));
    tui.input_box.render(frame, composer_area);

    let hints = match tui.focus {
        Focus::Feed => HINTS_FEED,
        Focus::Compose => HINTS_COMPOSE,
    };
    frame.render_widget(
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
        hints_area,
    );

    if let Some(image) = app.lightbox.image() {
        LightboxView::new(image, &app.base_url).render(frame, frame.area());
    }
}

/// Hit test: given a screen Y coordinate, find which feed node (if any) is at that position.
pub fn hit_test_node(screen_y: u16, frame_area: Rect, composer_height: u16, tui: &TuiState) -> Option<usize> {
    let [_, feed_area, _, _] = layout_areas(frame_area, composer_height);
    if screen_y < feed_area.y || screen_y >= feed_area.y + feed_area.height {
        return None;
    }
    let content_y = (screen_y - feed_area.y) + tui.feed_view.scroll_state.offset().y;
    tui.feed_view.hit_test(content_y)
}

/// Whether a screen Y coordinate falls inside the compose box.
pub fn in_composer(screen_y: u16, frame_area: Rect, composer_height: u16) -> bool {
    let [_, _, composer_area, _] = layout_areas(frame_area, composer_height);
    screen_y >= composer_area.y && screen_y < composer_area.y + composer_area.height
}
