//! # TitleBar Component
//!
//! Top status bar: which page is being browsed, the latest status message,
//! and how many requests are in flight.
//!
//! Stateless; every field is a prop.
//!
//! 1. **Requests in flight**: `"Perch · localhost:8000/feed | Posted | ⟳ 2"`
//! 2. **Status message**: `"Perch · localhost:8000/feed | Posted"`
//! 3. **Default**: `"Perch · localhost:8000/feed"`

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;

pub struct TitleBar {
    /// Site and path, e.g. "localhost:8000/feed"
    pub location: String,
    pub status_message: String,
    /// Number of requests awaiting a reply
    pub in_flight: usize,
}

impl TitleBar {
    pub fn new(base_url: &str, path: &str, status_message: String, in_flight: usize) -> Self {
        let host = base_url
            .split_once("://")
            .map_or(base_url, |(_, rest)| rest);
        Self {
            location: format!("{host}{path}"),
            status_message,
            in_flight,
        }
    }

    fn text(&self) -> String {
        let mut text = format!("Perch · {}", self.location);
        if !self.status_message.is_empty() {
            text.push_str(" | ");
            text.push_str(&self.status_message);
        }
        if self.in_flight > 0 {
            text.push_str(&format!(" | ⟳ {}", self.in_flight));
        }
        text
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Span::raw(self.text()), area);
    }
}
