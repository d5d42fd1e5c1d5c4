//! Image overlay. A terminal can't show the picture, so the overlay shows
//! where the full-size image lives and what it is.

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::core::fragment::Image;
use crate::tui::component::Component;

pub struct LightboxView<'a> {
    pub image: &'a Image,
    /// Used to turn site-relative sources into full URLs
    pub base_url: &'a str,
}

impl<'a> LightboxView<'a> {
    pub fn new(image: &'a Image, base_url: &'a str) -> Self {
        Self { image, base_url }
    }

    fn absolute(&self, src: &str) -> String {
        if src.starts_with('/') {
            format!("{}{}", self.base_url, src)
        } else {
            src.to_string()
        }
    }

    fn popup_area(area: Rect) -> Rect {
        let [row] = Layout::vertical([Constraint::Length(9)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::horizontal([Constraint::Percentage(80)])
            .flex(Flex::Center)
            .areas(row);
        popup
    }
}

impl<'a> Component for LightboxView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let popup = Self::popup_area(area);

        let title = if self.image.alt.is_empty() {
            " Image ".to_string()
        } else {
            format!(" {} ", self.image.alt)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta))
            .padding(Padding::uniform(1))
            .title(title)
            .title_bottom(Line::from(" Esc close · ←/→ other images ").right_aligned());

        let body = vec![
            Line::styled(
                self.absolute(&self.image.full),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ),
            Line::styled(
                format!("thumbnail: {}", self.absolute(&self.image.src)),
                Style::default().fg(Color::DarkGray),
            ),
        ];

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(body).block(block).wrap(Wrap { trim: true }),
            popup,
        );
    }
}
