use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget};

use crate::core::widgets::feed::{Control, Entry};
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// One list entry: its text, an image line and a row of action buttons.
///
/// Transient: built each frame by `FeedView` from a core `Entry`.
#[derive(Clone, Copy)]
pub struct EntryCard<'a> {
    pub entry: &'a Entry,
    pub is_selected: bool,
    /// Highlighted button, only meaningful while selected
    pub selected_slot: usize,
}

fn wrapped(text: &str, width: u16) -> Vec<String> {
    let options = textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace);
    textwrap::wrap(text.trim(), options)
        .into_iter()
        .map(|l| l.into_owned())
        .collect()
}

impl<'a> EntryCard<'a> {
    pub fn new(entry: &'a Entry, is_selected: bool, selected_slot: usize) -> Self {
        Self {
            entry,
            is_selected,
            selected_slot,
        }
    }

    /// Rendered height at `width`, predicted with the same wrapping as `render`.
    pub fn calculate_height(entry: &Entry, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let text_lines = u16::try_from(wrapped(&entry.text, content_width).len())
            .unwrap_or(u16::MAX)
            .max(1);
        text_lines
            .saturating_add(u16::from(!entry.images.is_empty()))
            .saturating_add(u16::from(!entry.controls.is_empty()))
            .saturating_add(VERTICAL_OVERHEAD)
    }

    fn images_line(&self) -> Line<'a> {
        let images = &self.entry.images;
        let names: Vec<&str> = images
            .iter()
            .map(|i| if i.alt.is_empty() { i.src.as_str() } else { i.alt.as_str() })
            .collect();
        let noun = if images.len() == 1 { "image" } else { "images" };
        Line::styled(
            format!("▣ {} {}: {}", images.len(), noun, names.join(", ")),
            Style::default().fg(Color::Magenta),
        )
    }

    fn controls_line(&self) -> Line<'a> {
        if self.entry.is_deleted() {
            return Line::styled("deleted", Style::default().fg(Color::Red));
        }

        let mut spans = Vec::new();
        for (slot, control) in self.entry.controls.iter().enumerate() {
            if slot > 0 {
                spans.push(Span::raw(" "));
            }

            let mut style = Style::default().fg(Color::Cyan);
            if control.is_in_flight() {
                style = style.add_modifier(Modifier::DIM);
            }
            if self.is_selected && slot == self.selected_slot {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(format!("[{}]", control.label()), style));

            if let Control::Delete(delete) = control
                && let Some(confirm) = delete.confirm_label()
            {
                let style = if delete.confirm_clickable() {
                    Style::default().fg(Color::Yellow)
                } else if delete.is_inert() {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::DIM)
                } else {
                    Style::default().fg(Color::Red)
                };
                spans.push(Span::raw(" "));
                spans.push(Span::styled(format!("[{confirm}]"), style));
            }
        }
        Line::from(spans)
    }
}

impl<'a> Widget for EntryCard<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let deleted = self.entry.is_deleted();

        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let text_style = if deleted {
            Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
        } else {
            Style::default()
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = wrapped(&self.entry.text, inner.width);
        let [text_area, images_area, controls_area] = Layout::vertical([
            Constraint::Length((lines.len() as u16).max(1)),
            Constraint::Length(u16::from(!self.entry.images.is_empty())),
            Constraint::Length(u16::from(!self.entry.controls.is_empty())),
        ])
        .areas(inner);

        Paragraph::new(lines.join("\n"))
            .style(text_style)
            .render(text_area, buf);
        if !self.entry.images.is_empty() {
            Paragraph::new(self.images_line()).render(images_area, buf);
        }
        if !self.entry.controls.is_empty() {
            Paragraph::new(self.controls_line()).render(controls_area, buf);
        }
    }
}

impl<'a> Component for EntryCard<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
