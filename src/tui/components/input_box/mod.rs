//! # InputBox Component
//!
//! The compose box: a text editor whose height follows its content, with a
//! character counter in the border.
//!
//! ## Responsibilities
//!
//! - Capture text input and editing (backspace, delete, cursor movement, paste)
//! - Report Enter with its Shift state; the parent decides submit vs newline
//! - Measure its natural content height for the core's auto-grow rule
//! - Display the counter, warning-coloured at the limit
//!
//! ## State Management
//!
//! The buffer is a local copy. The core `Composer` owns the canonical text
//! (it may fold it), so the parent calls `sync()` after every update.

mod cursor;
mod text_wrap;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::core::widgets::composer::CounterTone;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use cursor::CursorState;
use text_wrap::{VERTICAL_OVERHEAD, next_char_boundary, prev_char_boundary, scroll_height, visible_text};

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed; the parent applies the Enter policy
    Enter { shift: bool },
    /// Buffer content changed
    Edited,
    /// Only the cursor moved
    Moved,
}

/// Counter props shown in the top-right border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Counter {
    pub count: usize,
    pub limit: usize,
    pub tone: CounterTone,
}

pub struct InputBox {
    buffer: String,
    cursor: CursorState,
    /// Counter (Prop)
    pub counter: Counter,
    /// Whether keystrokes currently go here (Prop)
    pub focused: bool,
    /// A submission is in flight (Prop)
    pub submitting: bool,
}

impl InputBox {
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: String::new(),
            cursor: CursorState::new(),
            counter: Counter {
                count: 0,
                limit,
                tone: CounterTone::Normal,
            },
            focused: true,
            submitting: false,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Adopt the canonical text when it differs from the local buffer
    /// (folding, or clearing after a successful post).
    pub fn sync(&mut self, text: &str) {
        if self.buffer != text {
            self.buffer = text.to_string();
            self.cursor.move_to_end(&self.buffer);
        }
    }

    /// Natural height of the box for the width it was last rendered at.
    pub fn scroll_height(&self) -> u16 {
        scroll_height(&self.buffer, self.cursor.last_width)
    }

    pub fn insert_newline(&mut self) {
        self.buffer.insert(self.cursor.pos, '\n');
        self.cursor.pos += 1;
    }

    fn title(&self) -> &'static str {
        if self.submitting { " Posting... " } else { " Compose " }
    }

    fn counter_line(&self) -> Line<'static> {
        let style = match self.counter.tone {
            CounterTone::Normal => Style::default().fg(Color::DarkGray),
            CounterTone::Warning => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        };
        Line::styled(format!(" {}/{} ", self.counter.count, self.counter.limit), style)
            .right_aligned()
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let visible_lines = area.height.saturating_sub(VERTICAL_OVERHEAD);
        self.cursor.last_width = area.width;
        self.cursor
            .update_scroll_offset(&self.buffer, area.width, visible_lines);

        let text = visible_text(&self.buffer, area.width, self.cursor.scroll_offset, visible_lines);

        let border_style = if self.focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Green).add_modifier(Modifier::DIM)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .padding(Padding::horizontal(1))
            .title(self.title())
            .title(self.counter_line());

        frame.render_widget(Paragraph::new(text).block(block), area);

        if self.focused {
            frame.set_cursor_position(self.cursor.screen_pos(&self.buffer, area));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor.pos, *c);
                self.cursor.pos += c.len_utf8();
                Some(InputEvent::Edited)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.cursor.pos, text);
                self.cursor.pos += text.len();
                Some(InputEvent::Edited)
            }
            TuiEvent::Backspace if self.cursor.pos > 0 => {
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                Some(InputEvent::Edited)
            }
            TuiEvent::Delete if self.cursor.pos < self.buffer.len() => {
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                Some(InputEvent::Edited)
            }
            TuiEvent::CursorLeft if self.cursor.pos > 0 => {
                self.cursor.pos = prev_char_boundary(&self.buffer, self.cursor.pos);
                Some(InputEvent::Moved)
            }
            TuiEvent::CursorRight if self.cursor.pos < self.buffer.len() => {
                self.cursor.pos = next_char_boundary(&self.buffer, self.cursor.pos);
                Some(InputEvent::Moved)
            }
            TuiEvent::CursorHome => {
                let line_start = self.buffer[..self.cursor.pos]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                (self.cursor.pos != line_start).then(|| {
                    self.cursor.pos = line_start;
                    InputEvent::Moved
                })
            }
            TuiEvent::CursorEnd => {
                let line_end = self.buffer[self.cursor.pos..]
                    .find('\n')
                    .map(|i| self.cursor.pos + i)
                    .unwrap_or(self.buffer.len());
                (self.cursor.pos != line_end).then(|| {
                    self.cursor.pos = line_end;
                    InputEvent::Moved
                })
            }
            TuiEvent::CursorUp => self
                .cursor
                .move_vertically(&self.buffer, -1, self.cursor.last_width)
                .then_some(InputEvent::Moved),
            TuiEvent::CursorDown => self
                .cursor
                .move_vertically(&self.buffer, 1, self.cursor.last_width)
                .then_some(InputEvent::Moved),
            TuiEvent::Enter { shift } => Some(InputEvent::Enter { shift: *shift }),
            _ => None,
        }
    }
}
