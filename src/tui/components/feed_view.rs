//! # FeedView Component
//!
//! Scrollable view of the list: entry cards followed by the loader row.
//!
//! ## Responsibilities
//!
//! - Lay out nodes and cache their heights for scrolling and hit testing
//! - Track keyboard selection (node, and button within an entry)
//! - Report whether the loader row is on screen, which drives auto-loading
//!
//! ## Architecture
//!
//! `FeedView` is transient (created each frame) and wraps
//! `&'a mut FeedViewState` (persistent state) and the core `Feed` (props).

use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::widgets::feed::{Feed, Node};
use crate::core::widgets::loader::LoaderPhase;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::entry_card::EntryCard;
use crate::tui::event::TuiEvent;

const LOADER_HEIGHT: u16 = 1;

#[derive(Default)]
pub struct FeedViewState {
    pub scroll_state: ScrollViewState,
    /// Height of each node at the last rendered width
    pub heights: Vec<u16>,
    /// Running totals of `heights`; entry `i` ends at `prefix_heights[i]`
    pub prefix_heights: Vec<u16>,
    /// Selected node index
    pub selected: Option<usize>,
    /// Selected button within the selected entry
    pub slot: usize,
    pub viewport_height: u16,
    /// The loader row intersected the viewport on the last frame
    pub loader_visible: bool,
}

impl FeedViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_next(&mut self, node_count: usize) {
        if node_count == 0 {
            self.selected = None;
            return;
        }
        let next = self.selected.map_or(0, |i| (i + 1).min(node_count - 1));
        if self.selected != Some(next) {
            self.slot = 0;
        }
        self.selected = Some(next);
        self.scroll_to_selected();
    }

    pub fn select_prev(&mut self, node_count: usize) {
        if node_count == 0 {
            self.selected = None;
            return;
        }
        let prev = self.selected.map_or(0, |i| i.saturating_sub(1));
        if self.selected != Some(prev) {
            self.slot = 0;
        }
        self.selected = Some(prev);
        self.scroll_to_selected();
    }

    pub fn next_slot(&mut self, control_count: usize) {
        if self.slot + 1 < control_count {
            self.slot += 1;
        }
    }

    pub fn prev_slot(&mut self) {
        self.slot = self.slot.saturating_sub(1);
    }

    /// Clamp selection after the list shrank (e.g. a refresh).
    pub fn clamp_selection(&mut self, node_count: usize) {
        if let Some(i) = self.selected
            && i >= node_count
        {
            self.selected = node_count.checked_sub(1);
            self.slot = 0;
        }
    }

    /// Content height, capped at `u16::MAX` rows.
    pub fn total_height(&self) -> u16 {
        self.heights.iter().fold(0u16, |acc, &h| acc.saturating_add(h))
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Scroll the viewport so the selected node is fully visible.
    /// If the node is taller than the viewport, align its top edge.
    pub fn scroll_to_selected(&mut self) {
        let Some(idx) = self.selected else {
            return;
        };
        let Some(&bottom) = self.prefix_heights.get(idx) else {
            return;
        };
        let top = idx
            .checked_sub(1)
            .and_then(|i| self.prefix_heights.get(i).copied())
            .unwrap_or(0);
        let offset_y = self.scroll_state.offset().y;

        if top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: top });
        } else if bottom > offset_y.saturating_add(self.viewport_height) {
            let new_y = bottom.saturating_sub(self.viewport_height).min(top);
            self.scroll_state.set_offset(Position { x: 0, y: new_y });
        }
    }

    /// Node index at content row `content_y`, if any.
    pub fn hit_test(&self, content_y: u16) -> Option<usize> {
        let index = self.prefix_heights.partition_point(|&end| end <= content_y);
        (index < self.prefix_heights.len()).then_some(index)
    }

    fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    fn visible_range(&self) -> std::ops::Range<usize> {
        let offset = self.scroll_state.offset().y;
        let start = self.prefix_heights.partition_point(|&end| end <= offset);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < offset.saturating_add(self.viewport_height))
            .saturating_add(1)
            .min(self.prefix_heights.len());
        start..end.max(start)
    }
}

pub struct FeedView<'a> {
    pub state: &'a mut FeedViewState,
    pub feed: &'a Feed,
}

impl<'a> FeedView<'a> {
    pub fn new(state: &'a mut FeedViewState, feed: &'a Feed) -> Self {
        Self { state, feed }
    }
}

fn loader_row(label: &str, phase: LoaderPhase, selected: bool) -> Paragraph<'static> {
    let mut style = Style::default().fg(Color::DarkGray);
    if !matches!(phase, LoaderPhase::Loading(_)) {
        style = style.fg(Color::Cyan);
    }
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Paragraph::new(format!("── {label} ──"))
        .style(style)
        .alignment(Alignment::Center)
}

impl<'a> Component for FeedView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar
        let nodes = self.feed.nodes();

        self.state.heights = nodes
            .iter()
            .map(|node| match node {
                Node::Entry(entry) => EntryCard::calculate_height(entry, content_width),
                Node::Loader(_) => LOADER_HEIGHT,
            })
            .collect();
        self.state.rebuild_prefix_heights();
        self.state.clamp_selection(nodes.len());

        let total_height = self.state.total_height();
        self.state.viewport_height = area.height;
        self.state.clamp_scroll();

        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let visible = self.state.visible_range();
        for i in visible.clone() {
            let height = self.state.heights[i];
            let top = self.state.prefix_heights[i].saturating_sub(height);
            let rect = Rect::new(0, top, content_width, height);
            let is_selected = self.state.selected == Some(i);

            match &nodes[i] {
                Node::Entry(entry) => {
                    scroll_view.render_widget(EntryCard::new(entry, is_selected, self.state.slot), rect);
                }
                Node::Loader(loader) => {
                    scroll_view.render_widget(
                        loader_row(loader.label(), loader.phase(), is_selected),
                        rect,
                    );
                }
            }
        }

        self.state.loader_visible = matches!(nodes.last(), Some(Node::Loader(_)))
            && visible.contains(&(nodes.len() - 1));

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

impl EventHandler for FeedViewState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => self.scroll_state.scroll_up(),
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.clamp_scroll();
            }
            TuiEvent::ScrollPageUp => self.scroll_state.scroll_page_up(),
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.clamp_scroll();
            }
            _ => {}
        }
        None
    }
}
