//! The list container: entries, each with its action controls, optionally
//! followed by a loader.
//!
//! The feed starts out as a single loader at page 1, so the first page is
//! fetched through exactly the same path as every later one.

use log::{debug, info, warn};

use crate::api::types::Reply;
use crate::core::fragment::{DEFAULT_LOADER_LABEL, Image, ParsedNode, parse_fragment};
use crate::core::request::{ControlKey, EntryId, Outcome, Request, RequestId, RequestIds};
use crate::core::widgets::delete::{DeleteControl, DeletePhase};
use crate::core::widgets::loader::Loader;
use crate::core::widgets::toggle::ToggleControl;

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Toggle(ToggleControl),
    Delete(DeleteControl),
}

impl Control {
    pub fn label(&self) -> &'static str {
        match self {
            Control::Toggle(t) => t.label(),
            Control::Delete(d) => d.label(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        match self {
            Control::Toggle(t) => t.is_in_flight(),
            Control::Delete(d) => matches!(d.phase(), DeletePhase::InFlight(_)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    /// The element as served, before any of its controls changed state.
    pub markup: String,
    pub text: String,
    pub controls: Vec<Control>,
    pub images: Vec<Image>,
}

impl Entry {
    /// A confirmed delete turns the whole entry into a static marker.
    pub fn is_deleted(&self) -> bool {
        self.controls
            .iter()
            .any(|c| matches!(c, Control::Delete(d) if d.phase() == DeletePhase::Deleted))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Entry(Entry),
    Loader(Loader),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    /// Loader replaced; this many nodes were appended.
    Appended(usize),
    /// Loader restored for retry; carries the reason.
    Failed(String),
    Stale,
}

#[derive(Debug)]
pub struct Feed {
    path: String,
    nodes: Vec<Node>,
    next_entry: u64,
}

impl Feed {
    pub fn new(path: impl Into<String>) -> Self {
        let mut feed = Self {
            path: path.into(),
            nodes: Vec::new(),
            next_entry: 0,
        };
        feed.reset();
        feed
    }

    /// Drop everything and start again from page 1.
    pub fn reset(&mut self) {
        self.nodes = vec![Node::Loader(Loader::new(1, DEFAULT_LOADER_LABEL))];
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Entry(e) => Some(e),
            Node::Loader(_) => None,
        })
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries().find(|e| e.id == id)
    }

    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.nodes.iter_mut().find_map(|n| match n {
            Node::Entry(e) if e.id == id => Some(e),
            _ => None,
        })
    }

    pub fn loader(&self) -> Option<&Loader> {
        self.nodes.iter().find_map(|n| match n {
            Node::Loader(l) => Some(l),
            Node::Entry(_) => None,
        })
    }

    fn loader_mut(&mut self) -> Option<&mut Loader> {
        self.nodes.iter_mut().find_map(|n| match n {
            Node::Loader(l) => Some(l),
            Node::Entry(_) => None,
        })
    }

    /// Explicit "load more" activation.
    pub fn load_more(&mut self, ids: &mut RequestIds) -> Option<Request> {
        let path = self.path.clone();
        let (id, kind) = self.loader_mut()?.trigger(&path, ids)?;
        Some(Request {
            id,
            key: ControlKey::Loader,
            kind,
        })
    }

    /// Auto-trigger: only when the last node is an idle "Load more" loader.
    pub fn check_auto_load(&mut self, ids: &mut RequestIds) -> Option<Request> {
        match self.nodes.last() {
            Some(Node::Loader(l)) if l.is_auto_triggerable() => self.load_more(ids),
            _ => None,
        }
    }

    pub fn resolve_page(&mut self, id: RequestId, outcome: &Outcome) -> PageResult {
        let Some(index) = self
            .nodes
            .iter()
            .position(|n| matches!(n, Node::Loader(l) if l.owns(id)))
        else {
            return PageResult::Stale;
        };

        match outcome {
            Ok(Reply::Html(html)) => {
                self.nodes.remove(index);
                let appended = self.append_fragment(html);
                info!("Page loaded: {} nodes appended", appended);
                PageResult::Appended(appended)
            }
            Ok(Reply::Status(reply)) => {
                self.reset_loader(index);
                PageResult::Failed(format!("expected a page, got status '{}'", reply.status))
            }
            Err(e) => {
                self.reset_loader(index);
                PageResult::Failed(e.to_string())
            }
        }
    }

    fn reset_loader(&mut self, index: usize) {
        if let Some(Node::Loader(l)) = self.nodes.get_mut(index) {
            l.reset();
        }
    }

    /// Append a fragment's nodes. Only a trailing loader is kept live, so
    /// there is never more than one loader in the list.
    pub fn append_fragment(&mut self, html: &str) -> usize {
        let parsed = parse_fragment(html);
        let last = parsed.len().saturating_sub(1);
        let mut appended = 0;

        for (i, node) in parsed.into_iter().enumerate() {
            match node {
                ParsedNode::Entry(entry) => {
                    self.next_entry += 1;
                    let controls = entry
                        .controls
                        .into_iter()
                        .filter_map(|spec| {
                            if spec.verb.is_destructive() {
                                Some(Control::Delete(DeleteControl::new(spec.target)))
                            } else {
                                ToggleControl::new(spec.verb, spec.target).map(Control::Toggle)
                            }
                        })
                        .collect();
                    self.nodes.push(Node::Entry(Entry {
                        id: EntryId(self.next_entry),
                        markup: entry.markup,
                        text: entry.text,
                        controls,
                        images: entry.images,
                    }));
                    appended += 1;
                }
                ParsedNode::Loader { cursor, label } if i == last => {
                    if self.loader().is_some() {
                        warn!("Dropping loader for page {}: a loader is already live", cursor);
                        continue;
                    }
                    self.nodes.push(Node::Loader(Loader::new(cursor, label)));
                    appended += 1;
                }
                ParsedNode::Loader { cursor, .. } => {
                    debug!("Dropping non-trailing loader for page {}", cursor);
                }
            }
        }

        appended
    }
}
