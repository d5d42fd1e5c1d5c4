//! # Fragment Reader
//!
//! Pages come back from the site as raw HTML fragments. This module splits a
//! fragment into its top-level elements and pulls out what the widgets need:
//!
//! - `data-page="N"` on a top-level element marks a loader holding cursor `N`
//! - `data-action="save"` + `data-id="7"` (or `data-username`) marks a control
//! - `<img src=... data-full=...>` marks a lightbox-able thumbnail
//!
//! Server markup is HTML, not XML, so the reader runs lenient: end names are
//! not checked, stray end tags are tolerated and void elements (`<img>`,
//! `<br>`, ...) never open a nesting level. A bare `&` or `<` in text is
//! escaped before the reader sees it.

use std::borrow::Cow;

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core::verb::{Target, Verb};

pub const DEFAULT_LOADER_LABEL: &str = "Load more";

const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"source", b"track", b"wbr",
];

/// Elements whose text never shows up in an entry's plain text.
const HIDDEN_ELEMENTS: &[&[u8]] = &[b"script", b"style", b"template"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSpec {
    pub verb: Verb,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub src: String,
    /// Full-size source; `data-full` when present, else `src`.
    pub full: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// The element's exact source text.
    pub markup: String,
    /// Whitespace-collapsed text content, control labels excluded.
    pub text: String,
    pub controls: Vec<ControlSpec>,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedNode {
    Entry(ParsedEntry),
    Loader { cursor: u32, label: String },
}

// ============================================================================
// Attribute helpers
// ============================================================================

fn lower_name(e: &BytesStart) -> Vec<u8> {
    e.name().as_ref().to_ascii_lowercase()
}

fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.html_attributes()
        .flatten()
        .find(|a| a.key.as_ref().eq_ignore_ascii_case(key))
        .map(|a| unescape_html(&String::from_utf8_lossy(&a.value)))
}

/// Decode a named or numeric character reference (without `&` and `;`).
fn decode_entity(name: &str) -> Option<String> {
    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}

/// Replace character references. Unknown references are kept verbatim.
fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';').and_then(|semi| Some((semi, decode_entity(&after[..semi])?))) {
            Some((semi, decoded)) => {
                out.push_str(&decoded);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn control_spec(e: &BytesStart) -> Option<ControlSpec> {
    let action = attr(e, b"data-action")?;
    let Some(verb) = Verb::parse(&action) else {
        debug!("Skipping control with unknown action '{}'", action);
        return None;
    };

    let target = if verb.targets_user() {
        attr(e, b"data-username")
            .or_else(|| attr(e, b"data-id"))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .map(Target::Username)
    } else {
        // "0" was the parked-id sentinel in the old markup, never a real post
        attr(e, b"data-id")
            .and_then(|id| id.trim().parse::<u64>().ok())
            .filter(|&id| id != 0)
            .map(Target::Id)
    };

    match target {
        Some(target) => Some(ControlSpec { verb, target }),
        None => {
            debug!("Skipping '{}' control without a valid target", verb);
            None
        }
    }
}

fn image(e: &BytesStart) -> Option<Image> {
    let src = attr(e, b"src")?;
    let full = attr(e, b"data-full").unwrap_or_else(|| src.clone());
    let alt = attr(e, b"alt").unwrap_or_default();
    Some(Image { src, full, alt })
}

// ============================================================================
// Stray markup
// ============================================================================

/// Longest reference name looked at when deciding whether `&` starts one.
const MAX_REFERENCE_LEN: usize = 32;

/// Whether the text after an `&` is a `name;`, `#N;` or `#xH;` reference.
fn starts_reference(after: &str) -> bool {
    let Some(semi) = after
        .bytes()
        .take(MAX_REFERENCE_LEN + 1)
        .position(|b| b == b';')
    else {
        return false;
    };
    let name = &after[..semi];
    match name.strip_prefix('#') {
        Some(num) => match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()),
            None => !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()),
        },
        None => {
            name.bytes().next().is_some_and(|b| b.is_ascii_alphabetic())
                && name.bytes().all(|b| b.is_ascii_alphanumeric())
        }
    }
}

/// Whether the byte after a `<` can open a tag, end tag, comment or PI.
fn starts_tag(next: Option<&u8>) -> bool {
    next.is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

/// The fragment with stray `&` and `<` escaped, plus where each escape
/// landed so offsets can be mapped back to the served text.
struct Escaped<'a> {
    text: Cow<'a, str>,
    /// `(end of an inserted escape in text, bytes added up to there)`
    shifts: Vec<(usize, usize)>,
}

impl<'a> Escaped<'a> {
    fn new(html: &'a str) -> Self {
        let bytes = html.as_bytes();
        let mut out = String::new();
        let mut shifts = Vec::new();
        let mut copied = 0;

        for (i, &b) in bytes.iter().enumerate() {
            let escape = match b {
                b'&' if !starts_reference(&html[i + 1..]) => "&amp;",
                b'<' if !starts_tag(bytes.get(i + 1)) => "&lt;",
                _ => continue,
            };
            out.push_str(&html[copied..i]);
            out.push_str(escape);
            copied = i + 1;
            let added = shifts.last().map_or(0, |&(_, added)| added) + escape.len() - 1;
            shifts.push((out.len(), added));
        }

        if shifts.is_empty() {
            return Self {
                text: Cow::Borrowed(html),
                shifts,
            };
        }
        debug!("Escaped {} stray characters in fragment", shifts.len());
        out.push_str(&html[copied..]);
        Self {
            text: Cow::Owned(out),
            shifts,
        }
    }

    /// Map an offset in the escaped text back to the served text.
    fn original(&self, pos: usize) -> usize {
        let before = self.shifts.partition_point(|&(end, _)| end <= pos);
        let added = before
            .checked_sub(1)
            .map_or(0, |last| self.shifts[last].1);
        pos.saturating_sub(added)
    }
}

// ============================================================================
// Per-element builder
// ============================================================================

struct NodeBuilder {
    start: usize,
    cursor: Option<u32>,
    text: String,
    controls: Vec<ControlSpec>,
    images: Vec<Image>,
    /// Depth at which a control or hidden element opened; text is skipped inside.
    muted_at: Option<usize>,
}

impl NodeBuilder {
    fn new(start: usize, e: &BytesStart) -> Self {
        let cursor = attr(e, b"data-page").and_then(|p| p.trim().parse().ok());
        Self {
            start,
            cursor,
            text: String::new(),
            controls: Vec::new(),
            images: Vec::new(),
            muted_at: None,
        }
    }

    /// Record an opening (or self-closing) element found at `depth`.
    fn element(&mut self, e: &BytesStart, depth: usize, opens: bool) {
        let name = lower_name(e);
        if name == b"img"
            && let Some(img) = image(e)
        {
            self.images.push(img);
        }
        if name == b"br" {
            self.text.push(' ');
        }
        if let Some(spec) = control_spec(e) {
            self.controls.push(spec);
            if opens && self.muted_at.is_none() {
                self.muted_at = Some(depth);
            }
        } else if opens && self.muted_at.is_none() && HIDDEN_ELEMENTS.contains(&name.as_slice()) {
            self.muted_at = Some(depth);
        }
    }

    fn close(&mut self, depth: usize) {
        if self.muted_at == Some(depth) {
            self.muted_at = None;
        }
    }

    fn text(&mut self, s: &str) {
        if self.muted_at.is_none() {
            self.text.push_str(s);
        }
    }

    fn finish(self, source: &Escaped, html: &str, end: usize) -> ParsedNode {
        let text = self.text.split_whitespace().collect::<Vec<_>>().join(" ");
        match self.cursor {
            Some(cursor) => ParsedNode::Loader {
                cursor,
                label: if text.is_empty() {
                    DEFAULT_LOADER_LABEL.to_string()
                } else {
                    text
                },
            },
            None => ParsedNode::Entry(ParsedEntry {
                markup: html
                    .get(source.original(self.start)..source.original(end))
                    .unwrap_or_default()
                    .to_string(),
                text,
                controls: self.controls,
                images: self.images,
            }),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Split a fragment into top-level nodes, in document order.
pub fn parse_fragment(html: &str) -> Vec<ParsedNode> {
    let source = Escaped::new(html);
    let mut reader = Reader::from_str(&source.text);
    {
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    let mut nodes = Vec::new();
    let mut current: Option<NodeBuilder> = None;
    let mut depth = 0usize;

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let void = VOID_ELEMENTS.contains(&lower_name(&e).as_slice());
                let builder = current.get_or_insert_with(|| NodeBuilder::new(start, &e));
                builder.element(&e, depth, !void);
                if !void {
                    depth += 1;
                } else if depth == 0 {
                    let end = reader.buffer_position() as usize;
                    if let Some(done) = current.take() {
                        nodes.push(done.finish(&source, html, end));
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let builder = current.get_or_insert_with(|| NodeBuilder::new(start, &e));
                builder.element(&e, depth, false);
                if depth == 0 {
                    let end = reader.buffer_position() as usize;
                    if let Some(done) = current.take() {
                        nodes.push(done.finish(&source, html, end));
                    }
                }
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    debug!("Ignoring stray end tag at byte {}", start);
                    continue;
                }
                depth -= 1;
                if let Some(builder) = current.as_mut() {
                    builder.close(depth);
                }
                if depth == 0 {
                    let end = reader.buffer_position() as usize;
                    if let Some(done) = current.take() {
                        nodes.push(done.finish(&source, html, end));
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(builder) = current.as_mut() {
                    builder.text(&unescape_html(&String::from_utf8_lossy(&t)));
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(builder) = current.as_mut() {
                    builder.text(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Some(builder) = current.as_mut() {
                    let name = String::from_utf8_lossy(&r).to_string();
                    let decoded = decode_entity(&name).unwrap_or_else(|| format!("&{name};"));
                    builder.text(&decoded);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                // Stray text is escaped up front, so this is truncated markup
                warn!(
                    "Fragment parse stopped at byte {}: {}",
                    source.original(reader.error_position() as usize),
                    e
                );
                break;
            }
            _ => {}
        }
    }

    // Unclosed trailing element: keep what we have
    if let Some(builder) = current.take() {
        nodes.push(builder.finish(&source, html, source.text.len()));
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(node: &ParsedNode) -> &ParsedEntry {
        match node {
            ParsedNode::Entry(e) => e,
            other => panic!("expected entry, got {other:?}"),
        }
    }

    #[test]
    fn test_single_item_keeps_exact_markup() {
        let nodes = parse_fragment("<li>X</li>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(entry(&nodes[0]).markup, "<li>X</li>");
        assert_eq!(entry(&nodes[0]).text, "X");
    }

    #[test]
    fn test_whitespace_between_items_is_ignored() {
        let nodes = parse_fragment("\n  <li>a</li>\n  <li>b</li>\n");
        assert_eq!(nodes.len(), 2);
        assert_eq!(entry(&nodes[1]).markup, "<li>b</li>");
    }

    #[test]
    fn test_trailing_loader() {
        let html = r#"<li>a</li><li class="loader" data-page="3"><a>Load more</a></li>"#;
        let nodes = parse_fragment(html);
        assert_eq!(
            nodes[1],
            ParsedNode::Loader {
                cursor: 3,
                label: "Load more".into()
            }
        );
    }

    #[test]
    fn test_loader_without_label_gets_default() {
        let nodes = parse_fragment(r#"<div data-page="2"></div>"#);
        assert_eq!(
            nodes[0],
            ParsedNode::Loader {
                cursor: 2,
                label: DEFAULT_LOADER_LABEL.into()
            }
        );
    }

    #[test]
    fn test_controls_are_extracted_and_labels_excluded_from_text() {
        let html = r#"<li><p>hello world</p><small>
            <a href="" data-action="delete" data-id="12">delete</a>
            <a href="" data-action="save" data-id="12">save</a>
            <a href="" data-action="follow" data-username="bob">follow</a>
        </small></li>"#;
        let nodes = parse_fragment(html);
        let e = entry(&nodes[0]);
        assert_eq!(e.text, "hello world");
        assert_eq!(
            e.controls,
            vec![
                ControlSpec { verb: Verb::Delete, target: Target::Id(12) },
                ControlSpec { verb: Verb::Save, target: Target::Id(12) },
                ControlSpec { verb: Verb::Follow, target: Target::Username("bob".into()) },
            ]
        );
    }

    #[test]
    fn test_invalid_controls_are_skipped() {
        let html = r#"<li>
            <a data-action="like" data-id="1">like</a>
            <a data-action="save" data-id="0">save</a>
            <a data-action="save" data-id="abc">save</a>
            <a data-action="follow">follow</a>
        </li>"#;
        assert!(entry(&parse_fragment(html)[0]).controls.is_empty());
    }

    #[test]
    fn test_void_elements_and_images() {
        let html = r#"<li>one<br>two <img src="/t/1.jpg" data-full="/f/1.jpg" alt="cat"><img src="/t/2.jpg"></li><li>next</li>"#;
        let nodes = parse_fragment(html);
        assert_eq!(nodes.len(), 2);
        let e = entry(&nodes[0]);
        assert_eq!(e.text, "one two");
        assert_eq!(
            e.images,
            vec![
                Image { src: "/t/1.jpg".into(), full: "/f/1.jpg".into(), alt: "cat".into() },
                Image { src: "/t/2.jpg".into(), full: "/t/2.jpg".into(), alt: String::new() },
            ]
        );
    }

    #[test]
    fn test_entities_are_decoded() {
        let nodes = parse_fragment(r#"<li title="a&amp;b">fish &amp; chips &#33;</li>"#);
        assert_eq!(entry(&nodes[0]).text, "fish & chips !");
        assert_eq!(unescape_html("a&amp;b&bogus;"), "a&b&bogus;");
    }

    #[test]
    fn test_script_text_is_hidden() {
        let nodes = parse_fragment("<li>shown<script>var x = 1;</script></li>");
        assert_eq!(entry(&nodes[0]).text, "shown");
    }

    #[test]
    fn test_stray_end_tags_and_unclosed_tail() {
        let nodes = parse_fragment("</div><li>a</li><li>b");
        assert_eq!(nodes.len(), 2);
        assert_eq!(entry(&nodes[1]).text, "b");
        assert_eq!(entry(&nodes[1]).markup, "<li>b");
    }

    #[test]
    fn test_empty_fragment() {
        assert!(parse_fragment("").is_empty());
        assert!(parse_fragment("   \n").is_empty());
    }

    #[test]
    fn test_bare_ampersand_does_not_drop_later_nodes() {
        let html = r#"<li>fish & chips</li><li>b</li><li data-page="2">Load more</li>"#;
        let nodes = parse_fragment(html);
        assert_eq!(nodes.len(), 3);
        assert_eq!(entry(&nodes[0]).text, "fish & chips");
        assert_eq!(entry(&nodes[0]).markup, "<li>fish & chips</li>");
        assert_eq!(entry(&nodes[1]).markup, "<li>b</li>");
        assert_eq!(
            nodes[2],
            ParsedNode::Loader {
                cursor: 2,
                label: "Load more".into()
            }
        );
    }

    #[test]
    fn test_bare_less_than_is_text() {
        let nodes = parse_fragment("<li>1 < 2 && 3<4</li><li>next</li>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(entry(&nodes[0]).text, "1 < 2 && 3<4");
        assert_eq!(entry(&nodes[0]).markup, "<li>1 < 2 && 3<4</li>");
        assert_eq!(entry(&nodes[1]).text, "next");
    }

    #[test]
    fn test_ampersand_in_attribute_survives() {
        let nodes = parse_fragment(r#"<li><img src="/t.jpg?w=1&h=2" alt="a & b"></li>"#);
        let image = &entry(&nodes[0]).images[0];
        assert_eq!(image.src, "/t.jpg?w=1&h=2");
        assert_eq!(image.alt, "a & b");
    }

    #[test]
    fn test_reference_detection() {
        assert!(starts_reference("amp; rest"));
        assert!(starts_reference("#33;"));
        assert!(starts_reference("#x1F600;"));
        assert!(!starts_reference(" chips"));
        assert!(!starts_reference("#;"));
        assert!(!starts_reference("a b;"));
    }
}
