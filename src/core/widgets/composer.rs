//! Compose box: auto-growing height, character-limit counter and
//! Enter-to-submit.
//!
//! Height follows content: every change recomputes it as the content's
//! scroll height minus a fixed padding. The counter turns to a warning tone
//! once the text reaches the limit.
//!
//! ASCII folding (compatibility decomposition, then dropping whatever is
//! still non-ASCII) exists but is off unless configured, since it silently
//! removes accented letters, emoji and every non-Latin script.

use log::debug;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::api::types::Reply;
use crate::core::request::{Outcome, RequestId, RequestIds, RequestKind};

pub const DEFAULT_CHAR_LIMIT: usize = 480;
/// Padding subtracted from the scroll height. Measured in rows in the terminal.
pub const DEFAULT_GROW_PADDING: u16 = 0;
/// Form field the site expects the post body in.
pub const CONTENT_FIELD: &str = "content";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterTone {
    Normal,
    Warning,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnterPolicy {
    /// Enter always submits.
    #[serde(rename = "submit")]
    Always,
    /// Enter submits; Shift+Enter inserts a newline.
    #[serde(rename = "submit-unless-shift")]
    #[default]
    UnlessShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Submit,
    Newline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerPhase {
    Editing,
    Submitting(RequestId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResult {
    Posted,
    Failed(String),
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposerSettings {
    pub char_limit: usize,
    pub grow_padding: u16,
    pub strip_non_ascii: bool,
    pub enter: EnterPolicy,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            char_limit: DEFAULT_CHAR_LIMIT,
            grow_padding: DEFAULT_GROW_PADDING,
            strip_non_ascii: false,
            enter: EnterPolicy::default(),
        }
    }
}

/// New height for a box whose content measures `scroll_height`.
pub fn expand(scroll_height: u16, padding: u16) -> u16 {
    scroll_height.saturating_sub(padding)
}

/// Fold typography and compatibility forms to ASCII, then drop anything left over.
pub fn fold_to_ascii(text: &str) -> String {
    text.replace(['‘', '’'], "'")
        .replace(['“', '”'], "\"")
        .replace('—', "--")
        .nfkd()
        .filter(char::is_ascii)
        .collect()
}

#[derive(Debug)]
pub struct Composer {
    text: String,
    settings: ComposerSettings,
    height: u16,
    phase: ComposerPhase,
}

impl Composer {
    pub fn new(settings: ComposerSettings) -> Self {
        Self {
            text: String::new(),
            settings,
            height: 0,
            phase: ComposerPhase::Editing,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn phase(&self) -> ComposerPhase {
        self.phase
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn tone(&self) -> CounterTone {
        if self.char_count() >= self.settings.char_limit {
            CounterTone::Warning
        } else {
            CounterTone::Normal
        }
    }

    /// Content changed. Returns the (possibly folded) text the input should show.
    pub fn input(&mut self, text: &str, scroll_height: u16) -> &str {
        self.text = if self.settings.strip_non_ascii {
            fold_to_ascii(text)
        } else {
            text.to_string()
        };
        self.height = expand(scroll_height, self.settings.grow_padding);
        &self.text
    }

    pub fn on_enter(&self, shift: bool) -> KeyOutcome {
        match (self.settings.enter, shift) {
            (EnterPolicy::UnlessShift, true) => KeyOutcome::Newline,
            _ => KeyOutcome::Submit,
        }
    }

    pub fn submit(&mut self, path: &str, ids: &mut RequestIds) -> Option<(RequestId, RequestKind)> {
        if let ComposerPhase::Submitting(id) = self.phase {
            debug!("Submit {} still in flight", id);
            return None;
        }
        if self.text.trim().is_empty() {
            return None;
        }
        let id = ids.next();
        self.phase = ComposerPhase::Submitting(id);
        Some((
            id,
            RequestKind::Submit {
                path: path.to_string(),
                fields: vec![(CONTENT_FIELD.to_string(), self.text.clone())],
            },
        ))
    }

    /// On success the text is cleared; on failure it is kept for another try.
    pub fn resolve(&mut self, id: RequestId, outcome: &Outcome) -> SubmitResult {
        if self.phase != ComposerPhase::Submitting(id) {
            return SubmitResult::Stale;
        }
        self.phase = ComposerPhase::Editing;
        match outcome {
            Ok(Reply::Html(_)) => {
                self.text.clear();
                SubmitResult::Posted
            }
            Ok(Reply::Status(reply)) => SubmitResult::Failed(reply.parsed().feedback()),
            Err(e) => SubmitResult::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ApiError;

    fn composer(limit: usize) -> Composer {
        Composer::new(ComposerSettings {
            char_limit: limit,
            ..Default::default()
        })
    }

    #[test]
    fn test_tone_below_at_and_above_limit() {
        let mut c = composer(5);
        c.input("abcd", 3);
        assert_eq!(c.tone(), CounterTone::Normal);
        c.input("abcde", 3);
        assert_eq!(c.tone(), CounterTone::Warning);
        c.input("abcdef", 3);
        assert_eq!(c.tone(), CounterTone::Warning);
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        let mut c = composer(5);
        c.input("éééé", 3);
        assert_eq!(c.tone(), CounterTone::Normal);
    }

    #[test]
    fn test_height_is_scroll_height_minus_padding() {
        assert_eq!(expand(120, 10), 110);
        assert_eq!(expand(4, 10), 0);

        let mut c = Composer::new(ComposerSettings {
            grow_padding: 1,
            ..Default::default()
        });
        c.input("hi", 5);
        assert_eq!(c.height(), 4);
        c.input("", 3);
        assert_eq!(c.height(), 2);
    }

    #[test]
    fn test_non_ascii_is_kept_by_default() {
        let mut c = composer(480);
        assert_eq!(c.input("café ☕", 3), "café ☕");
    }

    #[test]
    fn test_opt_in_ascii_folding() {
        let mut c = Composer::new(ComposerSettings {
            strip_non_ascii: true,
            ..Default::default()
        });
        assert_eq!(c.input("Café “ok” ☕", 3), "Cafe \"ok\" ");
        assert_eq!(fold_to_ascii("ﬁne"), "fine");
    }

    #[test]
    fn test_enter_policy() {
        let mut c = composer(480);
        assert_eq!(c.on_enter(false), KeyOutcome::Submit);
        assert_eq!(c.on_enter(true), KeyOutcome::Newline);

        c.settings.enter = EnterPolicy::Always;
        assert_eq!(c.on_enter(true), KeyOutcome::Submit);
    }

    #[test]
    fn test_blank_text_is_never_submitted() {
        let mut ids = RequestIds::default();
        let mut c = composer(480);
        c.input("   \n", 3);
        assert!(c.submit("/feed", &mut ids).is_none());
    }

    #[test]
    fn test_submit_posts_content_field_once() {
        let mut ids = RequestIds::default();
        let mut c = composer(480);
        c.input("hello", 3);
        let (id, kind) = c.submit("/feed", &mut ids).unwrap();
        assert_eq!(
            kind,
            RequestKind::Submit {
                path: "/feed".into(),
                fields: vec![("content".into(), "hello".into())]
            }
        );
        assert!(c.submit("/feed", &mut ids).is_none());

        assert_eq!(c.resolve(id, &Ok(Reply::Html(String::new()))), SubmitResult::Posted);
        assert!(c.text().is_empty());
    }

    #[test]
    fn test_failed_submit_keeps_text() {
        let mut ids = RequestIds::default();
        let mut c = composer(480);
        c.input("hello", 3);
        let (id, _) = c.submit("/feed", &mut ids).unwrap();
        let result = c.resolve(id, &Err(ApiError::Timeout));
        assert_eq!(result, SubmitResult::Failed("request timed out".into()));
        assert_eq!(c.text(), "hello");
        assert_eq!(c.phase(), ComposerPhase::Editing);
    }
}
