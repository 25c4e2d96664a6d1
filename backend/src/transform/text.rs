//! Rich-text cleaning for free-text cells.
//!
//! Product exports carry HTML fragments, markdown emphasis and entities in
//! their description fields; the marketplace importer wants plain text.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<.*?>").expect("valid regex"));
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[a-zA-Z0-9#]+;").expect("valid regex"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static DEFAULT_SANITIZER: Lazy<TextSanitizer> = Lazy::new(TextSanitizer::default);

/// Markdown markers stripped by [`sanitize`].
pub const DEFAULT_MARKERS: &str = "*_`#>";

/// Strips markup with a configurable set of markdown markers.
#[derive(Debug, Clone)]
pub struct TextSanitizer {
    markers: Vec<char>,
}

impl TextSanitizer {
    pub fn new(markers: &str) -> Self {
        Self {
            markers: markers.chars().collect(),
        }
    }

    /// Clean one value:
    ///
    /// 1. drop `<...>` tags (shortest match),
    /// 2. drop markdown marker characters wherever they occur,
    /// 3. replace `&name;` / `&#123;` entities with a space,
    /// 4. collapse whitespace runs and trim.
    pub fn clean(&self, text: &str) -> String {
        let text = TAG_RE.replace_all(text, "");
        let text: String = text.chars().filter(|c| !self.markers.contains(c)).collect();
        let text = ENTITY_RE.replace_all(&text, " ");
        let text = SPACE_RE.replace_all(&text, " ");
        text.trim().to_string()
    }

    /// Clean an optional value; absent becomes `""`.
    pub fn clean_opt(&self, text: Option<&str>) -> String {
        text.map(|t| self.clean(t)).unwrap_or_default()
    }
}

impl Default for TextSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS)
    }
}

/// Clean a value with the default marker set.
///
/// ```
/// use sheetfill::transform::text::sanitize;
///
/// assert_eq!(sanitize("<b>Hello</b> &amp; world"), "Hello world");
/// ```
pub fn sanitize(text: &str) -> String {
    DEFAULT_SANITIZER.clean(text)
}

/// First `max_len` characters of `text`; unchanged when already short enough.
pub fn truncate(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
