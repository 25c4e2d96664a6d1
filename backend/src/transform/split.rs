//! Fan-out decomposition of compound source fields.
//!
//! Two formats appear in product exports:
//!
//! ```text
//! bullets: <ul><li>Passgenau</li><li>TÜV-frei</li></ul>   → ["Passgenau", "TÜV-frei"]
//! images:  https://cdn/a.jpg;0,https://cdn/b.jpg;1,         → ["https://cdn/a.jpg", "https://cdn/b.jpg"]
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static LI_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</li\s*>").expect("valid regex"));
static LI_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<li\s*>").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("valid regex"));

/// Separator used when an image list goes into one cell.
pub const IMAGE_JOIN_SEPARATOR: &str = "|";

/// Split an HTML bullet fragment into its lines, in document order.
pub fn split_bullets(raw: &str) -> Vec<String> {
    let text = BREAK_RE.replace_all(raw, "\n");
    let text = LI_CLOSE_RE.replace_all(&text, "\n");
    let text = LI_OPEN_RE.replace_all(&text, "");
    let text = TAG_RE.replace_all(&text, "");

    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Split a `url;index,url;index,` list into URLs, in document order.
///
/// The `;index` suffix is dropped; duplicates are kept.
pub fn split_images(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let url = part.split(';').next().unwrap_or("").trim();
            (!url.is_empty()).then(|| url.to_string())
        })
        .collect()
}

/// Image list for a single cell: URLs joined with `|`.
pub fn join_images(raw: &str) -> String {
    split_images(raw).join(IMAGE_JOIN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bullets_list_items() {
        assert_eq!(split_bullets("<li>One</li><li>Two</li>"), vec!["One", "Two"]);
        assert!(split_bullets("").is_empty());
    }

    #[test]
    fn test_split_bullets_breaks_and_wrappers() {
        let raw = "<ul>\n  <LI>Erste</LI>\n<li> Zweite </li></ul>Dritte<br>Vierte<BR/>Fünfte<br />";
        assert_eq!(
            split_bullets(raw),
            vec!["Erste", "Zweite", "Dritte", "Vierte", "Fünfte"]
        );
    }

    #[test]
    fn test_split_bullets_strips_inner_tags() {
        assert_eq!(
            split_bullets("<li><b>Stabil</b> &amp; leicht</li>"),
            vec!["Stabil &amp; leicht"]
        );
    }

    #[test]
    fn test_split_images() {
        assert_eq!(
            split_images("http://a.jpg;0,http://b.jpg;1,"),
            vec!["http://a.jpg", "http://b.jpg"]
        );
        assert_eq!(split_images(" http://a.jpg ;0, ,http://a.jpg"), vec!["http://a.jpg", "http://a.jpg"]);
        assert!(split_images("").is_empty());
        assert!(split_images(",;3,").is_empty());
    }

    #[test]
    fn test_join_images() {
        assert_eq!(join_images("http://a.jpg;0,http://b.jpg;1,"), "http://a.jpg|http://b.jpg");
        assert_eq!(join_images(""), "");
    }
}
