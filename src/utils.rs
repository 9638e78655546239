//! Helpers shared by providers: markup stripping, URL fragments, log truncation.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use url::Url;

static BR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// Strip HTML tags from `html`, keeping text and decoding entities.
///
/// `<br>` tags become newlines so multi-line posts keep their shape.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_tags("a <b>bold</b> &amp; more"), "a bold & more");
/// ```
pub fn strip_tags(html: &str) -> String {
    let normalized = BR_TAG.replace_all(html, "\n");
    let fragment = Html::parse_fragment(&normalized);
    fragment.root_element().text().collect::<String>()
}

/// File name of `url`'s path without its extension.
///
/// `https://repostuj.pl/media/abc123.mp4` -> `abc123`
pub fn url_file_stem(url: &str) -> Option<String> {
    let segment = last_path_segment(url)?;
    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment.as_str(),
    };
    Some(stem.to_string())
}

/// Last non-empty path segment of `url`, ignoring a trailing slash.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

/// `true` when `url`'s host is `domain` or one of its subdomains.
pub fn host_matches(url: &Url, domain: &str) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    })
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with the remaining byte count
/// appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…(+{} bytes)", &s[..idx], s.len() - idx),
    }
}
