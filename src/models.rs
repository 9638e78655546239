//! Data models: the normalized content record and the run report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One fetched item, normalized across sources.
///
/// A `Content` is built once inside a provider call and handed to the caller;
/// providers never keep or mutate records after returning them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Source-unique identifier of the item.
    pub cid: String,
    /// MIME type reported for `content_url`, if the probe returned one.
    pub mimetype: Option<String>,
    /// Display title. Sources without titles reuse `cid`.
    pub title: String,
    /// Plain-text description with markup stripped.
    pub description: String,
    /// Direct URL of the media resource. `None` for items without media.
    pub content_url: Option<String>,
    /// Canonical page URL of the item.
    pub base_url: String,
    /// Original embed URL when `content_url` was resolved from a third-party host.
    pub content_external: Option<String>,
}

/// Outcome of polling one provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderReport {
    pub provider_id: String,
    pub name: String,
    pub items: Vec<Content>,
    /// Error message when the call failed; `items` is then empty.
    pub error: Option<String>,
}

/// Everything one run collected, as written by the `mati` binary.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchReport {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run.
    pub local_time: String,
    pub providers: Vec<ProviderReport>,
}

impl FetchReport {
    pub fn item_count(&self) -> usize {
        self.providers.iter().map(|p| p.items.len()).sum()
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Content type:{}: {}>",
            self.mimetype.as_deref().unwrap_or("unknown"),
            self.cid
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(cid: &str, title: &str) -> Content {
        Content {
            cid: cid.to_string(),
            mimetype: Some("image/jpeg".to_string()),
            title: title.to_string(),
            description: String::new(),
            content_url: Some(format!("https://repostuj.pl/media/{cid}.jpg")),
            base_url: format!("https://repostuj.pl/post/{cid}"),
            content_external: None,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(content("abc", "t").to_string(), "<Content type:image/jpeg: abc>");

        let mut unknown = content("abc", "t");
        unknown.mimetype = None;
        assert_eq!(unknown.to_string(), "<Content type:unknown: abc>");
    }

    #[test]
    fn test_serialization_keeps_nulls() {
        let mut c = content("abc", "Title");
        c.content_url = None;
        let json = serde_json::to_value(&c).unwrap();
        assert!(json["content_url"].is_null());
        assert!(json["content_external"].is_null());
        assert_eq!(json["cid"], "abc");
    }

    #[test]
    fn test_fetch_report_roundtrip() {
        let report = FetchReport {
            local_date: "2026-10-19".to_string(),
            local_time: "08:00:00".to_string(),
            providers: vec![
                ProviderReport {
                    provider_id: "rep".to_string(),
                    name: "Repostuj".to_string(),
                    items: vec![content("a", "A"), content("b", "B")],
                    error: None,
                },
                ProviderReport {
                    provider_id: "wyk".to_string(),
                    name: "Wykop".to_string(),
                    items: vec![],
                    error: Some("configuration error: missing key".to_string()),
                },
            ],
        };
        assert_eq!(report.item_count(), 2);

        let json = serde_json::to_string(&report).unwrap();
        let back: FetchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.providers[0].items[1], content("b", "B"));
        assert_eq!(back.providers[1].error.as_deref(), Some("configuration error: missing key"));
    }
}
