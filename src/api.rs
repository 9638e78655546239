//! Wykop API v2 client.
//!
//! # Architecture
//!
//! - [`MikroblogApi`]: the three calls the mikroblog provider needs
//! - [`WykopApiV2`]: `reqwest` implementation talking to `a2.wykop.pl`
//!
//! # Request signing
//!
//! Every request carries an `apisign` header holding the lowercase hex MD5
//! of the API secret concatenated with the full request URL:
//!
//! ```text
//! apisign = md5(secret + "https://a2.wykop.pl/Entries/Hot/page/1/period/6/appkey/KEY/")
//! ```
//!
//! Responses are wrapped in an envelope with either a `data` or an `error`
//! member. Error envelopes become [`Error::Api`].

use crate::error::{Error, Result};
use crate::http::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, error, instrument};

pub const DEFAULT_API_URL: &str = "https://a2.wykop.pl";

/// A mikroblog entry as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub embed: Option<Embed>,
}

/// Media attached to an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Embed {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message_en: Option<String>,
    #[serde(default)]
    message_pl: Option<String>,
}

/// Calls the mikroblog provider makes against the remote API.
///
/// Implemented by [`WykopApiV2`]; tests provide in-memory fakes.
#[async_trait]
pub trait MikroblogApi: Send + Sync {
    /// One page of entries tagged with `tag`, newest first.
    async fn tag_entries(&self, tag: &str, page: u32) -> Result<Vec<Entry>>;

    /// One page of the hot feed over the last `period` hours.
    async fn hot_entries(&self, period: u32, page: u32) -> Result<Vec<Entry>>;

    /// A single entry by id.
    async fn entry(&self, id: &str) -> Result<Entry>;
}

/// Signed HTTP client for API v2.
#[derive(Clone)]
pub struct WykopApiV2 {
    client: reqwest::Client,
    base_url: String,
    appkey: String,
    secret: String,
}

impl fmt::Debug for WykopApiV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WykopApiV2")
            .field("base_url", &self.base_url)
            .field("appkey", &self.appkey)
            .finish_non_exhaustive()
    }
}

impl WykopApiV2 {
    pub fn new(appkey: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            appkey: appkey.into(),
            secret: secret.into(),
        })
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url.push_str("/appkey/");
        url.push_str(&urlencoding::encode(&self.appkey));
        url.push('/');
        url
    }

    fn sign(&self, url: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn call<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Option<T>> {
        let url = self.build_url(segments);
        let sign = self.sign(&url);
        debug!(%url, "Calling Wykop API");

        let body = self
            .client
            .get(&url)
            .header("apisign", sign)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        if let Some(err) = envelope.error {
            let message = err
                .message_en
                .or(err.message_pl)
                .unwrap_or_else(|| "unknown error".to_string());
            error!(code = err.code, %message, "Wykop API returned an error");
            return Err(Error::Api {
                code: err.code,
                message,
            });
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl MikroblogApi for WykopApiV2 {
    #[instrument(level = "debug", skip(self))]
    async fn tag_entries(&self, tag: &str, page: u32) -> Result<Vec<Entry>> {
        let page = page.to_string();
        let entries = self.call(&["Tags", "Entries", tag, "page", &page]).await?;
        Ok(entries.unwrap_or_default())
    }

    #[instrument(level = "debug", skip(self))]
    async fn hot_entries(&self, period: u32, page: u32) -> Result<Vec<Entry>> {
        let page = page.to_string();
        let period = period.to_string();
        let entries = self
            .call(&["Entries", "Hot", "page", &page, "period", &period])
            .await?;
        Ok(entries.unwrap_or_default())
    }

    #[instrument(level = "debug", skip(self))]
    async fn entry(&self, id: &str) -> Result<Entry> {
        self.call(&["Entries", "Entry", id])
            .await?
            .ok_or_else(|| Error::content(format!("Entry #{id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> WykopApiV2 {
        WykopApiV2::new("KEY", "SECRET")
            .unwrap()
            .with_base_url(server.uri())
    }

    #[test]
    fn test_build_url_encodes_segments() {
        let api = WykopApiV2::new("KEY", "SECRET").unwrap();
        assert_eq!(
            api.build_url(&["Tags", "Entries", "zaba smieszna", "page", "2"]),
            "https://a2.wykop.pl/Tags/Entries/zaba%20smieszna/page/2/appkey/KEY/"
        );
    }

    #[test]
    fn test_sign_is_md5_of_secret_and_url() {
        let api = WykopApiV2::new("KEY", "SECRET").unwrap();
        let url = "https://a2.wykop.pl/Entries/Entry/1/appkey/KEY/";
        let mut hasher = Md5::new();
        hasher.update(format!("SECRET{url}").as_bytes());
        assert_eq!(api.sign(url), hex::encode(hasher.finalize()));
        assert_eq!(api.sign(url).len(), 32);
    }

    #[tokio::test]
    async fn test_hot_entries_sends_signed_request() {
        let server = MockServer::start().await;
        let api = client(&server);
        let url = api.build_url(&["Entries", "Hot", "page", "1", "period", "6"]);

        Mock::given(method("GET"))
            .and(path("/Entries/Hot/page/1/period/6/appkey/KEY/"))
            .and(header("apisign", api.sign(&url).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": [
                    {"id": 1, "body": "hello", "vote_count": 12,
                     "embed": {"type": "image", "url": "https://www.wykop.pl/cdn/a.jpg"}},
                    {"id": 2, "body": null, "vote_count": 3}
                ]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let entries = api.hot_entries(6, 1).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].vote_count, 12);
        assert_eq!(
            entries[0].embed.as_ref().map(|e| e.url.as_str()),
            Some("https://www.wykop.pl/cdn/a.jpg")
        );
        assert!(entries[1].embed.is_none());
    }

    #[tokio::test]
    async fn test_error_envelope_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": null, "error": {"code": 14, "message_en": "Invalid key", "message_pl": "Niepoprawny klucz"}}"#,
            ))
            .mount(&server)
            .await;

        let err = client(&server).tag_entries("heheszki", 1).await.unwrap_err();
        match err {
            Error::Api { code, message } => {
                assert_eq!(code, 14);
                assert_eq!(message, "Invalid key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_single_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Entries/Entry/4242/appkey/KEY/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": {"id": 4242, "body": "x", "vote_count": 1,
                    "embed": {"type": "video", "url": "https://streamable.com/abc"}}}"#,
            ))
            .mount(&server)
            .await;

        let entry = client(&server).entry("4242").await.unwrap();
        assert_eq!(entry.id, 4242);
    }

    #[tokio::test]
    async fn test_garbage_payload_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(&server).hot_entries(6, 1).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
