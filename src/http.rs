//! HTTP access for HTML-scraped sources.
//!
//! Providers never build a client themselves; they receive an
//! `Arc<dyn PageFetcher>` so tests can swap in canned pages.

use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("libmati/", env!("CARGO_PKG_VERSION"));

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: String,
    pub body: String,
}

/// GET pages and probe media types.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page>;

    /// `Content-Type` reported by a HEAD request against `url`.
    ///
    /// `None` when the server sends no type or refuses the probe with a
    /// non-success status. Transport failures are still errors.
    async fn mimetype(&self, url: &str) -> Result<Option<String>>;
}

/// [`PageFetcher`] backed by `reqwest` with bounded timeouts.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Page> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let body = response.text().await?;
        debug!(bytes = body.len(), %final_url, "Fetched page");
        Ok(Page {
            url: final_url,
            body,
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn mimetype(&self, url: &str) -> Result<Option<String>> {
        let response = self.client.head(url).send().await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "Media type probe refused");
            return Ok(None);
        }
        let mimetype = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!(?mimetype, "Probed media type");
        Ok(mimetype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body_and_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/popularne/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = format!("{}/popularne/", server.uri());
        let page = fetcher.fetch(&url).await.unwrap();
        assert_eq!(page.body, "<html>ok</html>");
        assert_eq!(page.url, url);
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_mimetype_probe_uses_head() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/media/cat.mp4"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "video/mp4"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let mimetype = fetcher
            .mimetype(&format!("{}/media/cat.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(mimetype.as_deref(), Some("video/mp4"));
    }

    #[tokio::test]
    async fn test_refused_mimetype_probe_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405).insert_header("content-type", "text/html"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let mimetype = fetcher
            .mimetype(&format!("{}/media/cat.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(mimetype, None);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(50)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(err.is_network());
    }
}
