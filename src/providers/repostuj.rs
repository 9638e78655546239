//! Repostuj image/video board scraper.
//!
//! Repostuj shows one post per page. Every post page links to the previous
//! post through `#post-prev-btn`, so the board is walked backwards from a
//! start page (the "popular" listing by default) one page at a time.
//!
//! # Stop conditions
//!
//! - the freshly parsed post has the same title and id as the last collected
//!   one (the navigation wrapped around); the duplicate is not kept
//! - `limit` posts were collected
//! - the page has no previous link

use crate::config::{lookup_str, lookup_u64};
use crate::error::{Error, Result};
use crate::http::{HttpFetcher, Page, PageFetcher};
use crate::models::Content;
use crate::providers::{ConfigKey, ContentProvider, ProviderContext, ProviderDescriptor};
use crate::utils::{host_matches, last_path_segment, url_file_stem};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_yaml::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://repostuj.pl/popularne/";
const DEFAULT_LIMIT: usize = 100;
const DOMAIN: &str = "repostuj.pl";

static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img.img-fluid").unwrap());
static VIDEO_SOURCE: Lazy<Selector> = Lazy::new(|| Selector::parse("source").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("span.title").unwrap());
static PREV_BUTTON: Lazy<Selector> = Lazy::new(|| Selector::parse("#post-prev-btn").unwrap());

/// Scraper for `repostuj.pl`.
pub struct RepostujProvider {
    ctx: ProviderContext,
    fetcher: Arc<dyn PageFetcher>,
}

impl ProviderDescriptor for RepostujProvider {
    const NAME: &'static str = "Repostuj";
    const URL: &'static str = "https://repostuj.pl";
    const CONFIG_KEYS: &'static [ConfigKey] = &[
        ConfigKey {
            name: "base_url",
            description: "URL to start searching with. Should be startpage or 'popular' page",
        },
        ConfigKey {
            name: "limit",
            description: "Maximum number of posts collected by one call",
        },
    ];
}

/// What one post page yields before the media type is probed.
#[derive(Debug)]
struct ParsedPage {
    cid: String,
    title: String,
    media_url: Option<String>,
    page_url: String,
    prev_url: Option<String>,
}

impl ParsedPage {
    fn repeats(&self, last: &Content) -> bool {
        self.title == last.title && self.cid == last.cid
    }
}

impl RepostujProvider {
    /// Provider talking to the live site.
    pub fn new(provider_id: &str, config: Value) -> Result<Self> {
        Ok(Self::with_fetcher(
            provider_id,
            config,
            Arc::new(HttpFetcher::new()?),
        ))
    }

    /// Provider reading pages through `fetcher`.
    pub fn with_fetcher(provider_id: &str, config: Value, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            ctx: ProviderContext::new::<Self>(provider_id, config),
            fetcher,
        }
    }

    /// Start page: the configured override if any, else the popular listing.
    ///
    /// Overrides outside `repostuj.pl` are rejected.
    pub fn base_url(&self) -> Result<String> {
        let path = ProviderContext::property_path("base_url");
        let Some(conf_value) = lookup_str(self.ctx.config(), &path) else {
            return Ok(DEFAULT_BASE_URL.to_string());
        };

        info!(provider_id = %self.ctx.provider_id(), "Found `base_url` config value, using it instead of a default one");
        let belongs = Url::parse(&conf_value)
            .map(|url| host_matches(&url, DOMAIN))
            .unwrap_or(false);
        if !belongs {
            return Err(Error::config(format!(
                "Invalid `base_url` key in {} config",
                self.ctx.provider_id()
            )));
        }
        Ok(conf_value)
    }

    /// Maximum number of items `get_all` returns.
    pub fn limit(&self) -> usize {
        let path = ProviderContext::property_path("limit");
        match lookup_u64(self.ctx.config(), &path).and_then(|l| usize::try_from(l).ok()) {
            Some(limit) if limit > 0 => {
                debug!(limit, "Found `limit` config value, using it instead of a default one");
                limit
            }
            _ => DEFAULT_LIMIT,
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<ParsedPage> {
        let page = self.fetcher.fetch(url).await?;
        Ok(parse_page(&page))
    }

    async fn into_content(&self, parsed: ParsedPage) -> Result<Content> {
        let mimetype = match &parsed.media_url {
            Some(media_url) => self.fetcher.mimetype(media_url).await?,
            None => None,
        };

        Ok(Content {
            cid: parsed.cid,
            mimetype,
            title: parsed.title,
            description: String::new(),
            content_url: parsed.media_url,
            base_url: parsed.page_url,
            content_external: None,
        })
    }
}

#[async_trait]
impl ContentProvider for RepostujProvider {
    fn provider_id(&self) -> &str {
        self.ctx.provider_id()
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn config_keys(&self) -> &'static [ConfigKey] {
        Self::CONFIG_KEYS
    }

    #[instrument(level = "info", skip(self), fields(provider_id = %self.ctx.provider_id()))]
    async fn get_all(&self) -> Result<Vec<Content>> {
        let mut url = self.base_url()?;
        let limit = self.limit();
        let mut elements: Vec<Content> = Vec::new();

        loop {
            if elements.len() >= limit {
                info!(limit, "Hit elements limit");
                break;
            }

            let parsed = self.fetch_page(&url).await?;
            if elements.last().is_some_and(|last| parsed.repeats(last)) {
                info!(cid = %parsed.cid, "Navigation wrapped around to an already collected post");
                break;
            }

            let prev_url = parsed.prev_url.clone();
            let current = self.into_content(parsed).await?;
            info!(content = %current, "Found content via Repostuj");
            elements.push(current);

            match prev_url {
                Some(prev) => url = prev,
                None => {
                    info!(%url, "Post has no previous link");
                    break;
                }
            }
        }

        info!(count = elements.len(), "Found total of elements");
        Ok(elements)
    }

    #[instrument(level = "info", skip(self), fields(provider_id = %self.ctx.provider_id()))]
    async fn get_single(&self, locator: &str) -> Result<Content> {
        let parsed = self.fetch_page(locator).await?;
        self.into_content(parsed).await
    }
}

fn absolute(href: &str) -> Option<String> {
    let base = Url::parse(RepostujProvider::URL).ok()?;
    base.join(href).ok().map(String::from)
}

fn parse_page(page: &Page) -> ParsedPage {
    let document = Html::parse_document(&page.body);

    let image_src = document
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"));
    let video_src = || {
        document
            .select(&VIDEO_SOURCE)
            .find(|source| source.value().attr("type") == Some("video/mp4"))
            .and_then(|source| source.value().attr("src"))
    };
    let media_url = image_src
        .or_else(video_src)
        .filter(|src| !src.is_empty())
        .and_then(absolute);

    let cid = media_url
        .as_deref()
        .and_then(url_file_stem)
        .or_else(|| last_path_segment(&page.url))
        .unwrap_or_else(|| page.url.clone());

    let title = document
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|text| {
            let text = text.trim();
            text.split(" | ").nth(1).unwrap_or(text).trim().to_string()
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| cid.clone());

    let prev_url = document
        .select(&PREV_BUTTON)
        .next()
        .and_then(|a| a.value().attr("href"))
        .filter(|href| !href.is_empty())
        .and_then(absolute);

    ParsedPage {
        cid,
        title,
        media_url,
        page_url: page.url.clone(),
        prev_url,
    }
}
