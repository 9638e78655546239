//! Wykop Mikroblog provider.
//!
//! Entries come from the Wykop API, either from a tag or from the hot feed.
//! Only entries with embedded media and enough upvotes are kept. Media
//! hosted on Streamable, Gfycat or YouTube is resolved to a direct URL;
//! media hosted on Wykop itself is used as-is. Any other host fails the call.

use crate::api::{Entry, MikroblogApi, WykopApiV2};
use crate::config::{lookup_i64, lookup_str, lookup_u64};
use crate::error::{Error, Result};
use crate::http::{HttpFetcher, PageFetcher};
use crate::models::Content;
use crate::providers::{ConfigKey, ContentProvider, ProviderContext, ProviderDescriptor};
use crate::resolver::{DEFAULT_RESOLVER_PROGRAM, MediaResolver, YtDlpResolver};
use crate::utils::{host_matches, last_path_segment, strip_tags, truncate_for_log};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use once_cell::sync::OnceCell;
use serde_yaml::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use url::Url;

const DEFAULT_LIMIT: usize = 50;
const DEFAULT_HOT_PERIOD: u32 = 6;
const ENTRY_URL: &str = "https://wykop.pl/wpis";

/// Where an entry's embedded media lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedSource {
    Streamable,
    Gfycat,
    YouTube,
    /// Hosted by Wykop itself.
    Wykop,
}

impl EmbedSource {
    const HOSTS: &'static [(EmbedSource, &'static str)] = &[
        (EmbedSource::Streamable, "streamable.com"),
        (EmbedSource::Gfycat, "gfycat.com"),
        (EmbedSource::YouTube, "youtube.com"),
        (EmbedSource::YouTube, "youtu.be"),
        (EmbedSource::Wykop, "wykop.pl"),
    ];

    /// Classify an embed URL by host. `None` for hosts we cannot handle.
    pub fn classify(embed_url: &str) -> Option<Self> {
        let url = Url::parse(embed_url).ok()?;
        Self::HOSTS
            .iter()
            .find(|(_, domain)| host_matches(&url, domain))
            .map(|(source, _)| *source)
    }

    /// Third-party hosts only expose an embed page, not the media itself.
    pub fn needs_resolution(self) -> bool {
        !matches!(self, EmbedSource::Wykop)
    }
}

/// Adapter for the Wykop Mikroblog.
pub struct WykopMikroblogProvider {
    ctx: ProviderContext,
    api: OnceCell<Arc<dyn MikroblogApi>>,
    fetcher: Arc<dyn PageFetcher>,
    resolver: Arc<dyn MediaResolver>,
}

impl ProviderDescriptor for WykopMikroblogProvider {
    const NAME: &'static str = "Wykop";
    const URL: &'static str = "https://wykop.pl/mikroblog";
    const CONFIG_KEYS: &'static [ConfigKey] = &[
        ConfigKey {
            name: "api_key",
            description: "API key",
        },
        ConfigKey {
            name: "api_secret",
            description: "API secret key",
        },
        ConfigKey {
            name: "tag",
            description: "Tag to search entries in. If not provided, it will grab entries from hot page",
        },
        ConfigKey {
            name: "limit",
            description: "Maximum number of entries collected by one call",
        },
        ConfigKey {
            name: "upvotes_gte",
            description: "Only get entries where there are >= upvotes",
        },
        ConfigKey {
            name: "hot_period",
            description: "Hot feed window in hours (6, 12 or 24)",
        },
        ConfigKey {
            name: "media_resolver",
            description: "Program used to resolve external media, yt-dlp compatible",
        },
    ];
}

impl WykopMikroblogProvider {
    /// Provider talking to the live API. The API client itself is created on
    /// first use, once credentials are known to be present.
    pub fn new(provider_id: &str, config: Value) -> Result<Self> {
        let program = lookup_str(&config, &ProviderContext::property_path("media_resolver"))
            .unwrap_or_else(|| DEFAULT_RESOLVER_PROGRAM.to_string());

        Ok(Self::with_collaborators(
            provider_id,
            config,
            None,
            Arc::new(HttpFetcher::new()?),
            Arc::new(YtDlpResolver::new(program)),
        ))
    }

    /// Provider with injected collaborators. When `api` is `None` a
    /// [`WykopApiV2`] is built from the configured credentials.
    pub fn with_collaborators(
        provider_id: &str,
        config: Value,
        api: Option<Arc<dyn MikroblogApi>>,
        fetcher: Arc<dyn PageFetcher>,
        resolver: Arc<dyn MediaResolver>,
    ) -> Self {
        let cell = OnceCell::new();
        if let Some(api) = api {
            let _ = cell.set(api);
        }

        Self {
            ctx: ProviderContext::new::<Self>(provider_id, config),
            api: cell,
            fetcher,
            resolver,
        }
    }

    fn property(&self, key: &str) -> String {
        ProviderContext::property_path(key)
    }

    fn api(&self) -> Result<Arc<dyn MikroblogApi>> {
        let config = self.ctx.config();
        let key = lookup_str(config, &self.property("api_key"));
        let secret = lookup_str(config, &self.property("api_secret"));
        let (Some(key), Some(secret)) = (key, secret) else {
            return Err(Error::config(format!(
                "Required api_key or api_secret not found for {}",
                self.ctx.provider_id()
            )));
        };

        self.api
            .get_or_try_init(|| {
                let client: Arc<dyn MikroblogApi> = Arc::new(WykopApiV2::new(key, secret)?);
                Ok::<_, Error>(client)
            })
            .cloned()
    }

    /// Maximum number of items `get_all` returns.
    pub fn limit(&self) -> usize {
        lookup_u64(self.ctx.config(), &self.property("limit"))
            .and_then(|l| usize::try_from(l).ok())
            .filter(|&l| l > 0)
            .unwrap_or(DEFAULT_LIMIT)
    }

    /// Minimum vote count an entry needs to be kept.
    pub fn upvotes_gte(&self) -> i64 {
        lookup_i64(self.ctx.config(), &self.property("upvotes_gte")).unwrap_or(0)
    }

    /// Hot feed window in hours.
    pub fn hot_period(&self) -> u32 {
        lookup_u64(self.ctx.config(), &self.property("hot_period"))
            .and_then(|p| u32::try_from(p).ok())
            .filter(|&p| p > 0)
            .unwrap_or(DEFAULT_HOT_PERIOD)
    }

    /// Tag to read instead of the hot feed.
    pub fn tag(&self) -> Option<String> {
        lookup_str(self.ctx.config(), &self.property("tag"))
    }

    #[instrument(level = "info", skip_all, fields(cid = entry.id))]
    async fn entry_content(&self, entry: Entry) -> Result<Content> {
        let id = entry.id.to_string();
        info!("Found new Content entry from WykopAPI");

        let embed_url = entry
            .embed
            .map(|embed| embed.url)
            .ok_or_else(|| Error::content(format!("Entry #{id} has no embedded content")))?;

        let (content_url, content_external) = match EmbedSource::classify(&embed_url) {
            Some(source) if source.needs_resolution() => {
                info!(?source, "Entry is hosted externally, correcting URLs...");
                let resolved = self.resolver.resolve(&embed_url).await?;
                (resolved, Some(embed_url))
            }
            Some(_) => {
                debug!("Entry is internal Wykop's content");
                (embed_url, None)
            }
            None => {
                error!(%embed_url, "Found unsupported content type for entry. Check it manually.");
                return Err(Error::content(format!(
                    "Unknown content type for #{id} [{embed_url}]"
                )));
            }
        };

        let mimetype = self.fetcher.mimetype(&content_url).await?;
        let description = strip_tags(entry.body.as_deref().unwrap_or_default());
        debug!(description = %truncate_for_log(&description, 80), "Normalized entry");

        Ok(Content {
            cid: id.clone(),
            mimetype,
            title: id.clone(),
            description,
            content_url: Some(content_url),
            base_url: format!("{ENTRY_URL}/{id}"),
            content_external,
        })
    }
}

#[async_trait]
impl ContentProvider for WykopMikroblogProvider {
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
        let api = self.api()?;
        let tag = self.tag();
        let limit = self.limit();
        let upvotes_gte = self.upvotes_gte();
        let hot_period = self.hot_period();

        let mut entries: Vec<Entry> = Vec::new();
        let mut page = 1u32;
        while entries.len() < limit {
            let current = match &tag {
                Some(tag) => {
                    info!(page, %tag, "Calling WykopAPI for page of tag entries...");
                    api.tag_entries(tag, page).await?
                }
                None => {
                    info!(page, hot_period, "Calling WykopAPI for page of hot entries...");
                    api.hot_entries(hot_period, page).await?
                }
            };

            if current.is_empty() {
                info!(page, "No more entries available");
                break;
            }

            let fetched = current.len();
            entries.extend(
                current
                    .into_iter()
                    .filter(|e| e.embed.is_some() && e.vote_count >= upvotes_gte),
            );
            debug!(page, fetched, collected = entries.len(), "Filtered page");
            page += 1;
        }

        entries.truncate(limit);

        let contents: Vec<Content> = stream::iter(entries)
            .then(|entry| self.entry_content(entry))
            .try_collect()
            .await?;

        info!(count = contents.len(), "Found total of elements");
        Ok(contents)
    }

    #[instrument(level = "info", skip(self), fields(provider_id = %self.ctx.provider_id()))]
    async fn get_single(&self, locator: &str) -> Result<Content> {
        let entry_id = last_path_segment(locator)
            .ok_or_else(|| Error::content(format!("No entry id in {locator}")))?;

        let api = self.api()?;
        info!(%entry_id, "Calling WykopAPI for single item");
        let entry = api.entry(&entry_id).await?;
        self.entry_content(entry).await
    }
}
