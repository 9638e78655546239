//! Content providers: one adapter per external source.
//!
//! Every adapter implements [`ContentProvider`] and turns its source's
//! native items into [`Content`] records.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Repostuj | [`repostuj`] | HTML scraping | Walks "previous" links page by page |
//! | Wykop Mikroblog | [`wykop`] | API v2 | Requires API key and secret; resolves external embeds |
//!
//! # Common Patterns
//!
//! Each adapter:
//! - is built from a provider id and that provider's configuration entry
//! - reads its settings from the entry's `properties` mapping
//! - receives its network collaborators as trait objects
//! - fetches strictly sequentially and fails the whole call on the first error

use crate::config::lookup_str;
use crate::error::{Error, Result};
use crate::models::Content;
use async_trait::async_trait;
use serde_yaml::Value;

pub mod repostuj;
pub mod wykop;

pub use repostuj::RepostujProvider;
pub use wykop::WykopMikroblogProvider;

/// A configuration key an adapter understands, with a human description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigKey {
    pub name: &'static str,
    pub description: &'static str,
}

/// Static identity of an adapter type.
pub trait ProviderDescriptor {
    /// Human name of the source.
    const NAME: &'static str;
    /// Home URL of the source.
    const URL: &'static str;
    /// Keys recognized under `properties`.
    const CONFIG_KEYS: &'static [ConfigKey];
}

/// Per-instance state every adapter carries: its id and configuration.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    provider_id: String,
    config: Value,
}

impl ProviderContext {
    /// # Panics
    ///
    /// When `D` declares an empty name or URL. That is a bug in the adapter
    /// definition, not a runtime condition.
    pub fn new<D: ProviderDescriptor>(provider_id: impl Into<String>, config: Value) -> Self {
        assert!(!D::NAME.is_empty(), "Provider name not provided");
        assert!(!D::URL.is_empty(), "Provider URL not provided");

        Self {
            provider_id: provider_id.into(),
            config,
        }
    }

    /// Caller-assigned label of this instance.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// This provider's configuration entry.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Dotted path below this provider's `properties`.
    pub fn property_path(key: &str) -> String {
        format!("properties.{key}")
    }
}

/// Capability set every source adapter offers.
///
/// Callers hold `Box<dyn ContentProvider>` and never depend on a concrete
/// adapter type.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Caller-assigned label of this instance.
    fn provider_id(&self) -> &str;

    /// Human name of the source.
    fn name(&self) -> &'static str;

    /// Configuration keys this adapter reads.
    fn config_keys(&self) -> &'static [ConfigKey];

    /// Fetch as many items as the effective limit allows, in source order.
    async fn get_all(&self) -> Result<Vec<Content>>;

    /// Fetch exactly one item addressed by a source-specific locator.
    async fn get_single(&self, locator: &str) -> Result<Content>;
}

/// Build the adapter named by the entry's `type` key.
pub fn build_provider(provider_id: &str, entry: Value) -> Result<Box<dyn ContentProvider>> {
    let kind = lookup_str(&entry, "type").ok_or_else(|| {
        Error::config(format!("Provider {provider_id} has no `type` configured"))
    })?;

    let provider: Box<dyn ContentProvider> = match kind.as_str() {
        "repostuj" => Box::new(RepostujProvider::new(provider_id, entry)?),
        "wykop" | "wykop_mikroblog" => Box::new(WykopMikroblogProvider::new(provider_id, entry)?),
        other => {
            return Err(Error::config(format!(
                "Unknown provider type `{other}` for {provider_id}"
            )));
        }
    };
    Ok(provider)
}

/// Build every provider in `entries`, in order.
pub fn build_all(entries: Vec<(String, Value)>) -> Result<Vec<Box<dyn ContentProvider>>> {
    entries
        .into_iter()
        .map(|(id, entry)| build_provider(&id, entry))
        .collect()
}
