//! # libmati
//!
//! Content aggregation from image boards and micro-blogs.
//!
//! Each source is wrapped in an adapter implementing
//! [`ContentProvider`](providers::ContentProvider). Adapters page through
//! their source and normalize every item into a [`Content`](models::Content)
//! record.
//!
//! ## Providers
//!
//! - [`RepostujProvider`](providers::RepostujProvider): scrapes `repostuj.pl`
//!   post pages, following "previous" links
//! - [`WykopMikroblogProvider`](providers::WykopMikroblogProvider): reads the
//!   Wykop API, filters by upvotes and resolves external media
//!
//! ## Usage
//!
//! ```ignore
//! let mut config = YamlConfig::new(None);
//! config.load().await?;
//! for provider in providers::build_all(config.providers())? {
//!     for item in provider.get_all().await? {
//!         println!("{item}");
//!     }
//! }
//! ```
//!
//! Network access goes through injected collaborators
//! ([`PageFetcher`](http::PageFetcher), [`MikroblogApi`](api::MikroblogApi),
//! [`MediaResolver`](resolver::MediaResolver)). Calls are strictly
//! sequential and any failure fails the whole call.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod outputs;
pub mod providers;
pub mod resolver;
pub mod utils;

pub use config::{YamlConfig, lookup, sget};
pub use error::{Error, Result};
pub use models::Content;
pub use providers::{ContentProvider, build_all, build_provider};
