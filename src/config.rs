//! Configuration file loading and dotted-path lookup.
//!
//! The configuration is a YAML document. Providers live under a top-level
//! `content_providers` mapping keyed by provider id:
//!
//! ```yaml
//! content_providers:
//!   repostuj_popular:
//!     type: repostuj
//!     properties:
//!       base_url: https://repostuj.pl/popularne/
//!       limit: 20
//!   mikroblog_hot:
//!     type: wykop_mikroblog
//!     properties:
//!       api_key: KEY
//!       api_secret: SECRET
//!       upvotes_gte: 50
//! ```
//!
//! Values are read with [`sget`], which walks a dotted path such as
//! `content_providers.mikroblog_hot.properties.limit` and falls back to a
//! default on the first segment that does not resolve.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "libmati.yaml";

static INDEX_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());

/// Walk `root` along `dotted_path` and return the value it points at.
///
/// Each segment is applied according to the kind of the current value:
///
/// - mapping: the segment is a string key;
/// - sequence: the segment must be an integer literal, negative values count
///   from the end;
/// - tagged value: the walk continues into the wrapped value;
/// - scalar or null: nothing to descend into.
///
/// Returns `None` as soon as a segment does not resolve.
pub fn lookup<'a>(root: &'a Value, dotted_path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in dotted_path.split('.') {
        current = step(current, segment)?;
    }
    Some(current)
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Mapping(map) => map.get(segment),
        Value::Sequence(seq) => {
            if !INDEX_SEGMENT.is_match(segment) {
                return None;
            }
            let idx: i64 = segment.parse().ok()?;
            let len = i64::try_from(seq.len()).ok()?;
            let idx = if idx < 0 { len + idx } else { idx };
            if idx < 0 {
                return None;
            }
            seq.get(usize::try_from(idx).ok()?)
        }
        Value::Tagged(tagged) => step(&tagged.value, segment),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    }
}

/// Safe get: [`lookup`] with a default returned on any miss.
pub fn sget(root: &Value, dotted_path: &str, default: Value) -> Value {
    lookup(root, dotted_path).cloned().unwrap_or(default)
}

/// String at `dotted_path`. Empty strings count as unset.
pub fn lookup_str(root: &Value, dotted_path: &str) -> Option<String> {
    match lookup(root, dotted_path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Unsigned integer at `dotted_path`, from a YAML number or a numeric string.
pub fn lookup_u64(root: &Value, dotted_path: &str) -> Option<u64> {
    match lookup(root, dotted_path)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Signed integer at `dotted_path`, from a YAML number or a numeric string.
pub fn lookup_i64(root: &Value, dotted_path: &str) -> Option<i64> {
    match lookup(root, dotted_path)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The application configuration file.
#[derive(Debug, Default)]
pub struct YamlConfig {
    path: Option<PathBuf>,
    config: Value,
}

impl YamlConfig {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            config: Value::Null,
        }
    }

    /// Build a config from an in-memory YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(Self {
            path: None,
            config: serde_yaml::from_str(source)?,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE).to_path_buf())
    }

    /// Read and parse the configuration file.
    #[instrument(level = "info", skip_all, fields(path = %self.config_path().display()))]
    pub async fn load(&mut self) -> Result<&Value> {
        let path = self.config_path();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(source) => {
                error!(error = %source, "Config file could not be read");
                return Err(Error::Io { path, source });
            }
        };

        self.config = serde_yaml::from_str(&raw)?;
        info!("Config file loaded");
        Ok(&self.config)
    }

    pub fn root(&self) -> &Value {
        &self.config
    }

    pub fn get(&self, dotted_path: &str, default: Value) -> Value {
        sget(&self.config, dotted_path, default)
    }

    /// `(provider_id, entry)` pairs under `content_providers`, in file order.
    pub fn providers(&self) -> Vec<(String, Value)> {
        let Some(Value::Mapping(map)) = lookup(&self.config, "content_providers") else {
            return Vec::new();
        };

        map.iter()
            .filter_map(|(id, entry)| {
                let id = match id {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((id, entry.clone()))
            })
            .collect()
    }

    /// The configuration entry of a single provider.
    pub fn provider(&self, provider_id: &str) -> Option<Value> {
        let Some(Value::Mapping(map)) = lookup(&self.config, "content_providers") else {
            return None;
        };
        map.get(provider_id).cloned()
    }
}
