//! Error kinds surfaced by providers and their collaborators.
//!
//! Every failure inside [`get_all`](crate::providers::ContentProvider::get_all)
//! or [`get_single`](crate::providers::ContentProvider::get_single) voids the
//! whole call and propagates to the caller unchanged. Nothing is retried and
//! nothing is partially returned.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while configuring providers or fetching content.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials, a foreign `base_url` override, an unknown provider type.
    #[error("configuration error: {0}")]
    Config(String),

    /// An entry whose media cannot be classified or is missing altogether.
    #[error("content error: {0}")]
    Content(String),

    /// Transport failure, timeout or non-success HTTP status.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote API answered with an error envelope.
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// A JSON payload could not be decoded or encoded.
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The media resolver could not turn an embed URL into a direct one.
    #[error("failed to resolve media for {url}: {reason}")]
    Resolution { url: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn content(msg: impl Into<String>) -> Self {
        Error::Content(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    pub fn is_content(&self) -> bool {
        matches!(self, Error::Content(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = Error::config("Invalid `base_url` key in test config");
        assert_eq!(
            e.to_string(),
            "configuration error: Invalid `base_url` key in test config"
        );
        assert!(e.is_config());

        let e = Error::Api {
            code: 14,
            message: "Invalid appkey".to_string(),
        };
        assert_eq!(e.to_string(), "API error 14: Invalid appkey");
    }

    #[test]
    fn test_io_error_names_path() {
        let e = Error::Io {
            path: PathBuf::from("/nope/libmati.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(e.to_string().contains("/nope/libmati.yaml"));
    }
}
